use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use super::Direction;
use crate::binding::{AssignmentTable, SlotId};
use crate::config::PlaybackTiming;
use crate::input::{Key, KeySink, KeyHold};

/// Plays directions as key taps while holding the modifier.
///
/// The modifier and every direction key are released on every path,
/// including a failed key event.
pub fn play_sequence(
    keys: &dyn KeySink,
    directions: &[Direction],
    timing: &PlaybackTiming,
) -> Result<()> {
    let hold = KeyHold::press(keys, Key::Control)?;
    thread::sleep(timing.modifier_lead());

    for direction in directions {
        let tap = KeyHold::press(keys, direction.key())?;
        thread::sleep(timing.key_hold());
        tap.release()?;
        thread::sleep(timing.key_gap());
    }

    thread::sleep(timing.modifier_tail());
    hold.release()
}

/// Per-slot in-flight flags.
#[derive(Debug)]
pub struct SlotGuards {
    busy: [AtomicBool; SlotId::ALL.len()],
}

impl Default for SlotGuards {
    fn default() -> Self {
        Self {
            busy: std::array::from_fn(|_| AtomicBool::new(false)),
        }
    }
}

impl SlotGuards {
    /// Marks the slot as playing. Returns `None` if it already is.
    pub fn try_acquire(self: &Arc<Self>, slot: SlotId) -> Option<PlaybackHandle> {
        self.busy[slot.index()]
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| PlaybackHandle {
                guards: Arc::clone(self),
                slot,
            })
    }

    pub fn is_busy(&self, slot: SlotId) -> bool {
        self.busy[slot.index()].load(Ordering::SeqCst)
    }
}

/// An in-flight playback for one slot. Dropping it frees the slot.
#[derive(Debug)]
pub struct PlaybackHandle {
    guards: Arc<SlotGuards>,
    slot: SlotId,
}

impl PlaybackHandle {
    pub fn slot(&self) -> SlotId {
        self.slot
    }
}

impl Drop for PlaybackHandle {
    fn drop(&mut self) {
        self.guards.busy[self.slot.index()].store(false, Ordering::SeqCst);
    }
}

#[derive(Debug)]
pub enum TriggerOutcome {
    /// Playback runs on its own thread
    Started(JoinHandle<Result<()>>),
    /// A playback for this slot is still in flight; the trigger was dropped
    Busy,
    /// Nothing is assigned to the slot
    Unbound,
}

/// Plays slot macros from the current assignment table.
pub struct MacroPlayer {
    keys: Arc<dyn KeySink>,
    timing: PlaybackTiming,
    guards: Arc<SlotGuards>,
}

impl MacroPlayer {
    pub fn new(keys: Arc<dyn KeySink>, timing: PlaybackTiming) -> Self {
        Self {
            keys,
            timing,
            guards: Arc::new(SlotGuards::default()),
        }
    }

    pub fn guards(&self) -> &Arc<SlotGuards> {
        &self.guards
    }

    /// Starts playback of the item bound to `slot`.
    pub fn trigger(&self, slot: SlotId, table: &AssignmentTable) -> TriggerOutcome {
        let Some(binding) = table.get(slot) else {
            crate::log(&format!("Slot {} has no assigned item", slot));
            return TriggerOutcome::Unbound;
        };

        let Some(handle) = self.guards.try_acquire(slot) else {
            crate::log(&format!(
                "Slot {} ({}) is still playing, trigger dropped",
                slot, binding.name
            ));
            return TriggerOutcome::Busy;
        };

        let directions = Direction::parse_command(&binding.command);
        let name = binding.name.clone();
        let keys = Arc::clone(&self.keys);
        let timing = self.timing.clone();

        crate::log(&format!("Playing {} on slot {} ({})", name, slot, binding.command));
        // The handle moves into the worker and frees the slot when it ends
        let worker = thread::spawn(move || {
            let result = play_sequence(keys.as_ref(), &directions, &timing);
            if let Err(e) = &result {
                crate::log(&format!(
                    "Playback of {} on slot {} failed: {:#}",
                    name,
                    handle.slot(),
                    e
                ));
            }
            result
        });
        TriggerOutcome::Started(worker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::Binding;
    use crate::input::tests::{KeyEvent, RecordingSink};

    fn table_with(slot: SlotId, command: &str) -> AssignmentTable {
        let mut table = AssignmentTable::new();
        table.set(slot, Binding::new("飞鹰空袭", command));
        table
    }

    fn join(outcome: TriggerOutcome) -> Result<()> {
        match outcome {
            TriggerOutcome::Started(handle) => handle.join().expect("playback thread panicked"),
            other => panic!("expected playback to start, got {:?}", other),
        }
    }

    #[test]
    fn test_wasd_sequence() {
        let sink = RecordingSink::default();
        play_sequence(
            &sink,
            &Direction::parse_command("wasd"),
            &PlaybackTiming::immediate(),
        )
        .unwrap();

        use KeyEvent::{Down, Up};
        assert_eq!(
            sink.events(),
            vec![
                Down(Key::Control),
                Down(Key::Up),
                Up(Key::Up),
                Down(Key::Left),
                Up(Key::Left),
                Down(Key::Down),
                Up(Key::Down),
                Down(Key::Right),
                Up(Key::Right),
                Up(Key::Control),
            ]
        );
    }

    #[test]
    fn test_failure_mid_sequence_releases_modifier() {
        // Control, Up, then the Left press fails
        let sink = RecordingSink::failing_at(2);
        let result = play_sequence(
            &sink,
            &Direction::parse_command("wasd"),
            &PlaybackTiming::immediate(),
        );

        assert!(result.is_err());
        assert_eq!(sink.count(KeyEvent::Down(Key::Left)), 0);
        assert_eq!(sink.count(KeyEvent::Up(Key::Control)), 1);
        assert_eq!(sink.events().last(), Some(&KeyEvent::Up(Key::Control)));
    }

    #[test]
    fn test_failed_direction_release_leaves_nothing_held() {
        let sink = RecordingSink::failing_up_once(Key::Up);
        let result = play_sequence(
            &sink,
            &Direction::parse_command("wasd"),
            &PlaybackTiming::immediate(),
        );

        assert!(result.is_err());
        assert!(sink.still_held().is_empty());
        assert_eq!(sink.count(KeyEvent::Down(Key::Left)), 0);
        // The direction key comes up before the modifier
        use KeyEvent::{Down, Up};
        assert_eq!(
            sink.events(),
            vec![Down(Key::Control), Down(Key::Up), Up(Key::Up), Up(Key::Control)]
        );
    }

    #[test]
    fn test_delays_separate_steps() {
        let timing = PlaybackTiming {
            modifier_lead_ms: 5,
            key_hold_ms: 5,
            key_gap_ms: 5,
            modifier_tail_ms: 5,
        };
        let sink = RecordingSink::default();

        let start = std::time::Instant::now();
        play_sequence(&sink, &Direction::parse_command("wasd"), &timing).unwrap();
        let elapsed = start.elapsed();

        // lead + 4 × (hold + gap) + tail
        assert!(elapsed >= std::time::Duration::from_millis(5 + 4 * 10 + 5));
        assert_eq!(sink.events().len(), 2 + 4 * 2);
        assert!(sink.still_held().is_empty());
    }

    #[test]
    fn test_unbound_slot() {
        let sink = Arc::new(RecordingSink::default());
        let player = MacroPlayer::new(sink.clone(), PlaybackTiming::immediate());
        let outcome = player.trigger(SlotId::Role3, &AssignmentTable::new());
        assert!(matches!(outcome, TriggerOutcome::Unbound));
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_trigger_while_busy_is_dropped() {
        let sink = Arc::new(RecordingSink::default());
        let player = MacroPlayer::new(sink.clone(), PlaybackTiming::immediate());
        let table = table_with(SlotId::Role1, "wdsd");

        let in_flight = player.guards().try_acquire(SlotId::Role1).unwrap();
        assert!(matches!(
            player.trigger(SlotId::Role1, &table),
            TriggerOutcome::Busy
        ));
        assert!(sink.events().is_empty());

        drop(in_flight);
        join(player.trigger(SlotId::Role1, &table)).unwrap();
        assert_eq!(sink.events().len(), 2 + 4 * 2);
        assert!(!player.guards().is_busy(SlotId::Role1));
    }

    #[test]
    fn test_busy_slot_does_not_block_others() {
        let sink = Arc::new(RecordingSink::default());
        let player = MacroPlayer::new(sink.clone(), PlaybackTiming::immediate());
        let mut table = table_with(SlotId::Role1, "wdsd");
        table.set(SlotId::Reinforce, Binding::new("增援", "wsdaw"));

        let _in_flight = player.guards().try_acquire(SlotId::Role1).unwrap();
        join(player.trigger(SlotId::Reinforce, &table)).unwrap();
        assert_eq!(sink.count(KeyEvent::Down(Key::Up)), 2);
    }

    #[test]
    fn test_guard_cleared_after_failure() {
        let sink = Arc::new(RecordingSink::failing_at(1));
        let player = MacroPlayer::new(sink.clone(), PlaybackTiming::immediate());
        let table = table_with(SlotId::Area2, "sswd");

        assert!(join(player.trigger(SlotId::Area2, &table)).is_err());
        assert!(!player.guards().is_busy(SlotId::Area2));
        assert_eq!(sink.count(KeyEvent::Up(Key::Control)), 1);
    }

    #[test]
    fn test_handle_releases_on_drop() {
        let guards = Arc::new(SlotGuards::default());
        let handle = guards.try_acquire(SlotId::Area1).unwrap();
        assert_eq!(handle.slot(), SlotId::Area1);
        assert!(guards.try_acquire(SlotId::Area1).is_none());
        drop(handle);
        assert!(guards.try_acquire(SlotId::Area1).is_some());
    }
}
