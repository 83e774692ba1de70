use std::sync::Arc;
use std::thread::{self, JoinHandle};

use super::{run_cycle, CycleError, CycleInputs, CycleStatus, PipelineState};
use crate::binding::{binding_summary, SlotId};
use crate::capture::ScreenGrabber;
use crate::config::AppConfig;
use crate::input::pointer::center_pointer;
use crate::input::{spawn_centering, KeySink, Pointer};
use crate::ocr::TextEngine;
use crate::playback::{MacroPlayer, TriggerOutcome};
use crate::vocab::Vocabulary;

/// Drives recognition cycles and slot playback from trigger events.
pub struct Pipeline {
    grabber: Arc<dyn ScreenGrabber>,
    keys: Arc<dyn KeySink>,
    pointer: Option<Arc<dyn Pointer>>,
    engine: Option<Arc<dyn TextEngine>>,
    vocabulary: Arc<Vocabulary>,
    config: AppConfig,
    screen: (u32, u32),
    state: Arc<PipelineState>,
    player: MacroPlayer,
}

impl Pipeline {
    pub fn new(
        grabber: Arc<dyn ScreenGrabber>,
        keys: Arc<dyn KeySink>,
        engine: Option<Arc<dyn TextEngine>>,
        vocabulary: Arc<Vocabulary>,
        config: AppConfig,
        screen: (u32, u32),
    ) -> Self {
        let player = MacroPlayer::new(Arc::clone(&keys), config.playback.clone());
        Self {
            grabber,
            keys,
            pointer: None,
            engine,
            vocabulary,
            config,
            screen,
            state: Arc::new(PipelineState::new()),
            player,
        }
    }

    /// Enables pointer centering during recognition.
    pub fn with_pointer(mut self, pointer: Arc<dyn Pointer>) -> Self {
        self.pointer = Some(pointer);
        self
    }

    pub fn state(&self) -> &Arc<PipelineState> {
        &self.state
    }

    /// Starts a recognition cycle on a worker thread.
    ///
    /// A trigger while a cycle is running is ignored.
    pub fn start_cycle(self: &Arc<Self>) -> Result<JoinHandle<()>, CycleError> {
        let Some(claim) = self.state.try_begin_cycle() else {
            crate::log("Recognition already running, trigger ignored");
            return Err(CycleError::AlreadyRunning);
        };

        self.state.set_status(CycleStatus::Recognizing);
        self.start_pointer_centering();

        let pipeline = Arc::clone(self);
        Ok(thread::spawn(move || {
            let _claim = claim;
            crate::log("=== Recognition cycle started ===");
            pipeline.run_cycle_now();
        }))
    }

    /// Runs one cycle on the calling thread and publishes the result.
    ///
    /// On failure the previous table stays in place and the status reports
    /// the reason.
    pub fn run_cycle_now(&self) -> CycleStatus {
        let inputs = CycleInputs {
            grabber: self.grabber.as_ref(),
            keys: self.keys.as_ref(),
            engine: self.engine.as_deref(),
            vocabulary: &self.vocabulary,
            config: &self.config,
            screen: self.screen,
        };

        let status = match run_cycle(&inputs) {
            Ok(report) => {
                let table = report.assignment.table;
                let summary = binding_summary(&table, &self.config.keys);
                for line in &summary {
                    crate::log(line);
                }
                let bound = table.bound_count();
                self.state.publish(table, summary);
                CycleStatus::Ready { bound }
            }
            Err(e) => {
                crate::log(&format!("Recognition failed: {}", e));
                CycleStatus::Failed(e)
            }
        };

        self.state.set_status(status.clone());
        status
    }

    fn start_pointer_centering(&self) {
        let Some(pointer) = &self.pointer else {
            return;
        };
        if let Err(e) = center_pointer(pointer.as_ref()) {
            crate::log(&format!("Failed to center pointer: {:#}", e));
        }
        if self.config.pointer.enabled && self.state.claim_pointer_loop() {
            spawn_centering(
                Arc::clone(pointer),
                self.config.pointer.clone(),
                self.state.running_flag(),
            );
        }
    }

    /// Plays the macro bound to `slot` in the current table.
    pub fn trigger_slot(&self, slot: SlotId) -> TriggerOutcome {
        let table = self.state.snapshot();
        self.player.trigger(slot, &table)
    }

    /// Signals every background loop to stop.
    pub fn shutdown(&self) {
        crate::log("Stopping...");
        self.state.stop();
    }
}
