//! Keeps the pointer near the screen centre while the tool is active.

use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::config::PointerConfig;

/// Pointer device access.
pub trait Pointer: Send + Sync {
    /// Current display size in pixels.
    fn screen_size(&self) -> Result<(i32, i32)>;
    fn position(&self) -> Result<(i32, i32)>;
    fn move_to(&self, x: i32, y: i32) -> Result<()>;
}

/// Moves the pointer to the screen centre unconditionally.
pub fn center_pointer(pointer: &dyn Pointer) -> Result<()> {
    let (w, h) = pointer.screen_size()?;
    pointer.move_to(w / 2, h / 2)
}

/// One centering step: moves the pointer back if it drifted past the tolerance.
///
/// Returns whether the pointer was moved.
pub fn recenter_if_drifted(pointer: &dyn Pointer, tolerance_px: f64) -> Result<bool> {
    let (w, h) = pointer.screen_size()?;
    let (cx, cy) = (w / 2, h / 2);
    let (x, y) = pointer.position()?;

    let dx = (x - cx) as f64;
    let dy = (y - cy) as f64;
    if (dx * dx + dy * dy).sqrt() > tolerance_px {
        pointer.move_to(cx, cy)?;
        return Ok(true);
    }
    Ok(false)
}

/// Spawns the centering loop. It runs until `running` is cleared.
pub fn spawn_centering(
    pointer: Arc<dyn Pointer>,
    config: PointerConfig,
    running: Arc<AtomicBool>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        crate::log("Pointer centering started");
        let interval = Duration::from_millis(config.interval_ms);
        let backoff = Duration::from_millis(config.error_backoff_ms);

        while running.load(Ordering::SeqCst) {
            match recenter_if_drifted(pointer.as_ref(), config.tolerance_px) {
                Ok(_) => thread::sleep(interval),
                Err(e) => {
                    crate::log(&format!("Pointer centering failed: {:#}", e));
                    thread::sleep(backoff);
                }
            }
        }
        crate::log("Pointer centering stopped");
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    pub(crate) struct FakePointer {
        pub size: (i32, i32),
        pub pos: Mutex<(i32, i32)>,
        pub moves: Mutex<Vec<(i32, i32)>>,
    }

    impl FakePointer {
        pub fn at(x: i32, y: i32) -> Self {
            Self {
                size: (2560, 1440),
                pos: Mutex::new((x, y)),
                moves: Mutex::new(Vec::new()),
            }
        }

        pub fn move_count(&self) -> usize {
            self.moves.lock().unwrap().len()
        }
    }

    impl Pointer for FakePointer {
        fn screen_size(&self) -> Result<(i32, i32)> {
            Ok(self.size)
        }

        fn position(&self) -> Result<(i32, i32)> {
            Ok(*self.pos.lock().unwrap())
        }

        fn move_to(&self, x: i32, y: i32) -> Result<()> {
            *self.pos.lock().unwrap() = (x, y);
            self.moves.lock().unwrap().push((x, y));
            Ok(())
        }
    }

    #[test]
    fn test_within_tolerance_not_moved() {
        let pointer = FakePointer::at(1280 + 30, 720 + 30);
        assert!(!recenter_if_drifted(&pointer, 50.0).unwrap());
        assert_eq!(pointer.move_count(), 0);
    }

    #[test]
    fn test_drifted_pointer_moved_to_centre() {
        let pointer = FakePointer::at(10, 10);
        assert!(recenter_if_drifted(&pointer, 50.0).unwrap());
        assert_eq!(*pointer.pos.lock().unwrap(), (1280, 720));
    }

    #[test]
    fn test_center_pointer() {
        let pointer = FakePointer::at(0, 0);
        center_pointer(&pointer).unwrap();
        assert_eq!(*pointer.moves.lock().unwrap(), vec![(1280, 720)]);
    }

    #[test]
    fn test_loop_stops_on_flag() {
        let pointer = Arc::new(FakePointer::at(0, 0));
        let running = Arc::new(AtomicBool::new(true));
        let config = PointerConfig {
            interval_ms: 1,
            ..PointerConfig::default()
        };

        let handle = spawn_centering(pointer.clone(), config, running.clone());
        while pointer.move_count() == 0 {
            thread::sleep(Duration::from_millis(1));
        }
        running.store(false, Ordering::SeqCst);
        handle.join().expect("centering thread panicked");

        assert_eq!(*pointer.pos.lock().unwrap(), (1280, 720));
    }
}
