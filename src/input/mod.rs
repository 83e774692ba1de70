//! Synthetic keyboard and pointer input.
//!
//! The pipeline only talks to the `KeySink` and `Pointer` traits; the
//! Windows implementation injects events with SendInput.

pub mod pointer;
#[cfg(windows)]
pub mod sendinput;

pub use pointer::{spawn_centering, Pointer};

use anyhow::Result;

/// Keys the pipeline ever injects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    Control,
    Up,
    Down,
    Left,
    Right,
}

/// Destination for synthetic key events.
pub trait KeySink: Send + Sync {
    fn key_down(&self, key: Key) -> Result<()>;
    fn key_up(&self, key: Key) -> Result<()>;
}

/// Holds a key down until released or dropped.
///
/// The key is released exactly once: by `release()` when the caller wants the
/// error, otherwise on drop. A failed `release()` leaves the key held, so the
/// drop tries once more.
pub struct KeyHold<'a> {
    sink: &'a dyn KeySink,
    key: Key,
    held: bool,
}

impl<'a> KeyHold<'a> {
    pub fn press(sink: &'a dyn KeySink, key: Key) -> Result<Self> {
        sink.key_down(key)?;
        Ok(Self {
            sink,
            key,
            held: true,
        })
    }

    pub fn release(mut self) -> Result<()> {
        self.sink.key_up(self.key)?;
        self.held = false;
        Ok(())
    }
}

impl Drop for KeyHold<'_> {
    fn drop(&mut self) {
        if self.held {
            self.held = false;
            if let Err(e) = self.sink.key_up(self.key) {
                crate::log(&format!("Failed to release {:?}: {:#}", self.key, e));
            }
        }
    }
}
