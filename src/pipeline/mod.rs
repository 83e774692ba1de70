//! Recognition cycle: capture → normalize → recognize → match → assign.
//!
//! This module provides:
//! - One synchronous cycle over injected collaborators (`run_cycle`)
//! - Shared state with an atomically replaced assignment table
//! - The `Pipeline` controller driven by trigger events

pub mod controller;
pub mod cycle;
pub mod state;

pub use controller::Pipeline;
pub use cycle::{run_cycle, CycleInputs};
pub use state::PipelineState;

use thiserror::Error;

use crate::vocab::VocabularyEntry;

/// Failures that abort a whole recognition cycle.
///
/// Per-region and per-pass failures are logged and absorbed instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CycleError {
    #[error("no vocabulary loaded")]
    NoVocabularyLoaded,

    #[error("no region could be captured")]
    NoCaptures,

    #[error("OCR engine unavailable")]
    EngineUnavailable,

    #[error("capture failed: {0}")]
    Capture(String),

    #[error("a recognition cycle is already running")]
    AlreadyRunning,
}

/// Outcome of recognizing one captured region.
#[derive(Clone, Debug, PartialEq)]
pub struct RecognitionResult {
    pub source_index: usize,
    pub raw_text: String,
    pub matched: Option<VocabularyEntry>,
    pub similarity: f64,
}

/// What a display collaborator should show.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum CycleStatus {
    #[default]
    Idle,
    Recognizing,
    Ready { bound: usize },
    Failed(CycleError),
}

impl CycleStatus {
    pub fn status_text(&self) -> String {
        match self {
            CycleStatus::Idle => "Press F12 to recognize".to_string(),
            CycleStatus::Recognizing => "Recognizing...".to_string(),
            CycleStatus::Ready { bound } => format!("Ready: {} slot(s) bound", bound),
            CycleStatus::Failed(e) => format!("Recognition failed: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_text_is_distinct() {
        let failed = CycleStatus::Failed(CycleError::NoVocabularyLoaded);
        assert_eq!(failed.status_text(), "Recognition failed: no vocabulary loaded");
        assert_ne!(
            failed.status_text(),
            CycleStatus::Ready { bound: 0 }.status_text()
        );
    }

    #[test]
    fn test_capture_error_message() {
        let e = CycleError::Capture("SendInput rejected".to_string());
        assert_eq!(e.to_string(), "capture failed: SendInput rejected");
    }
}
