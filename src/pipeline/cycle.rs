use std::time::{Duration, Instant};

use super::{CycleError, RecognitionResult};
use crate::binding::{assign, Assignment, RecognizedItems};
use crate::capture::{capture_burst, CapturedImage, ScreenGrabber};
use crate::config::AppConfig;
use crate::input::KeySink;
use crate::ocr::{normalize, MultiPassRecognizer, TextEngine};
use crate::vocab::{CategoryPartition, MatchOutcome, Vocabulary, VocabularyMatcher};

/// Collaborators and settings for one cycle.
pub struct CycleInputs<'a> {
    pub grabber: &'a dyn ScreenGrabber,
    pub keys: &'a dyn KeySink,
    pub engine: Option<&'a dyn TextEngine>,
    pub vocabulary: &'a Vocabulary,
    pub config: &'a AppConfig,
    pub screen: (u32, u32),
}

#[derive(Debug)]
pub struct CycleReport {
    /// One per captured region, in region order
    pub results: Vec<RecognitionResult>,
    pub assignment: Assignment,
}

impl CycleReport {
    pub fn matched_count(&self) -> usize {
        self.results.iter().filter(|r| r.matched.is_some()).count()
    }
}

/// Runs one recognition cycle and returns the new assignment.
///
/// Nothing is published here; on error the caller keeps its previous table.
pub fn run_cycle(inputs: &CycleInputs) -> Result<CycleReport, CycleError> {
    let start = Instant::now();
    let config = inputs.config;

    if inputs.vocabulary.is_empty() {
        return Err(CycleError::NoVocabularyLoaded);
    }
    let engine = inputs.engine.ok_or(CycleError::EngineUnavailable)?;

    let (width, height) = inputs.screen;
    let regions = config.capture.regions(width, height);
    let captured = capture_burst(
        inputs.grabber,
        inputs.keys,
        &regions,
        Duration::from_millis(config.capture.settle_ms),
    )
    .map_err(|e| CycleError::Capture(format!("{:#}", e)))?;

    if captured.is_empty() {
        return Err(CycleError::NoCaptures);
    }

    let recognizer = MultiPassRecognizer::new(engine, config.ocr.confidence_cutoff);
    let matcher = VocabularyMatcher::new(config.match_threshold);
    let results: Vec<RecognitionResult> = captured
        .iter()
        .map(|c| recognize_region(c, &recognizer, &matcher, inputs.vocabulary, config))
        .collect();

    let items: RecognizedItems = results
        .iter()
        .filter_map(|r| r.matched.as_ref())
        .map(|entry| (entry.name.clone(), entry.command.clone()))
        .collect();

    let partition = CategoryPartition::from_vocabulary(inputs.vocabulary);
    let assignment = assign(&items, &partition, &config.priority);

    let report = CycleReport {
        results,
        assignment,
    };
    crate::log(&format!(
        "Cycle complete in {}ms: {}/{} regions matched, {} slot(s) bound",
        start.elapsed().as_millis(),
        report.matched_count(),
        report.results.len(),
        report.assignment.table.bound_count()
    ));
    Ok(report)
}

fn recognize_region(
    captured: &CapturedImage,
    recognizer: &MultiPassRecognizer,
    matcher: &VocabularyMatcher,
    vocabulary: &Vocabulary,
    config: &AppConfig,
) -> RecognitionResult {
    let region_no = captured.index + 1;
    let normalized = normalize(&captured.image, &config.ocr);
    let raw_text = recognizer.recognize(&normalized);
    crate::log(&format!("Region {}: recognized '{}'", region_no, raw_text));

    let outcome = matcher.best_match(&raw_text, vocabulary.names());
    let matched = match &outcome {
        MatchOutcome::Matched { name, score } => {
            let category = vocabulary
                .category_of(name)
                .map_or_else(|| "?".to_string(), |c| c.to_string());
            crate::log(&format!(
                "Region {}: matched {} ({:.2}, {})",
                region_no, name, score, category
            ));
            vocabulary.get(name).cloned()
        }
        MatchOutcome::NoMatch { best_score } => {
            crate::log(&format!(
                "Region {}: no match (best score {:.2})",
                region_no, best_score
            ));
            None
        }
    };

    RecognitionResult {
        source_index: captured.index,
        raw_text,
        matched,
        similarity: outcome.score(),
    }
}
