//! Multi-pass text recognition.
//!
//! Each pass runs the engine with a different page segmentation mode. Tokens
//! at or below the confidence cutoff are dropped and the survivors joined
//! without separators; the longest result across passes wins.

use image::GrayImage;

use super::engine::{OcrWord, PassConfig, TextEngine};

/// Passes in evaluation order.
pub const DEFAULT_PASSES: [PassConfig; 5] = [
    PassConfig { name: "block", psm: 6 },
    PassConfig { name: "raw line", psm: 13 },
    PassConfig { name: "single line", psm: 7 },
    PassConfig { name: "single word", psm: 8 },
    PassConfig { name: "sparse", psm: 11 },
];

pub struct MultiPassRecognizer<'a> {
    engine: &'a dyn TextEngine,
    passes: &'a [PassConfig],
    confidence_cutoff: f32,
}

impl<'a> MultiPassRecognizer<'a> {
    pub fn new(engine: &'a dyn TextEngine, confidence_cutoff: f32) -> Self {
        Self {
            engine,
            passes: &DEFAULT_PASSES,
            confidence_cutoff,
        }
    }

    pub fn with_passes(mut self, passes: &'a [PassConfig]) -> Self {
        self.passes = passes;
        self
    }

    /// Recognizes one normalized image. Never fails; the result may be empty.
    pub fn recognize(&self, img: &GrayImage) -> String {
        let mut candidates = Vec::with_capacity(self.passes.len());
        for pass in self.passes {
            match self.engine.recognize_words(img, pass) {
                Ok(words) => candidates.push(join_confident(&words, self.confidence_cutoff)),
                Err(e) => {
                    crate::log(&format!("OCR pass {} (psm {}) failed: {:#}", pass.name, pass.psm, e));
                    candidates.push(String::new());
                }
            }
        }

        let mut text = pick_longest(&candidates).to_string();
        if text.is_empty() {
            text = match self.engine.recognize_text(img) {
                Ok(raw) => raw,
                Err(e) => {
                    crate::log(&format!("OCR fallback failed: {:#}", e));
                    String::new()
                }
            };
        }

        strip_whitespace(&text)
    }
}

/// Concatenates tokens above the cutoff with no separator.
pub fn join_confident(words: &[OcrWord], cutoff: f32) -> String {
    words
        .iter()
        .filter(|w| w.confidence > cutoff && !w.text.trim().is_empty())
        .map(|w| w.text.as_str())
        .collect()
}

/// Longest candidate by character count; the earliest wins ties.
pub fn pick_longest(candidates: &[String]) -> &str {
    let mut best = "";
    let mut best_len = 0;
    for c in candidates {
        let len = c.chars().count();
        if len > best_len {
            best = c.as_str();
            best_len = len;
        }
    }
    best
}

pub fn strip_whitespace(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Result};
    use std::collections::HashMap;
    use std::sync::Mutex;

    fn word(text: &str, confidence: f32) -> OcrWord {
        OcrWord {
            text: text.to_string(),
            confidence,
        }
    }

    /// Returns canned words per PSM; missing PSMs fail.
    #[derive(Default)]
    struct ScriptedEngine {
        by_psm: HashMap<u8, Vec<OcrWord>>,
        fallback: Option<String>,
        fallback_calls: Mutex<usize>,
    }

    impl TextEngine for ScriptedEngine {
        fn recognize_words(&self, _img: &GrayImage, pass: &PassConfig) -> Result<Vec<OcrWord>> {
            self.by_psm
                .get(&pass.psm)
                .cloned()
                .ok_or_else(|| anyhow!("psm {} unavailable", pass.psm))
        }

        fn recognize_text(&self, _img: &GrayImage) -> Result<String> {
            *self.fallback_calls.lock().unwrap() += 1;
            self.fallback.clone().ok_or_else(|| anyhow!("no text"))
        }
    }

    fn img() -> GrayImage {
        GrayImage::new(4, 4)
    }

    #[test]
    fn test_low_confidence_tokens_dropped() {
        let words = vec![word("飞鹰", 80.0), word("x", 30.0), word("空袭", 31.0)];
        assert_eq!(join_confident(&words, 30.0), "飞鹰空袭");
    }

    #[test]
    fn test_longest_pass_wins() {
        let mut engine = ScriptedEngine::default();
        engine.by_psm.insert(6, vec![word("飞鹰", 90.0)]);
        engine.by_psm.insert(7, vec![word("飞鹰", 90.0), word("空袭", 90.0)]);
        engine.by_psm.insert(8, vec![word("飞", 90.0)]);

        let text = MultiPassRecognizer::new(&engine, 30.0).recognize(&img());
        assert_eq!(text, "飞鹰空袭");
        assert_eq!(*engine.fallback_calls.lock().unwrap(), 0);
    }

    #[test]
    fn test_tie_keeps_earliest_pass() {
        let candidates = vec!["ab".to_string(), "cd".to_string(), "e".to_string()];
        assert_eq!(pick_longest(&candidates), "ab");
        assert_eq!(pick_longest(&[]), "");
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        // "机枪" is 6 bytes but 2 characters
        let candidates = vec!["机枪".to_string(), "abc".to_string()];
        assert_eq!(pick_longest(&candidates), "abc");
    }

    #[test]
    fn test_failed_passes_do_not_abort_others() {
        let mut engine = ScriptedEngine::default();
        engine.by_psm.insert(11, vec![word("机枪", 60.0)]);

        let text = MultiPassRecognizer::new(&engine, 30.0).recognize(&img());
        assert_eq!(text, "机枪");
    }

    #[test]
    fn test_fallback_when_all_passes_empty() {
        let mut engine = ScriptedEngine::default();
        engine.by_psm.insert(6, vec![word("噪声", 10.0)]);
        engine.fallback = Some(" 哨戒\n机枪\t\n".to_string());

        let text = MultiPassRecognizer::new(&engine, 30.0).recognize(&img());
        assert_eq!(text, "哨戒机枪");
        assert_eq!(*engine.fallback_calls.lock().unwrap(), 1);
    }

    #[test]
    fn test_everything_failing_yields_empty() {
        let engine = ScriptedEngine::default();
        assert_eq!(MultiPassRecognizer::new(&engine, 30.0).recognize(&img()), "");
    }

    #[test]
    fn test_custom_passes() {
        let mut engine = ScriptedEngine::default();
        engine.by_psm.insert(6, vec![word("增援", 99.0)]);
        engine.by_psm.insert(7, vec![word("重新补给", 99.0)]);

        let passes = [PassConfig { name: "block", psm: 6 }];
        let text = MultiPassRecognizer::new(&engine, 30.0)
            .with_passes(&passes)
            .recognize(&img());
        assert_eq!(text, "增援");
    }
}
