//! Fuzzy matching of recognized text against vocabulary names.

use regex::Regex;
use std::sync::OnceLock;

/// Anything that is not a CJK unified ideograph.
const NON_IDEOGRAPH_PATTERN: &str = r"[^\x{4E00}-\x{9FFF}]";

fn non_ideograph_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(NON_IDEOGRAPH_PATTERN).expect("valid ideograph pattern"))
}

/// Keeps only the ideographic characters of a string.
pub fn ideographs_only(text: &str) -> String {
    non_ideograph_regex().replace_all(text, "").into_owned()
}

/// Length of the longest common subsequence, counted in chars.
fn lcs_len(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    // Single rolling row over `b`.
    let mut row = vec![0usize; b.len() + 1];
    for &ca in a {
        let mut diag = 0;
        for (j, &cb) in b.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = if ca == cb {
                diag + 1
            } else {
                above.max(row[j])
            };
            diag = above;
        }
    }
    row[b.len()]
}

/// `2 * matched / total` over the chars of both strings.
fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * lcs_len(&a, &b) as f64 / total as f64
}

/// Similarity of two labels in [0, 1].
///
/// Identical strings score 1.0. Otherwise both sides are reduced to their
/// ideographs and compared; if either side has none, the raw strings are
/// compared instead. Symmetric in its arguments.
pub fn similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }

    let clean_a = ideographs_only(a);
    let clean_b = ideographs_only(b);

    if clean_a.is_empty() || clean_b.is_empty() {
        ratio(a, b)
    } else {
        ratio(&clean_a, &clean_b)
    }
}

/// Result of matching one recognized string.
#[derive(Clone, Debug, PartialEq)]
pub enum MatchOutcome {
    Matched { name: String, score: f64 },
    /// Nothing reached the threshold; `best_score` is kept for diagnostics.
    NoMatch { best_score: f64 },
}

impl MatchOutcome {
    pub fn score(&self) -> f64 {
        match self {
            MatchOutcome::Matched { score, .. } => *score,
            MatchOutcome::NoMatch { best_score } => *best_score,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            MatchOutcome::Matched { name, .. } => Some(name),
            MatchOutcome::NoMatch { .. } => None,
        }
    }
}

/// Picks the closest vocabulary name for a recognized string.
#[derive(Clone, Debug)]
pub struct VocabularyMatcher {
    threshold: f64,
}

impl VocabularyMatcher {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Scores `candidate` against every name and returns the best one if it
    /// reaches the threshold. A name equal to `candidate` always wins;
    /// otherwise the first name wins ties.
    pub fn best_match<'a>(
        &self,
        candidate: &str,
        names: impl IntoIterator<Item = &'a str>,
    ) -> MatchOutcome {
        if candidate.is_empty() {
            return MatchOutcome::NoMatch { best_score: 0.0 };
        }

        let mut best: Option<(&str, f64)> = None;
        for name in names {
            if name == candidate {
                return MatchOutcome::Matched {
                    name: name.to_string(),
                    score: 1.0,
                };
            }
            let score = similarity(candidate, name);
            if best.is_none_or(|(_, s)| score > s) {
                best = Some((name, score));
            }
        }

        match best {
            Some((name, score)) if score >= self.threshold => MatchOutcome::Matched {
                name: name.to_string(),
                score,
            },
            Some((_, score)) => MatchOutcome::NoMatch { best_score: score },
            None => MatchOutcome::NoMatch { best_score: 0.0 },
        }
    }
}
