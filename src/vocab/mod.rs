//! Known vocabulary of labeled items and their command strings.
//!
//! This module provides:
//! - Loading the per-language assets file (`Map` + `Player/R,G,B`)
//! - Category partitioning for slot assignment
//! - Fuzzy matching of recognized text against vocabulary names

pub mod category;
pub mod matcher;

pub use category::{Category, CategoryPartition};
pub use matcher::{MatchOutcome, VocabularyMatcher};

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::playback::Direction;

/// One labeled item: its display name, command string and category.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VocabularyEntry {
    pub name: String,
    pub command: String,
    pub category: Category,
}

/// On-disk layout of an assets file.
#[derive(Debug, Default, Deserialize)]
struct AssetsFile {
    #[serde(rename = "Map", default)]
    map: BTreeMap<String, String>,
    #[serde(rename = "Player", default)]
    player: PlayerAssets,
}

#[derive(Debug, Default, Deserialize)]
struct PlayerAssets {
    #[serde(rename = "R", default)]
    r: BTreeMap<String, String>,
    #[serde(rename = "G", default)]
    g: BTreeMap<String, String>,
    #[serde(rename = "B", default)]
    b: BTreeMap<String, String>,
}

/// Immutable vocabulary, loaded once at startup.
///
/// Entry order is Map (by name), then R, G, B. Names are unique; a name listed
/// in several categories keeps the last one in that order.
#[derive(Clone, Debug, Default)]
pub struct Vocabulary {
    entries: Vec<VocabularyEntry>,
}

impl Vocabulary {
    /// Builds a vocabulary from `(name, command, category)` triples.
    pub fn from_entries(items: impl IntoIterator<Item = VocabularyEntry>) -> Self {
        let mut entries: Vec<VocabularyEntry> = Vec::new();
        for item in items {
            if item.name.is_empty() {
                continue;
            }
            if Direction::parse_command(&item.command).is_empty() {
                crate::log(&format!(
                    "Vocabulary: '{}' has no playable directions in command {:?}",
                    item.name, item.command
                ));
            }
            if let Some(existing) = entries.iter_mut().find(|e| e.name == item.name) {
                crate::log(&format!(
                    "Vocabulary: '{}' listed in both {} and {}, keeping {}",
                    item.name, existing.category, item.category, item.category
                ));
                *existing = item;
            } else {
                entries.push(item);
            }
        }
        Self { entries }
    }

    /// Parses an assets JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let file: AssetsFile = serde_json::from_str(json).context("Invalid assets file")?;

        let groups = [
            (Category::Area, file.map),
            (Category::RoleA, file.player.r),
            (Category::RoleB, file.player.g),
            (Category::RoleC, file.player.b),
        ];

        let items = groups.into_iter().flat_map(|(category, group)| {
            group.into_iter().map(move |(name, command)| VocabularyEntry {
                name,
                command,
                category,
            })
        });

        Ok(Self::from_entries(items))
    }

    /// Reads an assets file from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_json_str(&contents)
    }

    /// Loads the vocabulary, returning an empty one if the file is unusable.
    ///
    /// Recognition cycles refuse to run against an empty vocabulary, so the
    /// failure stays visible without stopping the process here.
    pub fn load_or_empty(path: &Path) -> Self {
        match Self::load(path) {
            Ok(vocabulary) => {
                crate::log(&format!(
                    "Loaded {} vocabulary entries from {}",
                    vocabulary.len(),
                    path.display()
                ));
                vocabulary
            }
            Err(e) => {
                crate::log(&format!("Failed to load vocabulary: {:#}", e));
                Self::default()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[VocabularyEntry] {
        &self.entries
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&VocabularyEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Category of a name, for display coloring.
    pub fn category_of(&self, name: &str) -> Option<Category> {
        self.get(name).map(|e| e.category)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tempfile::tempdir;

    pub(crate) const SAMPLE: &str = r#"{
        "Map": {
            "增援": "wsdaw",
            "重新补给": "sswd",
            "SOS信标": "wsdw",
            "地狱火炸弹": "swaswdsw"
        },
        "Player": {
            "R": { "轨道精准攻击": "ddw", "飞鹰空袭": "wdsd" },
            "G": { "哨戒机枪": "swdwa" },
            "B": { "机枪": "saswd" }
        }
    }"#;

    pub(crate) fn sample() -> Vocabulary {
        Vocabulary::from_json_str(SAMPLE).unwrap()
    }

    #[test]
    fn test_parse_assets_file() {
        let vocab = sample();
        assert_eq!(vocab.len(), 8);
        assert_eq!(vocab.category_of("增援"), Some(Category::Area));
        assert_eq!(vocab.category_of("飞鹰空袭"), Some(Category::RoleA));
        assert_eq!(vocab.category_of("哨戒机枪"), Some(Category::RoleB));
        assert_eq!(vocab.category_of("机枪"), Some(Category::RoleC));
        assert_eq!(vocab.get("重新补给").unwrap().command, "sswd");
        assert_eq!(vocab.category_of("不存在"), None);
    }

    #[test]
    fn test_entries_ordered_by_category() {
        let vocab = sample();
        let categories: Vec<Category> = vocab.entries().iter().map(|e| e.category).collect();
        let mut sorted = categories.clone();
        sorted.sort();
        assert_eq!(categories, sorted);
    }

    #[test]
    fn test_missing_sections_are_empty() {
        let vocab = Vocabulary::from_json_str(r#"{"Map": {"增援": "wsdaw"}}"#).unwrap();
        assert_eq!(vocab.len(), 1);

        let vocab = Vocabulary::from_json_str("{}").unwrap();
        assert!(vocab.is_empty());
    }

    #[test]
    fn test_duplicate_name_keeps_later_category() {
        let vocab = Vocabulary::from_json_str(
            r#"{"Map": {"飞鹰": "wd"}, "Player": {"B": {"飞鹰": "sa"}}}"#,
        )
        .unwrap();
        assert_eq!(vocab.len(), 1);
        let entry = vocab.get("飞鹰").unwrap();
        assert_eq!(entry.category, Category::RoleC);
        assert_eq!(entry.command, "sa");
    }

    #[test]
    fn test_load_or_empty_on_missing_file() {
        let dir = tempdir().unwrap();
        let vocab = Vocabulary::load_or_empty(&dir.path().join("nope.json"));
        assert!(vocab.is_empty());
    }

    #[test]
    fn test_bundled_assets_parse() {
        let priority = crate::config::PriorityNames::default();
        let vocab =
            Vocabulary::from_json_str(include_str!("../../config/assets/chi_sim.json")).unwrap();
        assert_eq!(vocab.category_of(&priority.reinforce), Some(Category::Area));
        assert_eq!(vocab.category_of(&priority.resupply), Some(Category::Area));
        assert!(vocab
            .entries()
            .iter()
            .all(|e| !Direction::parse_command(&e.command).is_empty()));

        let vocab = Vocabulary::from_json_str(include_str!("../../config/assets/eng.json")).unwrap();
        assert_eq!(vocab.category_of("Reinforce"), Some(Category::Area));
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("chi_sim.json");
        fs::write(&path, SAMPLE).unwrap();
        assert_eq!(Vocabulary::load(&path).unwrap().len(), 8);
    }
}
