//! Configuration types for the recognition pipeline.
//!
//! Loads settings from config.json at startup. Provides slot keys, capture
//! geometry, recognition thresholds, and playback timing.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

use crate::binding::SlotId;
use crate::capture::CaptureLayout;

/// Global configuration instance, initialized once at startup.
static CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// Physical key a slot is bound to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PhysicalKey {
    /// Numpad digit 0-9
    Numpad(u8),
    /// Numpad decimal point
    NumpadDecimal,
}

impl PhysicalKey {
    /// Parses the key notation used in config.json ("0".."9" or ".").
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "." => Some(PhysicalKey::NumpadDecimal),
            t if t.len() == 1 => t
                .chars()
                .next()
                .and_then(|c| c.to_digit(10))
                .map(|d| PhysicalKey::Numpad(d as u8)),
            _ => None,
        }
    }
}

impl std::fmt::Display for PhysicalKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PhysicalKey::Numpad(d) => write!(f, "{}", d),
            PhysicalKey::NumpadDecimal => write!(f, "."),
        }
    }
}

/// Slot name → physical key, using the field names of the Vanilla config file.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct KeyConfig {
    pub reinforce: String,
    pub supply: String,
    pub map1: String,
    pub map2: String,
    pub map3: String,
    pub player1: String,
    pub player2: String,
    pub player3: String,
    pub player4: String,
    pub player5: String,
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self {
            reinforce: "0".to_string(),
            supply: ".".to_string(),
            map1: "7".to_string(),
            map2: "8".to_string(),
            map3: "9".to_string(),
            player1: "1".to_string(),
            player2: "2".to_string(),
            player3: "3".to_string(),
            player4: "4".to_string(),
            player5: "5".to_string(),
        }
    }
}

impl KeyConfig {
    /// Raw key notation configured for a slot.
    pub fn key_for(&self, slot: SlotId) -> &str {
        match slot {
            SlotId::Reinforce => &self.reinforce,
            SlotId::Resupply => &self.supply,
            SlotId::Area1 => &self.map1,
            SlotId::Area2 => &self.map2,
            SlotId::Area3 => &self.map3,
            SlotId::Role1 => &self.player1,
            SlotId::Role2 => &self.player2,
            SlotId::Role3 => &self.player3,
            SlotId::Role4 => &self.player4,
            SlotId::Role5 => &self.player5,
        }
    }

    /// Parsed physical key for a slot.
    pub fn physical_key(&self, slot: SlotId) -> Option<PhysicalKey> {
        PhysicalKey::parse(self.key_for(slot))
    }

    /// Reverse lookup used by the hotkey dispatcher.
    pub fn slot_for(&self, key: PhysicalKey) -> Option<SlotId> {
        SlotId::ALL
            .into_iter()
            .find(|&slot| self.physical_key(slot) == Some(key))
    }

    /// Every slot must map to a distinct, parseable key.
    pub fn validate(&self) -> Result<()> {
        let mut seen: Vec<PhysicalKey> = Vec::with_capacity(SlotId::ALL.len());
        for slot in SlotId::ALL {
            let key = self.physical_key(slot).ok_or_else(|| {
                anyhow!("Slot {} has unsupported key {:?}", slot, self.key_for(slot))
            })?;
            if seen.contains(&key) {
                return Err(anyhow!("Key {} is bound to more than one slot", key));
            }
            seen.push(key);
        }
        Ok(())
    }
}

/// The two area items that always get their dedicated slots.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PriorityNames {
    pub reinforce: String,
    pub resupply: String,
}

impl Default for PriorityNames {
    fn default() -> Self {
        Self {
            reinforce: "增援".to_string(),
            resupply: "重新补给".to_string(),
        }
    }
}

/// Image normalization and OCR filtering parameters.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct OcrConfig {
    /// Word tokens at or below this confidence (0-100) are discarded
    #[serde(default = "default_confidence_cutoff")]
    pub confidence_cutoff: f32,
    /// Contrast enhancement factor (1.0 = unchanged)
    #[serde(default = "default_contrast_factor")]
    pub contrast_factor: f32,
    /// Luminance above this becomes white, everything else black
    #[serde(default = "default_binarize_threshold")]
    pub binarize_threshold: u8,
}

fn default_confidence_cutoff() -> f32 {
    30.0
}

fn default_contrast_factor() -> f32 {
    2.5
}

fn default_binarize_threshold() -> u8 {
    230
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            confidence_cutoff: default_confidence_cutoff(),
            contrast_factor: default_contrast_factor(),
            binarize_threshold: default_binarize_threshold(),
        }
    }
}

/// Delays between the micro-steps of a slot macro (milliseconds).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlaybackTiming {
    /// After pressing the modifier, before the first direction
    pub modifier_lead_ms: u64,
    /// How long each direction key is held
    pub key_hold_ms: u64,
    /// Pause after releasing a direction key
    pub key_gap_ms: u64,
    /// After the last direction, before releasing the modifier
    pub modifier_tail_ms: u64,
}

impl Default for PlaybackTiming {
    fn default() -> Self {
        Self {
            modifier_lead_ms: 30,
            key_hold_ms: 30,
            key_gap_ms: 30,
            modifier_tail_ms: 30,
        }
    }
}

impl PlaybackTiming {
    /// All delays zero. Used by tests.
    #[cfg(test)]
    pub fn immediate() -> Self {
        Self {
            modifier_lead_ms: 0,
            key_hold_ms: 0,
            key_gap_ms: 0,
            modifier_tail_ms: 0,
        }
    }

    pub fn modifier_lead(&self) -> Duration {
        Duration::from_millis(self.modifier_lead_ms)
    }

    pub fn key_hold(&self) -> Duration {
        Duration::from_millis(self.key_hold_ms)
    }

    pub fn key_gap(&self) -> Duration {
        Duration::from_millis(self.key_gap_ms)
    }

    pub fn modifier_tail(&self) -> Duration {
        Duration::from_millis(self.modifier_tail_ms)
    }
}

/// Background pointer re-centering while recognition is active.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PointerConfig {
    pub enabled: bool,
    /// Pointer is only moved when it drifts further than this from the centre
    pub tolerance_px: f64,
    pub interval_ms: u64,
    pub error_backoff_ms: u64,
}

impl Default for PointerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tolerance_px: 50.0,
            interval_ms: 50,
            error_backoff_ms: 500,
        }
    }
}

/// Complete application configuration.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    /// Screen width in pixels; detected from the display when absent
    #[serde(default)]
    pub screen_width: Option<u32>,
    /// Screen height in pixels; detected from the display when absent
    #[serde(default)]
    pub screen_height: Option<u32>,
    #[serde(flatten)]
    pub keys: KeyConfig,
    /// Tesseract language, also selects the vocabulary file
    #[serde(default = "default_ocr_language")]
    pub ocr_language: String,
    /// Minimum similarity (0.0-1.0) for a recognized text to count as a match
    #[serde(default = "default_match_threshold")]
    pub match_threshold: f64,
    #[serde(default)]
    pub priority: PriorityNames,
    #[serde(default)]
    pub ocr: OcrConfig,
    #[serde(default)]
    pub capture: CaptureLayout,
    #[serde(default)]
    pub playback: PlaybackTiming,
    #[serde(default)]
    pub pointer: PointerConfig,
}

fn default_ocr_language() -> String {
    "chi_sim".to_string()
}

fn default_match_threshold() -> f64 {
    0.3
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            screen_width: None,
            screen_height: None,
            keys: KeyConfig::default(),
            ocr_language: default_ocr_language(),
            match_threshold: default_match_threshold(),
            priority: PriorityNames::default(),
            ocr: OcrConfig::default(),
            capture: CaptureLayout::default(),
            playback: PlaybackTiming::default(),
            pointer: PointerConfig::default(),
        }
    }
}

impl AppConfig {
    /// Checks cross-field constraints and clamps thresholds into range.
    pub fn validated(mut self) -> Result<Self> {
        self.keys.validate()?;
        self.capture.validate()?;
        self.match_threshold = self.match_threshold.clamp(0.0, 1.0);
        self.ocr.confidence_cutoff = self.ocr.confidence_cutoff.clamp(0.0, 100.0);
        Ok(self)
    }

    /// Screen size from config, if both dimensions are set.
    pub fn configured_screen(&self) -> Option<(u32, u32)> {
        match (self.screen_width, self.screen_height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => Some((w, h)),
            _ => None,
        }
    }
}

/// Parses and validates a config document.
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    let config: AppConfig =
        serde_json::from_str(contents).context("config.json is not valid")?;
    config.validated()
}

/// Writes a config file as pretty JSON.
pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(config)?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Loads configuration from the given path or returns defaults.
///
/// A missing file is created with default values so it can be edited.
pub fn load_config_from(config_path: &Path) -> AppConfig {
    crate::log(&format!("Looking for config at: {}", config_path.display()));

    if config_path.exists() {
        match fs::read_to_string(config_path) {
            Ok(contents) => match parse_config(&contents) {
                Ok(config) => {
                    crate::log("Config loaded from config.json");
                    return config;
                }
                Err(e) => {
                    crate::log(&format!(
                        "Failed to parse config.json: {:#}. Using defaults.",
                        e
                    ));
                }
            },
            Err(e) => {
                crate::log(&format!(
                    "Failed to read config.json: {}. Using defaults.",
                    e
                ));
            }
        }
    } else {
        crate::log("config.json not found. Writing default config.");
        if let Err(e) = save_config(&AppConfig::default(), config_path) {
            crate::log(&format!("{:#}", e));
        }
    }

    AppConfig::default()
}

/// Initializes the global configuration. Call once at startup.
pub fn init_config() {
    let _ = CONFIG.set(load_config_from(&crate::paths::get_config_path()));
}

/// Returns a reference to the global configuration.
/// Panics if called before init_config().
pub fn get_config() -> &'static AppConfig {
    CONFIG
        .get()
        .expect("Config not initialized. Call init_config() first.")
}
