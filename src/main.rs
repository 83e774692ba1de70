//! Helldiver Auto Assets
//!
//! A Windows tray tool that reads the item list shown while the modifier key
//! is held, matches each entry against a known vocabulary and binds the
//! matches to numpad keys. Pressing a bound key plays the item's direction
//! sequence.

// Hide console window on Windows
#![windows_subsystem = "windows"]
// Outside Windows the core is only reached from tests
#![cfg_attr(not(windows), allow(dead_code))]

#[cfg(windows)]
mod app;
mod binding;
mod capture;
mod config;
mod input;
mod ocr;
mod paths;
mod pipeline;
mod playback;
mod vocab;

use anyhow::Result;
use chrono::Local;
use std::fs::OpenOptions;
use std::io::Write;

use crate::config::AppConfig;
use crate::vocab::Vocabulary;

const LOG_FILE: &str = "autoassets.log";

/// Logs a message to both console and log file with timestamp.
pub fn log(msg: &str) {
    let timestamp = Local::now().format("%H:%M:%S%.3f");
    let line = format!("[{}] {}\n", timestamp, msg);
    print!("{}", line);
    let log_path = paths::get_logs_dir().join(LOG_FILE);
    if let Ok(mut file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        let _ = file.write_all(line.as_bytes());
    }
}

fn install_panic_hook() {
    std::panic::set_hook(Box::new(|panic_info| {
        let msg = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        let location = if let Some(loc) = panic_info.location() {
            format!(" at {}:{}:{}", loc.file(), loc.line(), loc.column())
        } else {
            String::new()
        };
        let log_msg = format!("[PANIC]{} {}\n", location, msg);
        eprintln!("{}", log_msg);
        let log_path = paths::get_logs_dir().join(LOG_FILE);
        if let Ok(mut file) = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
        {
            let _ = file.write_all(log_msg.as_bytes());
        }
    }));
}

fn main() -> Result<()> {
    install_panic_hook();

    // Ensure output directories exist
    paths::ensure_directories()?;

    config::init_config();
    let config = config::get_config();
    log(&format!("OCR language: {}", config.ocr_language));

    let vocabulary = Vocabulary::load_or_empty(&paths::get_assets_path(&config.ocr_language));
    if vocabulary.is_empty() {
        log("Vocabulary is empty; recognition will fail until an assets file is provided");
    }

    run(config, vocabulary)
}

#[cfg(windows)]
fn run(config: &'static AppConfig, vocabulary: Vocabulary) -> Result<()> {
    app::run(config, vocabulary)
}

#[cfg(not(windows))]
fn run(_config: &'static AppConfig, _vocabulary: Vocabulary) -> Result<()> {
    log("Screen capture, hotkeys and key injection are only implemented for Windows");
    Err(anyhow::anyhow!("unsupported platform: {}", std::env::consts::OS))
}
