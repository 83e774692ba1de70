use anyhow::{anyhow, Context, Result};
use image::GrayImage;
use std::path::PathBuf;
use std::process::Command;
use tempfile::NamedTempFile;

use super::setup::TesseractPaths;

/// A single word from OCR with its confidence (0-100, -1 when unknown)
#[derive(Debug, Clone, PartialEq)]
pub struct OcrWord {
    pub text: String,
    pub confidence: f32,
}

/// One engine configuration of the multi-pass recognizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassConfig {
    pub name: &'static str,
    /// Tesseract page segmentation mode
    pub psm: u8,
}

/// Text recognition backend.
pub trait TextEngine: Send + Sync {
    /// Word-level tokens with confidences, in reading order.
    fn recognize_words(&self, img: &GrayImage, pass: &PassConfig) -> Result<Vec<OcrWord>>;

    /// Unfiltered whole-image text.
    fn recognize_text(&self, img: &GrayImage) -> Result<String>;
}

/// Runs the Tesseract command line tool.
#[derive(Debug, Clone)]
pub struct TesseractCli {
    executable: PathBuf,
    tessdata: PathBuf,
    language: String,
}

impl TesseractCli {
    pub fn new(paths: TesseractPaths, language: &str) -> Self {
        Self {
            executable: paths.executable,
            tessdata: paths.tessdata,
            language: language.to_string(),
        }
    }

    fn base_command(&self, input: &std::path::Path, output: &str) -> Command {
        let mut cmd = Command::new(&self.executable);
        cmd.arg(input)
            .arg(output)
            .arg("--tessdata-dir")
            .arg(&self.tessdata)
            .arg("-l")
            .arg(&self.language);
        hide_console(&mut cmd);
        cmd
    }
}

impl TextEngine for TesseractCli {
    fn recognize_words(&self, img: &GrayImage, pass: &PassConfig) -> Result<Vec<OcrWord>> {
        // Save image to temporary file
        let temp_input = NamedTempFile::with_suffix(".png")?;
        img.save(temp_input.path())?;

        // Tesseract appends .tsv to the output base
        let temp_output = NamedTempFile::new()?;
        let output_base = temp_output.path().to_string_lossy().to_string();

        let output = self
            .base_command(temp_input.path(), &output_base)
            .arg("--oem")
            .arg("3")
            .arg("--psm")
            .arg(pass.psm.to_string())
            .arg("tsv")
            .output()
            .with_context(|| format!("Failed to run {}", self.executable.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("Tesseract ({}) failed: {}", pass.name, stderr.trim()));
        }

        let tsv_path = format!("{}.tsv", output_base);
        let tsv_content = std::fs::read_to_string(&tsv_path)
            .map_err(|e| anyhow!("Failed to read Tesseract output: {}", e))?;
        let _ = std::fs::remove_file(&tsv_path);

        Ok(parse_tsv_words(&tsv_content))
    }

    fn recognize_text(&self, img: &GrayImage) -> Result<String> {
        let temp_input = NamedTempFile::with_suffix(".png")?;
        img.save(temp_input.path())?;

        let output = self
            .base_command(temp_input.path(), "stdout")
            .output()
            .with_context(|| format!("Failed to run {}", self.executable.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("Tesseract failed: {}", stderr.trim()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

#[cfg(windows)]
fn hide_console(cmd: &mut Command) {
    use std::os::windows::process::CommandExt;
    const CREATE_NO_WINDOW: u32 = 0x0800_0000;
    cmd.creation_flags(CREATE_NO_WINDOW);
}

#[cfg(not(windows))]
fn hide_console(_cmd: &mut Command) {}

/// Parses word rows (level 5) out of Tesseract TSV output.
fn parse_tsv_words(tsv: &str) -> Vec<OcrWord> {
    let mut words = Vec::new();

    // Skip header
    for line in tsv.lines().skip(1) {
        // level, page_num, block_num, par_num, line_num, word_num,
        // left, top, width, height, conf, text
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 12 {
            continue;
        }

        let level: i32 = fields[0].parse().unwrap_or(-1);
        if level != 5 {
            continue;
        }

        let text = fields[11].trim();
        if text.is_empty() {
            continue;
        }

        words.push(OcrWord {
            text: text.to_string(),
            confidence: fields[10].trim().parse().unwrap_or(-1.0),
        });
    }

    words
}
