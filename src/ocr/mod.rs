pub mod engine;
pub mod preprocess;
pub mod recognizer;
pub mod setup;

pub use engine::{OcrWord, PassConfig, TesseractCli, TextEngine};
pub use preprocess::normalize;
pub use recognizer::MultiPassRecognizer;
pub use setup::ensure_tesseract;

use anyhow::Result;

/// Locates Tesseract and the language data, returning a ready engine.
pub fn tesseract_engine(language: &str) -> Result<TesseractCli> {
    let paths = ensure_tesseract(language)?;
    Ok(TesseractCli::new(paths, language))
}
