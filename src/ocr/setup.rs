use anyhow::{anyhow, Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::log;

const TESSDATA_REPO: &str = "https://github.com/tesseract-ocr/tessdata/raw/main";

const INSTALL_DIRS: [&str; 2] = [
    r"C:\Program Files\Tesseract-OCR",
    r"C:\Program Files (x86)\Tesseract-OCR",
];

#[derive(Debug, Clone)]
pub struct TesseractPaths {
    pub executable: PathBuf,
    pub tessdata: PathBuf,
}

/// Returns the directory for storing Tesseract files
pub fn get_tesseract_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("helldiver-autoassets")
        .join("tesseract")
}

fn executable_name() -> String {
    format!("tesseract{}", std::env::consts::EXE_SUFFIX)
}

fn traineddata_name(language: &str) -> String {
    format!("{}.traineddata", language)
}

/// Ensures Tesseract and the language data are available.
///
/// The executable must already be installed. Missing language data is
/// downloaded into the local tool directory.
pub fn ensure_tesseract(language: &str) -> Result<TesseractPaths> {
    let executable = find_tesseract_executable()?;
    log(&format!("Tesseract executable: {}", executable.display()));

    let tessdata = match find_tessdata_dir(language) {
        Ok(dir) => dir,
        Err(_) => {
            log(&format!(
                "{} not found locally, downloading...",
                traineddata_name(language)
            ));
            let dir = get_tesseract_dir().join("tessdata");
            fs::create_dir_all(&dir)?;
            download_tessdata(&dir, language)?;
            dir
        }
    };
    log(&format!("Tesseract data ({}): {}", language, tessdata.display()));

    Ok(TesseractPaths {
        executable,
        tessdata,
    })
}

/// Downloads `<language>.traineddata` from the upstream tessdata repository
fn download_tessdata(tessdata_dir: &Path, language: &str) -> Result<()> {
    let file_name = traineddata_name(language);
    let url = format!("{}/{}", TESSDATA_REPO, file_name);
    let target = tessdata_dir.join(&file_name);

    let client = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(300))
        .build()?;

    let response = client
        .get(&url)
        .header("User-Agent", "helldiver-autoassets")
        .send()
        .with_context(|| format!("Failed to request {}", url))?;

    if !response.status().is_success() {
        return Err(anyhow!(
            "Failed to download {}: HTTP {}",
            file_name,
            response.status()
        ));
    }

    let bytes = response.bytes()?;
    // Only complete files get the .traineddata name
    let partial = tessdata_dir.join(format!("{}.part", file_name));
    let mut file = fs::File::create(&partial)?;
    file.write_all(&bytes)?;
    drop(file);
    fs::rename(&partial, &target)?;

    log(&format!("Downloaded {} ({} bytes)", file_name, bytes.len()));

    Ok(())
}

/// Finds the Tesseract executable, checking our local dir first, then system
pub fn find_tesseract_executable() -> Result<PathBuf> {
    let local_exe = get_tesseract_dir().join(executable_name());
    if local_exe.exists() {
        return Ok(local_exe);
    }

    // Check PATH
    if let Ok(output) = std::process::Command::new("tesseract")
        .arg("--version")
        .output()
    {
        if output.status.success() {
            return Ok(PathBuf::from("tesseract"));
        }
    }

    for dir in INSTALL_DIRS {
        let p = Path::new(dir).join(executable_name());
        if p.exists() {
            return Ok(p);
        }
    }

    Err(anyhow!(
        "Tesseract not found. Install Tesseract-OCR (add it to PATH) or copy it to {}",
        get_tesseract_dir().display()
    ))
}

/// Finds a tessdata directory holding data for `language`
pub fn find_tessdata_dir(language: &str) -> Result<PathBuf> {
    let mut candidates = vec![get_tesseract_dir().join("tessdata")];
    candidates.extend(INSTALL_DIRS.iter().map(|d| Path::new(d).join("tessdata")));
    if let Ok(prefix) = std::env::var("TESSDATA_PREFIX") {
        let prefix = PathBuf::from(prefix);
        candidates.push(prefix.join("tessdata"));
        candidates.push(prefix);
    }

    find_tessdata_in(&candidates, language).ok_or_else(|| {
        anyhow!(
            "tessdata directory not found. Please ensure {} is available.",
            traineddata_name(language)
        )
    })
}

/// First candidate directory that contains the language data.
fn find_tessdata_in(candidates: &[PathBuf], language: &str) -> Option<PathBuf> {
    let file_name = traineddata_name(language);
    candidates
        .iter()
        .find(|dir| dir.join(&file_name).is_file())
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_tessdata_picks_first_with_language() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        let c = dir.path().join("c");
        for d in [&a, &b, &c] {
            fs::create_dir_all(d).unwrap();
        }
        fs::write(a.join("eng.traineddata"), b"x").unwrap();
        fs::write(b.join("chi_sim.traineddata"), b"x").unwrap();
        fs::write(c.join("chi_sim.traineddata"), b"x").unwrap();

        let candidates = vec![a.clone(), b.clone(), c];
        assert_eq!(find_tessdata_in(&candidates, "chi_sim"), Some(b));
        assert_eq!(find_tessdata_in(&candidates, "eng"), Some(a));
        assert_eq!(find_tessdata_in(&candidates, "jpn"), None);
    }

    #[test]
    fn test_traineddata_name() {
        assert_eq!(traineddata_name("chi_sim"), "chi_sim.traineddata");
    }
}
