use std::path::PathBuf;
use std::sync::OnceLock;

static EXE_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Returns the directory containing the executable.
pub fn get_exe_dir() -> &'static PathBuf {
    EXE_DIR.get_or_init(|| {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."))
    })
}

/// Returns the logs directory: `<exe_dir>/logs/`
pub fn get_logs_dir() -> PathBuf {
    get_exe_dir().join("logs")
}

/// Returns the main config file: `<exe_dir>/config.json`
pub fn get_config_path() -> PathBuf {
    get_exe_dir().join("config.json")
}

/// Returns the vocabulary directory: `<exe_dir>/config/assets/`
pub fn get_assets_dir() -> PathBuf {
    get_exe_dir().join("config").join("assets")
}

/// Returns the vocabulary file for an OCR language, e.g. `<exe_dir>/config/assets/chi_sim.json`
pub fn get_assets_path(language: &str) -> PathBuf {
    get_assets_dir().join(format!("{}.json", language))
}

/// Ensures all output directories exist. Call at startup.
pub fn ensure_directories() -> std::io::Result<()> {
    std::fs::create_dir_all(get_logs_dir())?;
    std::fs::create_dir_all(get_assets_dir())?;
    Ok(())
}
