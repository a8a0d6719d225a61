// Configuration loading

pub mod ai;
pub mod settings;

/// Directory holding settings.json and the TUI log file.
pub fn config_dir() -> std::path::PathBuf {
    settings::Settings::config_path()
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| std::path::PathBuf::from("."))
}
