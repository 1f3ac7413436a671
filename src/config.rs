//! Data directory and listen-address resolution
//!
//! Resolution priority:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. OS-dependent compiled default (fallback)

use std::path::PathBuf;

pub const DATA_DIR_ENV: &str = "PLATEWATCH_DATA";
pub const PORT_ENV: &str = "PLATEWATCH_PORT";
pub const DEFAULT_PORT: u16 = 5790;

/// Resolve the data directory holding the SQLite database.
pub fn resolve_data_dir(cli_arg: Option<&str>) -> PathBuf {
    if let Some(path) = cli_arg {
        return PathBuf::from(path);
    }

    if let Ok(path) = std::env::var(DATA_DIR_ENV) {
        return PathBuf::from(path);
    }

    default_data_dir()
}

/// OS-dependent default data directory.
fn default_data_dir() -> PathBuf {
    if cfg!(target_os = "linux") {
        dirs::data_local_dir()
            .map(|d| d.join("platewatch"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/platewatch"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("platewatch"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/platewatch"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("platewatch"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\platewatch"))
    } else {
        PathBuf::from("./platewatch_data")
    }
}

/// Database file path inside the data directory.
pub fn database_path(data_dir: &std::path::Path) -> PathBuf {
    data_dir.join("platewatch.db")
}

/// Listen port, from environment or the compiled default.
pub fn resolve_port() -> u16 {
    std::env::var(PORT_ENV)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_PORT)
}
