mod config;
pub mod week_store;

pub use config::{
    Config, DirectoryConfig, ExportConfig, LogConfig, RemoteConfig, StorageConfig, TimerConfig,
};
pub use week_store::{
    load_or_create, JsonFileStore, MemoryStore, StoredWeek, SubmissionReceipt, WeekStore,
};

use std::path::PathBuf;

/// Returns the data directory, creating it if needed.
///
/// `TIMESHEET_HOME` wins when set. Otherwise `~/.config/timesheet[-dev]/`,
/// with `TIMESHEET_ENV=dev` selecting the development directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let dir = match std::env::var_os("TIMESHEET_HOME") {
        Some(home) if !home.is_empty() => PathBuf::from(home),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("TIMESHEET_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("timesheet-dev")
            } else {
                base_dir.join("timesheet")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
