mod config;
pub mod database;
mod store;
pub mod transfer;

pub use config::{Config, LogConfig, SessionConfig};
pub use database::{Database, MemoryBackend, StoreBackend};
pub use store::{HistoryEntry, LevelRecord, Store, Theme, STORE_KEY};

use std::path::PathBuf;

use crate::error::StorageError;

/// Returns the data directory.
///
/// `DOTPRACTICE_HOME` wins when set. Otherwise `~/.config/dotpractice[-dev]/`,
/// with the `-dev` suffix selected by `DOTPRACTICE_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, StorageError> {
    let dir = match std::env::var_os("DOTPRACTICE_HOME") {
        Some(home) if !home.is_empty() => PathBuf::from(home),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("DOTPRACTICE_ENV").unwrap_or_else(|_| "production".to_string());

            if env == "dev" {
                base_dir.join("dotpractice-dev")
            } else {
                base_dir.join("dotpractice")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| StorageError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
