mod config;
mod memory;
mod repository;
mod seed;
pub mod sqlite;

pub use config::{Config, EngineConfig};
pub use memory::InMemoryRoutineRepository;
pub use repository::RoutineRepository;
pub use seed::{seed_defaults, DEFAULT_ROUTINES};
pub use sqlite::SqliteRoutineRepository;

use std::path::PathBuf;

use crate::error::{Result, StorageError};

/// Returns `~/.config/habitizer[-dev]/` based on HABITIZER_ENV.
///
/// Set HABITIZER_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("HABITIZER_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("habitizer-dev")
    } else {
        base_dir.join("habitizer")
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| StorageError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
