//! Centralized path resolution for the bullion fetcher
//!
//! All file and directory paths are resolved through this module so the CLI,
//! the debug tools and the default file-backed cache agree on locations.
//!
//! ## Path Strategy
//!
//! The base directory follows platform standards unless
//! `BULLION_FETCHER_HOME` is set:
//! - **macOS**: `~/Library/Application Support/BullionFetcher/`
//! - **Windows**: `%LOCALAPPDATA%\BullionFetcher\`
//! - **Linux**: `$XDG_DATA_HOME/BullionFetcher/` (fallback `~/.local/share/BullionFetcher/`)
//!
//! ## Directory Structure
//!
//! ```text
//! BullionFetcher/
//! ├── data/
//! │ ├── config.toml
//! │ └── bullion_prices_v1.json (price cache store)
//! └── logs/
//!   └── bullion_fetcher_*.log
//! ```

use once_cell::sync::Lazy;
use std::path::PathBuf;

/// Environment variable overriding the base directory
pub const HOME_ENV_VAR: &str = "BULLION_FETCHER_HOME";

const APP_DIR: &str = "BullionFetcher";

/// Lazy-initialized base directory (thread-safe)
static BASE_DIRECTORY: Lazy<PathBuf> = Lazy::new(resolve_base_directory);

fn resolve_base_directory() -> PathBuf {
  if let Some(dir) = std::env::var_os(HOME_ENV_VAR).filter(|v| !v.is_empty()) {
    return PathBuf::from(dir);
  }

  if let Some(dir) = dirs::data_local_dir() {
    return dir.join(APP_DIR);
  }

  if let Some(dir) = dirs::data_dir() {
    return dir.join(APP_DIR);
  }

  if let Some(home) = dirs::home_dir() {
    return home.join(APP_DIR);
  }

  PathBuf::from(APP_DIR)
}

// =============================================================================
// DIRECTORY ACCESSORS
// =============================================================================

/// Returns the base directory for all fetcher data
pub fn get_base_directory() -> PathBuf {
  BASE_DIRECTORY.clone()
}

/// Returns the data directory path
///
/// Contains the config file and the persisted price cache.
pub fn get_data_directory() -> PathBuf {
  BASE_DIRECTORY.join("data")
}

/// Returns the logs directory path
pub fn get_logs_directory() -> PathBuf {
  BASE_DIRECTORY.join("logs")
}

// =============================================================================
// FILE PATHS
// =============================================================================

/// Returns the main configuration file path
pub fn get_config_path() -> PathBuf {
  get_data_directory().join("config.toml")
}

/// Returns the file a `FileStore` rooted at the data directory uses for `key`
pub fn get_store_file_path(key: &str) -> PathBuf {
  get_data_directory().join(format!("{}.json", key))
}

// =============================================================================
// DIRECTORY CREATION
// =============================================================================

/// Ensures all required directories exist
///
/// Called by the CLI before the logger opens its file.
pub fn ensure_all_directories() -> Result<(), String> {
  let dirs_to_create = vec![
    ("base", get_base_directory()),
    ("data", get_data_directory()),
    ("logs", get_logs_directory()),
  ];

  for (name, dir) in dirs_to_create {
    if !dir.exists() {
      std::fs::create_dir_all(&dir).map_err(|e| {
        format!(
          "Failed to create {} directory at {}: {}",
          name,
          dir.display(),
          e
        )
      })?;
    }
  }

  Ok(())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_base_directory_not_empty() {
    let base = get_base_directory();
    assert!(!base.as_os_str().is_empty());
  }

  #[test]
  fn test_data_and_logs_are_subdirs() {
    let base = get_base_directory();
    assert!(get_data_directory().starts_with(&base));
    assert!(get_logs_directory().starts_with(&base));
  }

  #[test]
  fn test_config_path_in_data_dir() {
    let config = get_config_path();
    assert!(config.starts_with(get_data_directory()));
    assert_eq!(config.file_name().unwrap(), "config.toml");
  }

  #[test]
  fn test_store_file_path_uses_key() {
    let path = get_store_file_path("bullion_prices_v1");
    assert!(path.starts_with(get_data_directory()));
    assert_eq!(path.file_name().unwrap(), "bullion_prices_v1.json");
  }
}
