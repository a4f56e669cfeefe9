// src/core/paths.rs

use crate::constants::{APP_DIR_NAME, STORE_FILE_EXTENSION};
use lazy_static::lazy_static;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use thiserror::Error;

lazy_static! {
    static ref TIERDB_CONFIG_DIR: Mutex<Option<PathBuf>> = Mutex::new(None);
}

#[derive(Error, Debug)]
pub enum PathsError {
    #[error("Could not find system config directory.")]
    ConfigDirNotFound,
    #[error("Could not create config directory at '{path}': {source}")]
    ConfigDirCreation {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to expand path '{path}': {reason}")]
    Expansion { path: String, reason: String },
}

/// Returns the tierdb configuration directory (`~/.config/tierdb` on Linux),
/// creating it if needed.
///
/// Memoized: only the first call touches the filesystem.
pub fn get_config_dir() -> Result<PathBuf, PathsError> {
    // A poisoned lock only means another thread panicked mid-lookup; the
    // cached value is still either unset or a complete path.
    let mut cached = TIERDB_CONFIG_DIR
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());

    if let Some(path) = &*cached {
        return Ok(path.clone());
    }

    let config_path = dirs::config_dir()
        .ok_or(PathsError::ConfigDirNotFound)?
        .join(APP_DIR_NAME);

    if !config_path.exists() {
        fs::create_dir_all(&config_path).map_err(|e| PathsError::ConfigDirCreation {
            path: config_path.display().to_string(),
            source: e,
        })?;
    }

    *cached = Some(config_path.clone());
    Ok(config_path)
}

/// Path of the store file for a namespace, e.g. `~/.config/tierdb/MyAddon.bin`.
pub fn get_store_path(namespace: &str) -> Result<PathBuf, PathsError> {
    get_config_dir().map(|dir| dir.join(format!("{}.{}", namespace, STORE_FILE_EXTENSION)))
}

/// Expands `~` and environment variables (`$VAR`, `${VAR}`) in a user supplied path.
pub fn expand_user_path(raw: &str) -> Result<PathBuf, PathsError> {
    let expanded = shellexpand::full(raw).map_err(|e| PathsError::Expansion {
        path: raw.to_string(),
        reason: e.to_string(),
    })?;
    Ok(PathBuf::from(expanded.into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_user_path_resolves_home() {
        let Some(home) = dirs::home_dir() else {
            return;
        };
        let expanded = expand_user_path("~/store.bin").unwrap();
        assert_eq!(expanded, home.join("store.bin"));
    }

    #[test]
    fn test_expand_user_path_reports_unknown_vars() {
        let result = expand_user_path("$TIERDB_SURELY_UNSET_VARIABLE/x");
        assert!(matches!(result, Err(PathsError::Expansion { .. })));
    }

    #[test]
    fn test_plain_paths_pass_through() {
        assert_eq!(
            expand_user_path("relative/store.bin").unwrap(),
            PathBuf::from("relative/store.bin")
        );
    }
}
