//! Platform paths
//!
//! Resolves where the shell keeps its configuration and saved credentials.

use std::path::PathBuf;

/// Get the user's home directory in a cross-platform way.
pub fn home_dir() -> Option<PathBuf> {
    dirs_next::home_dir()
}

/// Get the ha-shell config directory.
///
/// Returns `~/.ha-shell` on every platform. Hosts with a sandboxed data
/// directory (Android, iOS) pass their own path to the store and config
/// loaders instead.
pub fn config_dir() -> PathBuf {
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".ha-shell")
}

/// Path of the JSON config file
pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

/// Path of the persisted key-value store
pub fn store_path() -> PathBuf {
    config_dir().join("store.json")
}
