//! Store configuration.
//!
//! # Responsibility
//! - Resolve where the backing JSON file lives.
//!
//! # Invariants
//! - An unset or empty `ROOST_STORE_PATH` falls back to `file.json`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding the backing file location.
pub const STORE_PATH_ENV: &str = "ROOST_STORE_PATH";
/// Backing file used when nothing else is configured.
pub const DEFAULT_STORE_FILE: &str = "file.json";

/// Backing file settings for a `Store`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// JSON file holding every persisted entity.
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_STORE_FILE),
        }
    }
}

impl StoreConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Reads `ROOST_STORE_PATH`, falling back to the default file.
    pub fn from_env() -> Self {
        match std::env::var_os(STORE_PATH_ENV) {
            Some(path) if !path.is_empty() => Self::new(path),
            _ => Self::default(),
        }
    }

    /// Parses a JSON config document. Missing keys take default values.
    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
