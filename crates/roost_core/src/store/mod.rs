//! File-backed identity map.
//!
//! # Responsibility
//! - Own every live entity keyed by `"<ClassName>.<id>"`.
//! - Persist the whole map to one JSON file and rebuild it at process start.
//!
//! # Invariants
//! - The store never evicts entries on its own.
//! - `save()` replaces the backing file atomically (temp file + rename).
//! - `reload()` is all-or-nothing; a missing file is a no-op.

use crate::model::record::ModelError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

mod file_store;
mod invoke;

pub use file_store::Store;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug)]
pub enum StoreError {
    Model(ModelError),
    /// The backing file exists but is not a JSON object of entity objects.
    CorruptStore {
        path: PathBuf,
        detail: String,
    },
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    NotFound(String),
}

impl StoreError {
    pub(crate) fn corrupt(path: &Path, detail: impl Into<String>) -> Self {
        Self::CorruptStore {
            path: path.to_path_buf(),
            detail: detail.into(),
        }
    }

    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Model(err) => write!(f, "{err}"),
            Self::CorruptStore { path, detail } => {
                write!(f, "corrupt store file `{}`: {detail}", path.display())
            }
            Self::Io { path, source } => {
                write!(f, "store file `{}` I/O failure: {source}", path.display())
            }
            Self::NotFound(key) => write!(f, "entity not found: {key}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Model(err) => Some(err),
            Self::Io { source, .. } => Some(source),
            Self::CorruptStore { .. } => None,
            Self::NotFound(_) => None,
        }
    }
}

impl From<ModelError> for StoreError {
    fn from(value: ModelError) -> Self {
        Self::Model(value)
    }
}
