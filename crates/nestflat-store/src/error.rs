//! Snapshot file error types.

use std::path::PathBuf;
use thiserror::Error;

/// Snapshot load/save error.
#[derive(Debug, Error)]
pub enum StoreFileError {
    /// File I/O error.
    #[error("failed to {operation} file: {path}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not a snapshot or its content is malformed.
    #[error("invalid snapshot {path}: {source}")]
    InvalidFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("snapshot version {found} is not supported (maximum: {max_supported})")]
    UnsupportedVersion {
        found: u32,
        max_supported: u32,
        path: PathBuf,
    },

    #[error("failed to serialize snapshot")]
    Serialization {
        #[source]
        source: serde_json::Error,
    },

    /// Temp file couldn't be renamed over the target.
    #[error("failed to complete save to {target_path}")]
    AtomicWriteFailed {
        temp_path: PathBuf,
        target_path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, StoreFileError>;
