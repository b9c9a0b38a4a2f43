//! JSON snapshot files of a [`MemoryStore`].
//!
//! A snapshot is one JSON object: a `version` number next to the store's
//! locales, fields, source records, flat records and rows. Saving writes a
//! temp file first and renames it over the target.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Result, StoreFileError};
use crate::memory::MemoryStore;

/// Newest snapshot format this crate reads and the one it writes.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Deserialize)]
struct SnapshotHeader {
    version: u32,
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    version: u32,
    #[serde(flatten)]
    store: &'a MemoryStore,
}

/// Loads a store from a snapshot file.
pub fn load_snapshot(path: &Path) -> Result<MemoryStore> {
    let bytes = fs::read(path).map_err(|e| StoreFileError::Io {
        operation: "read",
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_snapshot(&bytes, path)
}

fn parse_snapshot(bytes: &[u8], path: &Path) -> Result<MemoryStore> {
    let header: SnapshotHeader =
        serde_json::from_slice(bytes).map_err(|e| StoreFileError::InvalidFormat {
            path: path.to_path_buf(),
            source: e,
        })?;
    if header.version > SNAPSHOT_VERSION {
        return Err(StoreFileError::UnsupportedVersion {
            found: header.version,
            max_supported: SNAPSHOT_VERSION,
            path: path.to_path_buf(),
        });
    }

    let mut store: MemoryStore =
        serde_json::from_slice(bytes).map_err(|e| StoreFileError::InvalidFormat {
            path: path.to_path_buf(),
            source: e,
        })?;
    store.reserve_known_ids();
    info!(
        path = %path.display(),
        fields = store.fields().len(),
        records = store.source_records().len(),
        "loaded snapshot"
    );
    Ok(store)
}

/// Writes `store` to `path` as a pretty-printed snapshot.
pub fn save_snapshot(store: &MemoryStore, path: &Path) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(&SnapshotRef {
        version: SNAPSHOT_VERSION,
        store,
    })
    .map_err(|e| StoreFileError::Serialization { source: e })?;

    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| StoreFileError::Io {
            operation: "create directory",
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    let temp_path = path.with_extension("json.tmp");
    let mut file = File::create(&temp_path).map_err(|e| StoreFileError::Io {
        operation: "create",
        path: temp_path.clone(),
        source: e,
    })?;
    file.write_all(&bytes).map_err(|e| StoreFileError::Io {
        operation: "write",
        path: temp_path.clone(),
        source: e,
    })?;
    file.sync_all().map_err(|e| StoreFileError::Io {
        operation: "sync",
        path: temp_path.clone(),
        source: e,
    })?;

    fs::rename(&temp_path, path).map_err(|e| StoreFileError::AtomicWriteFailed {
        temp_path: temp_path.clone(),
        target_path: path.to_path_buf(),
        source: e,
    })?;

    info!(path = %path.display(), "saved snapshot");
    Ok(())
}
