//! Reference store for nestflat migrations.
//!
//! [`MemoryStore`] implements the field, content and locale traits of
//! `nestflat-core` over in-memory tables and round-trips through JSON
//! snapshot files.

pub mod error;
pub mod memory;
pub mod snapshot;

pub use error::{Result, StoreFileError};
pub use memory::{
    ContentRow, LabelEntry, LabelTable, MemoryStore, StoredFlatRecord, SubTableStorage,
};
pub use snapshot::{SNAPSHOT_VERSION, load_snapshot, save_snapshot};
