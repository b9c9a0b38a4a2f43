//! Configuration options for a migration run.

use serde::{Deserialize, Serialize};

/// Options controlling what a migration does after the content pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationOptions {
    /// Delete generated fields (and emptied block types) that received no
    /// content during the run.
    pub clean_unused_fields: bool,

    /// Bulk-delete the source records once every root has been migrated.
    ///
    /// Disabling this leaves the source data in place, which keeps a failed
    /// or questionable run inspectable but doubles the stored content.
    pub delete_source_records: bool,
}

impl Default for MigrationOptions {
    fn default() -> Self {
        Self {
            clean_unused_fields: false,
            delete_source_records: true,
        }
    }
}

impl MigrationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_cleanup(mut self, enable: bool) -> Self {
        self.clean_unused_fields = enable;
        self
    }

    #[must_use]
    pub fn with_source_deletion(mut self, enable: bool) -> Self {
        self.delete_source_records = enable;
        self
    }
}
