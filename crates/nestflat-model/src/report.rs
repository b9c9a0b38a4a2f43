use serde::{Deserialize, Serialize};

use crate::field::FieldType;
use crate::ids::{BlockTypeId, FieldId};

/// A generated field removed by cleanup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovedField {
    pub block_type_id: BlockTypeId,
    pub handle: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationReport {
    pub field_id: Option<FieldId>,
    pub field_handle: String,
    /// Top-level block types of the destination field.
    pub block_types_created: usize,
    /// Sub-table fields generated across all top-level block types.
    pub sub_table_fields: usize,
    pub roots_processed: usize,
    /// Roots that reused the target record of another locale.
    pub locale_merges: usize,
    pub rows_written: usize,
    pub fields_removed: Vec<RemovedField>,
    pub block_types_removed: Vec<BlockTypeId>,
    pub source_records_deleted: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MigrationOutcome {
    Migrated(MigrationReport),
    /// The field is not hierarchical; nothing was touched.
    NotHierarchical { field_type: FieldType },
}

impl MigrationOutcome {
    pub fn is_migrated(&self) -> bool {
        matches!(self, MigrationOutcome::Migrated(_))
    }

    pub fn report(&self) -> Option<&MigrationReport> {
        match self {
            MigrationOutcome::Migrated(report) => Some(report),
            MigrationOutcome::NotHierarchical { .. } => None,
        }
    }
}
