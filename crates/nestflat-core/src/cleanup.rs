//! Removal of generated fields that never received content.

use nestflat_model::{BlockTypeId, RemovedField};
use tracing::{debug, info, warn};

use crate::reference_index::ReferenceIndex;
use crate::store::FieldStore;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub fields_removed: Vec<RemovedField>,
    pub block_types_removed: Vec<BlockTypeId>,
    /// Store calls that failed and were skipped.
    pub failures: usize,
}

/// Deletes every field still marked unused in the index, then every
/// destination block type left without fields.
///
/// Best effort: a failing store call is logged and skipped, never returned.
pub struct CleanupService<'a, S: ?Sized> {
    store: &'a mut S,
}

impl<'a, S: FieldStore + ?Sized> CleanupService<'a, S> {
    pub fn new(store: &'a mut S) -> Self {
        Self { store }
    }

    pub fn run(self, index: &ReferenceIndex) -> CleanupReport {
        let mut report = CleanupReport::default();
        for (&block_type_id, handles) in index.unused() {
            for handle in handles {
                if let Err(error) = self.store.delete_block_type_field(block_type_id, handle) {
                    warn!(
                        block_type_id = %block_type_id,
                        handle = %handle,
                        error = %error,
                        "failed to delete unused field"
                    );
                    report.failures += 1;
                    continue;
                }
                let is_sub_table = index
                    .field(block_type_id, handle)
                    .is_some_and(|field| field.is_sub_table());
                if is_sub_table
                    && let Err(error) = self.store.drop_sub_table_storage(block_type_id, handle)
                {
                    warn!(
                        block_type_id = %block_type_id,
                        handle = %handle,
                        error = %error,
                        "failed to drop sub-table storage"
                    );
                    report.failures += 1;
                }
                debug!(block_type_id = %block_type_id, handle = %handle, "removed unused field");
                report.fields_removed.push(RemovedField {
                    block_type_id,
                    handle: handle.clone(),
                });
            }

            match self.store.block_type_field_count(block_type_id) {
                Ok(0) => match self.store.delete_block_type(block_type_id) {
                    Ok(()) => report.block_types_removed.push(block_type_id),
                    Err(error) => {
                        warn!(
                            block_type_id = %block_type_id,
                            error = %error,
                            "failed to delete empty block type"
                        );
                        report.failures += 1;
                    }
                },
                Ok(_) => {}
                Err(error) => {
                    warn!(
                        block_type_id = %block_type_id,
                        error = %error,
                        "failed to count block type fields"
                    );
                    report.failures += 1;
                }
            }
        }
        info!(
            fields_removed = report.fields_removed.len(),
            block_types_removed = report.block_types_removed.len(),
            failures = report.failures,
            "cleanup finished"
        );
        report
    }
}
