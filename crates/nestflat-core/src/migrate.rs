//! Entry point tying the schema pass, content pass and cleanup together.

use std::collections::BTreeMap;

use nestflat_model::{
    BlockTypeId, FieldId, FieldType, MigrationOptions, MigrationOutcome, MigrationReport,
};
use tracing::{error, info, info_span};

use crate::cleanup::CleanupService;
use crate::content::ContentMigrator;
use crate::error::{MigrationError, Result};
use crate::flatten::SchemaFlattener;
use crate::observer::{MigrationEvent, MigrationObserver, Stage};
use crate::reference_index::ReferenceIndex;
use crate::store::{LabelSource, MigrationStore, RecordQuery};

/// Migrates the hierarchical field `field_id` into a composite field with
/// sub-tables, rewriting its schema and every stored record.
///
/// Returns [`MigrationOutcome::NotHierarchical`] without touching the store
/// when the field has another type. A failed write aborts the run; writes
/// applied before it are not rolled back and the store is left open.
pub fn migrate_field<S>(
    store: &mut S,
    labels: Option<&dyn LabelSource>,
    field_id: FieldId,
    options: MigrationOptions,
    observer: &mut dyn MigrationObserver,
) -> Result<MigrationOutcome>
where
    S: MigrationStore + ?Sized,
{
    let span = info_span!("migrate_field", field_id = %field_id);
    let _guard = span.enter();
    let result = run(store, labels, field_id, options, observer);
    if let Err(error) = &result {
        error!(field_id = %field_id, error = %error, "migration aborted");
    }
    result
}

fn run<S>(
    store: &mut S,
    labels: Option<&dyn LabelSource>,
    field_id: FieldId,
    options: MigrationOptions,
    observer: &mut dyn MigrationObserver,
) -> Result<MigrationOutcome>
where
    S: MigrationStore + ?Sized,
{
    let source = store
        .field_by_id(field_id)?
        .ok_or(MigrationError::DefinitionNotFound { field_id })?;
    if source.field_type != FieldType::Hierarchical {
        info!(
            field_id = %field_id,
            field_type = %source.field_type,
            "field is not hierarchical, nothing to migrate"
        );
        return Ok(MigrationOutcome::NotHierarchical {
            field_type: source.field_type,
        });
    }

    // Schema
    observer.on_event(&MigrationEvent::StageStarted(Stage::Schema));
    let flattened = SchemaFlattener::new(&source, labels).flatten()?;
    let sub_table_fields = flattened.sub_table_count();
    let source_ids: BTreeMap<String, BlockTypeId> = source
        .block_types
        .iter()
        .filter_map(|block| Some((block.handle.clone(), block.id.persisted()?)))
        .collect();
    let saved = store
        .save_field(flattened.field)
        .map_err(MigrationError::persistence("save flattened field"))?;
    info!(
        field = %saved.handle,
        block_types = saved.block_types.len(),
        sub_table_fields,
        "schema flattened"
    );
    let mut index = ReferenceIndex::build(&source_ids, &saved.block_types)?;

    // Content
    observer.on_event(&MigrationEvent::StageStarted(Stage::Content));
    let stats =
        ContentMigrator::new(store, &mut index, &flattened.paths).run(field_id, observer)?;
    info!(
        roots = stats.roots_processed,
        rows = stats.rows_written,
        locale_merges = stats.locale_merges,
        "content migrated"
    );

    let mut report = MigrationReport {
        field_id: saved.id.persisted(),
        field_handle: saved.handle.clone(),
        block_types_created: saved.block_types.len(),
        sub_table_fields,
        roots_processed: stats.roots_processed,
        locale_merges: stats.locale_merges,
        rows_written: stats.rows_written,
        ..MigrationReport::default()
    };

    if options.clean_unused_fields {
        observer.on_event(&MigrationEvent::StageStarted(Stage::Cleanup));
        let cleanup = CleanupService::new(store).run(&index);
        report.fields_removed = cleanup.fields_removed;
        report.block_types_removed = cleanup.block_types_removed;
    }

    if options.delete_source_records {
        observer.on_event(&MigrationEvent::StageStarted(Stage::DeleteSource));
        let ids: Vec<_> = store
            .query_records(&RecordQuery::all(field_id, None))?
            .into_iter()
            .map(|record| record.id)
            .collect();
        report.source_records_deleted = store
            .delete_records_by_ids(&ids)
            .map_err(MigrationError::persistence("delete source records"))?;
        info!(deleted = report.source_records_deleted, "source records deleted");
    }

    store.close();
    Ok(MigrationOutcome::Migrated(report))
}
