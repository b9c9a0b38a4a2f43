use std::io::{self, IsTerminal};
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{info, info_span};

use nestflat_core::{LabelSource, Outline, ParentFilter, migrate_field};
use nestflat_model::{FieldDefinition, FieldId, MigrationOptions, MigrationOutcome};
use nestflat_store::{MemoryStore, load_snapshot, save_snapshot};

use crate::cli::{InspectArgs, MigrateArgs};
use crate::progress::ProgressObserver;
use crate::types::{FieldSummary, InspectResult, MigrateResult};

pub fn run_migrate(args: &MigrateArgs) -> Result<MigrateResult> {
    let span = info_span!(
        "migrate",
        snapshot = %args.snapshot.display(),
        field_id = args.field_id
    );
    let _guard = span.enter();
    let start = Instant::now();

    let mut store = load_snapshot(&args.snapshot)
        .with_context(|| format!("load snapshot {}", args.snapshot.display()))?;
    let table = store.labels().clone();
    let labels: Option<&dyn LabelSource> = if table.is_empty() {
        None
    } else {
        Some(&table)
    };
    let options = MigrationOptions::new()
        .with_cleanup(args.clean)
        .with_source_deletion(!args.keep_source);
    let field_id = FieldId::new(args.field_id);

    let mut progress = ProgressObserver::new(!args.no_progress && io::stderr().is_terminal());
    let outcome = migrate_field(&mut store, labels, field_id, options, &mut progress);
    progress.finish();
    let outcome = outcome.with_context(|| format!("migrate field {field_id}"))?;

    let output = match &outcome {
        MigrationOutcome::Migrated(_) => {
            let path = args.output.clone().unwrap_or_else(|| args.snapshot.clone());
            save_snapshot(&store, &path)
                .with_context(|| format!("save snapshot {}", path.display()))?;
            Some(path)
        }
        MigrationOutcome::NotHierarchical { .. } => None,
    };
    let duration_ms = start.elapsed().as_millis();
    info!(
        field_id = %field_id,
        migrated = outcome.is_migrated(),
        duration_ms,
        "migrate command complete"
    );

    Ok(MigrateResult {
        snapshot: args.snapshot.clone(),
        output,
        outline: store
            .field(field_id)
            .map(|field| Outline(field).to_string()),
        outcome,
        duration_ms,
    })
}

pub fn run_inspect(args: &InspectArgs) -> Result<InspectResult> {
    let store = load_snapshot(&args.snapshot)
        .with_context(|| format!("load snapshot {}", args.snapshot.display()))?;
    let fields = store
        .fields()
        .iter()
        .map(|field| summarize_field(&store, field))
        .collect();
    Ok(InspectResult {
        snapshot: args.snapshot.clone(),
        locales: store
            .locales()
            .iter()
            .map(ToString::to_string)
            .collect(),
        fields,
    })
}

fn summarize_field(store: &MemoryStore, field: &FieldDefinition) -> FieldSummary {
    let id = field.id.persisted();
    let source_records = store
        .source_records()
        .iter()
        .filter(|record| Some(record.field_id) == id)
        .filter(|record| ParentFilter::Root.matches(record.parent_id))
        .count();
    let flat_records = store
        .flat_records()
        .iter()
        .filter(|record| Some(record.field_id) == id)
        .count();
    FieldSummary {
        id: field.id.to_string(),
        handle: field.handle.clone(),
        field_type: field.field_type.to_string(),
        block_types: field.block_types.len(),
        sub_tables: field
            .block_types
            .iter()
            .flat_map(|block| &block.fields)
            .filter(|slot| slot.field.is_sub_table())
            .count(),
        source_records,
        flat_records,
        outline: Outline(field).to_string(),
    }
}
