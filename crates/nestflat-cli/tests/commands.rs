//! Command-level tests over snapshot files.

use std::path::{Path, PathBuf};

use nestflat_cli::cli::{InspectArgs, MigrateArgs};
use nestflat_cli::commands::{run_inspect, run_migrate};
use nestflat_model::{
    BlockTypeDefinition, BlockTypeId, ChildBlocks, ContentRecord, ElementId, FieldDefinition,
    FieldId, FieldType, FieldValue, Identity, Locale, MigrationOutcome, RecordId,
};
use nestflat_store::{MemoryStore, load_snapshot, save_snapshot};

const FIELD: u64 = 100;

fn en() -> Locale {
    Locale::new("en").unwrap()
}

fn record(id: u64, type_id: u64) -> ContentRecord {
    ContentRecord::new(
        RecordId::new(id),
        FieldId::new(FIELD),
        BlockTypeId::new(type_id),
        ElementId::new(500),
        en(),
    )
}

fn section_store(field_type: FieldType) -> MemoryStore {
    let field = FieldDefinition::new(
        Identity::Persisted(FieldId::new(FIELD)),
        "sections",
        "Sections",
        field_type,
    )
    .with_block_types(vec![
        BlockTypeDefinition::persisted(1, "section")
            .with_fields(vec![FieldDefinition::leaf(11, "title", "PlainText")])
            .with_children(ChildBlocks::handles(["item"])),
        BlockTypeDefinition::persisted(2, "item")
            .with_fields(vec![FieldDefinition::leaf(12, "body", "PlainText")]),
    ]);
    MemoryStore::new(vec![en()]).with_field(field).with_records([
        record(1000, 1).with_attribute("title", FieldValue::scalar("Intro")),
        record(1001, 2)
            .with_parent(RecordId::new(1000))
            .with_attribute("body", FieldValue::scalar("first")),
        record(1002, 2)
            .with_parent(RecordId::new(1000))
            .with_sort_order(1)
            .with_attribute("body", FieldValue::scalar("second")),
    ])
}

fn write_snapshot(dir: &Path, store: &MemoryStore) -> PathBuf {
    let path = dir.join("store.json");
    save_snapshot(store, &path).unwrap();
    path
}

fn migrate_args(snapshot: PathBuf, output: Option<PathBuf>) -> MigrateArgs {
    MigrateArgs {
        snapshot,
        field_id: FIELD,
        clean: false,
        keep_source: false,
        output,
        no_progress: true,
    }
}

#[test]
fn migrate_writes_the_flattened_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = write_snapshot(dir.path(), &section_store(FieldType::Hierarchical));
    let output = dir.path().join("migrated.json");

    let result = run_migrate(&migrate_args(snapshot.clone(), Some(output.clone()))).unwrap();

    assert_eq!(result.output.as_deref(), Some(output.as_path()));
    let report = result.outcome.report().expect("migrated");
    assert_eq!(report.roots_processed, 1);
    assert_eq!(report.rows_written, 2);
    assert_eq!(report.source_records_deleted, 3);
    let outline = result.outline.expect("outline");
    assert!(outline.starts_with("sections [100] composite"));
    assert!(outline.contains("item"));

    let migrated = load_snapshot(&output).unwrap();
    assert!(migrated.source_records().is_empty());
    assert_eq!(migrated.flat_records().len(), 1);
    let bodies: Vec<_> = migrated
        .sub_table_rows()
        .iter()
        .map(|row| row.attributes["body"].clone())
        .collect();
    assert_eq!(
        bodies,
        [FieldValue::scalar("first"), FieldValue::scalar("second")]
    );

    // The input snapshot is left alone when an output path is given.
    let original = load_snapshot(&snapshot).unwrap();
    assert_eq!(original.source_records().len(), 3);
}

#[test]
fn migrate_overwrites_the_input_by_default() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = write_snapshot(dir.path(), &section_store(FieldType::Hierarchical));
    let mut args = migrate_args(snapshot.clone(), None);
    args.keep_source = true;

    let result = run_migrate(&args).unwrap();

    assert_eq!(result.output.as_deref(), Some(snapshot.as_path()));
    let migrated = load_snapshot(&snapshot).unwrap();
    assert_eq!(migrated.source_records().len(), 3);
    assert_eq!(migrated.sub_table_rows().len(), 2);
}

#[test]
fn non_hierarchical_field_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = write_snapshot(dir.path(), &section_store(FieldType::Composite));
    let output = dir.path().join("migrated.json");

    let result = run_migrate(&migrate_args(snapshot, Some(output.clone()))).unwrap();

    assert!(matches!(
        result.outcome,
        MigrationOutcome::NotHierarchical {
            field_type: FieldType::Composite
        }
    ));
    assert!(result.output.is_none());
    assert!(!output.exists());
}

#[test]
fn missing_snapshot_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let args = migrate_args(dir.path().join("absent.json"), None);
    let err = run_migrate(&args).unwrap_err();
    assert!(format!("{err:#}").contains("load snapshot"));
}

#[test]
fn inspect_counts_roots_per_field() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = write_snapshot(dir.path(), &section_store(FieldType::Hierarchical));

    let result = run_inspect(&InspectArgs { snapshot }).unwrap();

    assert_eq!(result.locales, ["en"]);
    let [field] = result.fields.as_slice() else {
        panic!("expected one field, got {}", result.fields.len());
    };
    assert_eq!(field.handle, "sections");
    assert_eq!(field.field_type, "hierarchical");
    assert_eq!(field.block_types, 2);
    assert_eq!(field.sub_tables, 0);
    assert_eq!(field.source_records, 1);
    assert_eq!(field.flat_records, 0);
}
