use std::path::PathBuf;

use nestflat_model::MigrationOutcome;

#[derive(Debug)]
pub struct MigrateResult {
    pub snapshot: PathBuf,
    /// Snapshot written after a successful migration; `None` when nothing changed.
    pub output: Option<PathBuf>,
    pub outcome: MigrationOutcome,
    /// Outline of the field as stored after the run.
    pub outline: Option<String>,
    pub duration_ms: u128,
}

#[derive(Debug)]
pub struct InspectResult {
    pub snapshot: PathBuf,
    pub locales: Vec<String>,
    pub fields: Vec<FieldSummary>,
}

#[derive(Debug)]
pub struct FieldSummary {
    pub id: String,
    pub handle: String,
    pub field_type: String,
    pub block_types: usize,
    pub sub_tables: usize,
    pub source_records: usize,
    pub flat_records: usize,
    pub outline: String,
}
