//! Flattening of hierarchical (nested block-type) fields into composite
//! fields with sub-tables.
//!
//! The migration runs in two passes over one field: the schema pass
//! ([`SchemaFlattener`]) builds the destination definition, the content pass
//! ([`ContentMigrator`]) rewrites every stored record against it. Storage is
//! reached through the traits in [`store`]; [`migrate_field`] drives a full
//! run.

pub mod cleanup;
pub mod content;
pub mod copier;
pub mod error;
pub mod flatten;
pub mod graph;
pub mod migrate;
pub mod observer;
pub mod outline;
pub mod reference_index;
pub mod store;

pub use cleanup::{CleanupReport, CleanupService};
pub use content::{ContentMigrator, ContentStats};
pub use copier::FieldCopier;
pub use error::{MigrationError, Result, StoreError};
pub use flatten::{FlattenedSchema, SchemaFlattener, SubTablePaths};
pub use graph::BlockTypeGraph;
pub use migrate::migrate_field;
pub use observer::{MigrationEvent, MigrationObserver, NoopObserver, Stage};
pub use outline::Outline;
pub use reference_index::ReferenceIndex;
pub use store::{
    ContentStore, FieldStore, LabelSource, LocaleRegistry, MigrationStore, ParentFilter,
    RecordQuery,
};
