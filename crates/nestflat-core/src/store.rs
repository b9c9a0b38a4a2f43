//! Collaborator interfaces consumed by the migration.
//!
//! The storage engine, locale configuration and label overrides live outside
//! this crate. All calls are synchronous; a migration owns the store
//! exclusively for its whole run.

use std::collections::BTreeMap;

use nestflat_model::{
    BlockTypeId, ContentRecord, ContentRowId, FieldDefinition, FieldId, FlatRecord,
    LabelOverride, LayoutId, Locale, RecordId, SubTableRow,
};

use crate::error::StoreError;

/// Parent restriction for a record query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentFilter {
    /// Only records without a parent.
    Root,
    /// Direct children of the given record.
    Of(RecordId),
    Any,
}

impl ParentFilter {
    pub fn matches(&self, parent_id: Option<RecordId>) -> bool {
        match self {
            ParentFilter::Root => parent_id.is_none(),
            ParentFilter::Of(parent) => parent_id == Some(*parent),
            ParentFilter::Any => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordQuery {
    pub field_id: FieldId,
    pub parent: ParentFilter,
    /// `None` matches every locale.
    pub locale: Option<Locale>,
}

impl RecordQuery {
    pub fn roots(field_id: FieldId, locale: Locale) -> Self {
        Self {
            field_id,
            parent: ParentFilter::Root,
            locale: Some(locale),
        }
    }

    /// Direct children of `record` in the record's own locale.
    pub fn children_of(record: &ContentRecord) -> Self {
        Self {
            field_id: record.field_id,
            parent: ParentFilter::Of(record.id),
            locale: Some(record.locale.clone()),
        }
    }

    pub fn all(field_id: FieldId, locale: Option<Locale>) -> Self {
        Self {
            field_id,
            parent: ParentFilter::Any,
            locale,
        }
    }
}

/// Field definitions and their backing storage.
pub trait FieldStore {
    fn field_by_id(&self, id: FieldId) -> Result<Option<FieldDefinition>, StoreError>;

    /// Persists `field`, replacing a stored field with the same identity.
    ///
    /// Returns the stored definition with every pending identity (field,
    /// block types, nested fields) replaced by a persisted one.
    fn save_field(&mut self, field: FieldDefinition) -> Result<FieldDefinition, StoreError>;

    /// Removes the field `handle` from a block type's layout and definitions.
    fn delete_block_type_field(
        &mut self,
        block_type_id: BlockTypeId,
        handle: &str,
    ) -> Result<(), StoreError>;

    /// Drops the content table backing a sub-table field, if one exists.
    fn drop_sub_table_storage(
        &mut self,
        block_type_id: BlockTypeId,
        handle: &str,
    ) -> Result<(), StoreError>;

    /// Number of fields still placed in the block type's layout.
    fn block_type_field_count(&self, block_type_id: BlockTypeId) -> Result<usize, StoreError>;

    fn delete_block_type(&mut self, block_type_id: BlockTypeId) -> Result<(), StoreError>;
}

/// Source records of hierarchical fields and the flat records replacing them.
pub trait ContentStore {
    /// Source records matching `query` in sort order, oldest first on ties.
    fn query_records(&self, query: &RecordQuery) -> Result<Vec<ContentRecord>, StoreError>;

    /// Inserts or updates a flat record and assigns `record.id` on insert.
    fn save_record(&mut self, record: &mut FlatRecord) -> Result<RecordId, StoreError>;

    fn save_sub_table_row(&mut self, row: &mut SubTableRow) -> Result<RecordId, StoreError>;

    /// Content row already stored for the record's identity and locale.
    fn existing_content_row(&self, record: &FlatRecord)
    -> Result<Option<ContentRowId>, StoreError>;

    /// Deletes source records; returns how many were removed.
    fn delete_records_by_ids(&mut self, ids: &[RecordId]) -> Result<usize, StoreError>;

    /// Deactivates the write path once a migration has completed.
    fn close(&mut self);
}

pub trait LocaleRegistry {
    fn configured_locales(&self) -> Result<Vec<Locale>, StoreError>;
}

/// Optional per-layout field label overrides.
pub trait LabelSource {
    fn label_overrides(&self, layout_id: LayoutId) -> BTreeMap<FieldId, LabelOverride>;
}

/// Everything a migration run needs from its backing store.
pub trait MigrationStore: FieldStore + ContentStore + LocaleRegistry {}

impl<T: FieldStore + ContentStore + LocaleRegistry + ?Sized> MigrationStore for T {}
