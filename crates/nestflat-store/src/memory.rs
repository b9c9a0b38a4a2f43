//! In-memory store implementing every collaborator trait of a migration.
//!
//! Source records, flat records, per-locale content rows and sub-table rows
//! live in plain vectors. Ids come from one sequential counter shared by all
//! entities. The first save of a flat record creates a content row for every
//! configured locale, the way a localized CMS propagates a new element, so
//! later locales must adopt the existing row instead of inserting another.

use std::collections::{BTreeMap, BTreeSet};

use nestflat_core::{ContentStore, FieldStore, LabelSource, LocaleRegistry, RecordQuery, StoreError};
use nestflat_model::{
    Attributes, BlockTypeDefinition, BlockTypeId, ContentRecord, ContentRowId, ElementId,
    FieldDefinition, FieldId, FlatRecord, Identity, LabelOverride, LayoutId, Locale, RecordId,
    SubTableRow,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Identity-level data of a flat record; localized values live in
/// [`ContentRow`]s.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFlatRecord {
    pub id: RecordId,
    pub field_id: FieldId,
    pub type_id: BlockTypeId,
    pub owner_id: ElementId,
    #[serde(default)]
    pub sort_order: u32,
    pub enabled: bool,
}

/// Localized values of one flat record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentRow {
    pub id: ContentRowId,
    pub record_id: RecordId,
    pub locale: Locale,
    #[serde(default)]
    pub attributes: Attributes,
}

/// Content table backing one sub-table field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubTableStorage {
    pub block_type_id: BlockTypeId,
    pub handle: String,
    pub field_id: FieldId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelEntry {
    pub layout_id: LayoutId,
    pub field_id: FieldId,
    #[serde(flatten)]
    pub label: LabelOverride,
}

/// Per-layout label overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<LabelEntry>", into = "Vec<LabelEntry>")]
pub struct LabelTable {
    layouts: BTreeMap<LayoutId, BTreeMap<FieldId, LabelOverride>>,
}

impl LabelTable {
    pub fn insert(&mut self, layout_id: LayoutId, field_id: FieldId, label: LabelOverride) {
        self.layouts
            .entry(layout_id)
            .or_default()
            .insert(field_id, label);
    }

    pub fn is_empty(&self) -> bool {
        self.layouts.is_empty()
    }
}

impl LabelSource for LabelTable {
    fn label_overrides(&self, layout_id: LayoutId) -> BTreeMap<FieldId, LabelOverride> {
        self.layouts.get(&layout_id).cloned().unwrap_or_default()
    }
}

impl From<Vec<LabelEntry>> for LabelTable {
    fn from(entries: Vec<LabelEntry>) -> Self {
        let mut table = LabelTable::default();
        for entry in entries {
            table.insert(entry.layout_id, entry.field_id, entry.label);
        }
        table
    }
}

impl From<LabelTable> for Vec<LabelEntry> {
    fn from(table: LabelTable) -> Self {
        table
            .layouts
            .into_iter()
            .flat_map(|(layout_id, labels)| {
                labels.into_iter().map(move |(field_id, label)| LabelEntry {
                    layout_id,
                    field_id,
                    label,
                })
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryStore {
    #[serde(default)]
    locales: Vec<Locale>,
    #[serde(default)]
    fields: Vec<FieldDefinition>,
    /// Source records of hierarchical fields.
    #[serde(default)]
    records: Vec<ContentRecord>,
    #[serde(default)]
    flat_records: Vec<StoredFlatRecord>,
    #[serde(default)]
    content_rows: Vec<ContentRow>,
    #[serde(default)]
    sub_table_storage: Vec<SubTableStorage>,
    #[serde(default)]
    sub_table_rows: Vec<SubTableRow>,
    #[serde(default)]
    labels: LabelTable,
    #[serde(default = "first_id")]
    next_id: u64,

    #[serde(skip, default = "open")]
    active: bool,
    #[serde(skip)]
    writes: usize,
    #[serde(skip)]
    fail_writes_after: Option<usize>,
    #[serde(skip)]
    failing_deletes: BTreeSet<String>,
}

fn first_id() -> u64 {
    1
}

fn open() -> bool {
    true
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl MemoryStore {
    pub fn new(locales: Vec<Locale>) -> Self {
        Self {
            locales,
            fields: Vec::new(),
            records: Vec::new(),
            flat_records: Vec::new(),
            content_rows: Vec::new(),
            sub_table_storage: Vec::new(),
            sub_table_rows: Vec::new(),
            labels: LabelTable::default(),
            next_id: first_id(),
            active: true,
            writes: 0,
            fail_writes_after: None,
            failing_deletes: BTreeSet::new(),
        }
    }

    /// Adds a stored field as-is. Pending identities are kept.
    #[must_use]
    pub fn with_field(mut self, field: FieldDefinition) -> Self {
        self.fields.retain(|stored| stored.id != field.id);
        self.fields.push(field);
        self.reserve_known_ids();
        self
    }

    #[must_use]
    pub fn with_record(mut self, record: ContentRecord) -> Self {
        self.records.push(record);
        self.reserve_known_ids();
        self
    }

    #[must_use]
    pub fn with_records(mut self, records: impl IntoIterator<Item = ContentRecord>) -> Self {
        self.records.extend(records);
        self.reserve_known_ids();
        self
    }

    #[must_use]
    pub fn with_label(
        mut self,
        layout_id: LayoutId,
        field_id: FieldId,
        label: LabelOverride,
    ) -> Self {
        self.labels.insert(layout_id, field_id, label);
        self
    }

    /// Rejects every save once `limit` saves have succeeded.
    #[must_use]
    pub fn fail_writes_after(mut self, limit: usize) -> Self {
        self.fail_writes_after = Some(limit);
        self
    }

    /// Rejects deleting any block-type field named `handle`.
    #[must_use]
    pub fn fail_field_delete(mut self, handle: impl Into<String>) -> Self {
        self.failing_deletes.insert(handle.into());
        self
    }

    pub fn locales(&self) -> &[Locale] {
        &self.locales
    }

    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    pub fn field(&self, id: FieldId) -> Option<&FieldDefinition> {
        self.fields
            .iter()
            .find(|field| field.id == Identity::Persisted(id))
    }

    pub fn source_records(&self) -> &[ContentRecord] {
        &self.records
    }

    pub fn flat_records(&self) -> &[StoredFlatRecord] {
        &self.flat_records
    }

    pub fn content_rows(&self) -> &[ContentRow] {
        &self.content_rows
    }

    pub fn content_row(&self, record_id: RecordId, locale: &Locale) -> Option<&ContentRow> {
        self.content_rows
            .iter()
            .find(|row| row.record_id == record_id && &row.locale == locale)
    }

    pub fn sub_table_rows(&self) -> &[SubTableRow] {
        &self.sub_table_rows
    }

    /// Sub-table rows owned by a flat record, in insertion order.
    pub fn rows_owned_by(&self, record_id: RecordId) -> impl Iterator<Item = &SubTableRow> {
        self.sub_table_rows
            .iter()
            .filter(move |row| row.owner_id == Some(record_id))
    }

    pub fn sub_table_storage(&self) -> &[SubTableStorage] {
        &self.sub_table_storage
    }

    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn block_type(&self, id: BlockTypeId) -> Option<&BlockTypeDefinition> {
        self.fields
            .iter()
            .find_map(|field| find_block_type(&field.block_types, id))
    }

    /// Moves the id counter past every id already present.
    pub(crate) fn reserve_known_ids(&mut self) {
        let mut highest = 0;
        for field in &self.fields {
            visit_schema_ids(field, &mut |id| highest = highest.max(id));
        }
        let content_ids = self
            .records
            .iter()
            .map(|record| record.id.get())
            .chain(self.flat_records.iter().map(|record| record.id.get()))
            .chain(self.content_rows.iter().map(|row| row.id.get()))
            .chain(
                self.sub_table_rows
                    .iter()
                    .filter_map(|row| row.id.map(RecordId::get)),
            );
        for id in content_ids {
            highest = highest.max(id);
        }
        self.next_id = self.next_id.max(highest + 1);
    }

    fn allocate(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn ensure_active(&self) -> Result<(), StoreError> {
        if self.active {
            Ok(())
        } else {
            Err(StoreError::Closed)
        }
    }

    /// Counts one save against the write limit.
    fn begin_write(&mut self, entity: &str) -> Result<(), StoreError> {
        self.ensure_active()?;
        if self
            .fail_writes_after
            .is_some_and(|limit| self.writes >= limit)
        {
            return Err(StoreError::rejected(entity, "write limit reached"));
        }
        self.writes += 1;
        Ok(())
    }

    /// Replaces every pending identity below `field` and re-links block
    /// types to the field that owns them.
    fn assign_ids(&mut self, field: &mut FieldDefinition) {
        if field.id.is_pending() {
            field.id = Identity::Persisted(FieldId::new(self.allocate()));
        }
        let owner = field.id.persisted();
        for block in &mut field.block_types {
            if block.id.is_pending() {
                block.id = Identity::Persisted(BlockTypeId::new(self.allocate()));
            }
            block.field_id = owner;
            for slot in &mut block.fields {
                self.assign_ids(&mut slot.field);
            }
        }
    }

    fn register_sub_tables(&mut self, field: &FieldDefinition) {
        for block in &field.block_types {
            let Some(block_type_id) = block.id.persisted() else {
                continue;
            };
            for slot in &block.fields {
                let Some(field_id) = slot.field.id.persisted() else {
                    continue;
                };
                if slot.field.is_sub_table()
                    && !self
                        .sub_table_storage
                        .iter()
                        .any(|storage| storage.field_id == field_id)
                {
                    self.sub_table_storage.push(SubTableStorage {
                        block_type_id,
                        handle: slot.field.handle.clone(),
                        field_id,
                    });
                }
                self.register_sub_tables(&slot.field);
            }
        }
    }

    fn block_type_mut(&mut self, id: BlockTypeId) -> Option<&mut BlockTypeDefinition> {
        self.fields
            .iter_mut()
            .find_map(|field| find_block_type_mut(&mut field.block_types, id))
    }
}

fn find_block_type(
    blocks: &[BlockTypeDefinition],
    id: BlockTypeId,
) -> Option<&BlockTypeDefinition> {
    blocks
        .iter()
        .find(|block| block.id.persisted() == Some(id))
        .or_else(|| {
            blocks
                .iter()
                .flat_map(|block| &block.fields)
                .find_map(|slot| find_block_type(&slot.field.block_types, id))
        })
}

fn find_block_type_mut(
    blocks: &mut [BlockTypeDefinition],
    id: BlockTypeId,
) -> Option<&mut BlockTypeDefinition> {
    match blocks.iter().position(|block| block.id.persisted() == Some(id)) {
        Some(position) => blocks.get_mut(position),
        None => blocks
            .iter_mut()
            .flat_map(|block| block.fields.iter_mut())
            .find_map(|slot| find_block_type_mut(&mut slot.field.block_types, id)),
    }
}

fn visit_schema_ids(field: &FieldDefinition, visit: &mut impl FnMut(u64)) {
    if let Some(id) = field.id.persisted() {
        visit(id.get());
    }
    for block in &field.block_types {
        if let Some(id) = block.id.persisted() {
            visit(id.get());
        }
        for slot in &block.fields {
            visit_schema_ids(&slot.field, visit);
        }
    }
}

/// Rejects a definition whose block types repeat a field handle.
fn validate_handles(field: &FieldDefinition) -> Result<(), StoreError> {
    for block in &field.block_types {
        let mut seen = BTreeSet::new();
        for handle in block.field_handles() {
            if !seen.insert(handle) {
                return Err(StoreError::rejected(
                    format!("field {:?}", field.handle),
                    format!("duplicate handle {handle:?} in block type {:?}", block.handle),
                ));
            }
        }
        for slot in &block.fields {
            validate_handles(&slot.field)?;
        }
    }
    Ok(())
}

impl FieldStore for MemoryStore {
    fn field_by_id(&self, id: FieldId) -> Result<Option<FieldDefinition>, StoreError> {
        Ok(self.field(id).cloned())
    }

    fn save_field(&mut self, mut field: FieldDefinition) -> Result<FieldDefinition, StoreError> {
        self.begin_write("field")?;
        validate_handles(&field)?;
        self.assign_ids(&mut field);
        self.register_sub_tables(&field);
        match self.fields.iter_mut().find(|stored| stored.id == field.id) {
            Some(stored) => *stored = field.clone(),
            None => self.fields.push(field.clone()),
        }
        debug!(field = %field.handle, id = %field.id, "saved field");
        Ok(field)
    }

    fn delete_block_type_field(
        &mut self,
        block_type_id: BlockTypeId,
        handle: &str,
    ) -> Result<(), StoreError> {
        self.ensure_active()?;
        if self.failing_deletes.contains(handle) {
            return Err(StoreError::rejected(
                format!("field {handle:?}"),
                "delete refused",
            ));
        }
        let block = self
            .block_type_mut(block_type_id)
            .ok_or_else(|| StoreError::not_found(format!("block type {block_type_id}")))?;
        let before = block.fields.len();
        block.fields.retain(|slot| slot.field.handle != handle);
        if block.fields.len() == before {
            return Err(StoreError::not_found(format!(
                "field {handle:?} in block type {block_type_id}"
            )));
        }
        trace!(block_type_id = %block_type_id, handle, "deleted block type field");
        Ok(())
    }

    fn drop_sub_table_storage(
        &mut self,
        block_type_id: BlockTypeId,
        handle: &str,
    ) -> Result<(), StoreError> {
        self.ensure_active()?;
        let Some(position) = self.sub_table_storage.iter().position(|storage| {
            storage.block_type_id == block_type_id && storage.handle == handle
        }) else {
            return Ok(());
        };
        let storage = self.sub_table_storage.remove(position);
        self.sub_table_rows
            .retain(|row| row.field_id != storage.field_id);
        trace!(block_type_id = %block_type_id, handle, "dropped sub-table storage");
        Ok(())
    }

    fn block_type_field_count(&self, block_type_id: BlockTypeId) -> Result<usize, StoreError> {
        self.block_type(block_type_id)
            .map(|block| block.fields.len())
            .ok_or_else(|| StoreError::not_found(format!("block type {block_type_id}")))
    }

    fn delete_block_type(&mut self, block_type_id: BlockTypeId) -> Result<(), StoreError> {
        self.ensure_active()?;
        for field in &mut self.fields {
            let before = field.block_types.len();
            field
                .block_types
                .retain(|block| block.id.persisted() != Some(block_type_id));
            if field.block_types.len() != before {
                trace!(block_type_id = %block_type_id, "deleted block type");
                return Ok(());
            }
        }
        Err(StoreError::not_found(format!("block type {block_type_id}")))
    }
}

impl ContentStore for MemoryStore {
    fn query_records(&self, query: &RecordQuery) -> Result<Vec<ContentRecord>, StoreError> {
        let mut records: Vec<ContentRecord> = self
            .records
            .iter()
            .filter(|record| record.field_id == query.field_id)
            .filter(|record| query.parent.matches(record.parent_id))
            .filter(|record| {
                query
                    .locale
                    .as_ref()
                    .is_none_or(|locale| &record.locale == locale)
            })
            .cloned()
            .collect();
        records.sort_by_key(|record| (record.sort_order, record.id));
        Ok(records)
    }

    fn save_record(&mut self, record: &mut FlatRecord) -> Result<RecordId, StoreError> {
        self.begin_write("flat record")?;
        let Some(id) = record.id else {
            let id = RecordId::new(self.allocate());
            record.id = Some(id);
            self.flat_records.push(StoredFlatRecord {
                id,
                field_id: record.field_id,
                type_id: record.type_id,
                owner_id: record.owner_id,
                sort_order: record.sort_order,
                enabled: record.enabled,
            });
            // A new element gets a content row in every configured locale.
            let mut locales = self.locales.clone();
            if !locales.contains(&record.locale) {
                locales.push(record.locale.clone());
            }
            for locale in locales {
                let row_id = ContentRowId::new(self.allocate());
                if locale == record.locale {
                    record.content_row_id = Some(row_id);
                }
                self.content_rows.push(ContentRow {
                    id: row_id,
                    record_id: id,
                    locale,
                    attributes: record.attributes.clone(),
                });
            }
            debug!(record_id = %id, locale = %record.locale, "inserted flat record");
            return Ok(id);
        };

        if !self.flat_records.iter().any(|stored| stored.id == id) {
            return Err(StoreError::not_found(format!("flat record {id}")));
        }
        match record.content_row_id {
            Some(row_id) => {
                let row = self
                    .content_rows
                    .iter_mut()
                    .find(|row| row.id == row_id && row.record_id == id)
                    .ok_or_else(|| StoreError::not_found(format!("content row {row_id}")))?;
                row.locale = record.locale.clone();
                row.attributes = record.attributes.clone();
            }
            None => {
                if self.content_row(id, &record.locale).is_some() {
                    return Err(StoreError::rejected(
                        format!("content row of record {id}"),
                        format!("locale {} already has a row", record.locale),
                    ));
                }
                let row_id = ContentRowId::new(self.allocate());
                record.content_row_id = Some(row_id);
                self.content_rows.push(ContentRow {
                    id: row_id,
                    record_id: id,
                    locale: record.locale.clone(),
                    attributes: record.attributes.clone(),
                });
            }
        }
        debug!(record_id = %id, locale = %record.locale, "updated flat record");
        Ok(id)
    }

    fn save_sub_table_row(&mut self, row: &mut SubTableRow) -> Result<RecordId, StoreError> {
        self.begin_write("sub-table row")?;
        let owner = row
            .owner_id
            .ok_or_else(|| StoreError::rejected("sub-table row", "row has no owner"))?;
        if !self.flat_records.iter().any(|stored| stored.id == owner) {
            return Err(StoreError::not_found(format!("owner record {owner}")));
        }
        match row.id {
            Some(id) => {
                let stored = self
                    .sub_table_rows
                    .iter_mut()
                    .find(|stored| stored.id == Some(id))
                    .ok_or_else(|| StoreError::not_found(format!("sub-table row {id}")))?;
                *stored = row.clone();
                Ok(id)
            }
            None => {
                let id = RecordId::new(self.allocate());
                row.id = Some(id);
                self.sub_table_rows.push(row.clone());
                trace!(
                    row_id = %id,
                    owner = %owner,
                    field_id = %row.field_id,
                    "inserted sub-table row"
                );
                Ok(id)
            }
        }
    }

    fn existing_content_row(
        &self,
        record: &FlatRecord,
    ) -> Result<Option<ContentRowId>, StoreError> {
        Ok(record
            .id
            .and_then(|id| self.content_row(id, &record.locale))
            .map(|row| row.id))
    }

    fn delete_records_by_ids(&mut self, ids: &[RecordId]) -> Result<usize, StoreError> {
        self.ensure_active()?;
        let ids: BTreeSet<RecordId> = ids.iter().copied().collect();
        let before = self.records.len();
        self.records.retain(|record| !ids.contains(&record.id));
        Ok(before - self.records.len())
    }

    fn close(&mut self) {
        self.active = false;
        debug!("store closed for writes");
    }
}

impl LocaleRegistry for MemoryStore {
    fn configured_locales(&self) -> Result<Vec<Locale>, StoreError> {
        Ok(self.locales.clone())
    }
}
