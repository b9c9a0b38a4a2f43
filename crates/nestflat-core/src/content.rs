//! Content pass: rewrite every stored record of the source field into flat
//! records plus sub-table rows, mirroring the flattened schema.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use nestflat_model::{
    Attributes, BlockTypeId, ContentRecord, FieldDefinition, FieldId, FieldValue, FlatRecord,
    RecordId, Relation, SubTableRow,
};
use tracing::{debug, info};

use crate::error::{MigrationError, Result};
use crate::flatten::SubTablePaths;
use crate::observer::{MigrationEvent, MigrationObserver};
use crate::reference_index::ReferenceIndex;
use crate::store::{ContentStore, LocaleRegistry, RecordQuery};

/// Counters collected during the content pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContentStats {
    pub roots_processed: usize,
    pub locale_merges: usize,
    pub rows_written: usize,
}

/// Destination sub-table resolved for one batch of rows.
struct SubTableTarget {
    field_id: FieldId,
    type_id: BlockTypeId,
    handles: BTreeSet<String>,
}

impl SubTableTarget {
    fn resolve(field: &FieldDefinition) -> Result<Self> {
        let block = field.sub_table_block_type().ok_or_else(|| {
            MigrationError::unpersisted(format!("block type of sub-table {:?}", field.handle))
        })?;
        let field_id = field
            .id
            .persisted()
            .ok_or_else(|| MigrationError::unpersisted(format!("sub-table {:?}", field.handle)))?;
        let type_id = block.id.persisted().ok_or_else(|| {
            MigrationError::unpersisted(format!("block type of sub-table {:?}", field.handle))
        })?;
        Ok(Self {
            field_id,
            type_id,
            handles: block.field_handles().map(str::to_string).collect(),
        })
    }
}

pub struct ContentMigrator<'a, S: ?Sized> {
    store: &'a mut S,
    index: &'a mut ReferenceIndex,
    paths: &'a SubTablePaths,
    /// Source record → flat record already written for another locale.
    migrated: BTreeMap<RecordId, RecordId>,
    stats: ContentStats,
}

impl<'a, S> ContentMigrator<'a, S>
where
    S: ContentStore + LocaleRegistry + ?Sized,
{
    pub fn new(store: &'a mut S, index: &'a mut ReferenceIndex, paths: &'a SubTablePaths) -> Self {
        Self {
            store,
            index,
            paths,
            migrated: BTreeMap::new(),
            stats: ContentStats::default(),
        }
    }

    /// Migrates every root record of `field_id`, one at a time.
    ///
    /// Stops at the first rejected write; records written before it stay.
    pub fn run(
        mut self,
        field_id: FieldId,
        observer: &mut dyn MigrationObserver,
    ) -> Result<ContentStats> {
        let mut queue = self.enumerate_roots(field_id)?;
        info!(field_id = %field_id, roots = queue.len(), "migrating content");
        observer.on_event(&MigrationEvent::ContentQueued { total: queue.len() });

        while let Some(root) = queue.pop_front() {
            observer.on_event(&MigrationEvent::RootProcessed {
                remaining: queue.len(),
            });
            self.migrate_root(&root)?;
        }
        Ok(self.stats)
    }

    /// Root records of every configured locale whose block type maps to a
    /// destination block type, in sort order per locale.
    fn enumerate_roots(&self, field_id: FieldId) -> Result<VecDeque<ContentRecord>> {
        let mut queue = VecDeque::new();
        for locale in self.store.configured_locales()? {
            let records = self
                .store
                .query_records(&RecordQuery::roots(field_id, locale))?;
            queue.extend(records.into_iter().filter(|record| {
                record.is_root() && self.index.destination_of(record.type_id).is_some()
            }));
        }
        Ok(queue)
    }

    /// Converts one root and its subtree, then persists the results.
    pub fn migrate_root(&mut self, root: &ContentRecord) -> Result<()> {
        let Some(type_id) = self.index.destination_of(root.type_id) else {
            return Ok(());
        };
        let mut flat = FlatRecord {
            id: None,
            content_row_id: None,
            field_id: root.field_id,
            type_id,
            owner_id: root.owner_id,
            locale: root.locale.clone(),
            sort_order: root.sort_order,
            enabled: root.enabled,
            attributes: Attributes::new(),
        };
        let mut used = Vec::new();
        let mut rows = Vec::new();

        for (handle, value) in &root.attributes {
            if !value.is_empty() {
                used.push(handle.clone());
            }
            match value {
                FieldValue::Scalar(_) => {
                    flat.attributes.insert(handle.clone(), value.clone());
                }
                FieldValue::Relation(relation) => {
                    if relation.kind.is_migratable() {
                        flat.attributes
                            .insert(handle.clone(), FieldValue::Relation(id_set(relation)));
                    } else {
                        debug!(handle = %handle, kind = ?relation.kind, "dropping relation");
                    }
                }
                FieldValue::Nested(records) => {
                    let field = self.index.field(type_id, handle);
                    let Some(field) = field.filter(|field| field.is_sub_table()) else {
                        continue;
                    };
                    let target = SubTableTarget::resolve(field)?;
                    let mut values = Vec::new();
                    for record in records {
                        collect_values(record, &target.handles, &mut values);
                    }
                    rows.extend(to_rows(&target, root, values));
                }
            }
        }

        for child in self.store.query_records(&RecordQuery::children_of(root))? {
            let prefix = [root.type_id, child.type_id];
            self.collect_subtree(&child, type_id, &prefix, root, &mut rows)?;
        }

        self.reconcile_locale(root, &mut flat)?;
        let record_id = self
            .store
            .save_record(&mut flat)
            .map_err(MigrationError::persistence("save flat record"))?;
        self.migrated.insert(root.id, record_id);
        for handle in &used {
            self.index.mark_used(type_id, handle);
        }

        let row_count = rows.len();
        for mut row in rows {
            row.owner_id = Some(record_id);
            if let Some(handle) = self.index.handle_of(type_id, row.field_id) {
                let handle = handle.to_string();
                self.index.mark_used(type_id, &handle);
            }
            self.store
                .save_sub_table_row(&mut row)
                .map_err(MigrationError::persistence("save sub-table row"))?;
        }
        self.stats.rows_written += row_count;
        self.stats.roots_processed += 1;
        debug!(
            source = %root.id,
            target = %record_id,
            locale = %root.locale,
            rows = row_count,
            "migrated root record"
        );
        Ok(())
    }

    /// Reuses the flat record written for another locale of the same source
    /// record. The first save of a flat record may already have created
    /// content rows for every locale, so an existing row is updated.
    fn reconcile_locale(&mut self, root: &ContentRecord, flat: &mut FlatRecord) -> Result<()> {
        match self.migrated.get(&root.id) {
            Some(&target) => {
                flat.id = Some(target);
                flat.content_row_id = self.store.existing_content_row(flat)?;
                self.stats.locale_merges += 1;
            }
            None => {
                flat.id = None;
                flat.content_row_id = None;
            }
        }
        Ok(())
    }

    /// Turns every record below a direct child of `root` into rows of the
    /// sub-table generated for that record's own block type.
    fn collect_subtree(
        &self,
        record: &ContentRecord,
        type_id: BlockTypeId,
        prefix: &[BlockTypeId],
        root: &ContentRecord,
        rows: &mut Vec<SubTableRow>,
    ) -> Result<()> {
        if let Some(target) = self.target_for(record.type_id, type_id, prefix)? {
            let mut values = Vec::new();
            collect_values(record, &target.handles, &mut values);
            rows.extend(to_rows(&target, root, values));
        }
        for child in self.store.query_records(&RecordQuery::children_of(record))? {
            self.collect_subtree(&child, type_id, prefix, root, rows)?;
        }
        Ok(())
    }

    /// Sub-table on `type_id` that receives records of `source_type` found
    /// below `prefix`, if the schema pass generated one.
    fn target_for(
        &self,
        source_type: BlockTypeId,
        type_id: BlockTypeId,
        prefix: &[BlockTypeId],
    ) -> Result<Option<SubTableTarget>> {
        let Some(handle) = self.index.source_handle(source_type) else {
            return Ok(None);
        };
        let fed = self
            .paths
            .get(handle)
            .is_some_and(|keys| keys.iter().any(|key| key.starts_with(prefix)));
        match self.index.field(type_id, handle) {
            Some(field) if fed && field.is_sub_table() => SubTableTarget::resolve(field).map(Some),
            _ => Ok(None),
        }
    }
}

/// One row of `handles` values for `record`, followed by one row per record
/// embedded in its nested values (no further depth).
fn collect_values(record: &ContentRecord, handles: &BTreeSet<String>, out: &mut Vec<Attributes>) {
    let mut row = Attributes::new();
    let mut embedded = Vec::new();
    for (handle, value) in &record.attributes {
        let value = match value {
            FieldValue::Nested(inner) => {
                embedded.extend(inner);
                continue;
            }
            FieldValue::Relation(relation) if !relation.kind.is_migratable() => continue,
            FieldValue::Relation(relation) => FieldValue::Relation(id_set(relation)),
            FieldValue::Scalar(_) => value.clone(),
        };
        if handles.contains(handle) {
            row.insert(handle.clone(), value);
        }
    }
    if !row.is_empty() {
        out.push(row);
    }
    for nested in embedded {
        collect_values(nested, handles, out);
    }
}

fn to_rows(
    target: &SubTableTarget,
    root: &ContentRecord,
    values: Vec<Attributes>,
) -> impl Iterator<Item = SubTableRow> {
    let field_id = target.field_id;
    let type_id = target.type_id;
    let locale = root.locale.clone();
    values.into_iter().map(move |attributes| SubTableRow {
        id: None,
        field_id,
        type_id,
        owner_id: None,
        locale: locale.clone(),
        attributes,
    })
}

/// A relation reduced to the ids it references, duplicates removed.
fn id_set(relation: &Relation) -> Relation {
    let mut seen = BTreeSet::new();
    Relation {
        kind: relation.kind.clone(),
        ids: relation
            .ids
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .collect(),
    }
}
