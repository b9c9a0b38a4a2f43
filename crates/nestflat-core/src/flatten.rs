//! Schema pass: rewrite a hierarchical field into a composite field with at
//! most two levels.
//!
//! Every top-level block type of the source becomes one block type of the
//! destination. Leaf fields are copied, embedded composite/hierarchical
//! fields become sub-tables, and every block type reachable below a top-level
//! block type becomes one more sub-table on that same block type. Sub-tables
//! only ever hold leaf fields, so the destination never nests deeper than
//! block type → sub-table.
//!
//! The traversal memo (`SubTablePaths`) is part of the output: the content
//! pass uses it to decide which sub-table a nested record feeds.

use std::collections::{BTreeMap, BTreeSet};

use nestflat_model::{
    BlockTypeDefinition, BlockTypeId, DedupKey, FieldDefinition, FieldType, LabelOverride,
    LayoutField, SubTableLayout,
};
use tracing::debug;

use crate::copier::FieldCopier;
use crate::error::{MigrationError, Result};
use crate::graph::BlockTypeGraph;
use crate::store::LabelSource;

/// Generated sub-table handle → `[top-level, direct child]` keys it was
/// reached through.
pub type SubTablePaths = BTreeMap<String, BTreeSet<DedupKey>>;

/// Result of the schema pass.
#[derive(Debug, Clone)]
pub struct FlattenedSchema {
    /// Destination composite field. Keeps the source field's identity so that
    /// saving it replaces the hierarchical field.
    pub field: FieldDefinition,
    pub paths: SubTablePaths,
}

impl FlattenedSchema {
    /// Number of sub-table fields across all destination block types.
    pub fn sub_table_count(&self) -> usize {
        self.field
            .block_types
            .iter()
            .flat_map(|block| &block.fields)
            .filter(|slot| slot.field.is_sub_table())
            .count()
    }
}

/// Traversal context for one schema pass.
pub struct SchemaFlattener<'a> {
    source: &'a FieldDefinition,
    graph: BlockTypeGraph<'a>,
    labels: Option<&'a dyn LabelSource>,
    copier: FieldCopier,
    paths: SubTablePaths,
}

impl<'a> SchemaFlattener<'a> {
    pub fn new(source: &'a FieldDefinition, labels: Option<&'a dyn LabelSource>) -> Self {
        Self {
            source,
            graph: BlockTypeGraph::build(&source.block_types),
            labels,
            copier: FieldCopier::new(),
            paths: SubTablePaths::new(),
        }
    }

    pub fn flatten(mut self) -> Result<FlattenedSchema> {
        let source = self.source;
        let top_level: Vec<&'a BlockTypeDefinition> = self.graph.top_level().collect();
        let mut block_types = Vec::with_capacity(top_level.len());
        for block in top_level {
            let mut flat = self.flatten_block_type(block, Some(source));
            self.expand_children(block, &mut flat.fields)?;
            debug!(
                block_type = %block.handle,
                fields = flat.fields.len(),
                "flattened top-level block type"
            );
            block_types.push(flat);
        }

        let mut field = FieldDefinition::new(
            source.id,
            source.handle.clone(),
            source.name.clone(),
            FieldType::Composite,
        )
        .with_block_types(block_types);
        field.instructions = source.instructions.clone();
        field.required = source.required;
        field.translatable = source.translatable;
        field.group_id = source.group_id;

        Ok(FlattenedSchema {
            field,
            paths: self.paths,
        })
    }

    /// Converts one block type's layout into a flat block type.
    ///
    /// Nested fields inside the layout become sub-tables; child block types
    /// are handled separately by [`Self::expand_children`].
    pub fn flatten_block_type(
        &mut self,
        block: &BlockTypeDefinition,
        owner: Option<&FieldDefinition>,
    ) -> BlockTypeDefinition {
        let overrides = match (self.labels, block.layout_id) {
            (Some(labels), Some(layout_id)) => labels.label_overrides(layout_id),
            _ => BTreeMap::new(),
        };
        let owner_translatable = owner.is_some_and(|field| field.translatable);

        let mut fields = Vec::with_capacity(block.fields.len());
        for slot in &block.fields {
            if slot.field.is_nesting() {
                let sub_table = self.sub_table_from_nested(&slot.field, owner);
                fields.push(LayoutField::new(sub_table));
                continue;
            }
            let Some(mut copy) = self.copier.copy(&slot.field, slot.required) else {
                continue;
            };
            if owner_translatable {
                copy.translatable = false;
            }
            if let Some(label) = slot.field.id.persisted().and_then(|id| overrides.get(&id)) {
                apply_label(&mut copy, label);
            }
            fields.push(LayoutField {
                field: copy,
                required: slot.required,
            });
        }

        let mut flat =
            BlockTypeDefinition::new(self.copier.pending(), &block.handle, &block.name);
        flat.field_id = owner.and_then(|field| field.id.persisted());
        flat.fields = fields;
        flat
    }

    /// Generates one sub-table per distinct block type reachable below
    /// `top_level` and appends it to `target`.
    ///
    /// Everything below one direct child of `top_level` is keyed by
    /// `[top_level, child]`; each block type is entered at most once per
    /// direct child, so wildcard schemas stay linear in their edge count.
    pub fn expand_children(
        &mut self,
        top_level: &'a BlockTypeDefinition,
        target: &mut Vec<LayoutField>,
    ) -> Result<()> {
        let top_id = persisted_block_id(top_level)?;
        let root = DedupKey::root(top_id);
        for child in self.graph.children_of(top_level)? {
            if child.handle == top_level.handle {
                continue;
            }
            let key = root.child(persisted_block_id(child)?);
            let mut visited = BTreeSet::new();
            self.visit(child, &key, &mut visited, target)?;
        }
        Ok(())
    }

    fn visit(
        &mut self,
        block: &'a BlockTypeDefinition,
        key: &DedupKey,
        visited: &mut BTreeSet<BlockTypeId>,
        target: &mut Vec<LayoutField>,
    ) -> Result<()> {
        let id = persisted_block_id(block)?;
        // Skips the top-level type and any type already entered below this child.
        if id == key.top_level() || !visited.insert(id) {
            return Ok(());
        }

        if !block.fields.is_empty() {
            let present = target.iter().any(|slot| slot.field.handle == block.handle);
            if !present {
                let owner = self.source;
                let mut leaves = Vec::new();
                let mut processed = BTreeSet::new();
                self.collect_leaf_fields(&block.fields, Some(owner), &mut processed, &mut leaves);
                let sub_table =
                    self.build_sub_table(&block.name, &block.handle, leaves, Some(owner));
                debug!(sub_table = %block.handle, path = %key, "generated sub-table");
                target.push(LayoutField::new(sub_table));
            }
            self.paths
                .entry(block.handle.clone())
                .or_default()
                .insert(key.clone());
        }

        for child in self.graph.children_of(block)? {
            self.visit(child, key, visited, target)?;
        }
        Ok(())
    }

    /// Sub-table replacing a composite/hierarchical field found in a layout.
    fn sub_table_from_nested(
        &mut self,
        field: &FieldDefinition,
        owner: Option<&FieldDefinition>,
    ) -> FieldDefinition {
        let mut leaves = Vec::new();
        let mut processed = BTreeSet::new();
        for block in &field.block_types {
            self.collect_leaf_fields(&block.fields, owner, &mut processed, &mut leaves);
        }
        self.build_sub_table(&field.name, &field.handle, leaves, owner)
    }

    /// Copies every leaf field of `layout`, descending into nested fields.
    /// The first field seen for a handle wins.
    fn collect_leaf_fields(
        &mut self,
        layout: &[LayoutField],
        owner: Option<&FieldDefinition>,
        processed: &mut BTreeSet<String>,
        out: &mut Vec<LayoutField>,
    ) {
        for slot in layout {
            if slot.field.is_nesting() {
                for block in &slot.field.block_types {
                    self.collect_leaf_fields(&block.fields, owner, processed, out);
                }
                continue;
            }
            if processed.contains(&slot.field.handle) {
                continue;
            }
            let Some(mut copy) = self.copier.copy(&slot.field, slot.required) else {
                continue;
            };
            if owner.is_some_and(|field| field.translatable) {
                copy.translatable = false;
            }
            processed.insert(copy.handle.clone());
            out.push(LayoutField {
                field: copy,
                required: slot.required,
            });
        }
    }

    fn build_sub_table(
        &mut self,
        name: &str,
        handle: &str,
        fields: Vec<LayoutField>,
        owner: Option<&FieldDefinition>,
    ) -> FieldDefinition {
        let mut block = BlockTypeDefinition::new(self.copier.pending(), handle, name);
        block.field_id = owner.and_then(|field| field.id.persisted());
        block.fields = fields;
        block.layout = Some(SubTableLayout::Row);
        FieldDefinition::new(self.copier.pending(), handle, name, FieldType::SubTable)
            .with_block_types(vec![block])
    }
}

fn apply_label(field: &mut FieldDefinition, label: &LabelOverride) {
    if let Some(name) = label.name.as_deref().filter(|name| !name.is_empty()) {
        field.name = name.to_string();
    }
    if let Some(instructions) = label
        .instructions
        .as_deref()
        .filter(|text| !text.is_empty())
    {
        field.instructions = Some(instructions.to_string());
    }
}

fn persisted_block_id(block: &BlockTypeDefinition) -> Result<BlockTypeId> {
    block.id.persisted().ok_or_else(|| {
        MigrationError::unpersisted(format!("source block type {:?}", block.handle))
    })
}
