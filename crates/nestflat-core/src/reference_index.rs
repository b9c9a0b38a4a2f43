//! Join tables between the persisted destination schema and the source
//! block types, built once per migration.

use std::collections::{BTreeMap, BTreeSet};

use nestflat_model::{BlockTypeDefinition, BlockTypeId, FieldDefinition, FieldId};

use crate::error::{MigrationError, Result};

#[derive(Debug, Clone, Default)]
pub struct ReferenceIndex {
    /// Source block type → destination block type.
    block_types: BTreeMap<BlockTypeId, BlockTypeId>,
    /// Source block type → handle, for every source block type.
    source_handles: BTreeMap<BlockTypeId, String>,
    fields_by_handle: BTreeMap<BlockTypeId, BTreeMap<String, FieldDefinition>>,
    handles_by_field_id: BTreeMap<BlockTypeId, BTreeMap<FieldId, String>>,
    /// Handles that have not received any content yet.
    unused: BTreeMap<BlockTypeId, BTreeSet<String>>,
}

impl ReferenceIndex {
    /// Indexes every field of every destination block type and seeds it as
    /// unused.
    ///
    /// `source_ids` maps source block-type handles to their ids; destination
    /// block types keep the handle of the top-level block type they replace.
    pub fn build(
        source_ids: &BTreeMap<String, BlockTypeId>,
        block_types: &[BlockTypeDefinition],
    ) -> Result<Self> {
        let mut index = Self {
            source_handles: source_ids
                .iter()
                .map(|(handle, id)| (*id, handle.clone()))
                .collect(),
            ..Self::default()
        };
        for block in block_types {
            let new_id = block.id.persisted().ok_or_else(|| {
                MigrationError::unpersisted(format!("block type {:?}", block.handle))
            })?;
            let old_id =
                source_ids
                    .get(&block.handle)
                    .ok_or_else(|| MigrationError::MissingBlockType {
                        handle: block.handle.clone(),
                    })?;
            index.block_types.insert(*old_id, new_id);

            let by_handle = index.fields_by_handle.entry(new_id).or_default();
            let by_id = index.handles_by_field_id.entry(new_id).or_default();
            let unused = index.unused.entry(new_id).or_default();
            for slot in &block.fields {
                let field = &slot.field;
                let field_id = field.id.persisted().ok_or_else(|| {
                    MigrationError::unpersisted(format!(
                        "field {:?} of block type {:?}",
                        field.handle, block.handle
                    ))
                })?;
                by_handle.insert(field.handle.clone(), field.clone());
                by_id.insert(field_id, field.handle.clone());
                unused.insert(field.handle.clone());
            }
        }
        Ok(index)
    }

    /// Destination block type replacing `source`, if it was a top-level type.
    pub fn destination_of(&self, source: BlockTypeId) -> Option<BlockTypeId> {
        self.block_types.get(&source).copied()
    }

    /// Handle of a source block type; nested sub-tables are named after it.
    pub fn source_handle(&self, source: BlockTypeId) -> Option<&str> {
        self.source_handles.get(&source).map(String::as_str)
    }

    pub fn field(&self, block_type: BlockTypeId, handle: &str) -> Option<&FieldDefinition> {
        self.fields_by_handle.get(&block_type)?.get(handle)
    }

    pub fn handle_of(&self, block_type: BlockTypeId, field_id: FieldId) -> Option<&str> {
        self.handles_by_field_id
            .get(&block_type)?
            .get(&field_id)
            .map(String::as_str)
    }

    /// Clears the unused marker; returns true if the handle was still unused.
    pub fn mark_used(&mut self, block_type: BlockTypeId, handle: &str) -> bool {
        self.unused
            .get_mut(&block_type)
            .is_some_and(|handles| handles.remove(handle))
    }

    pub fn is_unused(&self, block_type: BlockTypeId, handle: &str) -> bool {
        self.unused
            .get(&block_type)
            .is_some_and(|handles| handles.contains(handle))
    }

    pub fn unused(&self) -> &BTreeMap<BlockTypeId, BTreeSet<String>> {
        &self.unused
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nestflat_model::{FieldType, Identity};

    fn persisted_block() -> BlockTypeDefinition {
        let mut quotes = FieldDefinition::new(
            Identity::Persisted(FieldId::new(31)),
            "quotes",
            "Quotes",
            FieldType::SubTable,
        );
        quotes.block_types = vec![BlockTypeDefinition::persisted(32, "quotes")];
        BlockTypeDefinition::persisted(20, "text")
            .with_fields([FieldDefinition::leaf(30, "body", "PlainText"), quotes])
    }

    fn sources() -> BTreeMap<String, BlockTypeId> {
        BTreeMap::from([("text".to_string(), BlockTypeId::new(2))])
    }

    #[test]
    fn indexes_fields_three_ways() {
        let index = ReferenceIndex::build(&sources(), &[persisted_block()]).unwrap();
        let new_id = BlockTypeId::new(20);
        assert_eq!(index.destination_of(BlockTypeId::new(2)), Some(new_id));
        assert_eq!(index.source_handle(BlockTypeId::new(2)), Some("text"));
        assert_eq!(index.handle_of(new_id, FieldId::new(31)), Some("quotes"));
        assert!(index.field(new_id, "quotes").is_some_and(FieldDefinition::is_sub_table));
        assert!(index.is_unused(new_id, "body"));
    }

    #[test]
    fn marking_used_clears_once() {
        let mut index = ReferenceIndex::build(&sources(), &[persisted_block()]).unwrap();
        let new_id = BlockTypeId::new(20);
        assert!(index.mark_used(new_id, "body"));
        assert!(!index.mark_used(new_id, "body"));
        assert!(!index.is_unused(new_id, "body"));
        assert!(index.is_unused(new_id, "quotes"));
    }

    #[test]
    fn pending_identity_is_rejected() {
        let mut block = persisted_block();
        block.id = Identity::Pending(1);
        let err = ReferenceIndex::build(&sources(), &[block]).unwrap_err();
        assert!(matches!(err, MigrationError::UnpersistedSchema { .. }));
    }
}
