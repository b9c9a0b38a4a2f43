//! Parent/child relationships between the block types of one hierarchical field.

use std::collections::BTreeMap;

use nestflat_model::{BlockTypeDefinition, ChildBlocks};

use crate::error::{MigrationError, Result};

/// Derived view over a hierarchical field's block types.
///
/// Edges come from explicit child lists only; a wildcard child list
/// (`ChildBlocks::All`) allows every block type below it but does not make
/// any block type a non-root.
#[derive(Debug)]
pub struct BlockTypeGraph<'a> {
    block_types: &'a [BlockTypeDefinition],
    parents: BTreeMap<&'a str, Vec<&'a str>>,
}

impl<'a> BlockTypeGraph<'a> {
    pub fn build(block_types: &'a [BlockTypeDefinition]) -> Self {
        let mut parents: BTreeMap<&'a str, Vec<&'a str>> = BTreeMap::new();
        for block in block_types {
            let entry = parents.entry(block.handle.as_str()).or_default();
            for parent in block_types {
                if parent.child_blocks.lists(&block.handle) {
                    entry.push(parent.handle.as_str());
                }
            }
        }
        Self {
            block_types,
            parents,
        }
    }

    /// Handles of the block types that list `handle` as a child.
    pub fn parents_of(&self, handle: &str) -> &[&'a str] {
        self.parents.get(handle).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_top_level(&self, block: &BlockTypeDefinition) -> bool {
        block.top_level || self.parents_of(&block.handle).is_empty()
    }

    /// Top-level block types in definition order.
    pub fn top_level(&self) -> impl Iterator<Item = &'a BlockTypeDefinition> + '_ {
        self.block_types
            .iter()
            .filter(move |block| self.is_top_level(block))
    }

    pub fn get(&self, handle: &str) -> Option<&'a BlockTypeDefinition> {
        self.block_types.iter().find(|block| block.handle == handle)
    }

    /// Block types allowed below `block`, wildcard expanded in definition order.
    pub fn children_of(
        &self,
        block: &BlockTypeDefinition,
    ) -> Result<Vec<&'a BlockTypeDefinition>> {
        match &block.child_blocks {
            ChildBlocks::All => Ok(self.block_types.iter().collect()),
            ChildBlocks::Handles(handles) => handles
                .iter()
                .map(|handle| {
                    self.get(handle)
                        .ok_or_else(|| MigrationError::MissingBlockType {
                            handle: handle.clone(),
                        })
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.block_types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.block_types.is_empty()
    }
}
