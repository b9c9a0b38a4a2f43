//! Field and block-type definitions.
//!
//! A field either stores a leaf value (`FieldType::Leaf`) or owns an ordered
//! set of block types whose layouts contain further fields. `Composite` and
//! `Hierarchical` are the nesting types the flattener rewrites; `SubTable` is
//! the generated, non-nesting type holding exactly one block type.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ids::{BlockTypeId, FieldGroupId, FieldId, Identity, LayoutId};

/// Leaf type tag whose stored option list is positional and must be re-keyed on copy.
pub const POSITION_SELECT: &str = "PositionSelect";

/// Free-form, type-specific field settings.
pub type Settings = BTreeMap<String, serde_json::Value>;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "tag", rename_all = "snake_case")]
pub enum FieldType {
    /// A value-holding field, tagged with its storage type (e.g. `PlainText`).
    Leaf(String),
    /// Repeatable blocks without further nesting between block types.
    Composite,
    /// Repeatable blocks that may contain child blocks of other block types.
    Hierarchical,
    /// Generated single-block-type table embedding flattened leaf fields.
    SubTable,
}

impl FieldType {
    pub fn leaf(tag: impl Into<String>) -> Self {
        FieldType::Leaf(tag.into())
    }

    /// Returns true for the structural types that denote nested layouts.
    pub fn is_nesting(&self) -> bool {
        matches!(self, FieldType::Composite | FieldType::Hierarchical)
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, FieldType::Leaf(_))
    }

    pub fn as_str(&self) -> &str {
        match self {
            FieldType::Leaf(tag) => tag,
            FieldType::Composite => "composite",
            FieldType::Hierarchical => "hierarchical",
            FieldType::SubTable => "sub_table",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub id: Identity<FieldId>,
    /// Unique within the owning layout.
    pub handle: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub translatable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<FieldGroupId>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub settings: Settings,
    /// Block types owned by structural fields; always empty for leaves.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub block_types: Vec<BlockTypeDefinition>,
}

impl FieldDefinition {
    pub fn new(
        id: Identity<FieldId>,
        handle: impl Into<String>,
        name: impl Into<String>,
        field_type: FieldType,
    ) -> Self {
        Self {
            id,
            handle: handle.into(),
            name: name.into(),
            instructions: None,
            field_type,
            required: false,
            translatable: false,
            group_id: None,
            settings: Settings::new(),
            block_types: Vec::new(),
        }
    }

    /// Builds a persisted leaf field.
    pub fn leaf(id: u64, handle: impl Into<String>, tag: impl Into<String>) -> Self {
        let handle = handle.into();
        let name = handle.clone();
        Self::new(
            Identity::Persisted(FieldId::new(id)),
            handle,
            name,
            FieldType::leaf(tag),
        )
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_setting(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.settings.insert(key.into(), value);
        self
    }

    #[must_use]
    pub fn with_translatable(mut self, translatable: bool) -> Self {
        self.translatable = translatable;
        self
    }

    #[must_use]
    pub fn with_group(mut self, group_id: FieldGroupId) -> Self {
        self.group_id = Some(group_id);
        self
    }

    #[must_use]
    pub fn with_block_types(mut self, block_types: Vec<BlockTypeDefinition>) -> Self {
        self.block_types = block_types;
        self
    }

    pub fn is_nesting(&self) -> bool {
        self.field_type.is_nesting()
    }

    pub fn is_sub_table(&self) -> bool {
        self.field_type == FieldType::SubTable
    }

    /// The single block type of a generated sub-table field.
    pub fn sub_table_block_type(&self) -> Option<&BlockTypeDefinition> {
        if self.is_sub_table() {
            self.block_types.first()
        } else {
            None
        }
    }

    pub fn block_type(&self, handle: &str) -> Option<&BlockTypeDefinition> {
        self.block_types.iter().find(|block| block.handle == handle)
    }
}

/// Which block types may be placed below a block of a hierarchical field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChildBlocks {
    /// Wildcard: every block type of the field.
    All,
    Handles(Vec<String>),
}

impl ChildBlocks {
    pub fn none() -> Self {
        ChildBlocks::Handles(Vec::new())
    }

    pub fn handles<I, S>(handles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ChildBlocks::Handles(handles.into_iter().map(Into::into).collect())
    }

    /// True when `handle` is named in an explicit child list. The wildcard
    /// names no handle.
    pub fn lists(&self, handle: &str) -> bool {
        match self {
            ChildBlocks::All => false,
            ChildBlocks::Handles(handles) => handles.iter().any(|h| h == handle),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, ChildBlocks::Handles(handles) if handles.is_empty())
    }
}

impl Default for ChildBlocks {
    fn default() -> Self {
        Self::none()
    }
}

/// Presentation style of a generated sub-table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubTableLayout {
    #[default]
    Table,
    Row,
}

impl SubTableLayout {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubTableLayout::Table => "table",
            SubTableLayout::Row => "row",
        }
    }
}

/// A field placed in a block type's layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutField {
    pub field: FieldDefinition,
    /// Required flag of the layout slot, independent of the field itself.
    #[serde(default)]
    pub required: bool,
}

impl LayoutField {
    pub fn new(field: FieldDefinition) -> Self {
        Self {
            field,
            required: false,
        }
    }

    pub fn required(field: FieldDefinition) -> Self {
        Self {
            field,
            required: true,
        }
    }
}

impl From<FieldDefinition> for LayoutField {
    fn from(field: FieldDefinition) -> Self {
        Self::new(field)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockTypeDefinition {
    pub id: Identity<BlockTypeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_id: Option<FieldId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_id: Option<LayoutId>,
    /// Unique within the owning field.
    pub handle: String,
    pub name: String,
    #[serde(default)]
    pub fields: Vec<LayoutField>,
    #[serde(default)]
    pub child_blocks: ChildBlocks,
    #[serde(default)]
    pub top_level: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<SubTableLayout>,
}

impl BlockTypeDefinition {
    pub fn new(
        id: Identity<BlockTypeId>,
        handle: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id,
            field_id: None,
            layout_id: None,
            handle: handle.into(),
            name: name.into(),
            fields: Vec::new(),
            child_blocks: ChildBlocks::none(),
            top_level: false,
            layout: None,
        }
    }

    /// Builds a persisted block type whose name equals its handle.
    pub fn persisted(id: u64, handle: impl Into<String>) -> Self {
        let handle = handle.into();
        let name = handle.clone();
        Self::new(Identity::Persisted(BlockTypeId::new(id)), handle, name)
    }

    #[must_use]
    pub fn with_fields<I, F>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<LayoutField>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_children(mut self, child_blocks: ChildBlocks) -> Self {
        self.child_blocks = child_blocks;
        self
    }

    #[must_use]
    pub fn with_top_level(mut self, top_level: bool) -> Self {
        self.top_level = top_level;
        self
    }

    #[must_use]
    pub fn with_layout_id(mut self, layout_id: LayoutId) -> Self {
        self.layout_id = Some(layout_id);
        self
    }

    pub fn field(&self, handle: &str) -> Option<&FieldDefinition> {
        self.fields
            .iter()
            .map(|slot| &slot.field)
            .find(|field| field.handle == handle)
    }

    pub fn has_field(&self, handle: &str) -> bool {
        self.field(handle).is_some()
    }

    pub fn field_handles(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|slot| slot.field.handle.as_str())
    }
}

/// Name/instructions replacement for a field inside one layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelOverride {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub instructions: Option<String>,
}
