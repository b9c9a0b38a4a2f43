//! Stored content: source records of the hierarchical field and the flat
//! records and sub-table rows produced from them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ids::{BlockTypeId, ContentRowId, ElementId, FieldId, Locale, RecordId};

/// Element kind referenced by a relational field.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Entry,
    Asset,
    Category,
    Tag,
    User,
    Other(String),
}

impl ElementKind {
    /// Kinds whose relations are carried over as plain id sets.
    pub fn is_migratable(&self) -> bool {
        matches!(
            self,
            ElementKind::Entry
                | ElementKind::Asset
                | ElementKind::Category
                | ElementKind::Tag
                | ElementKind::User
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub kind: ElementKind,
    pub ids: Vec<ElementId>,
}

/// A value read from a record attribute, classified once at read time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Scalar(serde_json::Value),
    Relation(Relation),
    /// Records of an embedded repeater (composite) field.
    Nested(Vec<ContentRecord>),
}

impl FieldValue {
    pub fn scalar(value: impl Into<serde_json::Value>) -> Self {
        FieldValue::Scalar(value.into())
    }

    pub fn relation(kind: ElementKind, ids: impl IntoIterator<Item = u64>) -> Self {
        FieldValue::Relation(Relation {
            kind,
            ids: ids.into_iter().map(ElementId::new).collect(),
        })
    }

    /// Empty values do not count as "used" when deciding which generated
    /// fields can be removed. `false` and `0` are values.
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Scalar(value) => match value {
                serde_json::Value::Null => true,
                serde_json::Value::String(text) => text.is_empty(),
                serde_json::Value::Array(items) => items.is_empty(),
                serde_json::Value::Object(map) => map.is_empty(),
                serde_json::Value::Bool(_) | serde_json::Value::Number(_) => false,
            },
            FieldValue::Relation(relation) => relation.ids.is_empty(),
            FieldValue::Nested(records) => records.is_empty(),
        }
    }
}

pub type Attributes = BTreeMap<String, FieldValue>;

/// A record of the source (hierarchical) field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentRecord {
    pub id: RecordId,
    pub field_id: FieldId,
    pub type_id: BlockTypeId,
    pub owner_id: ElementId,
    pub locale: Locale,
    /// Parent record for nested blocks; `None` for roots.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<RecordId>,
    #[serde(default)]
    pub sort_order: u32,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub attributes: Attributes,
}

fn default_enabled() -> bool {
    true
}

impl ContentRecord {
    pub fn new(
        id: RecordId,
        field_id: FieldId,
        type_id: BlockTypeId,
        owner_id: ElementId,
        locale: Locale,
    ) -> Self {
        Self {
            id,
            field_id,
            type_id,
            owner_id,
            locale,
            parent_id: None,
            sort_order: 0,
            enabled: true,
            attributes: Attributes::new(),
        }
    }

    #[must_use]
    pub fn with_parent(mut self, parent_id: RecordId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    #[must_use]
    pub fn with_sort_order(mut self, sort_order: u32) -> Self {
        self.sort_order = sort_order;
        self
    }

    #[must_use]
    pub fn with_attribute(mut self, handle: impl Into<String>, value: FieldValue) -> Self {
        self.attributes.insert(handle.into(), value);
        self
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Main record of the flattened (composite) field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatRecord {
    /// `None` until first saved; reused across locales of the same source record.
    pub id: Option<RecordId>,
    /// Existing content row to update instead of inserting one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_row_id: Option<ContentRowId>,
    pub field_id: FieldId,
    pub type_id: BlockTypeId,
    pub owner_id: ElementId,
    pub locale: Locale,
    #[serde(default)]
    pub sort_order: u32,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub attributes: Attributes,
}

/// One row of a generated sub-table, owned by a flat record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubTableRow {
    pub id: Option<RecordId>,
    /// The sub-table field the row belongs to.
    pub field_id: FieldId,
    /// The sub-table field's single block type.
    pub type_id: BlockTypeId,
    pub owner_id: Option<RecordId>,
    pub locale: Locale,
    #[serde(default)]
    pub attributes: Attributes,
}
