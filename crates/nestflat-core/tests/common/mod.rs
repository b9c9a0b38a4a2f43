#![allow(dead_code)]

use nestflat_model::{
    BlockTypeDefinition, BlockTypeId, ChildBlocks, ContentRecord, ElementId, FieldDefinition,
    FieldId, FieldType, FieldValue, Identity, LayoutField, Locale, RecordId,
};
use nestflat_store::MemoryStore;

pub const FIELD: u64 = 100;
pub const OWNER: u64 = 500;

pub fn en() -> Locale {
    Locale::new("en").unwrap()
}

pub fn fr() -> Locale {
    Locale::new("fr").unwrap()
}

pub fn leaf(id: u64, handle: &str) -> FieldDefinition {
    FieldDefinition::leaf(id, handle, "PlainText")
}

pub fn block(id: u64, handle: &str, fields: Vec<FieldDefinition>) -> BlockTypeDefinition {
    BlockTypeDefinition::persisted(id, handle).with_fields(fields)
}

pub fn hierarchical(block_types: Vec<BlockTypeDefinition>) -> FieldDefinition {
    FieldDefinition::new(
        Identity::Persisted(FieldId::new(FIELD)),
        "content",
        "Content",
        FieldType::Hierarchical,
    )
    .with_block_types(block_types)
}

/// A → B → C, each block type holding one leaf (`a1`, `b1`, `c1`).
pub fn chain_field() -> FieldDefinition {
    hierarchical(vec![
        block(1, "A", vec![leaf(11, "a1")]).with_children(ChildBlocks::handles(["B"])),
        block(2, "B", vec![leaf(12, "b1")]).with_children(ChildBlocks::handles(["C"])),
        block(3, "C", vec![leaf(13, "c1")]),
    ])
}

/// Composite field with one block type, used as a nested field inside a layout.
pub fn links_field(id: u64) -> FieldDefinition {
    FieldDefinition::new(
        Identity::Persisted(FieldId::new(id)),
        "links",
        "Links",
        FieldType::Composite,
    )
    .with_block_types(vec![block(
        id + 1,
        "link",
        vec![leaf(id + 2, "url"), leaf(id + 3, "label")],
    )])
}

pub fn record(id: u64, type_id: u64, locale: Locale) -> ContentRecord {
    ContentRecord::new(
        RecordId::new(id),
        FieldId::new(FIELD),
        BlockTypeId::new(type_id),
        ElementId::new(OWNER),
        locale,
    )
}

pub fn text(value: &str) -> FieldValue {
    FieldValue::scalar(value)
}

/// One root of type A with a B child and a C grandchild, all in `locale`.
pub fn chain_records(locale: Locale) -> Vec<ContentRecord> {
    vec![
        record(1000, 1, locale.clone()).with_attribute("a1", text("hello")),
        record(1001, 2, locale.clone())
            .with_parent(RecordId::new(1000))
            .with_attribute("b1", text("x")),
        record(1002, 3, locale)
            .with_parent(RecordId::new(1001))
            .with_attribute("c1", text("y")),
    ]
}

pub fn chain_store() -> MemoryStore {
    MemoryStore::new(vec![en()])
        .with_field(chain_field())
        .with_records(chain_records(en()))
}

/// Destination block type replacing the top-level block type `handle`.
pub fn destination_block<'a>(store: &'a MemoryStore, handle: &str) -> &'a BlockTypeDefinition {
    store
        .field(FieldId::new(FIELD))
        .and_then(|field| field.block_type(handle))
        .expect("destination block type")
}

pub fn field_id_of(block: &BlockTypeDefinition, handle: &str) -> FieldId {
    block
        .field(handle)
        .and_then(|field| field.id.persisted())
        .expect("persisted field")
}

pub fn handles(fields: &[LayoutField]) -> Vec<&str> {
    fields.iter().map(|slot| slot.field.handle.as_str()).collect()
}
