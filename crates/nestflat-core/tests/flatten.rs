//! Schema pass over hierarchical fields.

mod common;

use insta::assert_snapshot;
use proptest::prelude::*;

use nestflat_core::{MigrationError, Outline, SchemaFlattener};
use nestflat_model::{
    BlockTypeDefinition, ChildBlocks, FieldId, FieldType, LabelOverride, LayoutField, LayoutId,
};
use nestflat_store::LabelTable;

use common::{block, chain_field, handles, hierarchical, leaf, links_field};

fn sub_table_fields(slot: &LayoutField) -> Vec<&str> {
    slot.field
        .sub_table_block_type()
        .map(|block| block.field_handles().collect())
        .unwrap_or_default()
}

#[test]
fn chain_becomes_sibling_sub_tables() {
    let source = chain_field();
    let flattened = SchemaFlattener::new(&source, None).flatten().unwrap();

    assert_eq!(flattened.field.field_type, FieldType::Composite);
    assert_eq!(flattened.field.id, source.id);
    assert_eq!(flattened.field.block_types.len(), 1);
    assert_eq!(flattened.sub_table_count(), 2);
    assert_snapshot!(Outline(&flattened.field).to_string(), @r"
    content [100] composite
      A [new2]
        a1 [new1] PlainText
        B [new5] sub_table (row)
          b1 [new3] PlainText
        C [new8] sub_table (row)
          c1 [new6] PlainText
    ");

    // Everything below B is keyed by the top-level type and B.
    let paths: Vec<String> = flattened.paths["C"].iter().map(ToString::to_string).collect();
    assert_eq!(paths, vec!["1_2"]);
}

#[test]
fn type_reached_through_two_parents_yields_one_sub_table() {
    let source = hierarchical(vec![
        block(1, "A", vec![leaf(11, "a1")]).with_children(ChildBlocks::handles(["B", "C"])),
        block(2, "B", vec![leaf(12, "b1")]).with_children(ChildBlocks::handles(["D"])),
        block(3, "C", vec![leaf(13, "c1")]).with_children(ChildBlocks::handles(["D"])),
        block(4, "D", vec![leaf(14, "d1")]),
    ]);
    let flattened = SchemaFlattener::new(&source, None).flatten().unwrap();

    let top = &flattened.field.block_types[0];
    assert_eq!(handles(&top.fields), vec!["a1", "B", "D", "C"]);
    assert_eq!(flattened.paths["D"].len(), 2);
}

#[test]
fn each_top_level_type_gets_its_own_copy_of_a_shared_child() {
    let source = hierarchical(vec![
        block(1, "A", vec![leaf(11, "a1")]).with_children(ChildBlocks::handles(["C"])),
        block(2, "B", vec![leaf(12, "b1")]).with_children(ChildBlocks::handles(["C"])),
        block(3, "C", vec![leaf(13, "c1")]),
    ]);
    let flattened = SchemaFlattener::new(&source, None).flatten().unwrap();

    let tops: Vec<&str> = flattened
        .field
        .block_types
        .iter()
        .map(|block| block.handle.as_str())
        .collect();
    assert_eq!(tops, vec!["A", "B"]);
    for block in &flattened.field.block_types {
        assert!(block.has_field("C"));
    }
    assert_eq!(flattened.paths["C"].len(), 2);
}

#[test]
fn cycles_and_self_references_terminate() {
    let source = hierarchical(vec![
        block(1, "A", vec![leaf(11, "a1")])
            .with_children(ChildBlocks::handles(["B"]))
            .with_top_level(true),
        block(2, "B", vec![leaf(12, "b1")]).with_children(ChildBlocks::handles(["A", "B"])),
    ]);
    let flattened = SchemaFlattener::new(&source, None).flatten().unwrap();

    assert_eq!(flattened.field.block_types.len(), 1);
    assert_eq!(handles(&flattened.field.block_types[0].fields), vec!["a1", "B"]);
}

#[test]
fn wildcard_children_expand_to_every_other_type() {
    let source = hierarchical(vec![
        block(1, "A", vec![leaf(11, "a1")]).with_children(ChildBlocks::All),
        block(2, "B", vec![leaf(12, "b1")]),
    ]);
    let flattened = SchemaFlattener::new(&source, None).flatten().unwrap();

    // Wildcards add no parent edges, so B stays top-level as well.
    let top = &flattened.field.block_types;
    assert_eq!(top.len(), 2);
    assert_eq!(handles(&top[0].fields), vec!["a1", "B"]);
    assert_eq!(handles(&top[1].fields), vec!["b1"]);
}

#[test]
fn wide_wildcard_schema_visits_each_type_once_per_child() {
    let count = 12u64;
    let source = hierarchical(
        (1..=count)
            .map(|id| {
                block(id, &format!("T{id}"), vec![leaf(100 + id, &format!("f{id}"))])
                    .with_children(ChildBlocks::All)
            })
            .collect(),
    );
    let flattened = SchemaFlattener::new(&source, None).flatten().unwrap();

    let others = (count - 1) as usize;
    assert_eq!(flattened.field.block_types.len(), count as usize);
    for block in &flattened.field.block_types {
        assert_eq!(block.fields.len(), 1 + others);
    }
    // One key per (top-level type, direct child) for every other type.
    for keys in flattened.paths.values() {
        assert_eq!(keys.len(), others * others);
        assert!(keys.iter().all(|key| key.depth() == 1));
    }
}

#[test]
fn types_without_fields_are_traversed_but_not_generated() {
    let source = hierarchical(vec![
        block(1, "A", vec![leaf(11, "a1")]).with_children(ChildBlocks::handles(["group"])),
        block(2, "group", Vec::new()).with_children(ChildBlocks::handles(["C"])),
        block(3, "C", vec![leaf(13, "c1")]),
    ]);
    let flattened = SchemaFlattener::new(&source, None).flatten().unwrap();

    assert_eq!(handles(&flattened.field.block_types[0].fields), vec!["a1", "C"]);
    assert!(!flattened.paths.contains_key("group"));
}

#[test]
fn nested_field_in_layout_becomes_sub_table() {
    let source = hierarchical(vec![block(
        1,
        "A",
        vec![leaf(11, "a1"), links_field(20)],
    )]);
    let flattened = SchemaFlattener::new(&source, None).flatten().unwrap();

    let top = &flattened.field.block_types[0];
    assert_eq!(handles(&top.fields), vec!["a1", "links"]);
    let links = &top.fields[1];
    assert!(links.field.is_sub_table());
    assert_eq!(sub_table_fields(links), vec!["url", "label"]);
}

#[test]
fn translatable_owner_disables_translation_and_labels_apply() {
    let mut source = hierarchical(vec![
        block(
            1,
            "A",
            vec![leaf(11, "a1").with_translatable(true), links_field(20)],
        )
        .with_layout_id(LayoutId::new(9)),
    ]);
    source.translatable = true;
    let mut labels = LabelTable::default();
    labels.insert(
        LayoutId::new(9),
        FieldId::new(11),
        LabelOverride {
            name: Some("Intro".to_string()),
            instructions: Some(String::new()),
        },
    );

    let flattened = SchemaFlattener::new(&source, Some(&labels))
        .flatten()
        .unwrap();

    assert!(flattened.field.translatable);
    let top = &flattened.field.block_types[0];
    let a1 = top.field("a1").unwrap();
    assert!(!a1.translatable);
    assert_eq!(a1.name, "Intro");
    assert_eq!(a1.instructions, None);
}

#[test]
fn unknown_child_handle_fails_the_pass() {
    let source = hierarchical(vec![
        block(1, "A", vec![leaf(11, "a1")]).with_children(ChildBlocks::handles(["missing"])),
    ]);
    let result = SchemaFlattener::new(&source, None).flatten();
    assert!(matches!(
        result,
        Err(MigrationError::MissingBlockType { handle }) if handle == "missing"
    ));
}

/// `levels` levels of `branching` block types each; every type lists all
/// types of the next level as children. Level 0 holds a single type.
fn layered(levels: usize, branching: usize) -> Vec<BlockTypeDefinition> {
    let mut id = 0;
    let mut blocks = Vec::new();
    for level in 0..levels {
        let width = if level == 0 { 1 } else { branching };
        for index in 0..width {
            id += 1;
            let children = if level + 1 < levels {
                ChildBlocks::handles((0..branching).map(|next| format!("L{}_{next}", level + 1)))
            } else {
                ChildBlocks::none()
            };
            blocks.push(
                block(id, &format!("L{level}_{index}"), vec![leaf(
                    1000 + id,
                    &format!("f{level}_{index}"),
                )])
                .with_children(children),
            );
        }
    }
    blocks
}

proptest! {
    #[test]
    fn flattened_schema_never_nests_past_sub_tables(levels in 1usize..7, branching in 1usize..4) {
        let source = hierarchical(layered(levels, branching));
        let flattened = SchemaFlattener::new(&source, None).flatten().unwrap();

        prop_assert_eq!(flattened.field.block_types.len(), 1);
        prop_assert_eq!(flattened.sub_table_count(), (levels - 1) * branching);
        for block in &flattened.field.block_types {
            for slot in &block.fields {
                prop_assert!(!slot.field.is_nesting());
                for inner in slot.field.block_types.iter().flat_map(|b| &b.fields) {
                    prop_assert!(inner.field.field_type.is_leaf());
                }
            }
        }
        for keys in flattened.paths.values() {
            for key in keys {
                prop_assert_eq!(key.depth(), 1);
            }
        }
    }
}
