//! Indented text rendering of a field definition tree.

use std::fmt;

use nestflat_model::{BlockTypeDefinition, FieldDefinition, LayoutField};

/// Displays a field, its block types and their layouts, one line each.
///
/// ```text
/// blocks [7] composite
///   heading [new1]
///     title* [new2] PlainText
///     quotes [new3] sub_table (row)
/// ```
///
/// `*` marks a required layout slot, `~` a translatable field.
pub struct Outline<'a>(pub &'a FieldDefinition);

impl fmt::Display for Outline<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = self.0;
        writeln!(f, "{} [{}] {}", field.handle, field.id, field.field_type)?;
        for block in &field.block_types {
            write_block(f, block, 1)?;
        }
        Ok(())
    }
}

fn write_block(
    f: &mut fmt::Formatter<'_>,
    block: &BlockTypeDefinition,
    depth: usize,
) -> fmt::Result {
    let indent = "  ".repeat(depth);
    writeln!(f, "{indent}{} [{}]", block.handle, block.id)?;
    for slot in &block.fields {
        write_slot(f, slot, depth + 1)?;
    }
    Ok(())
}

fn write_slot(f: &mut fmt::Formatter<'_>, slot: &LayoutField, depth: usize) -> fmt::Result {
    let indent = "  ".repeat(depth);
    let field = &slot.field;
    let required = if slot.required { "*" } else { "" };
    let translatable = if field.translatable { "~" } else { "" };
    write!(
        f,
        "{indent}{}{required}{translatable} [{}] {}",
        field.handle, field.id, field.field_type
    )?;
    if let Some(layout) = field.sub_table_block_type().and_then(|block| block.layout) {
        write!(f, " ({})", layout.as_str())?;
    }
    writeln!(f)?;
    if field.is_sub_table() {
        for slot in field.block_types.iter().flat_map(|block| &block.fields) {
            write_slot(f, slot, depth + 1)?;
        }
    } else {
        for block in &field.block_types {
            write_block(f, block, depth + 1)?;
        }
    }
    Ok(())
}
