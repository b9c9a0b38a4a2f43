use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use nestflat_model::{MigrationOutcome, MigrationReport};

use crate::types::{InspectResult, MigrateResult};

pub fn print_migration(result: &MigrateResult) {
    println!("Snapshot: {}", result.snapshot.display());
    match &result.outcome {
        MigrationOutcome::Migrated(report) => {
            if let Some(path) = &result.output {
                println!("Output: {}", path.display());
            }
            println!("{}", report_table(report));
            print_removed(report);
            if let Some(outline) = &result.outline {
                println!();
                print!("{outline}");
            }
        }
        MigrationOutcome::NotHierarchical { field_type } => {
            eprintln!("Field is {field_type}, not hierarchical; nothing migrated.");
        }
    }
}

pub fn report_table(report: &MigrationReport) -> Table {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Step"), header_cell("Count")]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    let rows = [
        ("Block types", report.block_types_created),
        ("Sub-table fields", report.sub_table_fields),
        ("Root records", report.roots_processed),
        ("Locale merges", report.locale_merges),
        ("Sub-table rows", report.rows_written),
        ("Fields removed", report.fields_removed.len()),
        ("Block types removed", report.block_types_removed.len()),
        ("Source records deleted", report.source_records_deleted),
    ];
    for (label, count) in rows {
        table.add_row(vec![Cell::new(label), count_cell(count)]);
    }
    table
}

fn print_removed(report: &MigrationReport) {
    if report.fields_removed.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![header_cell("Block type"), header_cell("Removed field")]);
    apply_table_style(&mut table);
    for removed in &report.fields_removed {
        let block_type = removed.block_type_id.to_string();
        let emptied = report.block_types_removed.contains(&removed.block_type_id);
        table.add_row(vec![
            if emptied {
                dim_cell(format!("{block_type} (deleted)"))
            } else {
                Cell::new(block_type)
            },
            Cell::new(&removed.handle),
        ]);
    }
    println!();
    println!("Removed:");
    println!("{table}");
}

pub fn print_inspection(result: &InspectResult) {
    println!("Snapshot: {}", result.snapshot.display());
    println!("Locales: {}", result.locales.join(", "));
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Id"),
        header_cell("Field"),
        header_cell("Type"),
        header_cell("Block types"),
        header_cell("Sub-tables"),
        header_cell("Source roots"),
        header_cell("Flat records"),
    ]);
    apply_summary_table_style(&mut table);
    for index in 3..7 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    for field in &result.fields {
        table.add_row(vec![
            Cell::new(&field.id),
            Cell::new(&field.handle)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            type_cell(&field.field_type),
            Cell::new(field.block_types),
            count_cell(field.sub_tables),
            count_cell(field.source_records),
            count_cell(field.flat_records),
        ]);
    }
    println!("{table}");
    for field in &result.fields {
        println!();
        print!("{}", field.outline);
    }
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(140);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn type_cell(field_type: &str) -> Cell {
    match field_type {
        "hierarchical" => Cell::new(field_type).fg(Color::Yellow),
        "composite" => Cell::new(field_type).fg(Color::Green),
        _ => Cell::new(field_type),
    }
}

fn count_cell(count: usize) -> Cell {
    if count > 0 {
        Cell::new(count).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn dim_cell<T: std::fmt::Display>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
