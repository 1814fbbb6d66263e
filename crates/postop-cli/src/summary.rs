//! Terminal tables for fields, predictions and model checks.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use postop_model::PredictionReport;
use postop_normalize::{Control, FormField};
use postop_registry::VerifySummary;

/// Probability as a percentage with one decimal.
pub fn format_probability(probability: f64) -> String {
    format!("{:.1}%", probability * 100.0)
}

pub fn report_table(report: &PredictionReport) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Complication"),
        header_cell("Probability"),
        header_cell("Predicted"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Center);
    for (key, result) in report.iter() {
        let probability = match result.probability {
            Some(p) => Cell::new(format_probability(p)).add_attribute(Attribute::Bold),
            None => dim_cell("-"),
        };
        let predicted = match result.label {
            Some(true) => Cell::new("Yes")
                .fg(Color::Red)
                .add_attribute(Attribute::Bold),
            Some(false) => Cell::new("No").fg(Color::Green),
            None => dim_cell("-"),
        };
        table.add_row(vec![Cell::new(key.description()), probability, predicted]);
    }
    table
}

pub fn fields_table(fields: &[FormField]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Variable"),
        header_cell("Label"),
        header_cell("Kind"),
        header_cell("Input"),
        header_cell("Default"),
    ]);
    apply_table_style(&mut table);
    for field in fields {
        let (input, default) = match &field.control {
            Control::Number { default, step } => {
                (format!("number (step {step})"), default.to_string())
            }
            Control::Choice { options, default } => (options.join(" / "), default.clone()),
        };
        table.add_row(vec![
            Cell::new(&field.variable.name).fg(Color::Cyan),
            Cell::new(&field.variable.label),
            dim_cell(field.variable.kind.as_str()),
            Cell::new(input),
            Cell::new(default),
        ]);
    }
    table
}

pub fn verify_table(summary: &VerifySummary) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Complication"),
        header_cell("Artifact"),
        header_cell("Scheme"),
        header_cell("Features"),
        header_cell("Probability"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 3, CellAlignment::Right);
    align_column(&mut table, 4, CellAlignment::Center);
    for model in &summary.models {
        let probability = if model.probability {
            Cell::new("✓").fg(Color::Green).add_attribute(Attribute::Bold)
        } else {
            dim_cell("label only")
        };
        table.add_row(vec![
            Cell::new(model.complication.as_str()).fg(Color::Cyan),
            Cell::new(&model.path),
            Cell::new(&model.scheme),
            Cell::new(model.feature_count),
            probability,
        ]);
    }
    table
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
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

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
