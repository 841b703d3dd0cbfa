//! Table formatting using comfy-table.

use std::time::Duration;

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use slowlab::{ScenarioDefinition, ScenarioResult};

/// Descriptions longer than this are cut and suffixed with `...`.
pub const DESCRIPTION_WIDTH: usize = 40;

fn styled_table(columns: &[&str]) -> Table {
    let mut table = Table::new();

    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);

    let header_cells: Vec<Cell> = columns
        .iter()
        .map(|col| {
            if super::no_color() {
                Cell::new(col)
            } else {
                Cell::new(col)
                    .add_attribute(Attribute::Bold)
                    .fg(Color::Cyan)
            }
        })
        .collect();
    table.set_header(header_cells);

    table
}

/// Shortens `text` to [`DESCRIPTION_WIDTH`] characters.
pub fn truncate(text: &str) -> String {
    if text.chars().count() <= DESCRIPTION_WIDTH {
        return text.to_string();
    }
    let kept: String = text.chars().take(DESCRIPTION_WIDTH - 3).collect();
    format!("{kept}...")
}

pub fn format_duration(duration: Duration) -> String {
    format!("{:.3} ms", duration.as_secs_f64() * 1_000.0)
}

/// Creates the results table. The comparison group is printed once, on the
/// first row of each group.
pub fn results_table(results: &[ScenarioResult]) -> Table {
    let mut table = styled_table(&["Type", "Name", "Description", "Duration", "Rows", "Status"]);

    let mut previous_group = None;
    for result in results {
        let group = if previous_group == Some(result.group) {
            String::new()
        } else {
            result.group.label().to_string()
        };
        previous_group = Some(result.group);

        let status = Cell::new(result.status());
        let status = match (super::no_color(), result.is_ok()) {
            (true, _) => status,
            (false, true) => status.fg(Color::Green),
            (false, false) => status.fg(Color::Red),
        };

        table.add_row(vec![
            Cell::new(group),
            Cell::new(result.name),
            Cell::new(truncate(result.description)),
            Cell::new(format_duration(result.duration)).set_alignment(CellAlignment::Right),
            Cell::new(result.row_count).set_alignment(CellAlignment::Right),
            status,
        ]);
    }

    table
}

pub fn print_results_table(results: &[ScenarioResult]) {
    println!("{}", results_table(results));
}

/// Creates the scenario listing table.
pub fn scenario_table(scenarios: &[ScenarioDefinition]) -> Table {
    let mut table = styled_table(&["Type", "Name", "Query"]);
    for scenario in scenarios {
        table.add_row(vec![
            scenario.group.label(),
            scenario.name,
            scenario.query,
        ]);
    }
    table
}

/// Creates a key-value info table (two columns: key and value).
pub fn info_table(entries: &[(&str, String)]) -> Table {
    let mut table = Table::new();

    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);

    for (key, value) in entries {
        let key_cell = if super::no_color() {
            Cell::new(key)
        } else {
            Cell::new(key).fg(Color::DarkGrey)
        };
        table.add_row(vec![key_cell, Cell::new(value)]);
    }

    table
}

pub fn print_info_table(entries: &[(&str, String)]) {
    println!("{}", info_table(entries));
}
