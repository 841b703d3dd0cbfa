//! Scenario catalog listing.

use anyhow::Result;
use serde::Serialize;
use slowlab::{ScenarioDefinition, catalog};

use super::OutputFormat;
use crate::style::scenario_table;

#[derive(Serialize)]
struct ScenarioEntry<'a> {
    group: &'a str,
    name: &'a str,
    description: &'a str,
    query: &'a str,
    params: Vec<String>,
}

impl<'a> From<&'a ScenarioDefinition> for ScenarioEntry<'a> {
    fn from(scenario: &'a ScenarioDefinition) -> Self {
        Self {
            group: scenario.group.label(),
            name: scenario.name,
            description: scenario.description,
            query: scenario.query,
            params: scenario.params.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Prints every scenario without touching the store.
pub fn list(format: OutputFormat) -> Result<()> {
    let scenarios = catalog();
    match format {
        OutputFormat::Table => println!("{}", scenario_table(&scenarios)),
        OutputFormat::Json => {
            let entries: Vec<ScenarioEntry<'_>> = scenarios.iter().map(ScenarioEntry::from).collect();
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
    }
    Ok(())
}
