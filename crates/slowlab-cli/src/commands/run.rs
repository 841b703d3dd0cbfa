//! Seed the store, run the scenario catalog and report.

use anyhow::{Context, Result, bail};
use indicatif::ProgressBar;
use serde::Serialize;
use slowlab::{
    AbortFlag, PopulateError, PopulationTargets, Populator, RunnerOptions, ScenarioResult,
    ScenarioRunner, SeedConfig, catalog,
};
use slowlab_config::{LabConfig, SeedSettings};
use slowlab_store::{DuckDbStore, OrderStore};
use slowlab_types::OrderFilter;
use tracing::{info, warn};

use super::OutputFormat;
use crate::style::{
    create_spinner, finish_error, finish_success, print_heading, print_indented, print_info_table,
    print_results_table, print_spacer, print_warn,
};

/// Stages of a run the user can skip.
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub skip_seed: bool,
    pub skip_scenarios: bool,
    pub format: OutputFormat,
}

/// JSON shape of one scenario result.
#[derive(Serialize)]
struct ResultEntry<'a> {
    group: &'a str,
    name: &'a str,
    description: &'a str,
    duration_ms: f64,
    rows: u64,
    status: String,
    plan: &'a [String],
}

impl<'a> From<&'a ScenarioResult> for ResultEntry<'a> {
    fn from(result: &'a ScenarioResult) -> Self {
        Self {
            group: result.group.label(),
            name: result.name,
            description: result.description,
            duration_ms: result.duration.as_secs_f64() * 1_000.0,
            rows: result.row_count,
            status: result.status(),
            plan: &result.plan,
        }
    }
}

/// Maps the `[seed]` section onto populator settings.
pub fn seed_config(settings: &SeedSettings) -> SeedConfig {
    SeedConfig {
        targets: PopulationTargets {
            orders: settings.orders,
            hot_customer: settings.hot_customer,
            hot_phone: settings.hot_phone,
            date_range: settings.date_range,
        },
        batch_size: settings.batch_size,
        seed: settings.seed,
    }
}

pub fn run(config: &LabConfig, options: RunOptions) -> Result<()> {
    let abort = AbortFlag::new();
    abort
        .register_signal_handlers()
        .context("Failed to install signal handlers")?;

    let settings = config.store.settings()?;
    let mut store = DuckDbStore::open(&config.store.database, &settings)
        .context("Failed to open the order store")?;
    store
        .ensure_schema()
        .context("Failed to create the orders schema")?;

    let requested = seed_config(&config.seed);
    if requested.orders_below_minimum() {
        let minimum = requested.targets.hot_customer;
        warn!(
            requested = requested.targets.orders,
            minimum, "orders raised to the hot-customer target"
        );
        print_warn(&format!(
            "--orders {} is below the hot-customer target; using {minimum}",
            requested.targets.orders
        ));
    }
    let populator = Populator::new(requested).with_abort(abort.clone());

    if !options.skip_seed {
        seed(&populator, &mut store)?;
    }
    report_dataset(&mut store, populator.config())?;

    if options.skip_scenarios {
        return Ok(());
    }

    let runner = ScenarioRunner::new(populator).with_options(RunnerOptions {
        capture_plans: config.run.explain,
    });
    let results = runner.run(&mut store, &catalog());
    let failures = results.iter().filter(|r| !r.is_ok()).count();
    info!(scenarios = results.len(), failures, "scenario run finished");

    match options.format {
        OutputFormat::Table => print_table(&results, config.run.explain),
        OutputFormat::Json => {
            let entries: Vec<ResultEntry<'_>> = results.iter().map(ResultEntry::from).collect();
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
    }

    if abort.is_raised() {
        bail!("interrupted before all scenarios completed");
    }
    Ok(())
}

/// Runs every population behind a spinner.
fn seed(populator: &Populator, store: &mut DuckDbStore) -> Result<()> {
    let spinner = create_spinner("Seeding general orders...");
    match seed_populations(populator, store, &spinner) {
        Ok(inserted) => {
            finish_success(&spinner, &format!("Seeding complete ({inserted} rows inserted)"));
            Ok(())
        }
        Err(err) => {
            finish_error(&spinner, "Seeding failed");
            Err(err).context("Failed to seed the dataset")
        }
    }
}

fn seed_populations(
    populator: &Populator,
    store: &mut DuckDbStore,
    spinner: &ProgressBar,
) -> Result<u64, PopulateError> {
    let mut inserted = populator.seed_orders(store)?;
    spinner.set_message("Cloning hot-customer orders...");
    inserted += populator.ensure_hot_customer_orders(store)?;
    spinner.set_message("Seeding hot-phone orders...");
    inserted += populator.ensure_hot_phone_orders(store)?;
    spinner.set_message("Seeding date-range orders...");
    inserted += populator.ensure_date_range_orders(store)?;
    Ok(inserted)
}

fn report_dataset(store: &mut DuckDbStore, config: &SeedConfig) -> Result<()> {
    let total = store
        .count(&OrderFilter::All)
        .context("Failed to count orders")?;
    let targets = config.targets;
    let expected_minimum = targets.orders + targets.hot_phone + targets.date_range;
    info!(total, expected_minimum, "dataset ready");
    if total < expected_minimum {
        warn!(total, expected_minimum, "dataset is below its targets");
    }

    print_info_table(&[
        ("Store", store.name().to_string()),
        ("Total orders", total.to_string()),
        ("Expected minimum", expected_minimum.to_string()),
    ]);
    Ok(())
}

fn print_table(results: &[ScenarioResult], explain: bool) {
    if explain {
        for result in results {
            print_heading(&format!("Plan: {}", result.name));
            for line in plan_lines(result) {
                print_indented(&line);
            }
            print_spacer();
        }
    }
    print_results_table(results);
}

/// Plan text for one scenario, or a note when the scenario errored.
fn plan_lines(result: &ScenarioResult) -> Vec<String> {
    match &result.error {
        Some(err) => vec![format!("skipped explain due to error: {err}")],
        None => result
            .plan
            .iter()
            .flat_map(|line| line.lines().map(str::to_string))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_config_maps_every_field() {
        let settings = SeedSettings {
            orders: 10,
            batch_size: 3,
            seed: 9,
            hot_customer: 20,
            hot_phone: 4,
            date_range: 5,
        };
        let config = seed_config(&settings);
        assert_eq!(config.targets.orders, 10);
        assert_eq!(config.targets.hot_customer, 20);
        assert_eq!(config.targets.hot_phone, 4);
        assert_eq!(config.targets.date_range, 5);
        assert_eq!(config.batch_size, 3);
        assert_eq!(config.seed, 9);
        assert!(config.orders_below_minimum());
    }

    fn result(plan: &[&str], error: Option<slowlab::ScenarioError>) -> ScenarioResult {
        ScenarioResult {
            group: slowlab::ScenarioGroup::TypeMatching,
            name: "type-matched",
            description: "",
            duration: std::time::Duration::ZERO,
            row_count: 0,
            plan: plan.iter().map(ToString::to_string).collect(),
            error,
        }
    }

    #[test]
    fn test_plan_lines_split_multiline_plans() {
        let lines = plan_lines(&result(&["a=1\nb=2", "c=3"], None));
        assert_eq!(lines, vec!["a=1", "b=2", "c=3"]);
    }

    #[test]
    fn test_plan_lines_note_errored_scenarios() {
        let lines = plan_lines(&result(&[], Some(slowlab::ScenarioError::Aborted)));
        assert_eq!(lines, vec!["skipped explain due to error: aborted"]);
    }
}
