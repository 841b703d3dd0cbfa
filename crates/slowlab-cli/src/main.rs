//! slowlab command-line runner.
//!
//! Seeds an `orders` table with synthetic data and runs paired slow/fast
//! queries that expose classic indexing pitfalls.
//!
//! # Quick Start
//!
//! ```bash
//! # Full demonstration scale (about two million rows)
//! slowlab
//!
//! # Reuse an existing dataset and skip plan capture
//! slowlab --skip-seed --explain false
//!
//! # Small in-memory run as JSON
//! slowlab --database :memory: --hot-customer 5000 --orders 5000 --format json
//! ```

mod commands;
mod style;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use commands::OutputFormat;
use commands::run::RunOptions;
use slowlab_config::{ConfigLoader, LabConfig};

/// slowlab - reproducible lab for indexing pitfalls.
#[derive(Parser)]
#[command(name = "slowlab")]
#[command(author, version, long_about = None)]
#[command(about = "Reproducible lab for indexing pitfalls")]
struct Cli {
    /// General population target. Raised to the hot-customer target if lower.
    #[arg(long)]
    orders: Option<u64>,

    /// Rows per insert statement (0 means 1000).
    #[arg(long)]
    batch: Option<usize>,

    /// Seed for the data generator.
    #[arg(long)]
    seed: Option<u64>,

    /// Rows owned by the hot customer.
    #[arg(long, value_name = "N")]
    hot_customer: Option<u64>,

    /// Rows sharing the hot phone number.
    #[arg(long, value_name = "N")]
    hot_phone: Option<u64>,

    /// Rows created on 2024-01-01.
    #[arg(long, value_name = "N")]
    date_range: Option<u64>,

    /// Database file, or :memory: for a transient store.
    #[arg(long, value_name = "PATH")]
    database: Option<String>,

    /// Directory holding slowlab.toml and slowlab.local.toml.
    #[arg(long, value_name = "DIR")]
    project_dir: Option<PathBuf>,

    /// Skip seeding and use the data already in the store.
    #[arg(long)]
    skip_seed: bool,

    /// Stop after seeding.
    #[arg(long)]
    skip_scenarios: bool,

    /// Capture a query plan for each scenario.
    #[arg(long, value_name = "BOOL", num_args = 0..=1, default_missing_value = "true")]
    explain: Option<bool>,

    /// Output format for results.
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Print the scenario catalog and exit.
    #[arg(long)]
    list_scenarios: bool,

    /// Print the effective configuration and exit.
    #[arg(long)]
    show_config: bool,

    /// Disable colored output.
    #[arg(long)]
    no_color: bool,
}

impl Cli {
    /// Loads layered configuration and applies flags on top.
    fn config(&self) -> Result<LabConfig> {
        let mut loader = ConfigLoader::new();
        if let Some(dir) = &self.project_dir {
            loader = loader.with_project_dir(dir);
        }
        let mut config = loader.load().context("Failed to load configuration")?;

        if let Some(database) = &self.database {
            config.store.database.clone_from(database);
        }
        if let Some(orders) = self.orders {
            config.seed.orders = orders;
        }
        if let Some(batch) = self.batch {
            config.seed.batch_size = batch;
        }
        if let Some(seed) = self.seed {
            config.seed.seed = seed;
        }
        if let Some(hot_customer) = self.hot_customer {
            config.seed.hot_customer = hot_customer;
        }
        if let Some(hot_phone) = self.hot_phone {
            config.seed.hot_phone = hot_phone;
        }
        if let Some(date_range) = self.date_range {
            config.seed.date_range = date_range;
        }
        if let Some(explain) = self.explain {
            config.run.explain = explain;
        }
        config.normalize();
        Ok(config)
    }
}

fn run(cli: &Cli) -> Result<()> {
    if cli.list_scenarios {
        return commands::scenarios::list(cli.format);
    }

    let config = cli.config()?;
    if cli.show_config {
        return commands::config::show(&config);
    }

    commands::run::run(&config, RunOptions {
        skip_seed: cli.skip_seed,
        skip_scenarios: cli.skip_scenarios,
        format: cli.format,
    })
}

fn main() -> ExitCode {
    // Logs go to stderr so stdout carries only results.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    if cli.no_color {
        style::set_no_color(true);
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            style::print_error(&format!("{err:#}"));
            ExitCode::FAILURE
        }
    }
}
