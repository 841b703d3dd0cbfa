//! CLI command implementations.

pub mod config;
pub mod run;
pub mod scenarios;

use clap::ValueEnum;

/// How results are written to stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Grouped table with per-scenario plans.
    Table,
    /// Pretty-printed JSON array.
    Json,
}
