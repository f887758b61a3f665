//! Command-line arguments

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::batches::BatchesArgs;
use crate::cli::commands::catalog::CatalogArgs;
use crate::cli::commands::completions::CompletionsArgs;
use crate::cli::commands::import::ImportArgs;
use crate::cli::commands::init::InitArgs;
use crate::cli::commands::stats::StatsArgs;
use crate::cli::commands::summary::SummaryArgs;

#[derive(Parser, Debug)]
#[command(
    name = "insp",
    version,
    about = "Weighted statistics over sensor inspection results",
    propagate_version = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command
#[derive(clap::Args, Debug, Clone)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'o', global = true, value_enum, default_value_t = OutputFormat::Auto)]
    pub output: OutputFormat,

    /// Record store database (overrides config and INSP_DATABASE)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the record store and a starter config
    Init(InitArgs),

    /// Load segment totals and records from CSV files
    Import(ImportArgs),

    /// Weighted statistics for a batch and result category
    Stats(StatsArgs),

    /// Result totals and percentages for a batch
    Summary(SummaryArgs),

    /// List batches, optionally for one year or month
    Batches(BatchesArgs),

    /// List the years that have inspection data
    Years,

    /// Show the catalog of measurement and test fields
    Catalog(CatalogArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Table for terminals (default)
    #[default]
    Auto,
    /// Bordered table
    Table,
    /// JSON
    Json,
    /// YAML
    Yaml,
    /// Comma-separated values
    Csv,
    /// Markdown table
    Md,
}
