//! `insp batches` and `insp years` commands - Browse batches by date

use console::style;
use miette::Result;
use serde::Serialize;
use tabled::Tabled;

use crate::cli::helpers::{load_config, open_store, truncate_str};
use crate::cli::output::{effective_format, print_csv, print_json, print_yaml, render_table};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::{list_batches, list_years, BatchListing};

#[derive(clap::Args, Debug)]
pub struct BatchesArgs {
    /// Only batches with segments in this year
    #[arg(long, short = 'y')]
    pub year: Option<i32>,

    /// Only batches with segments in this month (needs --year)
    #[arg(long, short = 'm', requires = "year", value_parser = clap::value_parser!(u32).range(1..=12))]
    pub month: Option<u32>,
}

#[derive(Tabled, Serialize)]
struct BatchRow {
    #[tabled(rename = "Batch")]
    batch: String,
    #[tabled(rename = "First")]
    first_date: String,
    #[tabled(rename = "Last")]
    last_date: String,
    #[tabled(rename = "Segments")]
    segments: usize,
    #[tabled(rename = "Inspected")]
    inspected: u64,
}

impl From<&BatchListing> for BatchRow {
    fn from(listing: &BatchListing) -> Self {
        Self {
            batch: truncate_str(&listing.batch, 32),
            first_date: listing
                .first_date
                .map(|d| d.to_string())
                .unwrap_or_default(),
            last_date: listing
                .last_date
                .map(|d| d.to_string())
                .unwrap_or_default(),
            segments: listing.segments,
            inspected: listing.inspected,
        }
    }
}

pub fn run(args: BatchesArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global)?;
    let store = open_store(&config)?;
    let batches = list_batches(&store, args.year, args.month)?;

    let format = effective_format(global.output);
    match format {
        OutputFormat::Json => print_json(&batches)?,
        OutputFormat::Yaml => print_yaml(&batches)?,
        OutputFormat::Csv => print_csv(batches.iter().map(BatchRow::from))?,
        OutputFormat::Table | OutputFormat::Md | OutputFormat::Auto => {
            if batches.is_empty() {
                println!("No batches found.");
                return Ok(());
            }
            println!(
                "{}",
                render_table(batches.iter().map(BatchRow::from), format)
            );
            println!("{} batch(es)", style(batches.len()).cyan());
        }
    }
    Ok(())
}

pub fn run_years(global: &GlobalOpts) -> Result<()> {
    let config = load_config(global)?;
    let store = open_store(&config)?;
    let years = list_years(&store)?;

    match effective_format(global.output) {
        OutputFormat::Json => print_json(&years)?,
        OutputFormat::Yaml => print_yaml(&years)?,
        _ => {
            for year in &years {
                println!("{}", year);
            }
        }
    }
    Ok(())
}
