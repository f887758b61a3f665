//! `insp stats` command - Weighted statistics for a batch
//!
//! Aggregates the records of one result category and prints the mean and
//! pass-rate tables of each inspection station.

use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use tabled::Tabled;

use crate::cli::helpers::{format_value, limits_marker, load_config, open_store};
use crate::cli::output::{effective_format, print_csv, print_json, print_yaml, render_table};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::{Aggregator, Category, Domain, FieldCatalog, RecordStore, StatsReport};

#[derive(clap::Args, Debug)]
pub struct StatsArgs {
    /// Result category: inspected (or all), good, fail, fail-od, fail-backward, fail-na
    pub category: String,

    /// Batch (job) identifier
    pub batch: String,

    /// Restrict to one segment instead of the whole job
    #[arg(long, short = 's')]
    pub segment: Option<String>,

    /// Only show one station: round, flat, dimension, cosmetic
    #[arg(long, short = 'd')]
    pub domain: Option<String>,
}

#[derive(Tabled)]
struct MeanTableRow {
    #[tabled(rename = "Measurement")]
    label: String,
    #[tabled(rename = "Mean")]
    mean: String,
    #[tabled(rename = "Count")]
    count: u64,
    #[tabled(rename = "Limits")]
    limits: String,
}

#[derive(Tabled)]
struct TestTableRow {
    #[tabled(rename = "Test")]
    label: String,
    #[tabled(rename = "Pass %")]
    value: String,
}

#[derive(Serialize)]
struct CsvRow<'a> {
    domain: &'static str,
    kind: &'static str,
    field: &'a str,
    label: &'a str,
    value: f64,
    count: Option<u64>,
    within_limits: Option<bool>,
}

pub fn run(args: StatsArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global)?;
    let store = open_store(&config)?;

    let category: Category = args.category.parse()?;
    let domains: Vec<Domain> = match &args.domain {
        Some(name) => vec![name.parse()?],
        None => Domain::all().to_vec(),
    };

    let aggregator = Aggregator::with_config(&store, config.aggregator_config());
    let segment = args.segment.as_deref();
    let result = aggregator.aggregate(&args.batch, segment, category)?;

    let mut report = StatsReport::build(
        &FieldCatalog::standard(),
        &args.batch,
        segment,
        category,
        &result,
        &domains,
    )?;
    if let Some(segment) = segment {
        let totals = store
            .query_segment_totals(&args.batch, Some(segment))
            .into_diagnostic()?;
        if let Some(totals) = totals.first() {
            report.describe_segment(totals);
        }
    }
    report.apply_standards(&config.standards);

    let format = effective_format(global.output);
    match format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Yaml => print_yaml(&report)?,
        OutputFormat::Csv => print_csv(csv_rows(&report))?,
        OutputFormat::Table | OutputFormat::Md | OutputFormat::Auto => {
            print_tables(&report, config.precision, format)
        }
    }
    Ok(())
}

fn csv_rows(report: &StatsReport) -> Vec<CsvRow<'_>> {
    let mut rows = Vec::new();
    for domain in &report.domains {
        for row in &domain.means {
            rows.push(CsvRow {
                domain: domain.domain.as_str(),
                kind: "mean",
                field: &row.field,
                label: &row.label,
                value: row.value,
                count: Some(row.count),
                within_limits: row.within_limits,
            });
        }
        for row in &domain.tests {
            rows.push(CsvRow {
                domain: domain.domain.as_str(),
                kind: "test",
                field: &row.field,
                label: &row.label,
                value: row.value,
                count: None,
                within_limits: None,
            });
        }
    }
    rows
}

fn print_tables(report: &StatsReport, precision: usize, format: OutputFormat) {
    let markdown = format == OutputFormat::Md;
    if markdown {
        println!(
            "# {} / {} / {}",
            report.batch,
            report.segment_heading(),
            report.category_name
        );
    } else {
        println!(
            "{} {}  {}  {}",
            style("Batch").bold(),
            style(&report.batch).yellow(),
            style(report.segment_heading()).cyan(),
            style(&report.category_name).bold()
        );
    }
    println!("Units weighted: {}", report.total_weight);

    for domain in &report.domains {
        println!();
        let title = domain.domain.as_str().to_uppercase();
        if markdown {
            println!("## {}", title);
        } else {
            println!("{}", style(title).bold().underlined());
        }

        let means = domain.means.iter().map(|row| MeanTableRow {
            label: row.label.clone(),
            mean: format_value(row.value, precision),
            count: row.count,
            limits: limits_marker(row.within_limits),
        });
        println!("{}", render_table(means, format));

        let tests = domain.tests.iter().map(|row| TestTableRow {
            label: row.label.clone(),
            value: format_value(row.value, precision),
        });
        println!("{}", render_table(tests, format));
    }
}
