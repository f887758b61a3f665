//! `insp summary` command - Result totals for a batch

use console::style;
use miette::Result;
use serde::Serialize;
use tabled::Tabled;

use crate::cli::helpers::{format_value, load_config, open_store};
use crate::cli::output::{effective_format, print_csv, print_json, print_yaml, render_table};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::{summarize_batch, BatchSummary, SegmentTotals};

#[derive(clap::Args, Debug)]
pub struct SummaryArgs {
    /// Batch (job) identifier
    pub batch: String,
}

#[derive(Tabled, Serialize)]
struct SegmentRow {
    #[tabled(rename = "Segment")]
    segment: String,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Inspected")]
    inspected: u64,
    #[tabled(rename = "Good")]
    good: u64,
    #[tabled(rename = "Fail")]
    fail_general: u64,
    #[tabled(rename = "Fail OD")]
    fail_od: u64,
    #[tabled(rename = "Backwards")]
    fail_backward: u64,
    #[tabled(rename = "N/A")]
    n_a: u64,
}

impl SegmentRow {
    fn from_totals(totals: &SegmentTotals, label: Option<&str>) -> Self {
        Self {
            segment: label
                .or(totals.segment.as_deref())
                .unwrap_or("-")
                .to_string(),
            date: totals.date.map(|d| d.to_string()).unwrap_or_default(),
            time: totals
                .time
                .map(|t| t.format("%H:%M").to_string())
                .unwrap_or_default(),
            inspected: totals.inspected,
            good: totals.good,
            fail_general: totals.fail_general,
            fail_od: totals.fail_od,
            fail_backward: totals.fail_backward,
            n_a: totals.n_a,
        }
    }
}

pub fn run(args: SummaryArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global)?;
    let store = open_store(&config)?;
    let summary = summarize_batch(&store, &args.batch)?;

    let format = effective_format(global.output);
    match format {
        OutputFormat::Json => print_json(&summary)?,
        OutputFormat::Yaml => print_yaml(&summary)?,
        OutputFormat::Csv => print_csv(rows(&summary))?,
        OutputFormat::Table | OutputFormat::Md | OutputFormat::Auto => {
            if summary.segments.is_empty() {
                println!(
                    "No segments found for batch '{}'.",
                    style(&summary.batch).yellow()
                );
                return Ok(());
            }
            println!(
                "{} {}",
                style("Batch").bold(),
                style(&summary.batch).yellow()
            );
            println!("{}", render_table(rows(&summary), format));

            let p = &summary.percent;
            let precision = config.precision;
            println!(
                "Good {}%  Fail {}%  Fail OD {}%  Backwards {}%  N/A {}%",
                style(format_value(p.good, precision)).green(),
                format_value(p.fail_general, precision),
                format_value(p.fail_od, precision),
                format_value(p.fail_backward, precision),
                format_value(p.n_a, precision)
            );
            println!(
                "Gate homes {}  Lost homing {}",
                summary.totals.gate_homes, summary.totals.lost_homing
            );
        }
    }
    Ok(())
}

/// Segment rows followed by the job total
fn rows(summary: &BatchSummary) -> Vec<SegmentRow> {
    let mut rows: Vec<SegmentRow> = summary
        .segments
        .iter()
        .map(|s| SegmentRow::from_totals(s, None))
        .collect();
    rows.push(SegmentRow::from_totals(&summary.totals, Some("Job Total")));
    rows
}
