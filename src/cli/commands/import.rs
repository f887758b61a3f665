//! `insp import` command - Load CSV exports into the record store

use console::style;
use miette::Result;
use std::path::PathBuf;

use crate::cli::helpers::{load_config, open_store};
use crate::cli::output::{effective_format, print_json, print_yaml};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::{import_dir, import_file};

#[derive(clap::Args, Debug)]
pub struct ImportArgs {
    /// Directory (searched recursively) or single CSV file to import
    pub path: PathBuf,
}

pub fn run(args: ImportArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global)?;
    let mut store = open_store(&config)?;

    if !args.path.exists() {
        return Err(miette::miette!(
            "Import path '{}' does not exist",
            args.path.display()
        ));
    }

    let stats = if args.path.is_dir() {
        import_dir(&mut store, &args.path)?
    } else {
        import_file(&mut store, &args.path)?
    };

    match effective_format(global.output) {
        OutputFormat::Json => print_json(&stats)?,
        OutputFormat::Yaml => print_yaml(&stats)?,
        _ => {
            println!(
                "{} Imported {} file(s) from {}",
                style("✓").green(),
                style(stats.files).cyan(),
                style(args.path.display()).yellow()
            );
            println!("  segments:   {}", stats.segments);
            println!("  counts:     {}", stats.counts);
            println!("  means:      {}", stats.means);
            println!("  pass rates: {}", stats.pass_rates);
            if stats.skipped_files > 0 {
                println!(
                    "  {} file(s) skipped (not a recognized export)",
                    style(stats.skipped_files).dim()
                );
            }
        }
    }
    Ok(())
}
