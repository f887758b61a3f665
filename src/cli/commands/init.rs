//! `insp init` command - Create the record store

use console::style;
use miette::{IntoDiagnostic, Result};
use std::fs;
use std::path::Path;

use crate::cli::helpers::load_config;
use crate::cli::GlobalOpts;
use crate::core::config::LOCAL_DIR;
use crate::core::SqliteStore;

const CONFIG_TEMPLATE: &str = "\
# insp configuration
#
# database: .insp/inspection.db
# precision: 2
#
# What to do with a mean record that has no matching count record:
# fail (default) or skip
# missing_weight: fail
#
# Acceptance limits for mean fields
# standards:
#   flat_chip_area:
#     max: 0.5
";

#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Do not write a starter .insp/config.yaml
    #[arg(long)]
    pub no_config: bool,
}

pub fn run(args: InitArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global)?;
    let existed = config.database.exists();

    let store = SqliteStore::open(&config.database).into_diagnostic()?;
    let version = store.catalog_version().into_diagnostic()?;

    if existed {
        println!(
            "{} Record store already exists at {}",
            style("•").cyan(),
            style(config.database.display()).yellow()
        );
    } else {
        println!(
            "{} Created record store at {}",
            style("✓").green(),
            style(config.database.display()).yellow()
        );
    }
    if let Some(version) = version {
        println!("  catalog version {}", version);
    }

    if !args.no_config {
        let config_path = Path::new(LOCAL_DIR).join("config.yaml");
        if !config_path.exists() {
            fs::create_dir_all(LOCAL_DIR).into_diagnostic()?;
            fs::write(&config_path, CONFIG_TEMPLATE).into_diagnostic()?;
            println!(
                "{} Wrote {}",
                style("✓").green(),
                style(config_path.display()).yellow()
            );
        }
    }

    println!();
    println!(
        "Load data with: {}",
        style("insp import <directory>").cyan()
    );
    Ok(())
}
