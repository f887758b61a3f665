//! `insp catalog` command - Show the field catalog

use console::style;
use miette::Result;
use serde::Serialize;
use tabled::Tabled;

use crate::cli::output::{effective_format, print_csv, print_json, print_yaml, render_table};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::{Domain, FieldCatalog, FieldKind};

#[derive(clap::Args, Debug)]
pub struct CatalogArgs {
    /// Only list fields of this station: round, flat, dimension, cosmetic
    pub domain: Option<String>,
}

#[derive(Tabled, Serialize)]
struct FieldRow {
    #[tabled(rename = "Domain")]
    domain: &'static str,
    #[tabled(rename = "Kind")]
    kind: &'static str,
    #[tabled(rename = "Field")]
    field: &'static str,
    #[tabled(rename = "Label")]
    label: &'static str,
}

pub fn run(args: CatalogArgs, global: &GlobalOpts) -> Result<()> {
    let catalog = FieldCatalog::standard();
    let domains: Vec<Domain> = match &args.domain {
        Some(name) => vec![catalog.fields_for_name(name)?.domain],
        None => Domain::all().to_vec(),
    };

    let rows: Vec<FieldRow> = domains
        .iter()
        .flat_map(|d| {
            let fields = catalog.fields_for(*d);
            fields.descriptors().iter().map(move |f| FieldRow {
                domain: fields.domain.as_str(),
                kind: match f.kind {
                    FieldKind::Mean => "mean",
                    FieldKind::Test => "test",
                },
                field: f.name,
                label: f.label,
            })
        })
        .collect();

    let format = effective_format(global.output);
    match format {
        OutputFormat::Json => print_json(&rows)?,
        OutputFormat::Yaml => print_yaml(&rows)?,
        OutputFormat::Csv => print_csv(&rows)?,
        OutputFormat::Table | OutputFormat::Md | OutputFormat::Auto => {
            println!("{}", render_table(&rows, format));
            println!(
                "Catalog version {}, {} field(s)",
                style(catalog.version()).cyan(),
                rows.len()
            );
        }
    }
    Ok(())
}
