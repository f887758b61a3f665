//! Output formatting utilities

use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::io;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::cli::OutputFormat;

/// Determine the effective output format
pub fn effective_format(format: OutputFormat) -> OutputFormat {
    match format {
        OutputFormat::Auto => OutputFormat::Table,
        other => other,
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).into_diagnostic()?);
    Ok(())
}

pub fn print_yaml<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    print!("{}", serde_yml::to_string(value).into_diagnostic()?);
    Ok(())
}

/// Write flat rows as CSV with a header line
pub fn print_csv<R: Serialize>(rows: impl IntoIterator<Item = R>) -> Result<()> {
    let mut writer = csv::Writer::from_writer(io::stdout());
    for row in rows {
        writer.serialize(row).into_diagnostic()?;
    }
    writer.flush().into_diagnostic()?;
    Ok(())
}

/// Render rows as a table, rounded for terminals or markdown for `Md`
pub fn render_table<R: Tabled>(rows: impl IntoIterator<Item = R>, format: OutputFormat) -> String {
    let mut table = Table::new(rows);
    if format == OutputFormat::Md {
        table.with(Style::markdown());
    } else {
        table.with(Style::rounded());
    }
    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Tabled)]
    struct Row {
        #[tabled(rename = "Field")]
        field: &'static str,
        #[tabled(rename = "Value")]
        value: String,
    }

    #[test]
    fn test_auto_means_table() {
        assert_eq!(effective_format(OutputFormat::Auto), OutputFormat::Table);
        assert_eq!(effective_format(OutputFormat::Csv), OutputFormat::Csv);
    }

    #[test]
    fn test_markdown_table() {
        let rendered = render_table(
            [Row {
                field: "flat_valid",
                value: "99.50".to_string(),
            }],
            OutputFormat::Md,
        );
        assert!(rendered.contains("| Field"));
        assert!(rendered.contains("flat_valid"));
        assert!(rendered.contains("99.50"));
    }
}
