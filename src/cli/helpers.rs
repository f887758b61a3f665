//! Shared helper functions for CLI commands

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::GlobalOpts;
use crate::core::{Config, SqliteStore};

/// Load config, with `--db` taking precedence over files and environment
pub fn load_config(global: &GlobalOpts) -> Result<Config> {
    let mut config = Config::load().into_diagnostic()?;
    if let Some(db) = &global.db {
        config.database = db.clone();
    }
    Ok(config)
}

/// Open the configured record store, which must already exist
pub fn open_store(config: &Config) -> Result<SqliteStore> {
    SqliteStore::open_existing(&config.database).into_diagnostic()
}

/// Format a value with a fixed number of decimals
pub fn format_value(value: f64, precision: usize) -> String {
    format!("{:.*}", precision, value)
}

/// Truncate a string to max_len, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Pass/fail marker for a limits check
pub fn limits_marker(within: Option<bool>) -> String {
    match within {
        Some(true) => style("ok").green().to_string(),
        Some(false) => style("OUT").red().bold().to_string(),
        None => String::new(),
    }
}
