//! Configuration management
//!
//! Settings are read from the user config directory and then from
//! `.insp/config.yaml` in the working directory; later files override
//! earlier ones key by key. `INSP_DATABASE` overrides the database path.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::aggregate::{AggregatorConfig, MissingWeightPolicy};
use crate::core::projection::MeasurementStandard;

/// Directory holding the local config file and default database
pub const LOCAL_DIR: &str = ".insp";

const CONFIG_FILE: &str = "config.yaml";
const DEFAULT_DATABASE: &str = "inspection.db";
const DATABASE_ENV: &str = "INSP_DATABASE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// One config file as written; every key optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    database: Option<PathBuf>,
    precision: Option<usize>,
    missing_weight: Option<MissingWeightPolicy>,
    standards: BTreeMap<String, MeasurementStandard>,
}

/// Effective configuration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Config {
    /// Path of the SQLite record store
    pub database: PathBuf,
    /// Decimal places used when printing values
    pub precision: usize,
    /// Policy for mean records with no count record
    pub missing_weight: MissingWeightPolicy,
    /// Acceptance limits per mean field
    pub standards: BTreeMap<String, MeasurementStandard>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: Path::new(LOCAL_DIR).join(DEFAULT_DATABASE),
            precision: 2,
            missing_weight: MissingWeightPolicy::Fail,
            standards: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Load from the user and local config files plus the environment
    pub fn load() -> Result<Self, ConfigError> {
        let mut paths = Vec::new();
        if let Some(dirs) = directories::ProjectDirs::from("", "", "insp") {
            paths.push(dirs.config_dir().join(CONFIG_FILE));
        }
        paths.push(Path::new(LOCAL_DIR).join(CONFIG_FILE));

        let mut config = Self::load_from(&paths)?;
        if let Ok(db) = std::env::var(DATABASE_ENV) {
            if !db.trim().is_empty() {
                config.database = PathBuf::from(db);
            }
        }
        Ok(config)
    }

    /// Merge the given files in order, skipping any that do not exist
    pub fn load_from(paths: &[PathBuf]) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        for path in paths {
            if !path.exists() {
                continue;
            }
            let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.clone(),
                source,
            })?;
            let file = Self::parse_file(&content, path)?;
            log::debug!("loaded config from {}", path.display());
            config.merge(file);
        }
        Ok(config)
    }

    fn parse_file(content: &str, path: &Path) -> Result<ConfigFile, ConfigError> {
        let has_settings = content.lines().any(|line| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        });
        if !has_settings {
            return Ok(ConfigFile::default());
        }
        serde_yml::from_str(content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    fn merge(&mut self, file: ConfigFile) {
        if let Some(database) = file.database {
            self.database = database;
        }
        if let Some(precision) = file.precision {
            self.precision = precision;
        }
        if let Some(policy) = file.missing_weight {
            self.missing_weight = policy;
        }
        self.standards.extend(file.standards);
    }

    /// Aggregator tables and policies derived from this config
    pub fn aggregator_config(&self) -> AggregatorConfig {
        AggregatorConfig {
            missing_weight: self.missing_weight,
            ..AggregatorConfig::default()
        }
    }
}
