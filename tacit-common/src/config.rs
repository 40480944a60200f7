//! Bootstrap configuration loading
//!
//! Settings resolve in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing config file is not an error: the service starts from compiled
//! defaults. A config file that exists but does not parse is fatal.

use crate::labels::{is_sentinel, CategoryDistribution};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "TACIT_CONFIG";

/// File name searched for in the user config dir and the working directory
pub const CONFIG_FILE_NAME: &str = "tacit.toml";

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_DATASET: &str = "./data/multi-cct-labels.csv";

/// How rows are chosen for each request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SamplingMode {
    /// Category-stratified pool, then one uniform draw
    #[default]
    Stratified,
    /// Uniform draw over the whole dataset
    Uniform,
}

/// Role of a dataset file in the TOML `[[datasets]]` table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetRole {
    #[default]
    Labeled,
    Unlabeled,
}

/// How the loader interprets one input file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceRole {
    /// Requires sentence and label columns
    Labeled,
    /// Requires a sentence column; every row is Class0
    Unlabeled,
    /// Per-category file; every row carries the named label
    Category(String),
}

/// One input file for the dataset loader
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetSource {
    pub path: PathBuf,
    pub role: SourceRole,
}

impl DatasetSource {
    pub fn labeled(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            role: SourceRole::Labeled,
        }
    }

    pub fn unlabeled(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            role: SourceRole::Unlabeled,
        }
    }
}

/// Column names expected in dataset files
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ColumnConfig {
    #[serde(default = "default_sentence_column")]
    pub sentence: String,

    /// Comma-separated label cell
    #[serde(default = "default_labels_column")]
    pub labels: String,

    /// Optional provenance column
    #[serde(default = "default_essay_id_column")]
    pub essay_id: String,
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            sentence: default_sentence_column(),
            labels: default_labels_column(),
            essay_id: default_essay_id_column(),
        }
    }
}

fn default_sentence_column() -> String {
    "sentence".to_string()
}

fn default_labels_column() -> String {
    "cct_labels".to_string()
}

fn default_essay_id_column() -> String {
    "essay_id".to_string()
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// `[[datasets]]` entry
#[derive(Debug, Clone, Deserialize)]
pub struct DatasetEntry {
    pub path: PathBuf,
    #[serde(default)]
    pub role: DatasetRole,
}

/// `[[categories]]` entry: one category mapped to its percentage and,
/// optionally, a file holding only that category's sentences
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryEntry {
    pub name: String,
    pub percent: f64,
    #[serde(default)]
    pub file: Option<PathBuf>,
}

/// Bootstrap configuration loaded from TOML file
///
/// Every field is optional so a partial file only overrides what it names.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub host: Option<String>,

    #[serde(default)]
    pub port: Option<u16>,

    #[serde(default)]
    pub sampling: Option<SamplingMode>,

    /// Fixed RNG seed (reproducible sampling)
    #[serde(default)]
    pub seed: Option<u64>,

    #[serde(default)]
    pub columns: ColumnConfig,

    #[serde(default)]
    pub datasets: Vec<DatasetEntry>,

    #[serde(default)]
    pub categories: Vec<CategoryEntry>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl TomlConfig {
    /// Parse a TOML config file
    ///
    /// Relative dataset paths are resolved against the file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let mut config = Self::parse(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;

        if let Some(base) = path.parent() {
            config.rebase_paths(base);
        }
        Ok(config)
    }

    /// Parse TOML text without touching the filesystem
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid TOML: {}", e)))
    }

    fn rebase_paths(&mut self, base: &Path) {
        for entry in &mut self.datasets {
            if entry.path.is_relative() {
                entry.path = base.join(&entry.path);
            }
        }
        for entry in &mut self.categories {
            if let Some(file) = entry.file.as_mut() {
                if file.is_relative() {
                    *file = base.join(&*file);
                }
            }
        }
    }
}

/// Values supplied on the command line or through environment variables
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub seed: Option<u64>,
    pub sampling: Option<SamplingMode>,
    /// Labeled files; replaces every labeled `[[datasets]]` entry when non-empty
    pub labeled: Vec<PathBuf>,
    /// Unlabeled file; replaces every unlabeled `[[datasets]]` entry
    pub unlabeled: Option<PathBuf>,
    pub log_level: Option<String>,
}

/// Fully resolved service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub sampling: SamplingMode,
    pub seed: Option<u64>,
    pub columns: ColumnConfig,
    pub sources: Vec<DatasetSource>,
    pub distribution: CategoryDistribution,
    pub logging: LoggingConfig,
}

impl ServiceConfig {
    /// Merge overrides over an optional TOML config over compiled defaults
    pub fn resolve(toml: Option<TomlConfig>, overrides: ConfigOverrides) -> Result<Self> {
        let toml = toml.unwrap_or_default();

        let host = overrides
            .host
            .or(toml.host)
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = overrides.port.or(toml.port).unwrap_or(DEFAULT_PORT);
        if port == 0 {
            return Err(Error::Config("Port must be non-zero".to_string()));
        }

        let distribution = if toml.categories.is_empty() {
            CategoryDistribution::cct_default()
        } else {
            CategoryDistribution::new(
                toml.categories
                    .iter()
                    .map(|entry| (entry.name.clone(), entry.percent)),
            )?
        };

        let mut labeled: Vec<PathBuf> = toml
            .datasets
            .iter()
            .filter(|d| d.role == DatasetRole::Labeled)
            .map(|d| d.path.clone())
            .collect();
        let mut unlabeled: Vec<PathBuf> = toml
            .datasets
            .iter()
            .filter(|d| d.role == DatasetRole::Unlabeled)
            .map(|d| d.path.clone())
            .collect();

        if !overrides.labeled.is_empty() {
            labeled = overrides.labeled;
        }
        if let Some(path) = overrides.unlabeled {
            unlabeled = vec![path];
        }

        let mut sources: Vec<DatasetSource> = labeled
            .into_iter()
            .map(DatasetSource::labeled)
            .chain(unlabeled.into_iter().map(DatasetSource::unlabeled))
            .collect();

        for entry in &toml.categories {
            if let Some(file) = &entry.file {
                let role = if is_sentinel(&entry.name) {
                    SourceRole::Unlabeled
                } else {
                    SourceRole::Category(entry.name.trim().to_string())
                };
                sources.push(DatasetSource {
                    path: file.clone(),
                    role,
                });
            }
        }

        if sources.is_empty() {
            sources.push(DatasetSource::labeled(DEFAULT_DATASET));
        }

        let mut logging = toml.logging;
        if let Some(level) = overrides.log_level {
            logging.level = level;
        }

        Ok(Self {
            host,
            port,
            sampling: overrides.sampling.or(toml.sampling).unwrap_or_default(),
            seed: overrides.seed.or(toml.seed),
            columns: toml.columns,
            sources,
            distribution,
            logging,
        })
    }

    /// `host:port` string for the listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Locates the TOML config file
///
/// Search order: explicit path, `TACIT_CONFIG`, `<user config dir>/tacit/tacit.toml`,
/// `./tacit.toml`.
pub struct ConfigFileResolver {
    cli_path: Option<PathBuf>,
}

impl ConfigFileResolver {
    pub fn new(cli_path: Option<PathBuf>) -> Self {
        Self { cli_path }
    }

    /// Returns `Err` only when an explicitly named file is missing
    pub fn resolve(&self) -> Result<Option<PathBuf>> {
        if let Some(path) = &self.cli_path {
            return explicit(path);
        }

        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.is_empty() {
                return explicit(Path::new(&path));
            }
        }

        let user_config = dirs::config_dir().map(|d| d.join("tacit").join(CONFIG_FILE_NAME));
        if let Some(path) = user_config {
            if path.exists() {
                return Ok(Some(path));
            }
        }

        let local = PathBuf::from(CONFIG_FILE_NAME);
        if local.exists() {
            return Ok(Some(local));
        }

        Ok(None)
    }
}

fn explicit(path: &Path) -> Result<Option<PathBuf>> {
    if path.exists() {
        Ok(Some(path.to_path_buf()))
    } else {
        Err(Error::Config(format!(
            "Config file not found: {}",
            path.display()
        )))
    }
}
