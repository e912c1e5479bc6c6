//! Configuration management for pg-meminfo.
//!
//! This module handles loading, merging, and validating configuration from files
//! and CLI arguments. It supports YAML, JSON, and TOML formats.

use crate::cli::{Args, ConfigFormat, LogLevel};
use crate::report::{OutputMode, ReportOptions};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

// Default configuration constants
pub const DEFAULT_OUTPUT: &str = "stdout";
pub const DEFAULT_PROC_ROOT: &str = "/proc";

/// Config files searched when no explicit path is given, in order.
pub const DEFAULT_CONFIG_PATHS: [&str; 8] = [
    "/etc/pg-meminfo/pg-meminfo.yaml",
    "/etc/pg-meminfo/pg-meminfo.yml",
    "/etc/pg-meminfo/pg-meminfo.json",
    "/etc/pg-meminfo/pg-meminfo.toml",
    "./pg-meminfo.yaml",
    "./pg-meminfo.yml",
    "./pg-meminfo.json",
    "./pg-meminfo.toml",
];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config file {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("cannot serialize config: {0}")]
    Serialize(String),

    #[error("{0}")]
    Invalid(String),
}

/// Where report records go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    Stdout,
    File(PathBuf),
}

/// Report configuration. Every field is optional so a config file may set
/// any subset; `Config::default()` holds the built-in values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Only report processes owned by this user
    pub user: Option<String>,
    pub csv: Option<bool>,
    /// "stdout" or a file path; a file requires `csv`
    pub output: Option<String>,
    #[serde(alias = "sum-only")]
    pub sum_only: Option<bool>,
    #[serde(alias = "postgres-query")]
    pub postgres_query: Option<bool>,
    /// Row limit; zero or negative means no limit
    pub lines: Option<i64>,
    #[serde(alias = "header-every")]
    pub header_every: Option<usize>,
    pub breakdown: Option<bool>,
    #[serde(alias = "database-url")]
    pub database_url: Option<String>,
    #[serde(alias = "proc-root")]
    pub proc_root: Option<PathBuf>,
    #[serde(alias = "log-level")]
    pub log_level: Option<LogLevel>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user: None,
            csv: Some(false),
            output: Some(DEFAULT_OUTPUT.to_string()),
            sum_only: Some(false),
            postgres_query: Some(false),
            lines: None,
            header_every: None,
            breakdown: Some(false),
            database_url: None,
            proc_root: Some(PathBuf::from(DEFAULT_PROC_ROOT)),
            log_level: Some(LogLevel::Warn),
        }
    }
}

impl Config {
    pub fn output_target(&self) -> OutputTarget {
        match self.output.as_deref() {
            None | Some(DEFAULT_OUTPUT) => OutputTarget::Stdout,
            Some(path) => OutputTarget::File(PathBuf::from(path)),
        }
    }

    pub fn proc_root(&self) -> PathBuf {
        self.proc_root
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PROC_ROOT))
    }

    pub fn log_level(&self) -> LogLevel {
        self.log_level.unwrap_or(LogLevel::Warn)
    }

    /// Whether backends are attributed to their current query. Sum-only
    /// output ignores this flag.
    pub fn query_attribution(&self) -> bool {
        self.postgres_query.unwrap_or(false) && !self.sum_only.unwrap_or(false)
    }

    /// Positive `lines` caps the rendered rows; anything else renders all.
    pub fn row_limit(&self) -> Option<usize> {
        self.lines.filter(|n| *n > 0).map(|n| n as usize)
    }

    /// Sum-only takes precedence over CSV, CSV over the table.
    pub fn output_mode(&self) -> OutputMode {
        if self.sum_only.unwrap_or(false) {
            OutputMode::SumOnly
        } else if self.csv.unwrap_or(false) {
            OutputMode::Csv
        } else {
            OutputMode::Table {
                header_every: self.header_every,
                breakdown: self.breakdown.unwrap_or(false),
            }
        }
    }

    pub fn report_options(&self) -> ReportOptions {
        ReportOptions {
            mode: self.output_mode(),
            row_limit: self.row_limit(),
            query_columns: self.query_attribution(),
            user: self.user.clone(),
        }
    }
}

/// Validate effective config (used by --check-config and at startup)
pub fn validate_effective_config(cfg: &Config) -> Result<(), ConfigError> {
    let csv = cfg.csv.unwrap_or(false);
    if let OutputTarget::File(path) = cfg.output_target() {
        if !csv {
            return Err(ConfigError::Invalid(format!(
                "output to file '{}' requires CSV mode",
                path.display()
            )));
        }
        if path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("output path is empty".into()));
        }
    }

    if cfg.header_every == Some(0) {
        return Err(ConfigError::Invalid(
            "header_every must be at least 1".into(),
        ));
    }

    if cfg.user.as_deref().is_some_and(|u| u.trim().is_empty()) {
        return Err(ConfigError::Invalid("user name is empty".into()));
    }

    if cfg
        .proc_root
        .as_ref()
        .is_some_and(|p| p.as_os_str().is_empty())
    {
        return Err(ConfigError::Invalid("proc_root is empty".into()));
    }

    Ok(())
}

/// Resolves configuration from CLI args, config file, and defaults.
/// This enforces precedence: CLI (if provided) > config file > default.
pub fn resolve_config(args: &Args) -> Result<Config, ConfigError> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref())?
    };

    // Override with CLI args
    if args.user.is_some() {
        config.user = args.user.clone();
    }
    if args.output.is_some() {
        config.output = args.output.clone();
    }
    if args.lines.is_some() {
        config.lines = args.lines;
    }
    if args.header_every.is_some() {
        config.header_every = args.header_every;
    }
    if args.database_url.is_some() {
        config.database_url = args.database_url.clone();
    }
    if args.proc_root.is_some() {
        config.proc_root = args.proc_root.clone();
    }
    if args.log_level.is_some() {
        config.log_level = args.log_level;
    }

    // Switches only ever turn a feature on
    if args.csv {
        config.csv = Some(true);
    }
    if args.sum_only {
        config.sum_only = Some(true);
    }
    if args.postgres_query {
        config.postgres_query = Some(true);
    }
    if args.breakdown {
        config.breakdown = Some(true);
    }

    Ok(config)
}

/// Loads a config file. An explicit path must exist; otherwise the default
/// locations are searched and built-in defaults are used when none is found.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => match DEFAULT_CONFIG_PATHS
            .iter()
            .map(Path::new)
            .find(|p| p.exists())
        {
            Some(found) => found.to_path_buf(),
            None => return Ok(Config::default()),
        },
    };

    let content = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;
    let parse_err = |reason: String| ConfigError::Parse {
        path: path.clone(),
        reason,
    };

    // Fields missing from the file fall back to the built-in defaults
    let config: Config = match path.extension().and_then(|s| s.to_str()) {
        Some("json") => serde_json::from_str(&content).map_err(|e| parse_err(e.to_string()))?,
        Some("toml") => toml::from_str(&content).map_err(|e| parse_err(e.to_string()))?,
        // Default to YAML
        _ => serde_yaml::from_str(&content).map_err(|e| parse_err(e.to_string()))?,
    };
    info!("Loaded configuration from: {}", path.display());
    Ok(config)
}

/// Serializes a configuration in the requested format.
pub fn render_config(config: &Config, format: ConfigFormat) -> Result<String, ConfigError> {
    let serialized = match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config).map_err(|e| e.to_string()),
        ConfigFormat::Toml => toml::to_string_pretty(config).map_err(|e| e.to_string()),
        ConfigFormat::Yaml => serde_yaml::to_string(config).map_err(|e| e.to_string()),
    };
    serialized.map_err(ConfigError::Serialize)
}

/// Shows configuration in requested format
pub fn show_config(config: &Config, format: ConfigFormat) -> Result<(), ConfigError> {
    let output = render_config(config, format)?;
    println!("{output}");
    Ok(())
}
