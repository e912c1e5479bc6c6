//! CLI arguments and subcommands for pg-meminfo.
//!
//! This module defines the command-line interface structure using the clap library,
//! including all flags, options, and subcommands.

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Log level options for CLI parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Configuration format options for output
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum ConfigFormat {
    #[default]
    Yaml,
    Json,
    Toml,
}

/// Main CLI arguments structure
#[derive(Parser, Debug, Default)]
#[command(
    name = "pg-meminfo",
    about = "Per-process unique resident memory (RSS - shared) report",
    long_about = "Per-process unique resident memory (RSS - shared) report.\n\n\
                  Lists every process ordered by unique resident size, with optional CSV \
                  output and attribution of each database backend to the query it is running.",
    version,
    propagate_version = true
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Only report processes owned by this user
    #[arg(short = 'u', long)]
    pub user: Option<String>,

    /// Emit CSV instead of a justified table
    #[arg(short = 'c', long)]
    pub csv: bool,

    /// Output target for CSV records: a file path or "stdout"
    #[arg(short = 'o', long)]
    pub output: Option<String>,

    /// Print only the total unique resident memory
    #[arg(short = 's', long)]
    pub sum_only: bool,

    /// Attribute database backends to the query they are running
    #[arg(short = 'p', long)]
    pub postgres_query: bool,

    /// Render at most N process rows (0 or negative = all)
    #[arg(short = 'n', long, allow_hyphen_values = true)]
    pub lines: Option<i64>,

    /// Repeat the table header every N rows
    #[arg(long, value_name = "N")]
    pub header_every: Option<usize>,

    /// Append per-user, per-program and per-CPU summaries to the table
    #[arg(long)]
    pub breakdown: bool,

    /// Database connection URL used for query attribution
    #[arg(long, value_name = "URL")]
    pub database_url: Option<String>,

    /// Root of the proc filesystem
    #[arg(long, value_name = "PATH")]
    pub proc_root: Option<PathBuf>,

    /// Log level (logs go to stderr)
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Config file (YAML/JSON/TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Disable all config file loading
    #[arg(long)]
    pub no_config: bool,

    /// Print effective merged config and exit
    #[arg(long)]
    pub show_config: bool,

    /// Output format for --show-config
    #[arg(long, value_enum, default_value = "yaml")]
    pub config_format: ConfigFormat,

    /// Validate config and exit (return code 1 on error)
    #[arg(long)]
    pub check_config: bool,
}

/// Subcommands for additional functionality
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate configuration and runtime requirements
    Check {
        /// Check /proc filesystem
        #[arg(long)]
        proc: bool,

        /// Check memory counters of this process
        #[arg(long)]
        memory: bool,

        /// Check the database connection used for query attribution
        #[arg(long)]
        database: bool,

        /// Run every check
        #[arg(long)]
        all: bool,
    },

    /// Generate configuration files
    Config {
        /// Output file path ("-" for stdout)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "yaml")]
        format: ConfigFormat,

        /// Include comments and examples
        #[arg(long)]
        commented: bool,
    },
}
