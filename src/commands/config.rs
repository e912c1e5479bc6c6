//! Config command implementation.
//!
//! Generates configuration files in various formats.

use std::fs;
use std::path::PathBuf;

use pg_meminfo::cli::ConfigFormat;
use pg_meminfo::config::{render_config, Config};

/// Generates configuration files.
pub fn command_config(
    output: Option<PathBuf>,
    format: ConfigFormat,
    commented: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();
    let output = output.unwrap_or_else(|| PathBuf::from(default_file_name(format)));

    let mut content = render_config(&config, format)?;
    if commented && matches!(format, ConfigFormat::Yaml | ConfigFormat::Toml) {
        content = add_config_comments(content);
    }

    if output.to_string_lossy() == "-" {
        print!("{}", content);
    } else {
        fs::write(&output, content)?;
        println!("✅ Configuration written to: {}", output.display());
    }

    Ok(())
}

fn default_file_name(format: ConfigFormat) -> &'static str {
    match format {
        ConfigFormat::Yaml => "pg-meminfo.yaml",
        ConfigFormat::Json => "pg-meminfo.json",
        ConfigFormat::Toml => "pg-meminfo.toml",
    }
}

/// Prepends a commented reference of every setting. YAML and TOML share the
/// `#` comment syntax.
fn add_config_comments(body: String) -> String {
    let comments = r#"# pg-meminfo Configuration
# ========================
#
# Selection
# ---------
# user: null                   # Only report processes owned by this user
#
# Output
# ------
# csv: false                   # CSV records instead of a justified table
# output: "stdout"             # "stdout" or a file path (file requires csv)
# sum_only: false              # Print only the total unique resident memory
# lines: null                  # Render at most N rows (<= 0 = all)
# header_every: null           # Repeat the table header every N rows
# breakdown: false             # Per-user/program/CPU summaries after the table
#
# Query Attribution
# -----------------
# postgres_query: false        # Look up each process in pg_stat_activity
# database_url: null           # e.g. "postgres://postgres@localhost/postgres"
#
# System
# ------
# proc_root: "/proc"           # Root of the proc filesystem
# log_level: "warn"            # off, error, warn, info, debug, trace (stderr)
"#;

    format!("{comments}\n{body}")
}
