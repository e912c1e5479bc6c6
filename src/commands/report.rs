//! Report command implementation.
//!
//! Scans the proc filesystem once and renders the result in the configured
//! output mode.

use std::io;

use pg_meminfo::config::Config;
use pg_meminfo::run_report;
use tracing::debug;

/// Runs one scan and renders the report to stdout or the configured file.
pub fn command_report(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let mut stdout = io::stdout().lock();
    let stats = run_report(config, &mut stdout)?;
    debug!(
        "Scan finished: {} candidates, {} filtered, {} vanished, {} failed",
        stats.candidates, stats.filtered, stats.vanished, stats.failed
    );
    Ok(())
}
