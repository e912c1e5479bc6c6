//! pg-meminfo library
//!
//! Measures the unique resident memory (RSS minus shared) of every process
//! on a Linux host and renders it as a ranked table, CSV, or a single total.
//! Database backends can optionally be attributed to the query they are
//! running.
//!
//! # Usage
//!
//! ```no_run
//! use pg_meminfo::report::{render, OutputMode, RenderContext, ReportOptions};
//! use pg_meminfo::{reader_for, scan_processes, ReportSnapshot, UserNameCache};
//! use std::path::Path;
//!
//! let reader = reader_for(Path::new("/proc"), None)?;
//! let (processes, _stats) = scan_processes(&reader, None)?;
//! let snapshot = ReportSnapshot::aggregate(processes);
//!
//! let options = ReportOptions {
//!     mode: OutputMode::SumOnly,
//!     row_limit: None,
//!     query_columns: false,
//!     user: None,
//! };
//! let mut names = UserNameCache::new();
//! let mut ctx = RenderContext {
//!     names: &mut names,
//!     now: chrono::Local::now(),
//!     ticks_per_second: *pg_meminfo::system::CLK_TCK,
//! };
//! render(&snapshot, &options, &mut ctx, &mut std::io::stdout())?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod aggregate;
pub mod cli;
pub mod config;
pub mod process;
pub mod query;
pub mod report;
pub mod run;
pub mod snapshot;
pub mod startup_checks;
pub mod system;
pub mod users;

// Re-export main types for convenience
pub use aggregate::ReportSnapshot;
pub use process::{reader_for, scan_processes, ProcessError, ProcessReader, ScanError, ScanStats};
pub use query::{PgActivityService, QueryAttribution};
pub use run::{run_report, RunError};
pub use snapshot::{ProcessSnapshot, QueryInfo};
pub use users::{NameLookup, UserNameCache};
