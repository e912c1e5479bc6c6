//! Process-related modules for enumeration and per-process collection.
//!
//! This module provides:
//! - `scanner`: Process discovery and the scan loop
//! - `reader`: One-shot read of a single `/proc/<pid>` directory
//! - `memory`: `statm` page counts and extended `Vm*` status counters
//! - `stat`: Fixed-position accounting fields, command line and threads

pub mod memory;
pub mod reader;
pub mod scanner;
pub mod stat;

#[cfg(test)]
pub(crate) mod testutil;

// Re-export commonly used types
pub use memory::{COUNTER_LIMIT_KB, OVERFLOW_SENTINEL, VM_STATUS_MAP};
pub use reader::{ProcessError, ProcessReader};
pub use scanner::{reader_for, scan_processes, ProcessEnumerator, ScanError, ScanStats};
