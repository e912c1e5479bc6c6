//! CLI command implementations for pg-meminfo.
//!
//! This module provides implementations for the report and the subcommands:
//! - `report`: The default memory report
//! - `check`: Runtime requirement and configuration validation
//! - `config`: Configuration file generation

pub mod check;
pub mod config;
pub mod report;

// Re-export command functions
pub use check::command_check;
pub use config::command_config;
pub use report::command_report;
