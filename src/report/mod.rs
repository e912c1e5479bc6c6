//! Report rendering.
//!
//! This module provides:
//! - `table`: Two-pass justified table for terminal output
//! - `csv`: Row-at-a-time CSV records for stdout or a file
//! - `breakdown`: Per-user, per-program and per-CPU summaries
//! - `format`: Cell formatting helpers
//!
//! Every mode renders from the same `ReportSnapshot` and agrees on its total.

pub mod breakdown;
pub mod csv;
pub mod format;
pub mod table;

use chrono::{DateTime, Local};
use std::io::{self, Write};
use tracing::debug;

use crate::aggregate::ReportSnapshot;
use crate::snapshot::ProcessSnapshot;
use crate::users::NameLookup;

use self::csv::CsvWriter;
use self::format::{format_epoch, format_optional, format_started};
use self::table::JustifiedTable;

/// Columns before the extended status counters.
pub const MAIN_HEADER: [&str; 5] = ["PID", "UID", "URES", "SHR", "VIRT"];
/// Leading column present only in CSV output.
pub const TIME_HEADER: &str = "epoch_time";
pub const CPU_HEADER: &str = "CPU";
pub const QUERY_HEADER: [&str; 3] = ["qry_state", "qry_waiting", "query"];

/// Failures while emitting a report.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("failed to write report: {0}")]
    Io(#[from] io::Error),
}

/// How the report is emitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputMode {
    /// A single line with the total.
    SumOnly,
    /// Justified table followed by the total.
    Table {
        /// Repeat the header after this many data rows.
        header_every: Option<usize>,
        /// Append per-user, per-program and per-CPU summaries.
        breakdown: bool,
    },
    /// CSV records, header first, no total.
    Csv,
}

/// Options shared by every output mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportOptions {
    pub mode: OutputMode,
    /// Caps rendered data rows; never affects the total.
    pub row_limit: Option<usize>,
    /// Whether query attribution was requested for this run.
    pub query_columns: bool,
    /// Name of the filter user, echoed in the total line.
    pub user: Option<String>,
}

/// Run-wide values used while formatting cells.
pub struct RenderContext<'a> {
    pub names: &'a mut dyn NameLookup,
    pub now: DateTime<Local>,
    pub ticks_per_second: u64,
}

/// The total line printed in sum-only and table modes.
pub fn sum_line(total_kb: i64, user: Option<&str>) -> String {
    let mut msg = format!("Unique Resident Memory sum: {} Kilobytes", total_kb);
    if let Some(user) = user {
        msg.push_str(&format!(", for user {}", user));
    }
    msg
}

/// Column schema for one report, derived from the snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLayout {
    pub timestamp: bool,
    pub extended: Vec<&'static str>,
    pub cpu: bool,
    pub query: bool,
}

impl ColumnLayout {
    /// Decides the layout. Query columns appear only when requested and at
    /// least one of the rows to be rendered carries query text.
    pub fn for_report(
        snapshot: &ReportSnapshot,
        rows: &[ProcessSnapshot],
        timestamp: bool,
        query_requested: bool,
    ) -> Self {
        Self {
            timestamp,
            extended: snapshot.extended_columns.clone(),
            cpu: snapshot.show_cpu(),
            query: query_requested && rows.iter().any(|p| p.query_text().is_some()),
        }
    }

    pub fn header(&self) -> Vec<String> {
        let mut header = Vec::new();
        if self.timestamp {
            header.push(TIME_HEADER.to_string());
        }
        header.extend(MAIN_HEADER.iter().map(|s| s.to_string()));
        header.extend(self.extended.iter().map(|s| s.to_lowercase()));
        header.push("MINFLT".to_string());
        header.push("MAJFLT".to_string());
        if self.cpu {
            header.push(CPU_HEADER.to_string());
        }
        header.extend(["threads", "started", "S", "CMD"].map(String::from));
        if self.query {
            header.extend(QUERY_HEADER.map(String::from));
        }
        header
    }

    pub fn row(&self, p: &ProcessSnapshot, ctx: &mut RenderContext<'_>) -> Vec<String> {
        let mut row = Vec::with_capacity(self.extended.len() + 16);
        if self.timestamp {
            row.push(format_epoch(ctx.now));
        }
        row.push(p.pid.to_string());
        row.push(ctx.names.user_name(p.uid));
        row.push(p.unique_resident_kb().to_string());
        row.push(p.shared_kb.to_string());
        row.push(p.virtual_kb.to_string());
        for label in &self.extended {
            row.push(format_optional(p.extended_counter(label)));
        }
        row.push(p.minor_faults.to_string());
        row.push(p.major_faults.to_string());
        if self.cpu {
            row.push(p.cpu_last_run.to_string());
        }
        row.push(p.thread_count.to_string());
        row.push(format_started(p.elapsed_ticks, ctx.ticks_per_second, ctx.now));
        row.push(p.state.clone());
        row.push(p.command.clone());
        if self.query {
            let q = p.query.clone().unwrap_or_default();
            row.push(q.state);
            row.push(q.wait_state);
            row.push(q.text);
        }
        row
    }
}

/// Renders `snapshot` to `out` in the mode given by `options`.
pub fn render<W: Write + ?Sized>(
    snapshot: &ReportSnapshot,
    options: &ReportOptions,
    ctx: &mut RenderContext<'_>,
    out: &mut W,
) -> Result<(), ReportError> {
    let user = options.user.as_deref();

    let (header_every, with_breakdown) = match &options.mode {
        OutputMode::SumOnly => {
            writeln!(out, "{}", sum_line(snapshot.total_unique_resident_kb, user))?;
            return Ok(());
        }
        OutputMode::Csv => return render_csv(snapshot, options, ctx, out),
        OutputMode::Table {
            header_every,
            breakdown,
        } => (*header_every, *breakdown),
    };

    let rows = snapshot.rendered(options.row_limit);
    let layout = ColumnLayout::for_report(snapshot, rows, false, options.query_columns);

    let mut table = JustifiedTable::new();
    table.add_row(layout.header());
    for p in rows {
        table.add_row(layout.row(p, ctx));
    }
    debug!("Rendering table with {} rows", table.data_rows());

    table.write_to(out, header_every)?;
    writeln!(out, "{}", sum_line(snapshot.total_unique_resident_kb, user))?;

    if with_breakdown {
        breakdown::write_breakdowns(snapshot, ctx, out)?;
    }
    out.flush()?;
    Ok(())
}

fn render_csv<W: Write + ?Sized>(
    snapshot: &ReportSnapshot,
    options: &ReportOptions,
    ctx: &mut RenderContext<'_>,
    out: &mut W,
) -> Result<(), ReportError> {
    let rows = snapshot.rendered(options.row_limit);
    let layout = ColumnLayout::for_report(snapshot, rows, true, options.query_columns);

    let mut writer = CsvWriter::new(out);
    writer.write_record(&layout.header())?;
    for p in rows {
        writer.write_record(&layout.row(p, ctx))?;
    }
    debug!("Wrote {} CSV rows", rows.len());
    Ok(())
}
