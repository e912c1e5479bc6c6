//! Aggregation of one scan into a report snapshot.
//!
//! Ranks processes by unique resident size, sums it over the whole filtered
//! population and discovers the dynamic column layout.

use std::collections::BTreeSet;

use crate::snapshot::ProcessSnapshot;

/// Everything the reporter needs from one scan.
#[derive(Debug, Clone, Default)]
pub struct ReportSnapshot {
    /// Sorted descending by unique resident size, ties in discovery order.
    pub processes: Vec<ProcessSnapshot>,
    /// Sum over every process, independent of any display row limit.
    pub total_unique_resident_kb: i64,
    /// Union of extended counter labels across all processes, ascending.
    pub extended_columns: Vec<&'static str>,
    /// Highest last-run CPU seen; 0 means the CPU column is hidden.
    pub max_cpu_observed: u32,
}

impl ReportSnapshot {
    /// Builds the report snapshot from processes in discovery order.
    pub fn aggregate(mut processes: Vec<ProcessSnapshot>) -> Self {
        let total_unique_resident_kb = processes.iter().map(|p| p.unique_resident_kb()).sum();

        let extended_columns: BTreeSet<&'static str> = processes
            .iter()
            .filter_map(|p| p.extended.as_ref())
            .flat_map(|counters| counters.keys().copied())
            .collect();

        let max_cpu_observed = processes.iter().map(|p| p.cpu_last_run).max().unwrap_or(0);

        // sort_by is stable: equal sizes keep discovery order
        processes.sort_by(|a, b| b.unique_resident_kb().cmp(&a.unique_resident_kb()));

        Self {
            processes,
            total_unique_resident_kb,
            extended_columns: extended_columns.into_iter().collect(),
            max_cpu_observed,
        }
    }

    pub fn show_cpu(&self) -> bool {
        self.max_cpu_observed > 0
    }

    /// The processes that will be rendered under an optional row limit.
    pub fn rendered(&self, row_limit: Option<usize>) -> &[ProcessSnapshot] {
        match row_limit {
            Some(limit) => &self.processes[..limit.min(self.processes.len())],
            None => &self.processes,
        }
    }
}
