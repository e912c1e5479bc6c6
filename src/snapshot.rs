//! Per-process records produced by a single scan.
//!
//! A `ProcessSnapshot` is built in one read-and-parse step and never mutated
//! afterwards; the aggregator and reporter only ever borrow it.

use std::collections::BTreeMap;

/// Extended status counters keyed by report column label (e.g. `"HWRES"`).
/// Values are kilobytes, or `-1` when the raw counter was implausible.
pub type ExtendedCounters = BTreeMap<&'static str, i64>;

/// Query attribution for a process, as reported by the database server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryInfo {
    pub state: String,
    pub wait_state: String,
    pub text: String,
}

/// Memory and accounting data for one live process at scan time.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessSnapshot {
    pub pid: u32,
    pub ppid: u32,
    pub uid: u32,
    pub gid: u32,
    pub virtual_kb: u64,
    pub resident_kb: u64,
    pub shared_kb: u64,
    /// `None` when the kernel exposed none of the recognized status fields.
    pub extended: Option<ExtendedCounters>,
    pub minor_faults: u64,
    pub major_faults: u64,
    pub user_ticks: u64,
    pub system_ticks: u64,
    pub cpu_last_run: u32,
    pub thread_count: usize,
    pub state: String,
    pub command: String,
    pub elapsed_ticks: u64,
    pub query: Option<QueryInfo>,
}

impl ProcessSnapshot {
    /// Unique resident size: resident minus shared, in kilobytes.
    ///
    /// Negative only when the kernel counters are inconsistent.
    pub fn unique_resident_kb(&self) -> i64 {
        self.resident_kb as i64 - self.shared_kb as i64
    }

    /// Returns the extended counter for `label`, if this process reported it.
    pub fn extended_counter(&self, label: &str) -> Option<i64> {
        self.extended.as_ref()?.get(label).copied()
    }

    /// Non-empty query text, if attribution found one.
    pub fn query_text(&self) -> Option<&str> {
        self.query
            .as_ref()
            .map(|q| q.text.as_str())
            .filter(|t| !t.is_empty())
    }

    /// Attaches query attribution, consuming the snapshot.
    pub fn with_query(self, query: Option<QueryInfo>) -> Self {
        Self { query, ..self }
    }

    /// Executable name without its directory, used for per-program grouping.
    ///
    /// Processes that rewrite their title ("postgres: checkpointer") group
    /// under the leading word.
    pub fn program_name(&self) -> &str {
        let first = self.command.split_whitespace().next().unwrap_or("");
        let base = first.rsplit('/').next().unwrap_or(first);
        base.trim_end_matches(':')
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Builds a snapshot with the given identity and memory figures; everything else zeroed.
    pub fn snapshot(pid: u32, resident_kb: u64, shared_kb: u64) -> ProcessSnapshot {
        ProcessSnapshot {
            pid,
            ppid: 1,
            uid: 1000,
            gid: 1000,
            virtual_kb: resident_kb * 4,
            resident_kb,
            shared_kb,
            extended: None,
            minor_faults: 0,
            major_faults: 0,
            user_ticks: 0,
            system_ticks: 0,
            cpu_last_run: 0,
            thread_count: 1,
            state: "S".to_string(),
            command: format!("/usr/bin/proc{}", pid),
            elapsed_ticks: 0,
            query: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::snapshot;
    use super::*;

    #[test]
    fn test_unique_resident_kb() {
        assert_eq!(snapshot(1, 10000, 2000).unique_resident_kb(), 8000);
        assert_eq!(snapshot(2, 5000, 1000).unique_resident_kb(), 4000);
        assert_eq!(snapshot(3, 8000, 500).unique_resident_kb(), 7500);
    }

    #[test]
    fn test_unique_resident_kb_inconsistent_counters() {
        assert_eq!(snapshot(1, 100, 300).unique_resident_kb(), -200);
    }

    #[test]
    fn test_query_text_ignores_empty() {
        let p = snapshot(1, 10, 1).with_query(Some(QueryInfo::default()));
        assert_eq!(p.query_text(), None);

        let p = p.with_query(Some(QueryInfo {
            state: "active".into(),
            wait_state: String::new(),
            text: "select 1".into(),
        }));
        assert_eq!(p.query_text(), Some("select 1"));
    }

    #[test]
    fn test_program_name() {
        let mut p = snapshot(1, 10, 1);
        p.command = "/usr/lib/postgresql/16/bin/postgres".into();
        assert_eq!(p.program_name(), "postgres");
        p.command = "postgres: app appdb [local] idle".into();
        assert_eq!(p.program_name(), "postgres");
        p.command = "bash".into();
        assert_eq!(p.program_name(), "bash");
        p.command = String::new();
        assert_eq!(p.program_name(), "");
    }
}
