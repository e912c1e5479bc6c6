//! Memory parsing utilities for reading process memory metrics from /proc.
//!
//! This module provides functions to parse the page-count triple from
//! `/proc/<pid>/statm` and the open-ended `Vm*` counters from
//! `/proc/<pid>/status`.

use std::fs;
use std::io;
use std::path::Path;

use crate::snapshot::ExtendedCounters;

/// Counters above this many kilobytes (4 GiB) are treated as corrupt.
pub const COUNTER_LIMIT_KB: i64 = 4 * 1024 * 1024;

/// Reported in place of a corrupt or unparseable counter.
pub const OVERFLOW_SENTINEL: i64 = -1;

/// Map from `/proc/<pid>/status` `Vm<label>:` suffixes to report column labels.
/// Labels not listed here are dropped.
pub const VM_STATUS_MAP: [(&str, &str); 8] = [
    ("Peak", "VIRT-P"),
    ("Lck", "LCKD"),
    ("HWM", "HWRES"),
    ("Data", "DATA"),
    ("Stk", "STACK"),
    ("Exe", "EXE"),
    ("Lib", "LIB"),
    ("PTE", "PTE"),
];

/// Virtual, resident and shared sizes in pages, as found in `statm`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCounts {
    pub size: u64,
    pub resident: u64,
    pub shared: u64,
}

impl PageCounts {
    /// Converts the page counts to kilobytes: (virtual, resident, shared).
    pub fn to_kb(self, page_kb: u64) -> (u64, u64, u64) {
        (
            self.size * page_kb,
            self.resident * page_kb,
            self.shared * page_kb,
        )
    }
}

/// Parses kilobyte values from status file lines.
pub fn parse_kb_value(v: &str) -> Option<i64> {
    v.split_whitespace().next()?.parse().ok()
}

/// Parses the first three fields of a `statm` record.
pub fn parse_statm(content: &str) -> io::Result<PageCounts> {
    let mut fields = content.split_whitespace().map(str::parse::<u64>);
    let mut next = |name: &str| -> io::Result<u64> {
        match fields.next() {
            Some(Ok(v)) => Ok(v),
            Some(Err(e)) => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("statm {}: {}", name, e),
            )),
            None => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("statm {}: missing field", name),
            )),
        }
    };

    Ok(PageCounts {
        size: next("size")?,
        resident: next("resident")?,
        shared: next("shared")?,
    })
}

/// Applies the overflow guard to a raw status counter.
pub fn guard_counter(raw: Option<i64>) -> i64 {
    match raw {
        Some(v) if v <= COUNTER_LIMIT_KB => v,
        _ => OVERFLOW_SENTINEL,
    }
}

/// Collects recognized `Vm*` counters from the contents of a status file.
///
/// Returns `None` when no recognized field is present, never an empty map.
pub fn parse_extended_status(content: &str) -> Option<ExtendedCounters> {
    let mut counters = ExtendedCounters::new();

    for line in content.lines() {
        let Some(rest) = line.strip_prefix("Vm") else {
            continue;
        };
        let Some((label, value)) = rest.split_once(':') else {
            continue;
        };
        if let Some((_, column)) = VM_STATUS_MAP.iter().find(|(raw, _)| *raw == label) {
            counters.insert(*column, guard_counter(parse_kb_value(value)));
        }
    }

    if counters.is_empty() {
        None
    } else {
        Some(counters)
    }
}

/// Reads `/proc/<pid>/statm`.
pub fn read_statm(proc_path: &Path) -> io::Result<PageCounts> {
    let content = fs::read_to_string(proc_path.join("statm"))?;
    parse_statm(&content)
}

/// Reads the extended counters from `/proc/<pid>/status`.
///
/// The `Name:` line carries the raw command name, so the file is decoded
/// lossily; only the `Vm*` lines are inspected.
pub fn read_extended_status(proc_path: &Path) -> io::Result<Option<ExtendedCounters>> {
    let raw = fs::read(proc_path.join("status"))?;
    Ok(parse_extended_status(&String::from_utf8_lossy(&raw)))
}
