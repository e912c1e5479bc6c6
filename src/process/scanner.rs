//! Process scanning utilities for discovering and reading process entries from /proc.
//!
//! This module enumerates numeric entries of the proc root and drives the
//! per-process reader over them, discarding processes that vanish or are
//! filtered out.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

use crate::process::reader::ProcessReader;
use crate::query::QueryAttribution;
use crate::snapshot::ProcessSnapshot;
use crate::system;

/// Lazy sequence of process ids visible under a proc root.
///
/// Reflects one point in time and cannot be restarted. Entries that cannot
/// be listed are skipped.
pub struct ProcessEnumerator {
    entries: fs::ReadDir,
}

impl ProcessEnumerator {
    pub fn open(root: &Path) -> io::Result<Self> {
        Ok(Self {
            entries: fs::read_dir(root)?,
        })
    }
}

impl Iterator for ProcessEnumerator {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        for entry in self.entries.by_ref().flatten() {
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if name.is_empty() || !name.bytes().all(|b| b.is_ascii_digit()) {
                continue;
            }
            if let Ok(pid) = name.parse() {
                return Some(pid);
            }
        }
        None
    }
}

/// Fatal failures of a scan as a whole.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("cannot list processes under {path}: {source}")]
    Enumerate {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot read kernel uptime under {path}: {source}")]
    Uptime {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Counters describing what a scan saw, for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub candidates: usize,
    pub included: usize,
    pub filtered: usize,
    pub vanished: usize,
    pub failed: usize,
}

/// Builds a reader for the host proc root, anchored at the current kernel uptime.
pub fn reader_for(proc_root: &Path, uid_filter: Option<u32>) -> Result<ProcessReader, ScanError> {
    let uptime_ticks = system::read_uptime_ticks(proc_root).map_err(|source| ScanError::Uptime {
        path: proc_root.to_path_buf(),
        source,
    })?;
    Ok(ProcessReader::new(
        proc_root,
        system::page_size_kb(),
        uptime_ticks,
        uid_filter,
    ))
}

/// Reads every process visible under the reader's proc root, in discovery order.
///
/// When `attribution` is given, each included process is looked up right
/// after it is read, so the query reflects the process as it was measured.
#[instrument(skip(reader, attribution), fields(root = %reader.proc_root().display()))]
pub fn scan_processes(
    reader: &ProcessReader,
    mut attribution: Option<&mut dyn QueryAttribution>,
) -> Result<(Vec<ProcessSnapshot>, ScanStats), ScanError> {
    let pids = ProcessEnumerator::open(reader.proc_root()).map_err(|source| ScanError::Enumerate {
        path: reader.proc_root().to_path_buf(),
        source,
    })?;

    let mut stats = ScanStats::default();
    let mut out = Vec::new();

    for pid in pids {
        stats.candidates += 1;
        match reader.read(pid) {
            Ok(Some(snapshot)) => {
                let snapshot = match attribution.as_deref_mut() {
                    Some(service) => {
                        let query = service.query_for(pid);
                        snapshot.with_query(query)
                    }
                    None => snapshot,
                };
                out.push(snapshot);
                stats.included += 1;
            }
            Ok(None) => stats.filtered += 1,
            Err(e) if e.is_transient() => {
                debug!("Skipping process {}: {}", pid, e);
                stats.vanished += 1;
            }
            Err(e) => {
                warn!("Skipping process {}: {}", pid, e);
                stats.failed += 1;
            }
        }
    }

    info!(
        "Scan finished: {} candidates, {} included, {} filtered, {} vanished, {} failed",
        stats.candidates, stats.included, stats.filtered, stats.vanished, stats.failed
    );

    Ok((out, stats))
}
