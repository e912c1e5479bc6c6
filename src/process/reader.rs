//! Single-process collector.
//!
//! `ProcessReader::read` turns one `/proc/<pid>` directory into a
//! `ProcessSnapshot` in a single pass. A process that disappears halfway is
//! reported as an error rather than a partial record.

use std::fs;
use std::io;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};

use crate::process::memory::{read_extended_status, read_statm};
use crate::process::stat::{count_threads, read_command, read_stat};
use crate::snapshot::ProcessSnapshot;

/// Why a single process could not be read.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("process {0} exited during the scan")]
    Gone(u32),

    #[error("permission denied reading {file} of process {pid}")]
    PermissionDenied { pid: u32, file: &'static str },

    #[error("malformed {file} for process {pid}: {reason}")]
    Malformed {
        pid: u32,
        file: &'static str,
        reason: String,
    },

    #[error("I/O error reading {file} of process {pid}: {source}")]
    Io {
        pid: u32,
        file: &'static str,
        #[source]
        source: io::Error,
    },
}

impl ProcessError {
    /// Classifies an I/O failure on one of the process's files.
    pub fn from_io(pid: u32, file: &'static str, err: io::Error) -> Self {
        if err.raw_os_error() == Some(libc::ESRCH) {
            return ProcessError::Gone(pid);
        }
        match err.kind() {
            io::ErrorKind::NotFound => ProcessError::Gone(pid),
            io::ErrorKind::PermissionDenied => ProcessError::PermissionDenied { pid, file },
            io::ErrorKind::InvalidData => ProcessError::Malformed {
                pid,
                file,
                reason: err.to_string(),
            },
            _ => ProcessError::Io {
                pid,
                file,
                source: err,
            },
        }
    }

    /// True for the expected races of a live process table: the process
    /// exited, or its files are not readable by us.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ProcessError::Gone(_) | ProcessError::PermissionDenied { .. }
        )
    }
}

/// Reads processes under one proc root for one scan.
#[derive(Debug, Clone)]
pub struct ProcessReader {
    proc_root: PathBuf,
    page_kb: u64,
    uptime_ticks: u64,
    uid_filter: Option<u32>,
}

impl ProcessReader {
    pub fn new(
        proc_root: impl Into<PathBuf>,
        page_kb: u64,
        uptime_ticks: u64,
        uid_filter: Option<u32>,
    ) -> Self {
        Self {
            proc_root: proc_root.into(),
            page_kb,
            uptime_ticks,
            uid_filter,
        }
    }

    pub fn proc_root(&self) -> &Path {
        &self.proc_root
    }

    /// Reads one process.
    ///
    /// `Ok(None)` means the process exists but is not reported: it belongs to
    /// another user, or it has no address space (kernel thread).
    pub fn read(&self, pid: u32) -> Result<Option<ProcessSnapshot>, ProcessError> {
        let proc_path = self.proc_root.join(pid.to_string());
        let io_err = move |file: &'static str| move |e: io::Error| ProcessError::from_io(pid, file, e);

        let meta = fs::metadata(&proc_path).map_err(io_err("directory"))?;
        if let Some(uid) = self.uid_filter {
            if meta.uid() != uid {
                return Ok(None);
            }
        }

        let pages = read_statm(&proc_path).map_err(io_err("statm"))?;
        let (virtual_kb, resident_kb, shared_kb) = pages.to_kb(self.page_kb);
        if virtual_kb == 0 {
            return Ok(None);
        }

        let extended = read_extended_status(&proc_path).map_err(io_err("status"))?;
        let stat = read_stat(&proc_path).map_err(io_err("stat"))?;
        let command = read_command(&proc_path).map_err(io_err("cmdline"))?;
        let thread_count = count_threads(&proc_path);

        Ok(Some(ProcessSnapshot {
            pid,
            ppid: stat.ppid,
            uid: meta.uid(),
            gid: meta.gid(),
            virtual_kb,
            resident_kb,
            shared_kb,
            extended,
            minor_faults: stat.minor_faults,
            major_faults: stat.major_faults,
            user_ticks: stat.user_ticks,
            system_ticks: stat.system_ticks,
            cpu_last_run: stat.processor,
            thread_count,
            state: stat.state,
            command,
            elapsed_ticks: self.uptime_ticks.saturating_sub(stat.start_ticks),
            query: None,
        }))
    }
}
