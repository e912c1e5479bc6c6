//! Accounting fields from `/proc/<pid>/stat`, plus the command line and
//! thread count readers.

use std::fs;
use std::io;
use std::path::Path;

/// Positions within the stat record, counted over the whole record
/// (0 = pid, 1 = command in parentheses).
const FIELD_STATE: usize = 2;
const FIELD_PPID: usize = 3;
const FIELD_MINFLT: usize = 9;
const FIELD_MAJFLT: usize = 11;
const FIELD_UTIME: usize = 13;
const FIELD_STIME: usize = 14;
const FIELD_STARTTIME: usize = 21;
const FIELD_PROCESSOR: usize = 38;

/// Fields that precede the remainder once the command is skipped.
const FIELDS_BEFORE_REST: usize = 2;

/// Fixed-position accounting fields of a process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatFields {
    pub state: String,
    pub ppid: u32,
    pub minor_faults: u64,
    pub major_faults: u64,
    pub user_ticks: u64,
    pub system_ticks: u64,
    pub start_ticks: u64,
    pub processor: u32,
}

fn invalid(reason: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, reason)
}

/// Parses a stat record.
///
/// The command field may itself contain spaces and parentheses, and is not
/// necessarily valid UTF-8, so only the remainder after the last `)` is
/// decoded.
pub fn parse_stat(content: &[u8]) -> io::Result<StatFields> {
    let comm_end = content
        .iter()
        .rposition(|&b| b == b')')
        .ok_or_else(|| invalid("stat: missing command terminator".to_string()))?;
    let tail = std::str::from_utf8(&content[comm_end + 1..])
        .map_err(|e| invalid(format!("stat: fields after command: {}", e)))?;
    let rest: Vec<&str> = tail.split_whitespace().collect();

    let field = |index: usize| {
        rest.get(index - FIELDS_BEFORE_REST).copied().ok_or_else(|| {
            invalid(format!(
                "stat: field {} missing ({} present)",
                index,
                rest.len() + FIELDS_BEFORE_REST
            ))
        })
    };
    let number = |index: usize| -> io::Result<u64> {
        let raw = field(index)?;
        raw.parse()
            .map_err(|e| invalid(format!("stat: field {} '{}': {}", index, raw, e)))
    };
    let narrow = |index: usize| -> io::Result<u32> {
        let value = number(index)?;
        u32::try_from(value)
            .map_err(|_| invalid(format!("stat: field {} out of range: {}", index, value)))
    };

    Ok(StatFields {
        state: field(FIELD_STATE)?.to_string(),
        ppid: narrow(FIELD_PPID)?,
        minor_faults: number(FIELD_MINFLT)?,
        major_faults: number(FIELD_MAJFLT)?,
        user_ticks: number(FIELD_UTIME)?,
        system_ticks: number(FIELD_STIME)?,
        start_ticks: number(FIELD_STARTTIME)?,
        processor: narrow(FIELD_PROCESSOR)?,
    })
}

/// Reads and parses `/proc/<pid>/stat`.
pub fn read_stat(proc_path: &Path) -> io::Result<StatFields> {
    let content = fs::read(proc_path.join("stat"))?;
    parse_stat(&content)
}

/// Keeps only the first NUL-terminated segment of a raw command line.
pub fn first_cmdline_segment(raw: &[u8]) -> String {
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    String::from_utf8_lossy(&raw[..end]).into_owned()
}

/// Reads `/proc/<pid>/cmdline`, keeping the executable segment only.
pub fn read_command(proc_path: &Path) -> io::Result<String> {
    let raw = fs::read(proc_path.join("cmdline"))?;
    Ok(first_cmdline_segment(&raw))
}

/// Counts entries under `/proc/<pid>/task`; 0 when the listing is unavailable.
pub fn count_threads(proc_path: &Path) -> usize {
    match fs::read_dir(proc_path.join("task")) {
        Ok(entries) => entries.flatten().count(),
        Err(_) => 0,
    }
}
