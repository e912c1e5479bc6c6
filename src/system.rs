//! Host-wide values read once per scan.
//!
//! This module provides the kernel page size, the accounting tick rate and
//! the kernel uptime expressed in ticks, which anchors every process's
//! elapsed-time computation.

use once_cell::sync::Lazy;
use std::fs;
use std::io;
use std::path::Path;

/// Get system clock ticks per second (usually 100, but can vary).
fn get_clk_tck() -> u64 {
    #[cfg(unix)]
    {
        // SAFETY: sysconf is safe to call with _SC_CLK_TCK
        // Returns -1 on error, 0 if undefined - both are handled by the > 0 check
        unsafe {
            let tck = libc::sysconf(libc::_SC_CLK_TCK);
            if tck > 0 {
                return tck as u64;
            }
        }
    }
    100
}

/// Get the kernel memory page size in bytes.
fn get_page_size() -> u64 {
    #[cfg(unix)]
    {
        // SAFETY: sysconf is safe to call with _SC_PAGESIZE
        unsafe {
            let size = libc::sysconf(libc::_SC_PAGESIZE);
            if size > 0 {
                return size as u64;
            }
        }
    }
    4096
}

/// Accounting ticks per second (USER_HZ).
pub static CLK_TCK: Lazy<u64> = Lazy::new(get_clk_tck);

/// Memory page size in bytes.
pub static PAGE_SIZE: Lazy<u64> = Lazy::new(get_page_size);

/// Page size expressed in kilobytes, the multiplier for `statm` page counts.
pub fn page_size_kb() -> u64 {
    (*PAGE_SIZE / 1024).max(1)
}

/// Parses the first field of an uptime record ("12345.67 54321.00") into ticks.
pub fn parse_uptime_ticks(content: &str, ticks_per_second: u64) -> io::Result<u64> {
    let first = content
        .split_whitespace()
        .next()
        .ok_or_else(|| io::Error::other("Invalid uptime format: no fields found"))?;

    let seconds: f64 = first
        .parse()
        .map_err(|e| io::Error::other(format!("Failed to parse uptime '{}': {}", first, e)))?;

    Ok((seconds * ticks_per_second as f64).round() as u64)
}

/// Reads `<proc_root>/uptime` and converts it to accounting ticks.
pub fn read_uptime_ticks(proc_root: &Path) -> io::Result<u64> {
    let content = fs::read_to_string(proc_root.join("uptime"))?;
    parse_uptime_ticks(&content, *CLK_TCK)
}
