//! Shared helpers for integration tests: a fake proc root on disk and a
//! deterministic user name lookup.

#![allow(dead_code)]

use std::fs;
use std::path::Path;

use chrono::{Local, TimeZone};
use pg_meminfo::report::{render, RenderContext, ReportOptions};
use pg_meminfo::{NameLookup, ReportSnapshot};

/// Kilobytes per page used by the fixed-page-size readers in these tests.
pub const PAGE_KB: u64 = 4;

/// Writes the minimal files the collector reads for one process.
/// Sizes are given in kilobytes and converted with `PAGE_KB`.
pub fn write_proc_entry(root: &Path, pid: u32, resident_kb: u64, shared_kb: u64, status_extra: &str) {
    let comm = format!("proc {pid}");
    write_proc_entry_with_comm(root, pid, resident_kb, shared_kb, comm.as_bytes(), status_extra);
}

/// Like `write_proc_entry`, with the raw command name written into both
/// `stat` and the `Name:` line of `status`.
pub fn write_proc_entry_with_comm(
    root: &Path,
    pid: u32,
    resident_kb: u64,
    shared_kb: u64,
    comm: &[u8],
    status_extra: &str,
) {
    let dir = root.join(pid.to_string());
    fs::create_dir_all(dir.join("task").join(pid.to_string())).unwrap();

    let size_pages = resident_kb * 3 / PAGE_KB;
    fs::write(
        dir.join("statm"),
        format!(
            "{} {} {} 1 0 100 0\n",
            size_pages,
            resident_kb / PAGE_KB,
            shared_kb / PAGE_KB
        ),
    )
    .unwrap();

    let mut status = b"Name:\t".to_vec();
    status.extend_from_slice(comm);
    status.extend_from_slice(format!("\nUmask:\t0077\nState:\tS (sleeping)\n{status_extra}").as_bytes());
    fs::write(dir.join("status"), status).unwrap();

    let mut stat = format!("{pid} (").into_bytes();
    stat.extend_from_slice(comm);
    stat.extend_from_slice(
        b") S 1 1 1 0 -1 4194304 10 0 1 0 250 50 0 0 20 0 1 0 500 \
          1000 100 18446744073709551615 1 1 0 0 0 0 0 0 0 0 0 0 17 0 0 0 0 0 0\n",
    );
    fs::write(dir.join("stat"), stat).unwrap();
    fs::write(dir.join("cmdline"), format!("/usr/bin/proc{pid}\0--flag\0")).unwrap();
}

pub fn write_uptime(root: &Path, seconds: f64) {
    fs::write(root.join("uptime"), format!("{seconds:.2} 0.00\n")).unwrap();
}

/// Resolves every uid to the same name.
pub struct FixedNames(pub &'static str);

impl NameLookup for FixedNames {
    fn user_name(&mut self, _uid: u32) -> String {
        self.0.to_string()
    }
}

/// Renders a report with a fixed clock and returns it as text.
pub fn render_report(snapshot: &ReportSnapshot, options: &ReportOptions) -> String {
    let mut names = FixedNames("postgres");
    let mut ctx = RenderContext {
        names: &mut names,
        now: Local.timestamp_opt(1_700_000_000, 0).single().unwrap(),
        ticks_per_second: 100,
    };
    let mut out = Vec::new();
    render(snapshot, options, &mut ctx, &mut out).unwrap();
    String::from_utf8(out).unwrap()
}
