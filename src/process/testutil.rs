//! Fake `/proc/<pid>` trees for collector tests.

use std::fs;
use std::path::Path;

/// Description of a process to materialize under a fake proc root.
#[derive(Debug, Clone)]
pub struct FakeProcess {
    pub pid: u32,
    pub size_pages: u64,
    pub resident_pages: u64,
    pub shared_pages: u64,
    pub threads: usize,
    pub processor: u32,
    pub start_ticks: u64,
    pub command: String,
    pub with_vm_status: bool,
}

impl FakeProcess {
    pub fn new(pid: u32, size_pages: u64, resident_pages: u64, shared_pages: u64) -> Self {
        Self {
            pid,
            size_pages,
            resident_pages,
            shared_pages,
            threads: 2,
            processor: 3,
            start_ticks: 8812,
            command: "/usr/lib/postgresql/bin/postgres".to_string(),
            with_vm_status: true,
        }
    }
}

/// Writes `statm`, `status`, `stat`, `cmdline` and `task/` for `p` under `root`.
pub fn write_process(root: &Path, p: &FakeProcess) {
    let dir = root.join(p.pid.to_string());
    fs::create_dir_all(&dir).expect("Failed to create pid dir");

    fs::write(
        dir.join("statm"),
        format!("{} {} {} 0 0 0 0\n", p.size_pages, p.resident_pages, p.shared_pages),
    )
    .expect("Failed to write statm");

    let mut status = format!("Name:\tpostgres\nState:\tS (sleeping)\nPid:\t{}\n", p.pid);
    if p.with_vm_status {
        status.push_str(&format!(
            "VmPeak:\t{} kB\nVmSize:\t{} kB\nVmHWM:\t{} kB\nVmRSS:\t{} kB\n",
            p.size_pages * 4,
            p.size_pages * 4,
            p.resident_pages * 4,
            p.resident_pages * 4
        ));
    }
    fs::write(dir.join("status"), status).expect("Failed to write status");

    fs::write(
        dir.join("stat"),
        format!(
            "{} (postgres) S 1 {} {} 0 -1 4194560 2543 0 7 0 112 45 0 0 20 0 {} 0 {} 227606528 6903 18446744073709551615 1 1 0 0 0 0 0 4096 16903 0 0 0 17 {} 0 0 0 0 0\n",
            p.pid, p.pid, p.pid, p.threads.max(1), p.start_ticks, p.processor
        ),
    )
    .expect("Failed to write stat");

    let mut cmdline = p.command.clone().into_bytes();
    cmdline.extend_from_slice(b"\0-D\0/var/lib/postgresql/data\0");
    fs::write(dir.join("cmdline"), cmdline).expect("Failed to write cmdline");

    for i in 0..p.threads {
        fs::create_dir_all(dir.join("task").join((p.pid as usize + i).to_string()))
            .expect("Failed to create task dir");
    }
}
