//! End-to-end tests: fake proc root -> scan -> aggregate -> rendered report.

mod common;

use std::fs;

use common::{render_report, write_proc_entry, write_proc_entry_with_comm, write_uptime, PAGE_KB};
use nix::unistd::{getuid, User};
use pg_meminfo::cli::Args;
use pg_meminfo::config::{resolve_config, validate_effective_config, Config, ConfigError};
use pg_meminfo::report::{OutputMode, ReportOptions};
use pg_meminfo::system::page_size_kb;
use pg_meminfo::{
    reader_for, run_report, scan_processes, ProcessReader, QueryAttribution, QueryInfo,
    ReportSnapshot, RunError,
};
use tempfile::{tempdir, TempDir};

/// Three processes whose unique resident sizes are 8000, 4000 and 7500 KB.
fn three_process_root() -> TempDir {
    let root = tempdir().expect("Failed to create temp dir");
    write_proc_entry(root.path(), 100, 10000, 2000, "");
    write_proc_entry(root.path(), 200, 5000, 1000, "");
    write_proc_entry(root.path(), 300, 8000, 500, "");
    write_uptime(root.path(), 1000.0);
    root
}

fn scan(root: &TempDir) -> ReportSnapshot {
    scan_as(root, None)
}

fn scan_as(root: &TempDir, uid_filter: Option<u32>) -> ReportSnapshot {
    let reader = ProcessReader::new(root.path(), PAGE_KB, 100_000, uid_filter);
    let (processes, _) = scan_processes(&reader, None).expect("scan failed");
    ReportSnapshot::aggregate(processes)
}

/// Total of `three_process_root` when read with the host page size, as a
/// full run does.
fn host_total() -> u64 {
    19500 / PAGE_KB * page_size_kb()
}

/// Configuration for a run against a fake proc root, without any config file.
fn run_config(root: &TempDir) -> Config {
    Config {
        proc_root: Some(root.path().to_path_buf()),
        ..Config::default()
    }
}

fn options(mode: OutputMode, row_limit: Option<usize>) -> ReportOptions {
    ReportOptions {
        mode,
        row_limit,
        query_columns: false,
        user: None,
    }
}

fn first_cells(report: &str) -> Vec<String> {
    report
        .lines()
        .map(|l| l.split_whitespace().next().unwrap_or("").to_string())
        .collect()
}

#[test]
fn test_table_ranks_by_unique_resident_and_sums_all() {
    let root = three_process_root();
    let snapshot = scan(&root);

    let out = render_report(
        &snapshot,
        &options(
            OutputMode::Table {
                header_every: None,
                breakdown: false,
            },
            None,
        ),
    );
    assert_eq!(first_cells(&out)[..4], ["PID", "100", "300", "200"]);
    assert_eq!(
        out.lines().last(),
        Some("Unique Resident Memory sum: 19500 Kilobytes")
    );
}

#[test]
fn test_csv_row_limit_keeps_order_and_omits_sum() {
    let root = three_process_root();
    let snapshot = scan(&root);

    let out = render_report(&snapshot, &options(OutputMode::Csv, Some(2)));
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("epoch_time,PID,UID,URES,SHR,VIRT,"));
    assert!(lines[1].starts_with("1700000000.000,100,postgres,8000,2000,"));
    assert!(lines[2].starts_with("1700000000.000,300,postgres,7500,500,"));
    assert!(!out.contains("Unique Resident Memory sum"));

    // the total still covers the processes that were not rendered
    assert_eq!(snapshot.total_unique_resident_kb, 19500);
}

#[test]
fn test_sum_only_with_user_covers_only_that_user() {
    let root = three_process_root();
    let own_uid = getuid().as_raw();
    let mut opts = options(OutputMode::SumOnly, Some(1));
    opts.user = Some("postgres".to_string());

    // every fixture file belongs to the user running the tests
    let own = scan_as(&root, Some(own_uid));
    assert_eq!(own.processes.len(), 3);
    assert_eq!(
        render_report(&own, &opts),
        "Unique Resident Memory sum: 19500 Kilobytes, for user postgres\n"
    );

    let other = scan_as(&root, Some(own_uid.wrapping_add(1)));
    assert!(other.processes.is_empty());
    assert_eq!(
        render_report(&other, &opts),
        "Unique Resident Memory sum: 0 Kilobytes, for user postgres\n"
    );
}

#[test]
fn test_run_sum_only_for_named_user() {
    let Some(user) = User::from_uid(getuid()).ok().flatten() else {
        return;
    };
    let root = three_process_root();
    let config = Config {
        user: Some(user.name.clone()),
        sum_only: Some(true),
        ..run_config(&root)
    };

    let mut stdout = Vec::new();
    let stats = run_report(&config, &mut stdout).expect("run failed");
    assert_eq!(stats.included, 3);
    assert_eq!(
        String::from_utf8(stdout).unwrap(),
        format!(
            "Unique Resident Memory sum: {} Kilobytes, for user {}\n",
            host_total(),
            user.name
        )
    );
}

#[test]
fn test_run_sum_only_ignores_query_attribution() {
    let root = three_process_root();
    let out_dir = tempdir().expect("Failed to create temp dir");
    let path = out_dir.path().join("report.csv");
    let config = Config {
        sum_only: Some(true),
        csv: Some(true),
        output: Some(path.display().to_string()),
        postgres_query: Some(true),
        // nothing listens here; a connection attempt would fail the run
        database_url: Some("postgres://postgres@127.0.0.1:1/postgres".to_string()),
        ..run_config(&root)
    };

    let mut stdout = Vec::new();
    run_report(&config, &mut stdout).expect("run failed");
    assert_eq!(
        String::from_utf8(stdout).unwrap(),
        format!("Unique Resident Memory sum: {} Kilobytes\n", host_total())
    );
    assert!(!path.exists());
}

#[test]
fn test_run_unknown_user_fails_before_scan() {
    // no uptime file: a scan would fail with a different error
    let root = tempdir().expect("Failed to create temp dir");
    write_proc_entry(root.path(), 100, 10000, 2000, "");
    let path = root.path().join("report.csv");
    let config = Config {
        user: Some("no-such-user-pg-meminfo-test".to_string()),
        csv: Some(true),
        output: Some(path.display().to_string()),
        proc_root: Some(root.path().to_path_buf()),
        ..Config::default()
    };

    let mut stdout = Vec::new();
    let err = run_report(&config, &mut stdout).unwrap_err();
    assert!(matches!(err, RunError::Config(ConfigError::Invalid(_))));
    assert!(err.to_string().contains("unknown user"));
    assert!(stdout.is_empty());
    assert!(!path.exists());
}

#[test]
fn test_non_utf8_command_name_is_counted() {
    let root = tempdir().expect("Failed to create temp dir");
    write_proc_entry(root.path(), 100, 10000, 2000, "VmLck:\t0 kB\n");
    write_proc_entry_with_comm(root.path(), 200, 5000, 1000, b"proc\x01\xff", "VmLck:\t0 kB\n");

    let reader = ProcessReader::new(root.path(), PAGE_KB, 100_000, None);
    let (processes, stats) = scan_processes(&reader, None).expect("scan failed");
    assert_eq!(stats.included, 2);
    assert_eq!(stats.failed, 0);

    let snapshot = ReportSnapshot::aggregate(processes);
    assert_eq!(snapshot.total_unique_resident_kb, 12000);
    assert_eq!(snapshot.processes[1].pid, 200);
}

#[test]
fn test_overflowed_counter_renders_sentinel_and_absent_renders_empty() {
    let root = tempdir().expect("Failed to create temp dir");
    write_proc_entry(
        root.path(),
        10,
        4000,
        0,
        "VmPeak:\t5000000 kB\nVmLck:\t0 kB\nVmSwap:\t12 kB\n",
    );
    write_proc_entry(root.path(), 11, 2000, 0, "");
    let snapshot = scan(&root);
    assert_eq!(snapshot.extended_columns, vec!["LCKD", "VIRT-P"]);

    let out = render_report(&snapshot, &options(OutputMode::Csv, None));
    let lines: Vec<&str> = out.lines().collect();
    assert!(lines[0].contains(",VIRT,lckd,virt-p,MINFLT,"));
    // VmLck present as zero, VmPeak above the plausibility limit
    assert!(lines[1].contains(",10,postgres,4000,0,12000,0,-1,10,1,"));
    // no extended counters at all: empty cells, not zeros
    assert!(lines[2].contains(",11,postgres,2000,0,6000,,,10,1,"));
}

#[test]
fn test_kernel_threads_and_vanished_entries_are_skipped() {
    let root = three_process_root();
    // kernel thread: no address space
    write_proc_entry(root.path(), 2, 0, 0, "");
    // listed but gone before it could be read
    fs::create_dir(root.path().join("999")).unwrap();
    fs::create_dir(root.path().join("self")).unwrap();

    let reader = reader_for(root.path(), None).expect("reader");
    let (processes, stats) = scan_processes(&reader, None).expect("scan failed");
    assert_eq!(processes.len(), 3);
    assert_eq!(stats.filtered, 1);
    assert_eq!(stats.vanished, 1);
}

struct OneQuery;

impl QueryAttribution for OneQuery {
    fn query_for(&mut self, pid: u32) -> Option<QueryInfo> {
        (pid == 200).then(|| QueryInfo {
            state: "active".into(),
            wait_state: "IO:DataFileRead".into(),
            text: "SELECT count(*) FROM big".into(),
        })
    }
}

#[test]
fn test_query_columns_follow_rendered_rows() {
    let root = three_process_root();
    let reader = ProcessReader::new(root.path(), PAGE_KB, 100_000, None);
    let mut service = OneQuery;
    let (processes, _) = scan_processes(&reader, Some(&mut service)).expect("scan failed");
    let snapshot = ReportSnapshot::aggregate(processes);

    let mut opts = options(OutputMode::Csv, None);
    opts.query_columns = true;
    let out = render_report(&snapshot, &opts);
    let lines: Vec<&str> = out.lines().collect();
    assert!(lines[0].ends_with(",qry_state,qry_waiting,query"));
    assert!(lines[1].ends_with(",,,"));
    assert!(lines[3].ends_with(",active,IO:DataFileRead,SELECT count(*) FROM big"));

    // pid 200 ranks last; with two rows rendered no query text is shown
    opts.row_limit = Some(2);
    let out = render_report(&snapshot, &opts);
    assert!(!out.contains("qry_state"));
}

#[test]
fn test_file_output_without_csv_is_rejected() {
    let args = Args {
        no_config: true,
        output: Some("/tmp/pg-meminfo-report.csv".to_string()),
        ..Default::default()
    };
    let config = resolve_config(&args).unwrap();
    assert!(matches!(
        validate_effective_config(&config),
        Err(ConfigError::Invalid(_))
    ));

    // the run refuses before creating the target
    let out_dir = tempdir().expect("Failed to create temp dir");
    let path = out_dir.path().join("report.txt");
    let root = three_process_root();
    let rejected = Config {
        output: Some(path.display().to_string()),
        ..run_config(&root)
    };
    let mut stdout = Vec::new();
    let err = run_report(&rejected, &mut stdout).unwrap_err();
    assert!(matches!(err, RunError::Config(ConfigError::Invalid(_))));
    assert!(stdout.is_empty());
    assert!(!path.exists());

    let args = Args {
        csv: true,
        ..args
    };
    let config = resolve_config(&args).unwrap();
    assert!(validate_effective_config(&config).is_ok());
    assert_eq!(config.output_mode(), OutputMode::Csv);
}
