//! Grouped URES summaries appended to the table report.
//!
//! Groups are computed over every process in the snapshot, not just the
//! rendered rows, so their totals add up to the sum line.

use ahash::AHashMap as HashMap;
use std::io::{self, Write};

use super::format::format_cpu_time;
use super::table::JustifiedTable;
use super::RenderContext;
use crate::aggregate::ReportSnapshot;
use crate::snapshot::ProcessSnapshot;

/// Accumulated figures for one group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupSummary {
    pub name: String,
    pub processes: usize,
    pub unique_resident_kb: i64,
    pub shared_kb: u64,
    pub cpu_ticks: u64,
}

impl GroupSummary {
    fn add(&mut self, p: &ProcessSnapshot) {
        self.processes += 1;
        self.unique_resident_kb += p.unique_resident_kb();
        self.shared_kb += p.shared_kb;
        self.cpu_ticks += p.user_ticks + p.system_ticks;
    }
}

/// Groups processes by `key`, largest URES first; equal sizes keep the order
/// in which the groups first appeared.
pub fn group_by<F>(processes: &[ProcessSnapshot], mut key: F) -> Vec<GroupSummary>
where
    F: FnMut(&ProcessSnapshot) -> String,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut summaries: Vec<GroupSummary> = Vec::new();
    for p in processes {
        let name = key(p);
        let slot = *index.entry(name.clone()).or_insert_with(|| {
            summaries.push(GroupSummary {
                name,
                ..Default::default()
            });
            summaries.len() - 1
        });
        summaries[slot].add(p);
    }

    summaries.sort_by(|a, b| b.unique_resident_kb.cmp(&a.unique_resident_kb));
    summaries
}

fn print_label<W: Write + ?Sized>(out: &mut W, label: &str) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", label)?;
    writeln!(out, "{}", "-".repeat(label.chars().count()))
}

fn write_section<W: Write + ?Sized>(
    out: &mut W,
    label: &str,
    key_header: &str,
    groups: &[GroupSummary],
    ticks_per_second: u64,
) -> io::Result<()> {
    print_label(out, label)?;

    let mut table = JustifiedTable::new();
    table.add_row(
        [key_header, "processes", "URES", "SHR", "cputime"]
            .map(String::from)
            .to_vec(),
    );
    for g in groups {
        table.add_row(vec![
            g.name.clone(),
            g.processes.to_string(),
            g.unique_resident_kb.to_string(),
            g.shared_kb.to_string(),
            format_cpu_time(g.cpu_ticks, ticks_per_second),
        ]);
    }
    table.write_to(out, None)
}

/// Writes the per-user, per-program and (when CPUs were observed) per-CPU
/// sections.
pub fn write_breakdowns<W: Write + ?Sized>(
    snapshot: &ReportSnapshot,
    ctx: &mut RenderContext<'_>,
    out: &mut W,
) -> io::Result<()> {
    let processes = &snapshot.processes;
    let tps = ctx.ticks_per_second;

    let names = &mut *ctx.names;
    let by_user = group_by(processes, |p| names.user_name(p.uid));
    write_section(out, "URES by user", "user", &by_user, tps)?;

    let by_program = group_by(processes, |p| p.program_name().to_string());
    write_section(out, "URES by program", "program", &by_program, tps)?;

    if snapshot.show_cpu() {
        let by_cpu = group_by(processes, |p| p.cpu_last_run.to_string());
        write_section(out, "URES by CPU", "CPU", &by_cpu, tps)?;
    }
    Ok(())
}
