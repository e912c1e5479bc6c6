//! Cell formatting helpers shared by the report modes.

use chrono::{DateTime, Duration, Local};

const SECONDS_PER_DAY: u64 = 60 * 60 * 24;

/// Upper bound on a process age, keeps the date arithmetic in range.
const MAX_AGE_SECONDS: u64 = 100 * 365 * SECONDS_PER_DAY;

/// Renders when a process started, given how many ticks ago that was.
///
/// Less than a day ago renders as local `HH:MM:SS`, otherwise as `YYYY-MM-DD`.
pub fn format_started(elapsed_ticks: u64, ticks_per_second: u64, now: DateTime<Local>) -> String {
    let seconds = elapsed_ticks / ticks_per_second.max(1);
    let started = now - Duration::seconds(seconds.min(MAX_AGE_SECONDS) as i64);

    if seconds < SECONDS_PER_DAY {
        started.format("%H:%M:%S").to_string()
    } else {
        started.format("%Y-%m-%d").to_string()
    }
}

/// Formats accumulated CPU ticks as `Ns`, `NmSSs` or `NhMMmSSs`.
pub fn format_cpu_time(ticks: u64, ticks_per_second: u64) -> String {
    let total = ticks / ticks_per_second.max(1);
    if total < 60 {
        return format!("{}s", total);
    }

    let secs = total % 60;
    let minutes = total / 60;
    if minutes < 60 {
        return format!("{}m{:02}s", minutes, secs);
    }
    format!("{}h{:02}m{:02}s", minutes / 60, minutes % 60, secs)
}

/// Seconds since the Unix epoch with millisecond precision.
pub fn format_epoch(now: DateTime<Local>) -> String {
    let millis = now.timestamp_millis();
    format!("{}.{:03}", millis.div_euclid(1000), millis.rem_euclid(1000))
}

/// Renders an optional counter; absent values render empty, never as zero.
pub fn format_optional(value: Option<i64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
