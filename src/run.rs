//! One report run: configuration checks, a single scan and the rendered
//! output.
//!
//! Everything that can reject the configuration (an invalid output target,
//! an unknown filter user, an unreachable database) is checked before the
//! output file is opened and before the proc filesystem is scanned.

use chrono::Local;
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::{debug, info};

use crate::config::{validate_effective_config, Config, ConfigError, OutputTarget};
use crate::process::{reader_for, scan_processes, ScanError, ScanStats};
use crate::query::{connect_options, PgActivityService, QueryAttribution, QueryError};
use crate::report::{render, OutputMode, RenderContext, ReportError};
use crate::startup_checks::{validate_requirements, ValidationError};
use crate::system::CLK_TCK;
use crate::users::{lookup_uid, UserNameCache};
use crate::ReportSnapshot;

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Requirements(#[from] ValidationError),

    #[error("cannot look up user '{name}': {source}")]
    UserLookup {
        name: String,
        #[source]
        source: nix::Error,
    },

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("cannot open output file {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Report(#[from] ReportError),
}

/// Resolves the filter user to a uid. An unknown user is a configuration error.
pub fn resolve_user_filter(user: Option<&str>) -> Result<Option<u32>, RunError> {
    let Some(name) = user else {
        return Ok(None);
    };
    let uid = lookup_uid(name).map_err(|source| RunError::UserLookup {
        name: name.to_string(),
        source,
    })?;
    match uid {
        Some(uid) => {
            debug!("Filtering processes of user {} (uid={})", name, uid);
            Ok(Some(uid))
        }
        None => Err(ConfigError::Invalid(format!("unknown user '{}'", name)).into()),
    }
}

/// Opens the report sink. A file target is created (and truncated) here;
/// sum-only output always goes to `stdout`.
pub fn open_output<'a>(
    config: &Config,
    mode: &OutputMode,
    stdout: &'a mut dyn Write,
) -> Result<Box<dyn Write + 'a>, RunError> {
    match (mode, config.output_target()) {
        (OutputMode::SumOnly, _) | (_, OutputTarget::Stdout) => Ok(Box::new(stdout)),
        (_, OutputTarget::File(path)) => {
            debug!("Writing report to {}", path.display());
            let file = File::create(&path).map_err(|source| RunError::Output { path, source })?;
            Ok(Box::new(file))
        }
    }
}

/// Runs one scan and renders the report; stdout-bound output goes to
/// `stdout`.
pub fn run_report(config: &Config, stdout: &mut dyn Write) -> Result<ScanStats, RunError> {
    validate_effective_config(config)?;

    let proc_root = config.proc_root();
    validate_requirements(&proc_root)?;

    let uid_filter = resolve_user_filter(config.user.as_deref())?;
    let options = config.report_options();

    let mut attribution = if config.query_attribution() {
        let connect = connect_options(config.database_url.as_deref())?;
        Some(PgActivityService::connect(connect)?)
    } else {
        None
    };

    let mut out = open_output(config, &options.mode, stdout)?;

    let reader = reader_for(&proc_root, uid_filter)?;
    let (processes, stats) = scan_processes(
        &reader,
        attribution
            .as_mut()
            .map(|service| service as &mut dyn QueryAttribution),
    )?;
    let snapshot = ReportSnapshot::aggregate(processes);
    info!(
        "Reporting {} processes, {} KB unique resident",
        stats.included, snapshot.total_unique_resident_kb
    );

    let mut names = UserNameCache::new();
    let mut ctx = RenderContext {
        names: &mut names,
        now: Local::now(),
        ticks_per_second: *CLK_TCK,
    };
    render(&snapshot, &options, &mut ctx, &mut *out)?;
    out.flush().map_err(ReportError::from)?;

    debug!("Resolved {} user names", names.len());
    Ok(stats)
}
