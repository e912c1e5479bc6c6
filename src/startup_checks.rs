//! Startup requirement validation for pg-meminfo.
//!
//! This module validates that the reporter has the permissions and proc
//! filesystem it needs before a scan starts.

use nix::unistd::geteuid;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Validate all runtime requirements
pub fn validate_requirements(proc_root: &Path) -> Result<(), ValidationError> {
    debug!("Validating runtime requirements...");

    check_user_privileges();
    check_proc_access(proc_root)?;

    debug!("All runtime requirements validated");
    Ok(())
}

/// Returns whether we run as root. Not being root is never fatal: processes
/// of other users are then skipped as they are encountered.
pub fn check_user_privileges() -> bool {
    let root = geteuid().is_root();
    if root {
        info!("Running as root (uid=0)");
    } else {
        warn!("⚠️  Not running as root - processes of other users may be skipped");
    }
    root
}

/// Checks that the proc root exists and can be listed.
pub fn check_proc_access(proc_root: &Path) -> Result<(), ValidationError> {
    match fs::read_dir(proc_root) {
        Ok(_) => {
            debug!("✅ {} is readable", proc_root.display());
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            error!("❌ {} not found - is the proc filesystem mounted?", proc_root.display());
            Err(ValidationError::ProcRootMissing(proc_root.to_path_buf()))
        }
        Err(e) => {
            error!("❌ Cannot read {}: {}", proc_root.display(), e);
            Err(ValidationError::ProcRootUnreadable {
                path: proc_root.to_path_buf(),
                source: e,
            })
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("proc filesystem not found at {0}")]
    ProcRootMissing(PathBuf),

    #[error("cannot read proc filesystem at {path}: {source}")]
    ProcRootUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
