//! External build step
//!
//! The launcher does not compile anything itself; it runs the configured
//! build command and only cares about its pass/fail outcome. Any non-zero
//! exit aborts the whole sequence before the grant and spawn stages.

use std::os::unix::process::ExitStatusExt;

use tokio::process::Command;
use tracing::{error, info};

use crate::config::BuildConfig;
use crate::error::ProcessError;

/// Run the configured build command with inherited stdio
///
/// Returns `BuildFailed` carrying the build's own exit code so it can be
/// surfaced unchanged as the launcher's exit status. A build killed by a
/// signal is reported with the 128+signal convention.
pub async fn run_build(build: &BuildConfig) -> Result<(), ProcessError> {
    info!(program = %build.program, args = ?build.args, "Running build step");

    let status = Command::new(&build.program)
        .args(&build.args)
        .status()
        .await
        .map_err(|e| ProcessError::BuildUnavailable {
            reason: format!("{}: {}", build.program, e),
        })?;

    if status.success() {
        info!("Build step completed");
        return Ok(());
    }

    let code = status
        .code()
        .unwrap_or_else(|| 128 + status.signal().unwrap_or(0));
    error!(code, "Build step failed");
    Err(ProcessError::BuildFailed { code })
}
