//! File capability grant
//!
//! Attaches CAP_NET_ADMIN to the built artifact as file metadata so the
//! spawned child can create and configure network interfaces without
//! running as root. The grant itself requires elevated privilege, which is
//! why the launcher is typically invoked via sudo; the child never is.

use std::path::Path;

use tokio::process::Command;
use tracing::{debug, error, info};

use crate::error::ProcessError;

/// Capability descriptor granted to the artifact
///
/// effective + inheritable + permitted, network administration only.
pub const NET_ADMIN_FLAGS: &str = "cap_net_admin=eip";

/// Grant CAP_NET_ADMIN to the artifact file
///
/// Runs `setcap cap_net_admin=eip <artifact>`. Failure is fatal for the
/// launcher and the child is never spawned; the setcap exit code is
/// carried so it can be propagated unchanged.
pub async fn grant_net_admin(setcap: &str, artifact: &Path) -> Result<(), ProcessError> {
    info!(artifact = %artifact.display(), flags = NET_ADMIN_FLAGS, "Granting file capability");

    let output = Command::new(setcap)
        .arg(NET_ADMIN_FLAGS)
        .arg(artifact)
        .output()
        .await
        .map_err(|e| ProcessError::GrantUnavailable {
            reason: format!("{}: {}", setcap, e),
        })?;

    if output.status.success() {
        debug!("Capability grant succeeded");
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    let code = output.status.code().unwrap_or(1);
    error!(code, stderr = %stderr.trim(), "Capability grant failed");
    Err(ProcessError::GrantFailed { code })
}

/// Check whether the artifact carries CAP_NET_ADMIN
///
/// Parses `getcap <artifact>` output. Used by the `grant` subcommand to
/// confirm the grant took on the underlying filesystem.
pub async fn verify_net_admin(getcap: &str, artifact: &Path) -> Result<bool, ProcessError> {
    let output = Command::new(getcap)
        .arg(artifact)
        .output()
        .await
        .map_err(|e| ProcessError::GrantUnavailable {
            reason: format!("{}: {}", getcap, e),
        })?;

    if !output.status.success() {
        return Ok(false);
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(stdout.contains("cap_net_admin"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::tempdir;

    fn write_script(dir: &Path, name: &str, body: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[tokio::test]
    async fn test_grant_failure_carries_exit_code() {
        let dir = tempdir().unwrap();
        let fake_setcap = write_script(dir.path(), "setcap", "exit 5");

        let err = grant_net_admin(fake_setcap.to_str().unwrap(), Path::new("/tmp/artifact"))
            .await
            .unwrap_err();
        assert_eq!(err, ProcessError::GrantFailed { code: 5 });
    }

    #[tokio::test]
    async fn test_grant_success() {
        let dir = tempdir().unwrap();
        let fake_setcap = write_script(dir.path(), "setcap", "exit 0");

        let result =
            grant_net_admin(fake_setcap.to_str().unwrap(), Path::new("/tmp/artifact")).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_verify_parses_getcap_output() {
        let dir = tempdir().unwrap();

        let with_cap = write_script(
            dir.path(),
            "getcap-yes",
            "echo \"$1 cap_net_admin=eip\"; exit 0",
        );
        let without_cap = write_script(dir.path(), "getcap-no", "exit 0");

        assert!(
            verify_net_admin(with_cap.to_str().unwrap(), Path::new("/tmp/artifact"))
                .await
                .unwrap()
        );
        assert!(
            !verify_net_admin(without_cap.to_str().unwrap(), Path::new("/tmp/artifact"))
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_missing_setcap_binary() {
        let err = grant_net_admin("/nonexistent/setcap", Path::new("/tmp/artifact"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessError::GrantUnavailable { .. }));
    }
}
