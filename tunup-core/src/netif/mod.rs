//! Network interface configuration
//!
//! Assigns the IPv4 address and brings the link up on the interface the
//! child created, by shelling out to ip(8). Both requests are made against
//! a fixed, well-known interface name; the launcher never creates the
//! interface itself.

use std::net::Ipv4Addr;

use tokio::process::Command;
use tracing::{error, info};

use crate::error::NetError;

pub mod readiness;

// Public re-exports
pub use readiness::{wait_for_interface, ReadinessPolicy};

/// Attach `address/prefix_len` to the named interface
///
/// Runs `ip addr add A/P dev I`.
pub async fn assign_address(
    ip: &str,
    ifname: &str,
    address: Ipv4Addr,
    prefix_len: u8,
) -> Result<(), NetError> {
    let cidr = format!("{}/{}", address, prefix_len);
    info!(interface = ifname, address = %cidr, "Assigning address");
    run_ip(ip, ifname, &["addr", "add", &cidr, "dev", ifname]).await
}

/// Mark the named interface administratively up
///
/// Runs `ip link set up dev I`.
pub async fn set_link_up(ip: &str, ifname: &str) -> Result<(), NetError> {
    info!(interface = ifname, "Setting link up");
    run_ip(ip, ifname, &["link", "set", "up", "dev", ifname]).await
}

/// Run one ip(8) request and classify its failure
async fn run_ip(ip: &str, ifname: &str, args: &[&str]) -> Result<(), NetError> {
    let output = Command::new(ip)
        .args(args)
        .output()
        .await
        .map_err(|e| NetError::CommandFailed {
            name: ifname.to_string(),
            detail: format!("{}: {}", ip, e),
        })?;

    if output.status.success() {
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    let err = classify_failure(ifname, stderr.trim());
    error!(interface = ifname, stderr = %stderr.trim(), "ip command failed");
    Err(err)
}

/// Map ip(8) stderr to the error taxonomy
///
/// iproute2 reports kernel errnos as "RTNETLINK answers: ..." lines and a
/// nonexistent device as "Cannot find device".
fn classify_failure(ifname: &str, stderr: &str) -> NetError {
    let lowered = stderr.to_lowercase();

    if lowered.contains("cannot find device") || lowered.contains("does not exist") {
        NetError::InterfaceNotFound {
            name: ifname.to_string(),
        }
    } else if lowered.contains("file exists") || lowered.contains("address already assigned") {
        NetError::AddressConflict {
            name: ifname.to_string(),
            detail: stderr.to_string(),
        }
    } else if lowered.contains("operation not permitted") || lowered.contains("permission denied")
    {
        NetError::PermissionDenied {
            name: ifname.to_string(),
            detail: stderr.to_string(),
        }
    } else {
        NetError::CommandFailed {
            name: ifname.to_string(),
            detail: stderr.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};
    use tempfile::tempdir;

    #[test]
    fn test_classify_missing_device() {
        let err = classify_failure("tun0", "Cannot find device \"tun0\"");
        assert_eq!(
            err,
            NetError::InterfaceNotFound {
                name: "tun0".to_string()
            }
        );
    }

    #[test]
    fn test_classify_address_conflict() {
        let err = classify_failure("tun0", "RTNETLINK answers: File exists");
        assert!(matches!(err, NetError::AddressConflict { .. }));
    }

    #[test]
    fn test_classify_permission_denied() {
        let err = classify_failure("tun0", "RTNETLINK answers: Operation not permitted");
        assert!(matches!(err, NetError::PermissionDenied { .. }));
    }

    #[test]
    fn test_classify_unknown_failure() {
        let err = classify_failure("tun0", "RTNETLINK answers: Invalid argument");
        assert!(matches!(err, NetError::CommandFailed { .. }));
    }

    fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[tokio::test]
    async fn test_assign_address_arguments() {
        let dir = tempdir().unwrap();
        let log = dir.path().join("ip.log");
        let fake_ip = write_script(
            dir.path(),
            "ip",
            &format!("echo \"$@\" >> {}; exit 0", log.display()),
        );

        assign_address(
            fake_ip.to_str().unwrap(),
            "tun0",
            Ipv4Addr::new(10, 12, 1, 1),
            24,
        )
        .await
        .unwrap();
        set_link_up(fake_ip.to_str().unwrap(), "tun0").await.unwrap();

        let recorded = std::fs::read_to_string(&log).unwrap();
        assert!(recorded.contains("addr add 10.12.1.1/24 dev tun0"));
        assert!(recorded.contains("link set up dev tun0"));
    }

    #[tokio::test]
    async fn test_failure_classified_from_stderr() {
        let dir = tempdir().unwrap();
        let fake_ip = write_script(
            dir.path(),
            "ip",
            "echo 'RTNETLINK answers: File exists' >&2; exit 2",
        );

        let err = assign_address(
            fake_ip.to_str().unwrap(),
            "tun0",
            Ipv4Addr::new(10, 12, 1, 1),
            24,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, NetError::AddressConflict { .. }));
    }
}
