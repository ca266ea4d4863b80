//! Child process spawning, waiting and termination
//!
//! The launcher supervises exactly one child: the built artifact. The
//! child is spawned into its own process group so the launcher's terminal
//! signals are not delivered to it directly; the signal relay forwards
//! them deliberately instead.

use std::os::unix::process::ExitStatusExt;
use std::path::Path;

use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use tokio::process::{Child, Command};
use tokio::time::{sleep, Duration};
use tracing::{info, warn};

use crate::error::ProcessError;

/// Terminal outcome of the child process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitOutcome {
    /// The child exited normally with this code
    Exited(i32),

    /// The child was terminated by this signal
    Signaled(i32),
}

impl ExitOutcome {
    /// Process exit code the launcher should propagate
    ///
    /// A signal death is synthesized as 128 + signal number so it stays
    /// distinguishable from normal exit codes.
    pub fn exit_code(&self) -> i32 {
        match self {
            ExitOutcome::Exited(code) => *code,
            ExitOutcome::Signaled(signal) => 128 + signal,
        }
    }
}

impl std::fmt::Display for ExitOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExitOutcome::Exited(code) => write!(f, "exited with code {}", code),
            ExitOutcome::Signaled(signal) => write!(f, "killed by signal {}", signal),
        }
    }
}

impl From<std::process::ExitStatus> for ExitOutcome {
    fn from(status: std::process::ExitStatus) -> Self {
        match status.code() {
            Some(code) => ExitOutcome::Exited(code),
            // No exit code means signal death on Unix
            None => ExitOutcome::Signaled(status.signal().unwrap_or(0)),
        }
    }
}

/// Handle to the supervised child process
#[derive(Debug)]
pub struct ChildHandle {
    child: Child,
    pid: i32,
}

/// Spawn the artifact as a detached child
///
/// The child is invoked with no arguments, inherits the environment and
/// stdio, and is placed in a fresh process group so it is not part of the
/// invoking terminal's foreground group. The spawn call's own result is
/// what decides `SpawnFailed`; the child's outcome only comes from `wait`.
pub async fn spawn_detached(artifact: &Path) -> Result<ChildHandle, ProcessError> {
    let mut command = Command::new(artifact);
    command.process_group(0);

    let child = command.spawn().map_err(|e| ProcessError::SpawnFailed {
        artifact: artifact.display().to_string(),
        reason: e.to_string(),
    })?;

    let pid = child
        .id()
        .map(|pid| pid as i32)
        .ok_or_else(|| ProcessError::SpawnFailed {
            artifact: artifact.display().to_string(),
            reason: "child exited before its pid could be read".to_string(),
        })?;

    info!(artifact = %artifact.display(), pid, "Spawned child process");
    Ok(ChildHandle { child, pid })
}

impl ChildHandle {
    /// Process identifier of the child
    pub fn pid(&self) -> i32 {
        self.pid
    }

    /// Block until the child terminates and report its true outcome
    pub async fn wait(&mut self) -> Result<ExitOutcome, ProcessError> {
        let status = self
            .child
            .wait()
            .await
            .map_err(|e| ProcessError::WaitFailed {
                reason: e.to_string(),
            })?;

        let outcome = ExitOutcome::from(status);
        info!(pid = self.pid, %outcome, "Child process terminated");
        Ok(outcome)
    }

    /// Terminate the child gracefully
    ///
    /// Sends SIGTERM, waits up to 2 seconds for it to exit, then sends
    /// SIGKILL. Used when the interface never appears and the child would
    /// otherwise be orphaned.
    pub async fn terminate(mut self) -> Result<ExitOutcome, ProcessError> {
        let pid = Pid::from_raw(self.pid);

        if let Err(e) = kill(pid, Signal::SIGTERM) {
            // ESRCH means it already exited; reap it below
            if e != nix::errno::Errno::ESRCH {
                warn!(pid = self.pid, error = %e, "Failed to send SIGTERM");
                return Err(ProcessError::TerminationFailed { pid: self.pid });
            }
        }

        for _ in 0..10 {
            if let Ok(Some(status)) = self.child.try_wait() {
                return Ok(ExitOutcome::from(status));
            }
            sleep(Duration::from_millis(200)).await;
        }

        warn!(pid = self.pid, "Child ignored SIGTERM, sending SIGKILL");
        if let Err(e) = kill(pid, Signal::SIGKILL) {
            if e != nix::errno::Errno::ESRCH {
                return Err(ProcessError::TerminationFailed { pid: self.pid });
            }
        }

        self.wait().await
    }
}

/// Forward a signal to a process by pid
///
/// A vanished child (ESRCH) is not an error: its exit is about to be
/// observed by the wait path anyway.
pub fn forward_signal(pid: i32, signal: Signal) -> Result<(), ProcessError> {
    match kill(Pid::from_raw(pid), signal) {
        Ok(()) => {
            info!(pid, signal = %signal, "Forwarded signal to child");
            Ok(())
        }
        Err(nix::errno::Errno::ESRCH) => {
            info!(pid, "Child already gone, nothing to forward");
            Ok(())
        }
        Err(e) => {
            warn!(pid, error = %e, "Failed to forward signal");
            Err(ProcessError::TerminationFailed { pid })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn test_exit_code_synthesis() {
        assert_eq!(ExitOutcome::Exited(0).exit_code(), 0);
        assert_eq!(ExitOutcome::Exited(7).exit_code(), 7);
        assert_eq!(ExitOutcome::Signaled(9).exit_code(), 137);
        assert_eq!(ExitOutcome::Signaled(15).exit_code(), 143);
    }

    #[tokio::test]
    async fn test_wait_reports_normal_exit() {
        let dir = tempdir().unwrap();
        let script = write_script(dir.path(), "child", "exit 7");

        let mut child = spawn_detached(&script).await.unwrap();
        assert!(child.pid() > 0);
        assert_eq!(child.wait().await.unwrap(), ExitOutcome::Exited(7));
    }

    #[tokio::test]
    async fn test_wait_reports_signal_death() {
        let dir = tempdir().unwrap();
        let script = write_script(dir.path(), "child", "kill -9 $$");

        let mut child = spawn_detached(&script).await.unwrap();
        assert_eq!(child.wait().await.unwrap(), ExitOutcome::Signaled(9));
    }

    #[tokio::test]
    async fn test_spawn_missing_artifact() {
        let err = spawn_detached(Path::new("/nonexistent/endpoint"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessError::SpawnFailed { .. }));
    }

    #[tokio::test]
    async fn test_terminate_stops_long_running_child() {
        let dir = tempdir().unwrap();
        let script = write_script(dir.path(), "child", "exec sleep 30");

        let child = spawn_detached(&script).await.unwrap();
        let pid = child.pid();
        let outcome = child.terminate().await.unwrap();

        assert_eq!(outcome, ExitOutcome::Signaled(15));
        assert_eq!(
            kill(Pid::from_raw(pid), None),
            Err(nix::errno::Errno::ESRCH)
        );
    }

    #[tokio::test]
    async fn test_forward_signal_to_trapping_child() {
        let dir = tempdir().unwrap();
        let script = write_script(
            dir.path(),
            "child",
            "trap 'exit 42' TERM\nwhile :; do sleep 0.1; done",
        );

        let mut child = spawn_detached(&script).await.unwrap();
        // Give the shell a moment to install its trap
        sleep(Duration::from_millis(100)).await;

        forward_signal(child.pid(), Signal::SIGTERM).unwrap();
        assert_eq!(child.wait().await.unwrap(), ExitOutcome::Exited(42));
    }

    #[test]
    fn test_forward_to_vanished_child_is_ok() {
        // Nothing should be listening on this pid
        assert!(forward_signal(999_999_99, Signal::SIGTERM).is_ok());
    }
}
