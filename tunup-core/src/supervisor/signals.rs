//! Signal relay
//!
//! Intercepts the launcher's own SIGINT/SIGTERM and forwards the same
//! signal to the recorded child so it can tear down its interface and exit
//! on its own terms. The relay never exits the launcher; final termination
//! always goes through the ordinary wait path so the propagated status is
//! the child's actual outcome.

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

use nix::sys::signal::Signal as UnixSignal;
use tokio::signal::unix::{signal, Signal, SignalKind};
use tracing::{debug, warn};

use super::process::forward_signal;

/// Relay for the launcher's interrupt and terminate signals
///
/// The child pid lives in an atomic cell shared with the launcher: it is
/// written once after spawn and only read here, so a signal arriving
/// between handler installation and assignment observes either 0 (no child
/// yet) or the final pid, never a torn value.
pub struct SignalRelay {
    child_pid: Arc<AtomicI32>,
    sigint: Signal,
    sigterm: Signal,
}

impl SignalRelay {
    /// Install handlers for SIGINT and SIGTERM
    ///
    /// Should be called immediately after the child handle is obtained to
    /// minimise the window in which a signal could be missed.
    pub fn install(child_pid: Arc<AtomicI32>) -> std::io::Result<Self> {
        let sigint = signal(SignalKind::interrupt())?;
        let sigterm = signal(SignalKind::terminate())?;
        debug!("Installed SIGINT/SIGTERM relay");

        Ok(Self {
            child_pid,
            sigint,
            sigterm,
        })
    }

    /// Wait for the next termination signal and forward it to the child
    ///
    /// Resolves once one signal has been relayed; the caller keeps waiting
    /// on the child regardless.
    pub async fn relay_next(&mut self) {
        let received = tokio::select! {
            _ = self.sigint.recv() => UnixSignal::SIGINT,
            _ = self.sigterm.recv() => UnixSignal::SIGTERM,
        };

        let pid = self.child_pid.load(Ordering::SeqCst);
        if pid <= 0 {
            warn!(signal = %received, "Received signal before child existed, nothing to forward");
            return;
        }

        // A relay failure is logged, not fatal: the wait path still owns
        // the final outcome.
        let _ = forward_signal(pid, received);
    }
}
