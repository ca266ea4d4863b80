//! Process supervision
//!
//! Spawning, waiting on and terminating the single supervised child, plus
//! the signal relay that forwards the launcher's termination signals to it.

pub mod process;
pub mod signals;

// Public re-exports
pub use process::{forward_signal, spawn_detached, ChildHandle, ExitOutcome};
pub use signals::SignalRelay;

use crate::error::ProcessError;

/// Block until the child exits, relaying termination signals meanwhile
///
/// A forwarded signal never abandons the wait: the loop keeps selecting
/// until the child actually terminates, so the returned outcome is always
/// the child's own.
pub async fn supervise(
    mut child: ChildHandle,
    mut relay: SignalRelay,
) -> Result<ExitOutcome, ProcessError> {
    loop {
        tokio::select! {
            outcome = child.wait() => return outcome,
            _ = relay.relay_next() => {
                // Signal forwarded; resume waiting for the child
            }
        }
    }
}
