//! Interface readiness waiting with exponential backoff
//!
//! The child creates its interface during its own initialization, which is
//! asynchronous with respect to the launcher observing the spawn return.
//! Configuring the interface immediately would race that creation, so the
//! launcher polls for the interface with bounded backoff until it appears
//! or the timeout elapses.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::time::{sleep, Duration, Instant};
use tracing::{debug, info};

use crate::error::NetError;

/// Configuration for the interface readiness wait
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadinessPolicy {
    /// Total time budget in milliseconds before giving up
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,

    /// First delay between probes in milliseconds
    #[serde(default = "default_base_delay")]
    pub base_delay_ms: u64,

    /// Multiplier for exponential backoff (typically 2)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: u64,

    /// Cap for the probe delay in milliseconds
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,
}

fn default_timeout() -> u64 {
    5000
}
fn default_base_delay() -> u64 {
    25
}
fn default_backoff_multiplier() -> u64 {
    2
}
fn default_max_delay() -> u64 {
    500
}

impl ReadinessPolicy {
    /// Validate the policy fields
    pub fn validate(&self) -> Result<(), String> {
        if self.timeout_ms == 0 {
            return Err("Readiness timeout cannot be zero".to_string());
        }
        if self.base_delay_ms == 0 {
            return Err("Readiness base delay cannot be zero".to_string());
        }
        if self.backoff_multiplier == 0 {
            return Err("Readiness backoff multiplier cannot be zero".to_string());
        }
        if self.max_delay_ms < self.base_delay_ms {
            return Err(format!(
                "Readiness max delay ({} ms) is less than base delay ({} ms)",
                self.max_delay_ms, self.base_delay_ms
            ));
        }
        Ok(())
    }

    /// Next probe delay after the current one, capped at `max_delay_ms`
    fn next_delay_ms(&self, current_ms: u64) -> u64 {
        current_ms
            .saturating_mul(self.backoff_multiplier)
            .min(self.max_delay_ms)
    }
}

impl Default for ReadinessPolicy {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout(),
            base_delay_ms: default_base_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            max_delay_ms: default_max_delay(),
        }
    }
}

/// Wait until `<sysfs_net>/<name>` exists
///
/// Returns the elapsed wait in milliseconds on success, or
/// `InterfaceNeverAppeared` once the policy's timeout is exhausted. The
/// caller is responsible for terminating the orphaned child in the latter
/// case.
pub async fn wait_for_interface(
    sysfs_net: &Path,
    name: &str,
    policy: &ReadinessPolicy,
) -> Result<u64, NetError> {
    let entry = sysfs_net.join(name);
    let start = Instant::now();
    let mut delay_ms = policy.base_delay_ms;

    loop {
        if entry.exists() {
            let waited_ms = start.elapsed().as_millis() as u64;
            info!(interface = name, waited_ms, "Interface appeared");
            return Ok(waited_ms);
        }

        let elapsed_ms = start.elapsed().as_millis() as u64;
        if elapsed_ms >= policy.timeout_ms {
            return Err(NetError::InterfaceNeverAppeared {
                name: name.to_string(),
                waited_ms: elapsed_ms,
            });
        }

        // Never sleep past the overall deadline
        let sleep_ms = delay_ms.min(policy.timeout_ms - elapsed_ms);
        debug!(interface = name, sleep_ms, "Interface not present yet");
        sleep(Duration::from_millis(sleep_ms)).await;
        delay_ms = policy.next_delay_ms(delay_ms);
    }
}
