//! End-to-end launch sequence
//!
//! Build, grant, spawn, wait for the interface, configure it, then
//! supervise the child until it exits. Each stage aborts the remainder on
//! failure; there are no retries across stage boundaries.

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

use tracing::{info, warn};

use crate::builder;
use crate::caps;
use crate::config::LaunchConfig;
use crate::error::Result;
use crate::netif;
use crate::supervisor::{self, ExitOutcome, SignalRelay};

/// Orchestrates one endpoint bring-up
pub struct Launcher {
    config: LaunchConfig,
    skip_build: bool,
}

impl Launcher {
    /// Create a launcher for the given configuration
    pub fn new(config: LaunchConfig) -> Self {
        Self {
            config,
            skip_build: false,
        }
    }

    /// Skip the build step and use the artifact as it is on disk
    pub fn skip_build(mut self, skip: bool) -> Self {
        self.skip_build = skip;
        self
    }

    /// Run the full sequence and return the child's terminal outcome
    ///
    /// Ordering guarantees: the grant completes strictly before spawn, the
    /// child handle is obtained strictly before any interface operation,
    /// and the signal relay is installed immediately after the handle is
    /// obtained.
    pub async fn run(&self) -> Result<ExitOutcome> {
        let interface = &self.config.interface;
        let system = &self.config.system;

        // Stage 1: build
        match (&self.config.build, self.skip_build) {
            (Some(build), false) => builder::run_build(build).await?,
            (Some(_), true) => info!("Skipping build step"),
            (None, _) => info!("No build step configured"),
        }

        // Stage 2: grant CAP_NET_ADMIN to the artifact
        caps::grant_net_admin(&system.setcap, &self.config.artifact).await?;

        // Stage 3: spawn the child and record its pid for the relay
        let child = supervisor::spawn_detached(&self.config.artifact).await?;
        let child_pid = Arc::new(AtomicI32::new(child.pid()));

        // Stage 4: signal relay, installed as soon as the pid is known
        let relay = SignalRelay::install(Arc::clone(&child_pid))?;

        // Stage 5: wait for the child's interface to appear
        let waited = netif::wait_for_interface(
            &system.sysfs_net,
            &interface.name,
            &self.config.readiness,
        )
        .await;

        if let Err(err) = waited {
            // The child is orphaned without its interface; reap it before
            // surfacing the failure.
            warn!(interface = %interface.name, "Interface never appeared, terminating child");
            child_pid.store(0, Ordering::SeqCst);
            let _ = child.terminate().await;
            return Err(err.into());
        }

        // Stage 6: configure the interface. Failures here are fatal for
        // the launcher, but the child keeps running: it does not depend on
        // address assignment succeeding.
        if let Err(e) =
            netif::assign_address(&system.ip, &interface.name, interface.address, interface.prefix_len)
                .await
        {
            warn!(pid = child.pid(), "Leaving child running after configuration failure");
            return Err(e.into());
        }

        if let Err(e) = netif::set_link_up(&system.ip, &interface.name).await {
            warn!(pid = child.pid(), "Leaving child running after configuration failure");
            return Err(e.into());
        }

        info!(
            interface = %interface.name,
            address = %format!("{}/{}", interface.address, interface.prefix_len),
            "Endpoint up, supervising child"
        );

        // Stage 7: block until the child exits, relaying signals meanwhile
        let outcome = supervisor::supervise(child, relay).await?;
        Ok(outcome)
    }
}
