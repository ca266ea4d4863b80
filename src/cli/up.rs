//! Endpoint bring-up command
//!
//! Loads the configuration, checks the external tools are reachable, and
//! hands off to the core launcher sequence.

use std::path::PathBuf;

use tracing::info;
use tunup_core::config::toml_config::{load_config, load_config_from_path};
use tunup_core::config::LaunchConfig;
use tunup_core::error::{ConfigError, TunupError};
use tunup_core::launcher::Launcher;
use tunup_core::supervisor::ExitOutcome;

/// Run the up command
pub async fn run_up(
    config_path: Option<PathBuf>,
    skip_build: bool,
) -> Result<ExitOutcome, TunupError> {
    let config = match config_path {
        Some(path) => load_config_from_path(path)?,
        None => load_config()?,
    };

    preflight(&config)?;

    info!(
        artifact = %config.artifact.display(),
        interface = %config.interface.name,
        "Starting endpoint bring-up"
    );

    Launcher::new(config).skip_build(skip_build).run().await
}

/// Fail early if the external tools the sequence depends on are missing
fn preflight(config: &LaunchConfig) -> Result<(), TunupError> {
    for program in [&config.system.setcap, &config.system.ip] {
        which::which(program).map_err(|_| {
            TunupError::Config(ConfigError::ValidationError {
                message: format!("Required tool not found: {}", program),
            })
        })?;
    }
    Ok(())
}
