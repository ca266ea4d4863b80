//! Standalone capability grant command
//!
//! Runs the privilege-grant step on its own and verifies the artifact
//! actually carries CAP_NET_ADMIN afterwards. Useful after copying the
//! artifact to another filesystem, since file capabilities do not survive
//! every copy.

use std::path::PathBuf;

use tunup_core::caps;
use tunup_core::config::toml_config::{load_config, load_config_from_path};
use tunup_core::error::{ConfigError, ProcessError, TunupError};

/// Run the grant command
pub async fn run_grant(config_path: Option<PathBuf>) -> Result<(), TunupError> {
    let config = match config_path {
        Some(path) => load_config_from_path(path)?,
        None => load_config()?,
    };

    if !config.artifact.exists() {
        return Err(TunupError::Config(ConfigError::ValidationError {
            message: format!(
                "Artifact does not exist: {} (build it first)",
                config.artifact.display()
            ),
        }));
    }

    caps::grant_net_admin(&config.system.setcap, &config.artifact).await?;
    println!("✓ Granted {} to {}", caps::NET_ADMIN_FLAGS, config.artifact.display());

    if caps::verify_net_admin(&config.system.getcap, &config.artifact).await? {
        println!("✓ Verified: artifact carries cap_net_admin");
        Ok(())
    } else {
        Err(TunupError::Process(ProcessError::GrantFailed { code: 1 }))
    }
}
