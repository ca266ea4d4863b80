//! TOML configuration file I/O
//!
//! Handles loading and saving the launcher configuration to/from TOML
//! files in the user's configuration directory.

use std::path::{Path, PathBuf};

use crate::config::LaunchConfig;
use crate::error::{ConfigError, TunupError};

/// Default configuration file name
const CONFIG_FILE_NAME: &str = "config.toml";

/// Get the default configuration directory
///
/// Returns ~/.config/tunup on Linux, or TUNUP_CONFIG_DIR environment
/// variable if set.
///
/// The launcher is commonly invoked via sudo (the grant step needs
/// elevated privilege), so SUDO_USER is honored to resolve the invoking
/// user's home directory instead of root's.
pub fn get_config_dir() -> Result<PathBuf, TunupError> {
    // Allow tests to override config directory via environment variable
    if let Ok(config_dir) = std::env::var("TUNUP_CONFIG_DIR") {
        return Ok(PathBuf::from(config_dir));
    }

    let home = if let Ok(sudo_user) = std::env::var("SUDO_USER") {
        // Running under sudo, resolve the actual user's home directory
        std::env::var("SUDO_HOME").unwrap_or_else(|_| format!("/home/{}", sudo_user))
    } else {
        std::env::var("HOME").map_err(|_| {
            TunupError::Config(ConfigError::IoError {
                message: "HOME environment variable not set".to_string(),
            })
        })?
    };

    Ok(PathBuf::from(home).join(".config").join("tunup"))
}

/// Get the default configuration file path
pub fn get_config_path() -> Result<PathBuf, TunupError> {
    let config_dir = get_config_dir()?;
    Ok(config_dir.join(CONFIG_FILE_NAME))
}

/// Load the launcher configuration from the default TOML file
pub fn load_config() -> Result<LaunchConfig, TunupError> {
    let config_path = get_config_path()?;
    load_config_from_path(&config_path)
}

/// Load the launcher configuration from a specific TOML file
pub fn load_config_from_path<P: AsRef<Path>>(path: P) -> Result<LaunchConfig, TunupError> {
    let contents = std::fs::read_to_string(&path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => TunupError::Config(ConfigError::LoadFailed {
            path: path.as_ref().to_string_lossy().to_string(),
        }),
        _ => TunupError::Config(ConfigError::IoError {
            message: format!("Failed to read config file: {}", e),
        }),
    })?;

    let config: LaunchConfig = toml::from_str(&contents).map_err(|e| {
        TunupError::Config(ConfigError::IoError {
            message: format!("Failed to parse TOML: {}", e),
        })
    })?;

    // Validate the loaded configuration
    config
        .validate()
        .map_err(|e| TunupError::Config(ConfigError::ValidationError { message: e }))?;

    Ok(config)
}

/// Save the launcher configuration to the default TOML file
pub fn save_config(config: &LaunchConfig) -> Result<(), TunupError> {
    let config_path = get_config_path()?;
    save_config_to_path(config, &config_path)
}

/// Save the launcher configuration to a specific TOML file
pub fn save_config_to_path<P: AsRef<Path>>(
    config: &LaunchConfig,
    path: P,
) -> Result<(), TunupError> {
    // Validate configuration before saving
    config
        .validate()
        .map_err(|e| TunupError::Config(ConfigError::ValidationError { message: e }))?;

    // Ensure config directory exists
    if let Some(parent) = path.as_ref().parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            TunupError::Config(ConfigError::IoError {
                message: format!("Failed to create config directory: {}", e),
            })
        })?;
    }

    let contents = toml::to_string_pretty(config)?;

    std::fs::write(&path, contents).map_err(|_e| {
        TunupError::Config(ConfigError::SaveFailed {
            path: path.as_ref().to_string_lossy().to_string(),
        })
    })?;

    Ok(())
}

/// Check if a configuration file exists
pub fn config_exists() -> Result<bool, TunupError> {
    let config_path = get_config_path()?;
    Ok(config_path.exists())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BuildConfig;
    use std::path::PathBuf;
    use tempfile::tempdir;

    #[test]
    fn test_config_roundtrip() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("test_config.toml");

        let mut original_config = LaunchConfig::new(PathBuf::from("target/release/endpoint"));
        original_config.build = Some(BuildConfig {
            program: "cargo".to_string(),
            args: vec!["build".to_string(), "--release".to_string()],
        });
        original_config.interface.name = "tun1".to_string();
        original_config.readiness.timeout_ms = 2500;

        // Save config
        save_config_to_path(&original_config, &config_path).unwrap();

        // Load config
        let loaded_config = load_config_from_path(&config_path).unwrap();

        assert_eq!(original_config, loaded_config);
    }

    #[test]
    fn test_minimal_config_gets_defaults() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.toml");

        std::fs::write(&config_path, "artifact = \"target/release/endpoint\"\n").unwrap();

        let config = load_config_from_path(&config_path).unwrap();
        assert!(config.build.is_none());
        assert_eq!(config.interface.name, "tun0");
        assert_eq!(config.system.ip, "ip");
        assert_eq!(config.system.sysfs_net, PathBuf::from("/sys/class/net"));
    }

    #[test]
    fn test_missing_config_is_load_failed() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("nope.toml");

        let err = load_config_from_path(&config_path).unwrap_err();
        assert!(matches!(
            err,
            TunupError::Config(ConfigError::LoadFailed { .. })
        ));
    }

    #[test]
    fn test_invalid_config_rejected_on_load() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.toml");

        std::fs::write(
            &config_path,
            "artifact = \"bin\"\n\n[interface]\nname = \"tun0\"\nprefix_len = 99\n",
        )
        .unwrap();

        let err = load_config_from_path(&config_path).unwrap_err();
        assert!(matches!(
            err,
            TunupError::Config(ConfigError::ValidationError { .. })
        ));
    }
}
