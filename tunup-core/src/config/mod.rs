//! Configuration module
//!
//! Handles loading and saving launcher configuration from TOML files.

use std::net::Ipv4Addr;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::netif::ReadinessPolicy;

pub mod toml_config;

/// Launcher configuration structure
///
/// Everything the launcher needs to bring up one user-space endpoint:
/// where the executable artifact lives, how to (re)build it, which
/// interface the child is expected to create, and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaunchConfig {
    /// Path to the executable artifact the build step produces
    pub artifact: PathBuf,

    /// Optional build step run before anything else
    #[serde(default)]
    pub build: Option<BuildConfig>,

    /// Interface the spawned child is expected to create
    #[serde(default)]
    pub interface: InterfaceConfig,

    /// Bounded-backoff policy for waiting on interface appearance
    #[serde(default)]
    pub readiness: ReadinessPolicy,

    /// Paths to external tools and the sysfs network directory
    #[serde(default)]
    pub system: SystemPaths,
}

impl LaunchConfig {
    /// Create a configuration with defaults for everything but the artifact
    pub fn new(artifact: PathBuf) -> Self {
        Self {
            artifact,
            build: None,
            interface: InterfaceConfig::default(),
            readiness: ReadinessPolicy::default(),
            system: SystemPaths::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.artifact.as_os_str().is_empty() {
            return Err("Artifact path cannot be empty".to_string());
        }

        if let Some(build) = &self.build {
            build.validate()?;
        }

        self.interface.validate()?;
        self.readiness.validate()?;
        self.system.validate()?;

        Ok(())
    }
}

/// External build step configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Program to run (e.g. "cargo")
    pub program: String,

    /// Arguments passed to the program (e.g. ["build", "--release"])
    #[serde(default)]
    pub args: Vec<String>,
}

impl BuildConfig {
    /// Validate the build step
    pub fn validate(&self) -> Result<(), String> {
        if self.program.is_empty() {
            return Err("Build program cannot be empty".to_string());
        }
        Ok(())
    }
}

/// Expected interface name and the address/prefix to assign to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceConfig {
    /// Interface name the child creates (well-known, fixed)
    #[serde(default = "default_interface_name")]
    pub name: String,

    /// IPv4 address assigned once the interface exists
    #[serde(default = "default_address")]
    pub address: Ipv4Addr,

    /// Subnet prefix length (1-32)
    #[serde(default = "default_prefix_len")]
    pub prefix_len: u8,
}

fn default_interface_name() -> String {
    "tun0".to_string()
}

fn default_address() -> Ipv4Addr {
    Ipv4Addr::new(10, 12, 1, 1)
}

fn default_prefix_len() -> u8 {
    24
}

impl InterfaceConfig {
    /// Validate the interface settings
    pub fn validate(&self) -> Result<(), String> {
        if self.name.is_empty() {
            return Err("Interface name cannot be empty".to_string());
        }

        // IFNAMSIZ is 16 including the trailing NUL
        if self.name.len() > 15 {
            return Err("Interface name exceeds 15 characters".to_string());
        }

        if !self
            .name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err("Interface name contains invalid characters".to_string());
        }

        if self.prefix_len == 0 || self.prefix_len > 32 {
            return Err("Prefix length must be between 1 and 32".to_string());
        }

        Ok(())
    }
}

impl Default for InterfaceConfig {
    fn default() -> Self {
        Self {
            name: default_interface_name(),
            address: default_address(),
            prefix_len: default_prefix_len(),
        }
    }
}

/// Paths to the external tools the launcher shells out to
///
/// Defaults are resolved via PATH. Overriding them keeps the launcher
/// usable on systems that install iproute2/libcap elsewhere and lets the
/// test suite substitute recording stand-ins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemPaths {
    /// setcap(8) used to grant the file capability
    #[serde(default = "default_setcap")]
    pub setcap: String,

    /// getcap(8) used to verify the grant
    #[serde(default = "default_getcap")]
    pub getcap: String,

    /// ip(8) used for address assignment and link state
    #[serde(default = "default_ip")]
    pub ip: String,

    /// Directory probed for interface existence
    #[serde(default = "default_sysfs_net")]
    pub sysfs_net: PathBuf,
}

fn default_setcap() -> String {
    "setcap".to_string()
}

fn default_getcap() -> String {
    "getcap".to_string()
}

fn default_ip() -> String {
    "ip".to_string()
}

fn default_sysfs_net() -> PathBuf {
    PathBuf::from("/sys/class/net")
}

impl SystemPaths {
    /// Validate the tool paths
    pub fn validate(&self) -> Result<(), String> {
        if self.setcap.is_empty() || self.getcap.is_empty() || self.ip.is_empty() {
            return Err("Tool paths cannot be empty".to_string());
        }
        if self.sysfs_net.as_os_str().is_empty() {
            return Err("sysfs network directory cannot be empty".to_string());
        }
        Ok(())
    }
}

impl Default for SystemPaths {
    fn default() -> Self {
        Self {
            setcap: default_setcap(),
            getcap: default_getcap(),
            ip: default_ip(),
            sysfs_net: default_sysfs_net(),
        }
    }
}
