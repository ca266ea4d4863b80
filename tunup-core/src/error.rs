//! Error types for the tunup launcher
//!
//! This module defines all error types used throughout the application,
//! providing consistent error handling and user-friendly error messages.

use thiserror::Error;

/// Main error type for the tunup application
#[derive(Error, Debug)]
pub enum TunupError {
    /// Errors related to configuration loading/parsing
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Errors related to the build, grant and child process stages
    #[error("Process error: {0}")]
    Process(#[from] ProcessError),

    /// Errors related to network interface configuration
    #[error("Interface error: {0}")]
    Net(#[from] NetError),

    /// Generic I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing errors
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization errors
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration file: {path}")]
    LoadFailed { path: String },

    #[error("Failed to save configuration file: {path}")]
    SaveFailed { path: String },

    #[error("Configuration validation error: {message}")]
    ValidationError { message: String },

    #[error("I/O error: {message}")]
    IoError { message: String },
}

/// Build, privilege-grant and child-process errors
///
/// `BuildFailed` and `GrantFailed` carry the failing command's own exit
/// code so the launcher can surface it unchanged as its own exit status.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProcessError {
    #[error("Build command exited with code {code}")]
    BuildFailed { code: i32 },

    #[error("Failed to run build command: {reason}")]
    BuildUnavailable { reason: String },

    #[error("Capability grant exited with code {code}")]
    GrantFailed { code: i32 },

    #[error("Failed to run capability grant command: {reason}")]
    GrantUnavailable { reason: String },

    #[error("Failed to spawn {artifact}: {reason}")]
    SpawnFailed { artifact: String, reason: String },

    #[error("Failed to wait for child process: {reason}")]
    WaitFailed { reason: String },

    #[error("Failed to terminate child process {pid}")]
    TerminationFailed { pid: i32 },
}

/// Network interface configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetError {
    #[error("Interface {name} does not exist")]
    InterfaceNotFound { name: String },

    #[error("Interface {name} did not appear within {waited_ms} ms")]
    InterfaceNeverAppeared { name: String, waited_ms: u64 },

    #[error("Address conflict on {name}: {detail}")]
    AddressConflict { name: String, detail: String },

    #[error("Permission denied configuring {name}: {detail}")]
    PermissionDenied { name: String, detail: String },

    #[error("Interface configuration command failed on {name}: {detail}")]
    CommandFailed { name: String, detail: String },
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, TunupError>;
