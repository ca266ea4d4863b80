//! tunup - privileged launcher for user-space TUN endpoints
//!
//! Builds an external endpoint binary, grants it CAP_NET_ADMIN so it can
//! own a TUN interface without running as root, spawns it, configures the
//! interface it creates, and supervises it until exit.
//!
//! Exit status:
//! - build or grant failure: the failing command's own exit code
//! - configuration errors: 2
//! - spawn failure: 3
//! - interface missing / never appeared: 4
//! - address conflict: 5
//! - permission denied configuring the interface: 6
//! - child exited normally: the child's exit code
//! - child killed by signal s: 128 + s

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tunup_core::{error::TunupError, init_logging};

mod cli;

#[derive(Parser)]
#[command(name = "tunup")]
#[command(about = "Privileged launcher for user-space TUN network endpoints")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build, grant, spawn, configure and supervise the endpoint
    Up {
        /// Use the artifact as-is instead of running the build step
        #[arg(long)]
        skip_build: bool,

        /// Path to an alternative configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Grant CAP_NET_ADMIN to the configured artifact and verify it
    Grant {
        /// Path to an alternative configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Write the launcher configuration interactively
    Setup,
}

#[tokio::main]
async fn main() {
    // Initialize logging
    if let Err(e) = init_logging() {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(2);
    }

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Up { skip_build, config } => {
            match cli::up::run_up(config, skip_build).await {
                // Propagate the child's own terminal status
                Ok(outcome) => std::process::exit(outcome.exit_code()),
                Err(e) => Err(e),
            }
        }
        Commands::Grant { config } => cli::grant::run_grant(config).await,
        Commands::Setup => cli::setup::run_setup(),
    };

    match result {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(exit_code_for(&e));
        }
    }
}

/// Map an error to the launcher's documented exit status
fn exit_code_for(error: &TunupError) -> i32 {
    use tunup_core::error::{NetError, ProcessError};

    match error {
        // Configuration errors (exit code 2)
        TunupError::Config(_) | TunupError::Toml(_) | TunupError::TomlSerialize(_) => 2,
        // Setup stage failures surface the failing command's own code
        TunupError::Process(ref process_error) => match process_error {
            ProcessError::BuildFailed { code } => *code,
            ProcessError::GrantFailed { code } => *code,
            ProcessError::SpawnFailed { .. } => 3,
            ProcessError::BuildUnavailable { .. }
            | ProcessError::GrantUnavailable { .. }
            | ProcessError::WaitFailed { .. }
            | ProcessError::TerminationFailed { .. } => 1,
        },
        // Interface configuration failures
        TunupError::Net(ref net_error) => match net_error {
            NetError::InterfaceNotFound { .. } | NetError::InterfaceNeverAppeared { .. } => 4,
            NetError::AddressConflict { .. } => 5,
            NetError::PermissionDenied { .. } => 6,
            NetError::CommandFailed { .. } => 1,
        },
        // IO errors (exit code 1 - runtime)
        TunupError::Io(_) => 1,
    }
}
