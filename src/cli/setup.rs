//! Setup command implementation
//!
//! Interactive command for first-time launcher configuration.

use std::io::{self, Write};
use std::net::Ipv4Addr;
use std::path::PathBuf;

use tunup_core::config::{toml_config, BuildConfig, LaunchConfig};
use tunup_core::error::{ConfigError, TunupError};

/// Run the setup command
pub fn run_setup() -> Result<(), TunupError> {
    println!("tunup setup");
    println!("===========");
    println!();
    println!("This will configure the endpoint launcher.");
    println!("Configuration will be saved to ~/.config/tunup/config.toml");
    println!();

    // Check if already configured
    if let Ok(true) = toml_config::config_exists() {
        println!("Existing configuration detected.");
        if !prompt_yes_no("Overwrite existing setup? (y/N)", false)? {
            println!("Setup cancelled.");
            return Ok(());
        }
        println!();
    }

    let config = collect_launch_config()?;

    // Validate configuration
    config.validate().map_err(|e| {
        TunupError::Config(ConfigError::ValidationError {
            message: format!("Configuration validation failed: {}", e),
        })
    })?;

    println!();
    println!("Saving configuration...");
    toml_config::save_config(&config)?;

    println!("✓ Setup complete!");
    println!();
    println!("You can now use:");
    println!("  sudo tunup up      - Build, grant and supervise the endpoint");
    println!("  sudo tunup grant   - Re-grant cap_net_admin to the artifact");

    Ok(())
}

/// Collect launcher configuration interactively
fn collect_launch_config() -> Result<LaunchConfig, TunupError> {
    println!("Endpoint configuration:");
    println!("----------------------");

    let artifact = prompt_required("Artifact path (the executable to supervise)", "")?;
    let mut config = LaunchConfig::new(PathBuf::from(artifact));

    if prompt_yes_no("Run a build step before launching? (Y/n)", true)? {
        let program = prompt_required("Build program", "cargo")?;
        let args = prompt_optional("Build arguments (space separated)", "build --release")?;
        config.build = Some(BuildConfig {
            program,
            args: args.split_whitespace().map(str::to_string).collect(),
        });
    }

    println!();
    println!("Interface configuration:");
    println!("-----------------------");

    config.interface.name = prompt_required("Interface name", "tun0")?;

    let address = prompt_required("IPv4 address", "10.12.1.1")?;
    config.interface.address = address.parse::<Ipv4Addr>().map_err(|_| {
        TunupError::Config(ConfigError::ValidationError {
            message: format!("Invalid IPv4 address: {}", address),
        })
    })?;

    let prefix = prompt_required("Prefix length", "24")?;
    config.interface.prefix_len = prefix.parse().map_err(|_| {
        TunupError::Config(ConfigError::ValidationError {
            message: format!("Invalid prefix length: {}", prefix),
        })
    })?;

    Ok(config)
}

/// Prompt for a required value with default
fn prompt_required(prompt: &str, default: &str) -> Result<String, TunupError> {
    let prompt_text = if default.is_empty() {
        format!("{}: ", prompt)
    } else {
        format!("{} [{}]: ", prompt, default)
    };

    loop {
        let input = prompt_input(&prompt_text)?;

        if input.trim().is_empty() {
            if !default.is_empty() {
                return Ok(default.to_string());
            }
            println!("This field is required. Please enter a value.");
            continue;
        }

        return Ok(input.trim().to_string());
    }
}

/// Prompt for an optional value
fn prompt_optional(prompt: &str, default: &str) -> Result<String, TunupError> {
    let prompt_text = format!("{} [{}]: ", prompt, default);
    let input = prompt_input(&prompt_text)?;

    if input.trim().is_empty() {
        Ok(default.to_string())
    } else {
        Ok(input.trim().to_string())
    }
}

/// Prompt for yes/no with default
fn prompt_yes_no(prompt: &str, default_yes: bool) -> Result<bool, TunupError> {
    let prompt_text = format!("{}: ", prompt);

    loop {
        let input = prompt_input(&prompt_text)?.to_lowercase();

        match input.as_str() {
            "y" | "yes" => return Ok(true),
            "n" | "no" => return Ok(false),
            "" => return Ok(default_yes),
            _ => {
                println!("Please enter 'y' for yes or 'n' for no.");
                continue;
            }
        }
    }
}

/// Low-level input prompting
fn prompt_input(prompt: &str) -> Result<String, TunupError> {
    print!("{}", prompt);
    io::stdout().flush().map_err(TunupError::Io)?;

    let mut input = String::new();
    io::stdin().read_line(&mut input).map_err(TunupError::Io)?;

    Ok(input.trim_end().to_string())
}
