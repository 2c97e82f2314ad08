// src/cli/config_args.rs
use clap::{Args, Subcommand};

/// Configuration management arguments
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Set a configuration value
    Set {
        /// Configuration key (dot-separated, e.g. export.fps)
        key: String,
        /// Configuration value
        value: String,
    },
    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,
    },
    /// List all configuration values
    List,
    /// Print the configuration file path
    Path,
    /// Reset configuration to defaults
    Reset,
}
