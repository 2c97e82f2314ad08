//! Command-line interface for the silence-cutter take-selection tool.
//!
//! # Architecture
//!
//! The CLI is built using `clap` and follows a subcommand pattern:
//! - `cut` - Run the full pipeline over one recording and write the edits
//! - `config` - Configuration management and inspection
//! - `generate-completion` - Shell completion script generation
//!
//! # Examples
//!
//! ```bash
//! # Cut a recording with defaults
//! silence-cutter cut talk.mp4
//!
//! # Tighter silence detection, 30 fps timecode
//! silence-cutter cut talk.mp4 --noise-db -40 --fps 30
//!
//! # Inspect configuration
//! silence-cutter config list
//! ```

mod config_args;
mod cut_args;
mod generate_completion_args;
pub mod ui;

use clap::{Parser, Subcommand};
pub use config_args::{ConfigAction, ConfigArgs};
pub use cut_args::CutArgs;
pub use generate_completion_args::GenerateCompletionArgs;
pub use ui::{create_progress_bar, print_error, print_success, print_warning};

/// Main CLI application structure defining the top-level interface.
#[derive(Parser, Debug)]
#[command(name = "silence-cutter")]
#[command(about = "AI take-selection tool: silence cutting, take ranking, EDL/XMEML export")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Cut one recording: detect takes, rank them, export the edit
    Cut(CutArgs),

    /// Manage and inspect application configuration
    Config(ConfigArgs),

    /// Generate shell completion scripts
    GenerateCompletion(GenerateCompletionArgs),
}

/// Executes the CLI application with parsed arguments.
///
/// Returns a [`crate::Result<()>`] that wraps any errors encountered
/// during command execution; errors propagate up to `main` for exit-code
/// mapping.
pub async fn run() -> crate::Result<()> {
    let cli = Cli::parse();
    let config_service = std::sync::Arc::new(crate::config::ProductionConfigService::new()?);
    crate::commands::dispatcher::dispatch_command(cli.command, config_service).await
}
