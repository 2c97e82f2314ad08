// src/cli/generate_completion_args.rs
use clap::Args;
use clap_complete::Shell;

/// Shell completion script generation arguments
#[derive(Args, Debug)]
pub struct GenerateCompletionArgs {
    /// The shell to generate a completion script for
    #[arg(value_enum)]
    pub shell: Shell,
}
