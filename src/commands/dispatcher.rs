use crate::{Result, cli::Commands, config::ConfigService};
use std::sync::Arc;

/// Central command dispatcher.
///
/// Routes parsed CLI arguments to their command implementations with the
/// configuration service injected, so the CLI path and library callers
/// share one execution path.
pub async fn dispatch_command(
    command: Commands,
    config_service: Arc<dyn ConfigService>,
) -> Result<()> {
    match command {
        Commands::Cut(args) => {
            crate::commands::cut_command::execute(args, config_service).await
        }
        Commands::Config(args) => {
            crate::commands::config_command::execute(args, config_service.as_ref())
        }
        Commands::GenerateCompletion(args) => {
            let mut cmd = <crate::cli::Cli as clap::CommandFactory>::command();
            let cmd_name = cmd.get_name().to_string();
            let mut stdout = std::io::stdout();
            clap_complete::generate(args.shell, &mut cmd, cmd_name, &mut stdout);
            Ok(())
        }
    }
}
