//! Configuration management command implementation.

use crate::cli::{ConfigAction, ConfigArgs};
use crate::config::{Config, ConfigService};
use crate::{Result, cli::ui};

/// Execute a `config` action against the given service.
pub fn execute(args: ConfigArgs, config_service: &dyn ConfigService) -> Result<()> {
    match args.action {
        ConfigAction::Set { key, value } => {
            config_service.set_config_value(&key, &value)?;
            ui::print_success(&format!("Set {} = {}", key, value));
            Ok(())
        }
        ConfigAction::Get { key } => {
            let value = config_service.get_config_value(&key)?;
            println!("{}", value);
            Ok(())
        }
        ConfigAction::List => {
            let config = config_service.get_config()?;
            for key in Config::known_keys() {
                println!("{} = {}", key, config.get_value(key)?);
            }
            Ok(())
        }
        ConfigAction::Path => {
            println!("{}", config_service.get_config_file_path()?.display());
            Ok(())
        }
        ConfigAction::Reset => {
            let path = config_service.get_config_file_path()?;
            if path.exists() {
                std::fs::remove_file(&path)?;
            }
            config_service.reload()?;
            ui::print_success("Configuration reset to defaults");
            Ok(())
        }
    }
}
