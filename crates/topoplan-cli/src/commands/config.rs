use crate::{
    config::{Config, CONFIG_KEYS},
    display::{print_info, print_success, print_warning},
    ConfigCommands, Result,
};
use colored::Colorize;

/// Handles the `config` command.
///
/// # Supported Operations
/// - **Show**: Print the whole config with the API key masked
/// - **Get**: Print one value by dotted key
/// - **Set**: Store one value and save the file
/// - **Path**: Print where the config file lives
///
/// Accepted keys are `backend.api_key`, `backend.base_url` and
/// `deployment.file`.
pub async fn handle(action: ConfigCommands, mut config: Config) -> Result<()> {
    match action {
        ConfigCommands::Show => {
            println!("{}", "Current configuration:".bold());
            println!("{}", config.show_config());
            Ok(())
        }
        ConfigCommands::Get { key } => {
            match config.get_value(&key)? {
                Some(value) => println!("{}", value),
                None => print_warning(&format!("{} is not set", key)),
            }
            Ok(())
        }
        ConfigCommands::Set { key, value } => {
            config.set_value(&key, &value)?;
            config.save()?;
            print_success(&format!("Saved {}", key));
            Ok(())
        }
        ConfigCommands::Path => {
            println!("{}", config.path().display());
            if !config.path().exists() {
                print_info(&format!(
                    "File not created yet; set one of {} to create it",
                    CONFIG_KEYS.join(", ")
                ));
            }
            Ok(())
        }
    }
}
