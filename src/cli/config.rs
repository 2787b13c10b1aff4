//! Config command handler
//!
//! View and modify configuration settings.

use crate::config::Config;
use crate::error::{Error, Result};
use clap::Args;

/// Config command arguments
#[derive(Args)]
pub struct ConfigArgs {
    /// Configuration key (e.g., "progression.truck_speed_mph")
    pub key: Option<String>,

    /// Value to set (if not provided, shows current value)
    pub value: Option<String>,

    /// Show config file path
    #[arg(long)]
    pub path: bool,

    /// Reset config to defaults
    #[arg(long)]
    pub reset: bool,
}

/// Run the config command
pub fn run(args: ConfigArgs) -> Result<()> {
    // Show path
    if args.path {
        let path = Config::config_path()?;
        println!("{}", path.display());
        return Ok(());
    }

    // Reset config
    if args.reset {
        let config = Config::default();
        config.save()?;
        println!("Configuration reset to defaults ({})", Config::config_path()?.display());
        return Ok(());
    }

    let mut config = Config::load()?;

    match (&args.key, &args.value) {
        // No arguments: show all config
        (None, None) => {
            show_all_config(&config);
        }

        // Key only: show that value
        (Some(key), None) => {
            let value = config.get(key).ok_or_else(|| {
                Error::Config(format!(
                    "Unknown config key: {} (available: {})",
                    key,
                    Config::available_keys().join(", ")
                ))
            })?;
            println!("{}", value);
        }

        // Key and value: set the value
        (Some(key), Some(value)) => {
            config.set(key, value)?;
            config.save()?;
            println!("{} = {}", key, value);
        }

        // Value without key: not valid
        (None, Some(_)) => {
            return Err(Error::Config("Must specify a key to set a value".to_string()));
        }
    }

    Ok(())
}

/// Display all configuration values, grouped by section
fn show_all_config(config: &Config) {
    let mut section = "";
    for key in Config::available_keys() {
        let Some((name, field)) = key.split_once('.') else {
            continue;
        };
        if name != section {
            if !section.is_empty() {
                println!();
            }
            println!("[{}]", name);
            section = name;
        }
        let value = config.get(key).unwrap_or_default();
        if value.parse::<f64>().is_ok() || value == "true" || value == "false" {
            println!("{} = {}", field, value);
        } else {
            println!("{} = \"{}\"", field, value);
        }
    }
}
