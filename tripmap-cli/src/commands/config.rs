//! `tripmap config` commands.
//!
//! Reads and edits `config.ini` one `section.key` at a time.

use clap::Subcommand;
use tripmap::config::{config_file_path, ConfigFile, ConfigKey};

use crate::error::CliError;

#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print one setting
    Get {
        /// Setting name as section.key (e.g. tracking.max_hidden_secs)
        key: String,
    },

    /// Change one setting
    Set {
        /// Setting name as section.key (e.g. prefetch.delay_ms)
        key: String,

        /// New value
        value: String,
    },

    /// Print every setting
    List,

    /// Print the configuration file location
    Path,
}

pub fn run(command: ConfigCommands, config: ConfigFile) -> Result<(), CliError> {
    match command {
        ConfigCommands::Get { key } => {
            let key = parse_key(&key)?;
            let value = key.get(&config);
            if value.is_empty() {
                println!("(not set)");
            } else {
                println!("{}", value);
            }
        }
        ConfigCommands::Set { key, value } => {
            let key = parse_key(&key)?;
            let mut config = config;
            key.set(&mut config, &value)?;
            let path = config.save()?;
            println!("{} = {}", key, key.get(&config));
            println!("Saved to {}", path.display());
        }
        ConfigCommands::List => print_all(&config),
        ConfigCommands::Path => println!("{}", config_file_path().display()),
    }
    Ok(())
}

fn parse_key(key: &str) -> Result<ConfigKey, CliError> {
    key.parse().map_err(|_| {
        CliError::Config(format!(
            "Unknown setting '{}'. Run 'tripmap config list' for the available keys.",
            key
        ))
    })
}

fn print_all(config: &ConfigFile) {
    let mut section = "";
    for key in ConfigKey::all() {
        if key.section() != section {
            if !section.is_empty() {
                println!();
            }
            section = key.section();
            println!("[{}]", section);
        }

        let value = key.get(config);
        if value.is_empty() {
            println!("  {} = (not set)", key.key_name());
        } else {
            println!("  {} = {}", key.key_name(), value);
        }
    }
}
