//! Configuration CLI commands.

use clap::Subcommand;
use zonecache::config::{config_file_path, ConfigFile};

use crate::error::CliError;

#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Show the configuration file path
    Path,
    /// Write a default configuration file if none exists
    Init,
}

pub fn run(command: ConfigCommands) -> Result<(), CliError> {
    match command {
        ConfigCommands::Path => {
            println!("{}", config_file_path().display());
            Ok(())
        }
        ConfigCommands::Init => {
            let path = ConfigFile::ensure_exists()?;
            println!("Config file: {}", path.display());
            Ok(())
        }
    }
}
