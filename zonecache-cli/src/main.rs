//! ZoneCache CLI - Command-line interface
//!
//! Plans, downloads and manages offline map zones on the local disk store.

mod commands;
mod error;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;
use zonecache::logging::{default_log_dir, default_log_file, init_logging};

use commands::check::CheckArgs;
use commands::common::Context;
use commands::config::ConfigCommands;
use commands::download::{DownloadArgs, ResumeArgs};
use commands::estimate::EstimateArgs;
use commands::zones::{DeleteArgs, ListArgs, ShowArgs};
use error::CliError;

#[derive(Parser)]
#[command(name = "zonecache")]
#[command(version)]
#[command(about = "Offline map tile and zone cache manager", long_about = None)]
struct Cli {
    /// Configuration file (defaults to ~/.zonecache/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Store directory, overrides [storage] directory
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate tile count, size and POIs for a region
    Estimate(EstimateArgs),
    /// Download a new zone
    Download(DownloadArgs),
    /// Retry the missing tiles of a partial zone
    Resume(ResumeArgs),
    /// Settle zones left downloading by a run that stopped
    Recover,
    /// List downloaded zones
    List(ListArgs),
    /// Show one zone
    Show(ShowArgs),
    /// Delete a zone and its tiles
    Delete(DeleteArgs),
    /// Show storage usage
    Stats,
    /// Check whether a location is cached
    Check(CheckArgs),
    /// Remove tiles whose zone record is gone
    Sweep,
    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        e.exit();
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let _logging = init_logging(&default_log_dir(), default_log_file())
        .map_err(|e| CliError::Startup(format!("Failed to initialize logging: {}", e)))?;
    info!(version = env!("CARGO_PKG_VERSION"), "zonecache starting");

    if let Commands::Config { command } = cli.command {
        return commands::config::run(command);
    }

    let context = Context::load(cli.config.as_deref(), cli.store)?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::Startup(format!("Failed to start runtime: {}", e)))?;

    runtime.block_on(async move {
        match cli.command {
            Commands::Estimate(args) => commands::estimate::run(&context, args).await,
            Commands::Download(args) => commands::download::run_download(&context, args).await,
            Commands::Resume(args) => commands::download::run_resume(&context, args).await,
            Commands::Recover => commands::download::run_recover(&context).await,
            Commands::List(args) => commands::zones::run_list(&context, args).await,
            Commands::Show(args) => commands::zones::run_show(&context, args).await,
            Commands::Delete(args) => commands::zones::run_delete(&context, args).await,
            Commands::Stats => commands::zones::run_stats(&context).await,
            Commands::Check(args) => commands::check::run(&context, args).await,
            Commands::Sweep => commands::zones::run_sweep(&context).await,
            Commands::Config { .. } => Ok(()),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_download() {
        let cli = Cli::try_parse_from([
            "zonecache", "--store", "/tmp/zc", "download", "--name", "Paris",
            "--bounds", "49,48,3,2", "--zoom", "10,11",
        ])
        .unwrap();
        assert_eq!(cli.store, Some(PathBuf::from("/tmp/zc")));
        match cli.command {
            Commands::Download(args) => {
                assert_eq!(args.name, "Paris");
                assert_eq!(args.region.zoom, vec![10, 11]);
            }
            _ => panic!("expected download"),
        }
    }

    #[test]
    fn test_parse_recover() {
        let cli = Cli::try_parse_from(["zonecache", "recover"]).unwrap();
        assert!(matches!(cli.command, Commands::Recover));
        assert!(Cli::try_parse_from(["zonecache", "recover", "zone-1"]).is_err());
    }
}
