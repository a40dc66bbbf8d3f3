//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and exit codes.

use std::fmt;
use std::process;

use zonecache::config::ConfigFileError;
use zonecache::download::DownloadError;
use zonecache::poi::PointSourceError;
use zonecache::provider::ProviderError;
use zonecache::store::StoreError;

/// CLI-specific errors.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging or the runtime
    Startup(String),
    /// Configuration error
    Config(String),
    /// Bad command-line input
    Input(String),
    /// Failed to set up the tile provider
    Provider(ProviderError),
    /// Failed to load points of interest
    Points(PointSourceError),
    /// Store operation failed
    Store(StoreError),
    /// Zone download failed
    Download(DownloadError),
    /// No zone with this id
    ZoneNotFound(String),
    /// Failed to write an output file
    FileWrite { path: String, error: std::io::Error },
}

impl CliError {
    /// Exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Input(_) | CliError::Config(_) => 2,
            CliError::ZoneNotFound(_) => 3,
            CliError::Download(DownloadError::ZoneTooLarge { .. }) => 4,
            CliError::Download(DownloadError::ZoneBusy(_)) => 5,
            _ => 1,
        }
    }

    /// Exit the process with an error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Download(DownloadError::ZoneTooLarge { .. }) => {
                eprintln!();
                eprintln!("Try a smaller area, fewer zoom levels, or raise");
                eprintln!("[download] max_tiles in the config file.");
            }
            CliError::Provider(_) => {
                eprintln!();
                eprintln!("Check [provider] tile_server and that the network is reachable.");
            }
            _ => {}
        }

        process::exit(self.exit_code())
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Startup(msg) => write!(f, "Startup failed: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Input(msg) => write!(f, "Invalid input: {}", msg),
            CliError::Provider(e) => write!(f, "Tile provider error: {}", e),
            CliError::Points(e) => write!(f, "{}", e),
            CliError::Store(e) => write!(f, "Store error: {}", e),
            CliError::Download(e) => write!(f, "Download failed: {}", e),
            CliError::ZoneNotFound(id) => write!(f, "No zone with id '{}'", id),
            CliError::FileWrite { path, error } => {
                write!(f, "Failed to write file '{}': {}", path, error)
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Provider(e) => Some(e),
            CliError::Points(e) => Some(e),
            CliError::Store(e) => Some(e),
            CliError::Download(e) => Some(e),
            CliError::FileWrite { error, .. } => Some(error),
            _ => None,
        }
    }
}

impl From<StoreError> for CliError {
    fn from(e: StoreError) -> Self {
        CliError::Store(e)
    }
}

impl From<DownloadError> for CliError {
    fn from(e: DownloadError) -> Self {
        match e {
            DownloadError::ZoneNotFound(id) => CliError::ZoneNotFound(id.to_string()),
            other => CliError::Download(other),
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e.to_string())
    }
}
