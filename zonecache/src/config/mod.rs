//! Configuration for zonecache.
//!
//! Settings are read from `~/.zonecache/config.ini`:
//!
//! ```ini
//! [provider]
//! tile_server = https://tile.openstreetmap.org
//! client_name = my-app
//! contact = me@example.org
//! timeout = 10
//!
//! [download]
//! max_tiles = 5000
//! concurrency = 4
//! max_bytes_in_flight = 16MB
//!
//! [storage]
//! directory = ~/.zonecache/store
//! ```

mod file;
mod parser;
mod settings;
mod size;
mod writer;

pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{
    default_storage_directory, ConfigFile, DownloadConfig, ProviderConfig, StorageConfig,
};
pub use size::{format_size, format_size_approx, parse_size, SizeParseError};
