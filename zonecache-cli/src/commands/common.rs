//! Shared argument types and setup used across commands.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use clap::Args;
use zonecache::config::ConfigFile;
use zonecache::coord::GeoBounds;
use zonecache::poi::StaticPointSource;
use zonecache::store::DiskStore;
use zonecache::zone::ZoneSummary;

use crate::error::CliError;

/// A bounding box given as `north,south,east,west`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundsArg(pub GeoBounds);

impl FromStr for BoundsArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values: Vec<f64> = s
            .split(',')
            .map(|v| v.trim().parse::<f64>())
            .collect::<Result<_, _>>()
            .map_err(|e| format!("'{}': {}", s, e))?;

        match values.as_slice() {
            [north, south, east, west] => Ok(Self(GeoBounds::new(*north, *south, *east, *west))),
            _ => Err(format!(
                "expected 4 comma-separated values north,south,east,west, got {}",
                values.len()
            )),
        }
    }
}

/// Region selection shared by `estimate` and `download`.
#[derive(Debug, Args)]
pub struct RegionArgs {
    /// Bounding box as north,south,east,west in degrees (e.g. 49,48,3,2)
    #[arg(long, allow_hyphen_values = true)]
    pub bounds: BoundsArg,

    /// Zoom levels, comma-separated (e.g. 10,11,12)
    #[arg(long, value_delimiter = ',', required = true)]
    pub zoom: Vec<u8>,

    /// JSON file with the known points of interest
    #[arg(long)]
    pub points: Option<PathBuf>,
}

/// Loaded configuration plus command-line overrides.
pub struct Context {
    pub config: ConfigFile,
}

impl Context {
    pub fn load(config_path: Option<&Path>, store_dir: Option<PathBuf>) -> Result<Self, CliError> {
        let mut config = match config_path {
            Some(path) => ConfigFile::load_from(path)?,
            None => ConfigFile::load()?,
        };
        if let Some(dir) = store_dir {
            config.storage.directory = dir;
        }
        Ok(Self { config })
    }

    pub async fn open_store(&self) -> Result<Arc<DiskStore>, CliError> {
        let store = DiskStore::open(&self.config.storage.directory).await?;
        Ok(Arc::new(store))
    }
}

/// Loads points from `path`, or an empty source when none is given.
pub fn load_points(path: Option<&Path>) -> Result<StaticPointSource, CliError> {
    match path {
        Some(path) => StaticPointSource::from_json_file(path).map_err(CliError::Points),
        None => Ok(StaticPointSource::default()),
    }
}

pub fn print_json<T: serde::Serialize>(value: &T) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| CliError::Startup(format!("JSON encoding failed: {}", e)))?;
    println!("{}", json);
    Ok(())
}

/// One-line zone description used by `list` and after downloads.
pub fn zone_line(zone: &ZoneSummary) -> String {
    format!(
        "{}  {:<20} {:<11} {:>6}/{:<6} tiles  {:>10}  {} POIs",
        zone.id,
        zone.name,
        zone.status,
        zone.downloaded_tiles,
        zone.tile_count,
        zonecache::config::format_size_approx(zone.total_bytes),
        zone.poi_count,
    )
}
