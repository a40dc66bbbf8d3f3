//! `check` command: is a location cached at a zoom level?

use std::path::PathBuf;

use clap::Args;
use zonecache::availability::AvailabilityChecker;
use zonecache::coord;

use super::common::Context;
use crate::error::CliError;

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Latitude in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    pub lat: f64,

    /// Longitude in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    pub lng: f64,

    #[arg(long)]
    pub zoom: u8,

    /// Write the cached tile image to this file
    #[arg(long)]
    pub output: Option<PathBuf>,
}

pub async fn run(context: &Context, args: CheckArgs) -> Result<(), CliError> {
    let tile = coord::try_to_tile(args.lat, args.lng, args.zoom)
        .map_err(|e| CliError::Input(e.to_string()))?;
    let checker = AvailabilityChecker::new(context.open_store().await?);

    if !checker.is_tile_available(tile) {
        println!("Tile {} is not cached", tile);
        return Ok(());
    }
    println!("Tile {} is cached", tile);

    if let Some(path) = args.output {
        let Some(data) = checker.get_any_tile(args.lat, args.lng, args.zoom).await else {
            println!("  (tile could not be read)");
            return Ok(());
        };
        std::fs::write(&path, &data).map_err(|error| CliError::FileWrite {
            path: path.display().to_string(),
            error,
        })?;
        println!("  Wrote {} bytes to {}", data.len(), path.display());
    }
    Ok(())
}
