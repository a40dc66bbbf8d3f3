//! `estimate` command: pre-flight size of a zone.

use clap::Args;
use zonecache::config::format_size_approx;
use zonecache::poi::PointSource;

use super::common::{load_points, print_json, Context, RegionArgs};
use crate::error::CliError;

#[derive(Debug, Args)]
pub struct EstimateArgs {
    #[command(flatten)]
    pub region: RegionArgs,

    /// Print the estimate as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(context: &Context, args: EstimateArgs) -> Result<(), CliError> {
    let bounds = args.region.bounds.0;
    bounds
        .validate()
        .map_err(|e| CliError::Input(e.to_string()))?;

    let points = load_points(args.region.points.as_deref())?
        .all_points()
        .await
        .map_err(CliError::Points)?;

    let estimate = context
        .config
        .estimator()
        .estimate(&bounds, &args.region.zoom, &points);

    if args.json {
        return print_json(&estimate);
    }

    let max_tiles = context.config.download.max_tiles;
    println!("Zone estimate for {}", bounds);
    println!("  Zoom levels: {:?}", args.region.zoom);
    println!("  Tiles:       {}", estimate.tile_count);
    println!("  Size:        ~{}", format_size_approx(estimate.estimated_bytes));
    println!("  POIs:        {}", estimate.poi_count);
    if estimate.exceeds(max_tiles) {
        println!();
        println!(
            "{}",
            console::style(format!(
                "Exceeds the {} tile limit; this zone would be refused.",
                max_tiles
            ))
            .yellow()
        );
    }
    Ok(())
}
