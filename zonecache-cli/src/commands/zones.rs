//! Zone registry commands: `list`, `show`, `delete`, `stats`, `sweep`.

use clap::Args;
use zonecache::config::format_size_approx;
use zonecache::store::ZoneStore;
use zonecache::zone::{ZoneId, ZoneRegistry, ZoneSummary};

use super::common::{print_json, zone_line, Context};
use crate::error::CliError;

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Print zone summaries as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    pub zone_id: String,

    /// Print the full zone record, including POIs, as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct DeleteArgs {
    pub zone_id: String,
}

pub async fn run_list(context: &Context, args: ListArgs) -> Result<(), CliError> {
    let registry = ZoneRegistry::new(context.open_store().await?);
    let summaries: Vec<ZoneSummary> = registry.list().await?.iter().map(|z| z.summary()).collect();

    if args.json {
        return print_json(&summaries);
    }
    if summaries.is_empty() {
        println!("No zones downloaded.");
        return Ok(());
    }
    for summary in &summaries {
        println!("{}", zone_line(summary));
    }
    Ok(())
}

pub async fn run_show(context: &Context, args: ShowArgs) -> Result<(), CliError> {
    let registry = ZoneRegistry::new(context.open_store().await?);
    let zone = registry
        .get(&ZoneId::new(args.zone_id.clone()))
        .await?
        .ok_or(CliError::ZoneNotFound(args.zone_id))?;

    if args.json {
        return print_json(&zone);
    }

    println!("Zone {}", zone.id);
    println!("  Name:       {}", zone.name);
    println!("  Status:     {}", zone.status);
    println!("  Bounds:     {}", zone.bounds);
    println!("  Zoom:       {:?}", zone.zoom_levels);
    println!("  Tiles:      {}/{} ({} failed)", zone.downloaded_tiles, zone.tile_count, zone.failed_tile_count);
    println!("  Size:       {}", format_size_approx(zone.total_bytes));
    println!("  POIs:       {}", zone.poi_count());
    println!("  Created:    {}", zone.created_at.format("%Y-%m-%d %H:%M:%S UTC"));
    Ok(())
}

pub async fn run_delete(context: &Context, args: DeleteArgs) -> Result<(), CliError> {
    let registry = ZoneRegistry::new(context.open_store().await?);
    if registry.delete(&ZoneId::new(args.zone_id.clone())).await? {
        println!("Deleted zone {}", args.zone_id);
        Ok(())
    } else {
        Err(CliError::ZoneNotFound(args.zone_id))
    }
}

pub async fn run_stats(context: &Context) -> Result<(), CliError> {
    let registry = ZoneRegistry::new(context.open_store().await?);
    let stats = registry.stats().await?;

    println!("Store: {}", context.config.storage.directory.display());
    println!("  Zones: {}", stats.zone_count);
    println!("  Tiles: {}", stats.total_tiles);
    println!("  Size:  {}", format_size_approx(stats.total_bytes));
    for usage in &stats.per_zone {
        println!(
            "    {:<20} {:<11} {:>6} tiles {:>10}",
            usage.name,
            usage.status,
            usage.tiles,
            format_size_approx(usage.bytes)
        );
    }
    Ok(())
}

pub async fn run_sweep(context: &Context) -> Result<(), CliError> {
    let store = context.open_store().await?;
    let reclaimed = store.sweep_orphans().await?;
    println!("Reclaimed {} orphaned tiles", reclaimed);
    Ok(())
}
