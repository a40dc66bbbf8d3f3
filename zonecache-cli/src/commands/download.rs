//! `download`, `resume` and `recover` commands.

use std::sync::Arc;

use clap::Args;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tokio_util::sync::CancellationToken;
use zonecache::download::{DownloadOrchestrator, DownloadProgress, DownloadReport, ProgressCallback};
use zonecache::poi::StaticPointSource;
use zonecache::provider::{AsyncReqwestClient, HttpTileProvider};
use zonecache::zone::{ZoneId, ZoneStatus};

use super::common::{load_points, zone_line, Context, RegionArgs};
use crate::error::CliError;

#[derive(Debug, Args)]
pub struct DownloadArgs {
    /// Zone name
    #[arg(long)]
    pub name: String,

    #[command(flatten)]
    pub region: RegionArgs,

    /// Concurrent tile fetches (1-8), overrides the config file
    #[arg(long)]
    pub concurrency: Option<usize>,
}

#[derive(Debug, Args)]
pub struct ResumeArgs {
    /// Id of a partial zone
    pub zone_id: String,

    /// Concurrent tile fetches (1-8), overrides the config file
    #[arg(long)]
    pub concurrency: Option<usize>,
}

pub async fn run_download(context: &Context, args: DownloadArgs) -> Result<(), CliError> {
    let points = load_points(args.region.points.as_deref())?;
    let orchestrator = build_orchestrator(context, points, args.concurrency).await?;

    let cancel = cancel_on_ctrl_c()?;
    let bar = progress_bar();
    let report = orchestrator
        .download_zone(
            &args.name,
            args.region.bounds.0,
            &args.region.zoom,
            &cancel,
            Some(progress_callback(&bar)),
        )
        .await;
    bar.finish_and_clear();

    print_report(&report?);
    Ok(())
}

pub async fn run_resume(context: &Context, args: ResumeArgs) -> Result<(), CliError> {
    let orchestrator =
        build_orchestrator(context, load_points(None)?, args.concurrency).await?;

    let cancel = cancel_on_ctrl_c()?;
    let bar = progress_bar();
    let report = orchestrator
        .resume_zone(
            &ZoneId::new(args.zone_id),
            &cancel,
            Some(progress_callback(&bar)),
        )
        .await;
    bar.finish_and_clear();

    print_report(&report?);
    Ok(())
}

/// Settles zones left `downloading` by a run that stopped writing checkpoints.
pub async fn run_recover(context: &Context) -> Result<(), CliError> {
    let orchestrator = build_orchestrator(context, load_points(None)?, None).await?;
    let recovered = orchestrator.recover_interrupted().await?;

    if recovered.is_empty() {
        println!("No interrupted zones.");
        return Ok(());
    }
    for id in &recovered {
        println!("Recovered zone {}", id);
    }
    println!();
    println!("Run `zonecache resume <zone-id>` to retry missing tiles.");
    Ok(())
}

type HttpOrchestrator = DownloadOrchestrator<HttpTileProvider<AsyncReqwestClient>, StaticPointSource>;

async fn build_orchestrator(
    context: &Context,
    points: StaticPointSource,
    concurrency: Option<usize>,
) -> Result<HttpOrchestrator, CliError> {
    let provider = HttpTileProvider::from_settings(&context.config.provider_settings())
        .map_err(CliError::Provider)?;
    let store = context.open_store().await?;

    let mut config = context.config.orchestrator_config();
    if let Some(n) = concurrency {
        config = config.with_concurrency(n);
    }

    Ok(DownloadOrchestrator::new(
        Arc::new(provider),
        Arc::new(points),
        store,
        config,
    ))
}

/// Cancels the returned token on Ctrl+C.
fn cancel_on_ctrl_c() -> Result<CancellationToken, CliError> {
    let token = CancellationToken::new();
    let handler_token = token.clone();
    ctrlc::set_handler(move || {
        eprintln!();
        eprintln!("Cancelling, keeping tiles downloaded so far...");
        handler_token.cancel();
    })
    .map_err(|e| CliError::Startup(format!("Failed to set signal handler: {}", e)))?;
    Ok(token)
}

/// Progress bar drawn on stdout; logs go to stderr.
fn progress_bar() -> ProgressBar {
    let bar = ProgressBar::with_draw_target(Some(0), ProgressDrawTarget::stdout());
    let style = ProgressStyle::with_template(
        "{spinner} [{elapsed_precise}] {wide_bar} {pos}/{len} tiles ({percent}%) {msg}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar());
    bar.set_style(style);
    bar
}

fn progress_callback(bar: &ProgressBar) -> ProgressCallback {
    let bar = bar.clone();
    Arc::new(move |progress: &DownloadProgress| {
        bar.set_length(progress.total);
        bar.set_position(progress.downloaded);
        if progress.failed > 0 {
            bar.set_message(format!("{} failed", progress.failed));
        }
    })
}

fn print_report(report: &DownloadReport) {
    let summary = report.zone.summary();
    let status = match report.status() {
        ZoneStatus::Complete => console::style("complete").green(),
        ZoneStatus::Partial => console::style("partial").yellow(),
        ZoneStatus::Downloading => console::style("downloading").cyan(),
    };

    if report.cancelled {
        println!("Download cancelled.");
    }
    println!(
        "Zone {} {} in {:.1}s ({} attempted, {} failed)",
        summary.name,
        status,
        report.elapsed.as_secs_f64(),
        report.attempted,
        report.failed_tiles.len()
    );
    println!("{}", zone_line(&summary));
    if report.status() == ZoneStatus::Partial {
        println!();
        println!("Run `zonecache resume {}` to retry missing tiles.", summary.id);
    }
}
