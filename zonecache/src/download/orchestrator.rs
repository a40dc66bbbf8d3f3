//! Zone download orchestration.
//!
//! A run moves a zone through `Downloading` to `Complete` or `Partial`:
//!
//! 1. validate bounds and zoom levels, plan tiles, enforce the tile cap
//! 2. snapshot points of interest inside the bounds
//! 3. persist the zone as `Downloading`
//! 4. fetch tiles, storing each success and counting each failure
//! 5. persist the final status
//!
//! Steps 1 and 2 do no storage I/O, so rejected requests leave nothing behind.
//! Fetches run through a bounded `buffer_unordered` pool; all store writes
//! happen on the driving task, so cancellation never strands a half-counted
//! tile.

use std::pin::pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::coord::{self, GeoBounds, TileCoord};
use crate::poi::{self, Point, PointSource};
use crate::provider::{ProviderError, TileProvider};
use crate::store::{StoreError, ZoneStore};
use crate::zone::{TileRecord, Zone, ZoneId, ZoneStatus};

use super::budget::{BudgetHold, ByteBudget};
use super::config::{OrchestratorConfig, MAX_CONCURRENCY};
use super::error::{DownloadError, DownloadResult};
use super::progress::ProgressCallback;
use super::state::DownloadState;

/// Outcome of a download run.
#[derive(Debug, Clone)]
pub struct DownloadReport {
    /// Zone record as persisted at the end of the run.
    pub zone: Zone,
    /// Tiles attempted in this run.
    pub attempted: u64,
    /// Tiles that failed in this run.
    pub failed_tiles: Vec<TileCoord>,
    /// The run stopped because the cancellation token fired.
    pub cancelled: bool,
    pub elapsed: Duration,
}

impl DownloadReport {
    pub fn zone_id(&self) -> &ZoneId {
        &self.zone.id
    }

    pub fn status(&self) -> ZoneStatus {
        self.zone.status
    }
}

/// Marks a zone as owned by a running download until dropped.
struct ZoneLease<'a> {
    active: &'a DashMap<ZoneId, ()>,
    zone_id: ZoneId,
}

impl Drop for ZoneLease<'_> {
    fn drop(&mut self) {
        self.active.remove(&self.zone_id);
    }
}

/// A finished fetch and the byte budget its payload holds until written.
struct Fetched<'a> {
    tile: TileCoord,
    result: Result<Vec<u8>, ProviderError>,
    _budget: BudgetHold<'a>,
}

/// Downloads zones from a tile provider into a zone store.
///
/// At most one run per zone id is active at a time; a second concurrent
/// request for the same zone fails with [`DownloadError::ZoneBusy`]. Runs
/// refresh the zone's `updated_at` at least every `heartbeat_interval`, so
/// other orchestrators sharing the store can tell a live download from an
/// abandoned one.
pub struct DownloadOrchestrator<T: TileProvider, P: PointSource> {
    provider: Arc<T>,
    points: Arc<P>,
    store: Arc<dyn ZoneStore>,
    config: OrchestratorConfig,
    active: DashMap<ZoneId, ()>,
    budget: ByteBudget,
}

impl<T: TileProvider, P: PointSource> DownloadOrchestrator<T, P> {
    pub fn new(
        provider: Arc<T>,
        points: Arc<P>,
        store: Arc<dyn ZoneStore>,
        config: OrchestratorConfig,
    ) -> Self {
        let budget = ByteBudget::new(config.max_bytes_in_flight);
        Self {
            provider,
            points,
            store,
            config,
            active: DashMap::new(),
            budget,
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Whether a download currently holds `zone_id`.
    pub fn is_active(&self, zone_id: &ZoneId) -> bool {
        self.active.contains_key(zone_id)
    }

    /// Tile bytes currently reserved against the in-flight budget.
    pub fn bytes_in_flight(&self) -> u64 {
        self.budget.in_flight()
    }

    /// Creates a zone and downloads every tile covering `bounds` at `zoom_levels`.
    ///
    /// Per-tile fetch failures are counted on the zone, which ends `Partial`.
    /// Cancellation also ends the zone `Partial` and returns `Ok` with
    /// `cancelled` set.
    pub async fn download_zone(
        &self,
        name: &str,
        bounds: GeoBounds,
        zoom_levels: &[u8],
        cancel: &CancellationToken,
        on_progress: Option<ProgressCallback>,
    ) -> DownloadResult<DownloadReport> {
        bounds
            .validate()
            .map_err(|e| DownloadError::InvalidBounds(e.to_string()))?;
        coord::validate_zoom_levels(zoom_levels)
            .map_err(|e| DownloadError::InvalidBounds(e.to_string()))?;

        let planned = coord::count_tiles_for_bounds(&bounds, zoom_levels);
        if planned > self.config.max_tiles_per_zone {
            return Err(DownloadError::ZoneTooLarge {
                tiles: planned,
                max: self.config.max_tiles_per_zone,
            });
        }
        let plan = coord::tiles_for_bounds(&bounds, zoom_levels);

        let snapshot = self.snapshot_points(&bounds).await;
        let mut zone = Zone::new(name, bounds, zoom_levels.to_vec(), planned, snapshot);
        let _lease = self.lease(&zone.id)?;

        self.save(&mut zone)
            .await
            .map_err(DownloadError::StorageWrite)?;

        info!(
            zone = %zone.id,
            name,
            tiles = planned,
            pois = zone.poi_count(),
            provider = self.provider.name(),
            "Starting zone download"
        );

        self.run(zone, plan, DownloadState::new(planned), cancel, on_progress)
            .await
    }

    /// Fetches the tiles a `Downloading` or `Partial` zone is still missing.
    ///
    /// The POI snapshot is kept as is. Resuming a `Complete` zone does
    /// nothing and reports zero attempts. A `Downloading` zone refreshed
    /// within `stale_after` belongs to a live run elsewhere and is refused
    /// with [`DownloadError::ZoneBusy`].
    pub async fn resume_zone(
        &self,
        zone_id: &ZoneId,
        cancel: &CancellationToken,
        on_progress: Option<ProgressCallback>,
    ) -> DownloadResult<DownloadReport> {
        let _lease = self.lease(zone_id)?;

        let mut zone = self
            .store
            .get_zone(zone_id)
            .await
            .map_err(DownloadError::StorageRead)?
            .ok_or_else(|| DownloadError::ZoneNotFound(zone_id.clone()))?;

        if zone.status == ZoneStatus::Complete {
            debug!(zone = %zone_id, "Zone already complete, nothing to resume");
            return Ok(DownloadReport {
                zone,
                attempted: 0,
                failed_tiles: Vec::new(),
                cancelled: false,
                elapsed: Duration::ZERO,
            });
        }

        if zone.status == ZoneStatus::Downloading && !self.is_stale(&zone) {
            return Err(DownloadError::ZoneBusy(zone_id.clone()));
        }

        let plan: Vec<TileCoord> = coord::tiles_for_bounds(&zone.bounds, &zone.zoom_levels)
            .into_iter()
            .filter(|tile| !self.store.contains_tile(zone_id, *tile))
            .collect();
        let stored = self.store.tiles_for_zone(zone_id).len() as u64;
        let stored_bytes = self
            .store
            .tile_bytes_for_zone(zone_id)
            .await
            .map_err(DownloadError::StorageRead)?;

        zone.status = ZoneStatus::Downloading;
        zone.downloaded_tiles = stored;
        zone.total_bytes = stored_bytes;
        zone.failed_tile_count = 0;
        self.save(&mut zone)
            .await
            .map_err(DownloadError::StorageWrite)?;

        info!(zone = %zone_id, stored, stored_bytes, remaining = plan.len(), "Resuming zone download");

        let state = DownloadState::resumed(zone.tile_count, stored, stored_bytes);
        self.run(zone, plan, state, cancel, on_progress).await
    }

    /// Finalizes zones left `Downloading` by a process that stopped mid-run.
    ///
    /// Only zones whose record has not been refreshed for `stale_after` are
    /// touched; zones held by a run in this orchestrator are left alone too.
    /// Stored tiles and bytes are recounted and the zone becomes `Partial`,
    /// or `Complete` if every planned tile turns out to be present. Returns
    /// the ids updated.
    pub async fn recover_interrupted(&self) -> DownloadResult<Vec<ZoneId>> {
        let zones = self
            .store
            .list_zones()
            .await
            .map_err(DownloadError::StorageRead)?;

        let mut recovered = Vec::new();
        for mut zone in zones
            .into_iter()
            .filter(|z| z.status == ZoneStatus::Downloading)
        {
            if !self.is_stale(&zone) {
                debug!(zone = %zone.id, updated_at = %zone.updated_at, "Zone still live, not recovering");
                continue;
            }
            let Ok(_lease) = self.lease(&zone.id) else {
                continue;
            };

            let stored = self.store.tiles_for_zone(&zone.id).len() as u64;
            zone.total_bytes = self
                .store
                .tile_bytes_for_zone(&zone.id)
                .await
                .map_err(DownloadError::StorageRead)?;
            zone.downloaded_tiles = stored;
            zone.failed_tile_count = zone.tile_count.saturating_sub(stored);
            zone.status = if stored >= zone.tile_count {
                ZoneStatus::Complete
            } else {
                ZoneStatus::Partial
            };
            self.save(&mut zone)
                .await
                .map_err(DownloadError::StorageWrite)?;

            info!(zone = %zone.id, stored, status = %zone.status, "Recovered interrupted zone");
            recovered.push(zone.id);
        }

        Ok(recovered)
    }

    async fn run(
        &self,
        mut zone: Zone,
        plan: Vec<TileCoord>,
        mut state: DownloadState,
        cancel: &CancellationToken,
        on_progress: Option<ProgressCallback>,
    ) -> DownloadResult<DownloadReport> {
        let started = Instant::now();
        let mut cancelled = false;
        let mut since_checkpoint = 0u64;
        let mut last_saved = Instant::now();

        let mut fetches = pin!(futures::stream::iter(plan)
            .map(|tile| self.fetch_tile(tile))
            .buffer_unordered(self.config.concurrency.clamp(1, MAX_CONCURRENCY)));

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    cancelled = true;
                    break;
                }
                next = fetches.next() => next,
            };
            let Some(fetched) = next else {
                break;
            };

            match fetched.result {
                Ok(data) => {
                    let bytes = data.len() as u64;
                    let record = TileRecord::new(zone.id.clone(), fetched.tile, data);
                    if let Err(e) = self.store.put_tile(record).await {
                        warn!(zone = %zone.id, tile = %fetched.tile, error = %e, "Tile write failed, aborting zone");
                        state.record_failure(fetched.tile);
                        return Err(self.abort(zone, &state, e).await);
                    }
                    state.record_success(bytes);
                    since_checkpoint += 1;
                    debug!(zone = %zone.id, tile = %fetched.tile, bytes, "Stored tile");
                }
                Err(e) => {
                    warn!(zone = %zone.id, tile = %fetched.tile, error = %e, "Tile fetch failed");
                    state.record_failure(fetched.tile);
                }
            }

            if let Some(callback) = &on_progress {
                callback(&state.progress());
            }

            let count_due = self.config.checkpoint_interval > 0
                && since_checkpoint >= self.config.checkpoint_interval;
            if count_due || last_saved.elapsed() >= self.config.heartbeat_interval {
                since_checkpoint = 0;
                last_saved = Instant::now();
                apply_counts(&mut zone, &state);
                if let Err(e) = self.save(&mut zone).await {
                    warn!(zone = %zone.id, error = %e, "Failed to checkpoint zone progress");
                }
            }
        }

        zone.status = if !cancelled && state.is_complete() {
            ZoneStatus::Complete
        } else {
            ZoneStatus::Partial
        };
        apply_counts(&mut zone, &state);
        self.save(&mut zone)
            .await
            .map_err(DownloadError::StorageWrite)?;

        let elapsed = started.elapsed();
        info!(
            zone = %zone.id,
            status = %zone.status,
            downloaded = zone.downloaded_tiles,
            failed = zone.failed_tile_count,
            bytes = zone.total_bytes,
            cancelled,
            elapsed_ms = elapsed.as_millis() as u64,
            "Zone download finished"
        );

        Ok(DownloadReport {
            zone,
            attempted: state.attempted,
            failed_tiles: state.failed,
            cancelled,
            elapsed,
        })
    }

    /// Marks the zone `Partial` after a write failure and builds the error.
    async fn abort(&self, mut zone: Zone, state: &DownloadState, cause: StoreError) -> DownloadError {
        zone.status = ZoneStatus::Partial;
        apply_counts(&mut zone, state);
        if let Err(e) = self.save(&mut zone).await {
            warn!(zone = %zone.id, error = %e, "Could not record partial zone after write failure");
        }
        DownloadError::StorageWrite(cause)
    }

    /// Persists `zone` with a fresh `updated_at`.
    async fn save(&self, zone: &mut Zone) -> Result<(), StoreError> {
        zone.updated_at = Utc::now();
        self.store.put_zone(zone).await
    }

    /// Whether a `Downloading` record has gone without a refresh for `stale_after`.
    fn is_stale(&self, zone: &Zone) -> bool {
        match (Utc::now() - zone.updated_at).to_std() {
            Ok(age) => age >= self.config.stale_after,
            // Refreshed "in the future": clock skew between writers.
            Err(_) => false,
        }
    }

    async fn fetch_tile(&self, tile: TileCoord) -> Fetched<'_> {
        let mut budget = self.budget.reserve(self.config.average_tile_size).await;
        let result = self.fetch_with_retry(tile).await;
        match &result {
            Ok(data) => budget.settle(data.len() as u64),
            Err(_) => budget.settle(0),
        }

        Fetched {
            tile,
            result,
            _budget: budget,
        }
    }

    async fn fetch_with_retry(&self, tile: TileCoord) -> Result<Vec<u8>, ProviderError> {
        if !self.provider.supports_zoom(tile.zoom) {
            return Err(ProviderError::UnsupportedZoom(tile.zoom));
        }

        let mut attempt = 0;
        loop {
            let result =
                match tokio::time::timeout(self.config.request_timeout, self.provider.fetch_tile(tile))
                    .await
                {
                    Ok(result) => result,
                    Err(_) => Err(ProviderError::Timeout {
                        secs: self.config.request_timeout.as_secs(),
                    }),
                };

            match result {
                Ok(data) => return Ok(data),
                Err(e) if attempt < self.config.max_retries => {
                    attempt += 1;
                    debug!(tile = %tile, attempt, error = %e, "Retrying tile fetch");
                    tokio::time::sleep(self.config.retry_delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn snapshot_points(&self, bounds: &GeoBounds) -> Vec<Point> {
        match self.points.all_points().await {
            Ok(all) => poi::points_in_bounds(bounds, &all),
            Err(e) => {
                warn!(error = %e, "Point source unavailable, zone gets an empty POI snapshot");
                Vec::new()
            }
        }
    }

    fn lease(&self, zone_id: &ZoneId) -> DownloadResult<ZoneLease<'_>> {
        match self.active.entry(zone_id.clone()) {
            Entry::Occupied(_) => Err(DownloadError::ZoneBusy(zone_id.clone())),
            Entry::Vacant(entry) => {
                entry.insert(());
                Ok(ZoneLease {
                    active: &self.active,
                    zone_id: zone_id.clone(),
                })
            }
        }
    }
}

fn apply_counts(zone: &mut Zone, state: &DownloadState) {
    zone.downloaded_tiles = state.downloaded;
    zone.total_bytes = state.bytes;
    zone.failed_tile_count = state.failure_count();
}

impl<T: TileProvider, P: PointSource> std::fmt::Debug for DownloadOrchestrator<T, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadOrchestrator")
            .field("provider", &self.provider.name())
            .field("config", &self.config)
            .field("active", &self.active.len())
            .field("byte_budget", &self.budget.capacity())
            .finish_non_exhaustive()
    }
}
