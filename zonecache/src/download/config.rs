//! Configuration for the download orchestrator.

use std::time::Duration;

use crate::estimate::AVERAGE_TILE_SIZE;

/// Default cap on planned tiles per zone.
pub const DEFAULT_MAX_TILES_PER_ZONE: u64 = 5000;

/// Upper bound on concurrent tile fetches.
pub const MAX_CONCURRENCY: usize = 8;

/// Default cap on tile bytes held in memory between fetch and write (16 MiB).
pub const DEFAULT_MAX_BYTES_IN_FLIGHT: u64 = 16 * 1024 * 1024;

/// Default gap between zone record refreshes during a run.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Default age after which a `Downloading` zone counts as abandoned.
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(5 * 60);

/// Configuration for [`super::DownloadOrchestrator`].
#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorConfig {
    /// Zones planning more tiles than this are rejected.
    pub max_tiles_per_zone: u64,

    /// Concurrent tile fetches, clamped to `1..=MAX_CONCURRENCY`.
    ///
    /// `1` downloads strictly in plan order.
    pub concurrency: usize,

    /// Per-request timeout for a single tile fetch.
    pub request_timeout: Duration,

    /// Extra attempts after a failed fetch. `0` means a single attempt.
    pub max_retries: u32,

    /// Pause between attempts of the same tile.
    pub retry_delay: Duration,

    /// Budget for tile bytes fetched but not yet written.
    pub max_bytes_in_flight: u64,

    /// Reservation made against the byte budget before a fetch.
    pub average_tile_size: u64,

    /// Zone progress is persisted every this many stored tiles. `0` disables.
    pub checkpoint_interval: u64,

    /// Longest gap between zone record writes while a run is active.
    pub heartbeat_interval: Duration,

    /// A `Downloading` zone not refreshed for this long is treated as
    /// abandoned by recovery and resume. Keep it well above
    /// `heartbeat_interval` plus the worst time a single tile can take.
    pub stale_after: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_tiles_per_zone: DEFAULT_MAX_TILES_PER_ZONE,
            concurrency: 1,
            request_timeout: Duration::from_secs(10),
            max_retries: 0,
            retry_delay: Duration::from_millis(500),
            max_bytes_in_flight: DEFAULT_MAX_BYTES_IN_FLIGHT,
            average_tile_size: AVERAGE_TILE_SIZE,
            checkpoint_interval: 100,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            stale_after: DEFAULT_STALE_AFTER,
        }
    }
}

impl OrchestratorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_tiles_per_zone(mut self, max: u64) -> Self {
        self.max_tiles_per_zone = max;
        self
    }

    /// Set the number of concurrent fetches (clamped to `1..=8`).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.clamp(1, MAX_CONCURRENCY);
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn with_max_bytes_in_flight(mut self, bytes: u64) -> Self {
        self.max_bytes_in_flight = bytes.max(1);
        self
    }

    pub fn with_average_tile_size(mut self, bytes: u64) -> Self {
        self.average_tile_size = bytes.max(1);
        self
    }

    pub fn with_checkpoint_interval(mut self, tiles: u64) -> Self {
        self.checkpoint_interval = tiles;
        self
    }

    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    pub fn with_stale_after(mut self, age: Duration) -> Self {
        self.stale_after = age;
        self
    }
}
