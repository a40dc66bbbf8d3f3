//! Zone download orchestration.
//!
//! # Architecture
//!
//! ```text
//! DownloadOrchestrator
//!         │
//!         ├── TileProvider   (fetch, with timeout and retry)
//!         ├── PointSource    (POI snapshot)
//!         ├── ZoneStore      (tile and zone persistence)
//!         ├── ByteBudget     (bytes held between fetch and write)
//!         ├── DownloadState  (per-run counters)
//!         └── ProgressCallback
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use zonecache::download::{DownloadOrchestrator, OrchestratorConfig};
//!
//! let orchestrator = DownloadOrchestrator::new(provider, points, store, OrchestratorConfig::default());
//! let report = orchestrator
//!     .download_zone("Paris", bounds, &[10, 11], &CancellationToken::new(), None)
//!     .await?;
//! println!("{} tiles, status {}", report.zone.downloaded_tiles, report.status());
//! ```

mod budget;
mod config;
mod error;
mod orchestrator;
mod progress;
mod state;

pub use config::{
    OrchestratorConfig, DEFAULT_HEARTBEAT_INTERVAL, DEFAULT_MAX_BYTES_IN_FLIGHT,
    DEFAULT_MAX_TILES_PER_ZONE, DEFAULT_STALE_AFTER, MAX_CONCURRENCY,
};
pub use error::{DownloadError, DownloadResult};
pub use orchestrator::{DownloadOrchestrator, DownloadReport};
pub use progress::{DownloadProgress, ProgressCallback};
pub use state::DownloadState;
