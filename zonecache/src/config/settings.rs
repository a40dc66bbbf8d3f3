//! Configuration settings and their defaults.

use std::path::PathBuf;
use std::time::Duration;

use crate::download::{OrchestratorConfig, DEFAULT_MAX_BYTES_IN_FLIGHT, DEFAULT_MAX_TILES_PER_ZONE};
use crate::estimate::{ZoneEstimator, AVERAGE_TILE_SIZE};
use crate::provider::{ProviderSettings, DEFAULT_TILE_SERVER};

pub const DEFAULT_CLIENT_NAME: &str = "zonecache";
pub const DEFAULT_CONTACT: &str = "unknown";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_MAX_ZOOM: u8 = 19;
pub const DEFAULT_CONCURRENCY: usize = 1;
pub const DEFAULT_MAX_RETRIES: u32 = 0;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 500;

/// Contents of `config.ini`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConfigFile {
    pub provider: ProviderConfig,
    pub download: DownloadConfig,
    pub storage: StorageConfig,
}

/// `[provider]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    pub tile_server: String,
    pub client_name: String,
    pub contact: String,
    /// Per-request timeout in seconds.
    pub timeout: u64,
    pub max_zoom: u8,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            tile_server: DEFAULT_TILE_SERVER.to_string(),
            client_name: DEFAULT_CLIENT_NAME.to_string(),
            contact: DEFAULT_CONTACT.to_string(),
            timeout: DEFAULT_TIMEOUT_SECS,
            max_zoom: DEFAULT_MAX_ZOOM,
        }
    }
}

/// `[download]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadConfig {
    pub max_tiles: u64,
    pub concurrency: usize,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub max_bytes_in_flight: u64,
    pub average_tile_size: u64,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            max_tiles: DEFAULT_MAX_TILES_PER_ZONE,
            concurrency: DEFAULT_CONCURRENCY,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            max_bytes_in_flight: DEFAULT_MAX_BYTES_IN_FLIGHT,
            average_tile_size: AVERAGE_TILE_SIZE,
        }
    }
}

/// `[storage]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct StorageConfig {
    /// Root directory of the disk store.
    pub directory: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            directory: default_storage_directory(),
        }
    }
}

/// Default store location (`~/.zonecache/store`).
pub fn default_storage_directory() -> PathBuf {
    super::file::config_directory().join("store")
}

impl ConfigFile {
    pub fn provider_settings(&self) -> ProviderSettings {
        ProviderSettings {
            tile_server: self.provider.tile_server.clone(),
            client_name: self.provider.client_name.clone(),
            contact: self.provider.contact.clone(),
            timeout: Duration::from_secs(self.provider.timeout),
            max_zoom: self.provider.max_zoom,
        }
    }

    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig::new()
            .with_max_tiles_per_zone(self.download.max_tiles)
            .with_concurrency(self.download.concurrency)
            .with_request_timeout(Duration::from_secs(self.provider.timeout))
            .with_max_retries(self.download.max_retries)
            .with_retry_delay(Duration::from_millis(self.download.retry_delay_ms))
            .with_max_bytes_in_flight(self.download.max_bytes_in_flight)
            .with_average_tile_size(self.download.average_tile_size)
    }

    pub fn estimator(&self) -> ZoneEstimator {
        ZoneEstimator::new().with_average_tile_size(self.download.average_tile_size)
    }
}
