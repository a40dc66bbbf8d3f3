//! Raster tile provider for `{z}/{x}/{y}.png` tile servers.
//!
//! Most public slippy-map servers (OpenStreetMap and its mirrors) expose
//! tiles at `{tile_server}/{z}/{x}/{y}.png`. The server also expects every
//! client to identify itself, so the HTTP client is built with a
//! `"{client_name} ({contact})"` User-Agent.

use std::time::Duration;

use crate::coord::TileCoord;
use crate::provider::{AsyncHttpClient, AsyncReqwestClient, ProviderError, TileProvider};

/// Default tile server.
pub const DEFAULT_TILE_SERVER: &str = "https://tile.openstreetmap.org";

/// Settings needed to talk to a raster tile server.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSettings {
    /// Base URL, without trailing slash.
    pub tile_server: String,
    /// Application name sent in the User-Agent.
    pub client_name: String,
    /// Contact (e-mail or URL) sent in the User-Agent.
    pub contact: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Highest zoom the server renders.
    pub max_zoom: u8,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            tile_server: DEFAULT_TILE_SERVER.to_string(),
            client_name: format!("zonecache/{}", env!("CARGO_PKG_VERSION")),
            contact: "unknown".to_string(),
            timeout: Duration::from_secs(10),
            max_zoom: 19,
        }
    }
}

impl ProviderSettings {
    pub fn user_agent(&self) -> String {
        format!("{} ({})", self.client_name, self.contact)
    }
}

/// Tile provider for `{z}/{x}/{y}.png` servers.
pub struct HttpTileProvider<C: AsyncHttpClient> {
    http_client: C,
    tile_server: String,
    max_zoom: u8,
}

impl HttpTileProvider<AsyncReqwestClient> {
    /// Builds a provider backed by reqwest from `settings`.
    pub fn from_settings(settings: &ProviderSettings) -> Result<Self, ProviderError> {
        let client = AsyncReqwestClient::new(&settings.user_agent(), settings.timeout)?;
        Ok(Self::new(client, &settings.tile_server).with_max_zoom(settings.max_zoom))
    }
}

impl<C: AsyncHttpClient> HttpTileProvider<C> {
    pub fn new(http_client: C, tile_server: &str) -> Self {
        Self {
            http_client,
            tile_server: tile_server.trim_end_matches('/').to_string(),
            max_zoom: 19,
        }
    }

    pub fn with_max_zoom(mut self, max_zoom: u8) -> Self {
        self.max_zoom = max_zoom;
        self
    }

    /// Builds the tile URL for the given coordinates.
    pub fn build_url(&self, tile: &TileCoord) -> String {
        format!(
            "{}/{}/{}/{}.png",
            self.tile_server, tile.zoom, tile.x, tile.y
        )
    }
}

impl<C: AsyncHttpClient> TileProvider for HttpTileProvider<C> {
    async fn fetch_tile(&self, tile: TileCoord) -> Result<Vec<u8>, ProviderError> {
        if !self.supports_zoom(tile.zoom) {
            return Err(ProviderError::UnsupportedZoom(tile.zoom));
        }

        let url = self.build_url(&tile);
        self.http_client.get(&url).await
    }

    fn name(&self) -> &str {
        &self.tile_server
    }

    fn max_zoom(&self) -> u8 {
        self.max_zoom
    }
}
