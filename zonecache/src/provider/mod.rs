//! Raster tile provider abstraction
//!
//! This module provides the [`TileProvider`] trait used by the download
//! orchestrator and an HTTP implementation for `{z}/{x}/{y}.png` servers.
//!
//! ```ignore
//! use zonecache::provider::{HttpTileProvider, ProviderSettings};
//!
//! let provider = HttpTileProvider::from_settings(&ProviderSettings::default())?;
//! let png = provider.fetch_tile(TileCoord::new(10, 517, 351)).await?;
//! ```

mod http;
mod raster;
mod types;

pub use http::{AsyncHttpClient, AsyncReqwestClient};
pub use raster::{HttpTileProvider, ProviderSettings, DEFAULT_TILE_SERVER};
pub use types::{ProviderError, TileProvider};

#[cfg(test)]
pub use http::tests::MockAsyncHttpClient;
