//! Provider types and traits

use std::fmt;
use std::future::Future;

use crate::coord::TileCoord;

/// Errors that can occur while fetching a tile.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// HTTP request failed
    HttpError(String),
    /// Server answered with a non-success status
    Status { code: u16, url: String },
    /// Request exceeded the per-request deadline
    Timeout { secs: u64 },
    /// Zoom level not supported by this provider
    UnsupportedZoom(u8),
    /// Response body was unusable
    InvalidResponse(String),
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::HttpError(msg) => write!(f, "HTTP error: {}", msg),
            ProviderError::Status { code, url } => write!(f, "HTTP {} from {}", code, url),
            ProviderError::Timeout { secs } => write!(f, "Request timed out after {}s", secs),
            ProviderError::UnsupportedZoom(zoom) => {
                write!(f, "Zoom level {} not supported by provider", zoom)
            }
            ProviderError::InvalidResponse(msg) => write!(f, "Invalid response: {}", msg),
        }
    }
}

impl std::error::Error for ProviderError {}

/// Async source of raster tiles.
///
/// Implementors fetch the pre-rendered image for a single slippy-map tile.
pub trait TileProvider: Send + Sync {
    /// Downloads the raw image bytes for `tile`.
    fn fetch_tile(
        &self,
        tile: TileCoord,
    ) -> impl Future<Output = Result<Vec<u8>, ProviderError>> + Send;

    /// Returns the provider's name for logging and identification.
    fn name(&self) -> &str;

    /// Returns the minimum supported zoom level.
    fn min_zoom(&self) -> u8 {
        0
    }

    /// Returns the maximum supported zoom level.
    fn max_zoom(&self) -> u8 {
        19
    }

    /// Checks if this provider supports the given zoom level.
    fn supports_zoom(&self, zoom: u8) -> bool {
        zoom >= self.min_zoom() && zoom <= self.max_zoom()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_display() {
        let err = ProviderError::Status {
            code: 404,
            url: "https://tiles.example/1/2/3.png".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 404 from https://tiles.example/1/2/3.png");

        let err = ProviderError::Timeout { secs: 10 };
        assert!(err.to_string().contains("10s"));
    }
}
