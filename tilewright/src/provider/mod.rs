//! Remote overlay tile provider.
//!
//! The overlay pipeline fetches topographic tiles from a public ArcGIS-style
//! tile service. The HTTP transport sits behind the [`HttpClient`] trait so
//! tests can swap in a mock; [`OverlayProvider`] owns the service's URL
//! convention, which orders path segments `<z>/<y>/<x>` (Y before X,
//! unlike the local on-disk layout).

mod http;

pub use http::{HttpClient, ReqwestClient};

use thiserror::Error;

use crate::coord::TileCoord;

/// Base URL of the USDA Forest Service FSTopo tile service.
pub const FSTOPO_BASE_URL: &str =
    "https://apps.fs.usda.gov/arcx/rest/services/EDW/EDW_FSTopo_01/MapServer/tile";

/// Deepest zoom level the overlay service publishes.
const PROVIDER_MAX_ZOOM: u8 = 18;

/// Errors that can occur when fetching overlay tiles.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// Transport-level failure (connect, status, body).
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// The service does not publish tiles at this zoom level.
    #[error("unsupported zoom level {0}")]
    UnsupportedZoom(u8),
}

/// Overlay tile provider over an ArcGIS-style `<z>/<y>/<x>` endpoint.
#[derive(Debug, Clone)]
pub struct OverlayProvider<C: HttpClient> {
    http_client: C,
    base_url: String,
}

impl<C: HttpClient> OverlayProvider<C> {
    /// Creates a provider for the default FSTopo service.
    pub fn new(http_client: C) -> Self {
        Self::with_base_url(http_client, FSTOPO_BASE_URL)
    }

    /// Creates a provider for a custom service root.
    ///
    /// A trailing slash on the root is tolerated.
    pub fn with_base_url(http_client: C, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            http_client,
            base_url,
        }
    }

    /// Service URL for one tile: `<base>/<z>/<y>/<x>`.
    fn build_url(&self, coord: &TileCoord) -> String {
        format!("{}/{}/{}/{}", self.base_url, coord.zoom, coord.y, coord.x)
    }

    /// Fetches the overlay tile covering `coord`.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError::UnsupportedZoom` beyond the service range and
    /// `ProviderError::HttpError` for any transport failure. Callers treat
    /// every error as "no overlay available" and fall back.
    pub fn fetch_tile(&self, coord: &TileCoord) -> Result<Vec<u8>, ProviderError> {
        if coord.zoom > PROVIDER_MAX_ZOOM {
            return Err(ProviderError::UnsupportedZoom(coord.zoom));
        }
        self.http_client.get(&self.build_url(coord))
    }
}

#[cfg(test)]
pub use http::tests::MockHttpClient;
