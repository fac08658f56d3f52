//! Tile download abstraction.

use std::future::Future;
use std::pin::Pin;

use crate::geo::TileCoord;

use super::config::PrefetchConfig;
use super::error::PrefetchError;

/// Boxed future type for dyn-compatible async methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Downloads tile images.
///
/// Allows the prefetcher to run against a mock in tests.
pub trait TileFetcher: Send + Sync {
    /// Fetch one tile's image bytes.
    fn fetch(&self, tile: TileCoord) -> BoxFuture<'_, Result<Vec<u8>, PrefetchError>>;
}

/// Expand a `{z}/{x}/{y}` URL template.
pub fn tile_url(template: &str, tile: TileCoord) -> String {
    template
        .replace("{z}", &tile.zoom.to_string())
        .replace("{x}", &tile.x.to_string())
        .replace("{y}", &tile.y.to_string())
}

/// Fetches tiles over HTTP with reqwest.
pub struct HttpTileFetcher {
    client: reqwest::Client,
    url_template: String,
}

impl HttpTileFetcher {
    pub fn new(config: &PrefetchConfig) -> Result<Self, PrefetchError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| PrefetchError::Client(e.to_string()))?;

        Ok(Self {
            client,
            url_template: config.tile_url.clone(),
        })
    }
}

impl TileFetcher for HttpTileFetcher {
    fn fetch(&self, tile: TileCoord) -> BoxFuture<'_, Result<Vec<u8>, PrefetchError>> {
        Box::pin(async move {
            let url = tile_url(&self.url_template, tile);

            let response = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(|e| PrefetchError::Http {
                    url: url.clone(),
                    message: e.to_string(),
                })?;

            let status = response.status();
            if !status.is_success() {
                return Err(PrefetchError::HttpStatus {
                    url,
                    status: status.as_u16(),
                });
            }

            response
                .bytes()
                .await
                .map(|b| b.to_vec())
                .map_err(|e| PrefetchError::Http {
                    url,
                    message: format!("Failed to read response: {}", e),
                })
        })
    }
}
