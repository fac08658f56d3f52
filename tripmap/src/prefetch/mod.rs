//! Offline tile prefetch.
//!
//! Downloads every map tile covering a bounding box over a zoom range so
//! the map works without a connection. Downloads are sequential and
//! rate limited:
//!
//! ```text
//! count_tiles ──► over max_tiles? ── yes ──► TooManyTiles
//!                      │ no
//!                      ▼
//! plan_tiles(bounds, zooms) ──► for each tile:
//!                                 stored?  ── yes ──► skip (no pause)
//!                                    │ no
//!                                    ▼
//!                                 fetch ──► store ──► pause ──► next
//! ```

mod config;
mod error;
mod fetcher;
mod plan;
mod runner;
mod store;

pub use config::{
    default_user_agent, PrefetchConfig, DEFAULT_MAX_TILES, DEFAULT_REQUEST_DELAY,
    DEFAULT_REQUEST_TIMEOUT, DEFAULT_TILE_URL,
};
pub use error::PrefetchError;
pub use fetcher::{tile_url, BoxFuture, HttpTileFetcher, TileFetcher};
pub use plan::{count_tiles, plan_tiles, TileBounds};
pub use runner::{PrefetchProgress, PrefetchSummary, TileOutcome, TilePrefetcher};
pub use store::{DiskTileStore, TileStore};
