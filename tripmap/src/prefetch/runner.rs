//! Sequential, rate-limited tile download.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::geo::TileCoord;

use super::config::DEFAULT_REQUEST_DELAY;
use super::fetcher::TileFetcher;
use super::store::TileStore;

/// What happened to one tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileOutcome {
    Downloaded,
    /// Already in the store; no request made.
    Skipped,
    Failed,
}

/// Reported after each tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrefetchProgress {
    pub completed: usize,
    pub total: usize,
    pub tile: TileCoord,
    pub outcome: TileOutcome,
}

/// Totals for a finished (or cancelled) run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrefetchSummary {
    pub total: usize,
    pub downloaded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub cancelled: bool,
}

impl PrefetchSummary {
    /// Tiles processed before the run ended.
    pub fn completed(&self) -> usize {
        self.downloaded + self.skipped + self.failed
    }

    fn record(&mut self, outcome: TileOutcome) {
        match outcome {
            TileOutcome::Downloaded => self.downloaded += 1,
            TileOutcome::Skipped => self.skipped += 1,
            TileOutcome::Failed => self.failed += 1,
        }
    }
}

/// Downloads tiles one at a time, pausing after every network request.
pub struct TilePrefetcher {
    fetcher: Arc<dyn TileFetcher>,
    store: Arc<dyn TileStore>,
    delay: Duration,
}

impl TilePrefetcher {
    pub fn new(fetcher: Arc<dyn TileFetcher>, store: Arc<dyn TileStore>) -> Self {
        Self {
            fetcher,
            store,
            delay: DEFAULT_REQUEST_DELAY,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Download `tiles` in order.
    ///
    /// Stored tiles are skipped without a request or a pause. A failed tile
    /// is logged and counted; the run continues. Cancellation is checked
    /// between tiles and during the pause.
    pub async fn run<F>(
        &self,
        tiles: &[TileCoord],
        shutdown: &CancellationToken,
        mut on_progress: F,
    ) -> PrefetchSummary
    where
        F: FnMut(PrefetchProgress),
    {
        let total = tiles.len();
        let mut summary = PrefetchSummary {
            total,
            ..Default::default()
        };

        tracing::info!(total, delay_ms = self.delay.as_millis() as u64, "Tile prefetch starting");

        for (index, &tile) in tiles.iter().enumerate() {
            if shutdown.is_cancelled() {
                summary.cancelled = true;
                break;
            }

            let (outcome, requested) = self.process(tile).await;
            summary.record(outcome);
            on_progress(PrefetchProgress {
                completed: index + 1,
                total,
                tile,
                outcome,
            });

            let more = index + 1 < total;
            if requested && more && !self.delay.is_zero() {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        summary.cancelled = true;
                        break;
                    }
                    _ = tokio::time::sleep(self.delay) => {}
                }
            }
        }

        tracing::info!(
            total,
            downloaded = summary.downloaded,
            skipped = summary.skipped,
            failed = summary.failed,
            cancelled = summary.cancelled,
            "Tile prefetch finished"
        );
        summary
    }

    /// Returns the outcome and whether a network request was made.
    async fn process(&self, tile: TileCoord) -> (TileOutcome, bool) {
        if self.store.contains(tile).await {
            tracing::trace!(tile = %tile, "Tile already stored");
            return (TileOutcome::Skipped, false);
        }

        let data = match self.fetcher.fetch(tile).await {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!(tile = %tile, error = %e, "Tile download failed");
                return (TileOutcome::Failed, true);
            }
        };

        match self.store.put(tile, data).await {
            Ok(()) => {
                tracing::debug!(tile = %tile, "Tile stored");
                (TileOutcome::Downloaded, true)
            }
            Err(e) => {
                tracing::warn!(tile = %tile, error = %e, "Tile store failed");
                (TileOutcome::Failed, true)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use parking_lot::Mutex;
    use tokio::time::Instant;

    use super::*;
    use crate::prefetch::error::PrefetchError;
    use crate::prefetch::fetcher::BoxFuture;

    /// Records request times; fails for tiles in `failing`.
    struct MockFetcher {
        requests: Mutex<Vec<(TileCoord, Instant)>>,
        failing: HashSet<TileCoord>,
    }

    impl MockFetcher {
        fn new(failing: &[TileCoord]) -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
                failing: failing.iter().copied().collect(),
            }
        }
    }

    impl TileFetcher for MockFetcher {
        fn fetch(&self, tile: TileCoord) -> BoxFuture<'_, Result<Vec<u8>, PrefetchError>> {
            Box::pin(async move {
                self.requests.lock().push((tile, Instant::now()));
                if self.failing.contains(&tile) {
                    Err(PrefetchError::HttpStatus {
                        url: tile.to_string(),
                        status: 503,
                    })
                } else {
                    Ok(vec![0u8; 4])
                }
            })
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        tiles: Mutex<HashSet<TileCoord>>,
    }

    impl TileStore for MemoryStore {
        fn contains(&self, tile: TileCoord) -> BoxFuture<'_, bool> {
            Box::pin(async move { self.tiles.lock().contains(&tile) })
        }

        fn put(&self, tile: TileCoord, _data: Vec<u8>) -> BoxFuture<'_, Result<(), PrefetchError>> {
            Box::pin(async move {
                self.tiles.lock().insert(tile);
                Ok(())
            })
        }
    }

    fn tiles(n: u32) -> Vec<TileCoord> {
        (0..n).map(|y| TileCoord::new(10, 0, y)).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_requests_are_spaced() {
        let fetcher = Arc::new(MockFetcher::new(&[]));
        let store = Arc::new(MemoryStore::default());
        let prefetcher = TilePrefetcher::new(fetcher.clone(), store.clone());

        let summary = prefetcher
            .run(&tiles(4), &CancellationToken::new(), |_| {})
            .await;

        assert_eq!(summary.downloaded, 4);
        let requests = fetcher.requests.lock().clone();
        for pair in requests.windows(2) {
            assert!(pair[1].1 - pair[0].1 >= Duration::from_millis(500));
        }
        assert_eq!(store.tiles.lock().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stored_tiles_skip_without_delay() {
        let fetcher = Arc::new(MockFetcher::new(&[]));
        let store = Arc::new(MemoryStore::default());
        for tile in tiles(3) {
            store.tiles.lock().insert(tile);
        }
        let prefetcher = TilePrefetcher::new(fetcher.clone(), store);

        let started = Instant::now();
        let summary = prefetcher
            .run(&tiles(3), &CancellationToken::new(), |_| {})
            .await;

        assert_eq!(summary.skipped, 3);
        assert!(fetcher.requests.lock().is_empty());
        assert_eq!(Instant::now(), started);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_are_counted_and_run_continues() {
        let all = tiles(3);
        let fetcher = Arc::new(MockFetcher::new(&all[1..2]));
        let store = Arc::new(MemoryStore::default());
        let prefetcher = TilePrefetcher::new(fetcher.clone(), store);

        let mut progress = Vec::new();
        let summary = prefetcher
            .run(&all, &CancellationToken::new(), |p| progress.push(p))
            .await;

        assert_eq!(summary.downloaded, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.completed(), 3);
        assert!(!summary.cancelled);
        assert_eq!(
            progress.iter().map(|p| p.completed).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!(progress[1].outcome, TileOutcome::Failed);
        assert!(progress.iter().all(|p| p.total == 3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_between_tiles() {
        let fetcher = Arc::new(MockFetcher::new(&[]));
        let store = Arc::new(MemoryStore::default());
        let prefetcher = TilePrefetcher::new(fetcher.clone(), store);
        let shutdown = CancellationToken::new();

        let cancel = shutdown.clone();
        let summary = prefetcher
            .run(&tiles(10), &shutdown, |p| {
                if p.completed == 2 {
                    cancel.cancel();
                }
            })
            .await;

        assert!(summary.cancelled);
        assert_eq!(summary.completed(), 2);
        assert_eq!(fetcher.requests.lock().len(), 2);
    }
}
