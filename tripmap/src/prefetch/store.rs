//! Local tile storage.

use std::path::{Path, PathBuf};

use crate::geo::TileCoord;

use super::error::PrefetchError;
use super::fetcher::BoxFuture;

/// Where downloaded tiles are kept.
pub trait TileStore: Send + Sync {
    /// Whether the tile is already stored.
    fn contains(&self, tile: TileCoord) -> BoxFuture<'_, bool>;

    /// Store a tile's bytes.
    fn put(&self, tile: TileCoord, data: Vec<u8>) -> BoxFuture<'_, Result<(), PrefetchError>>;
}

/// Stores tiles as `<root>/<z>/<x>/<y>.png`.
#[derive(Debug, Clone)]
pub struct DiskTileStore {
    root: PathBuf,
}

impl DiskTileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn tile_path(&self, tile: TileCoord) -> PathBuf {
        self.root
            .join(tile.zoom.to_string())
            .join(tile.x.to_string())
            .join(format!("{}.png", tile.y))
    }
}

impl TileStore for DiskTileStore {
    fn contains(&self, tile: TileCoord) -> BoxFuture<'_, bool> {
        Box::pin(async move {
            tokio::fs::try_exists(self.tile_path(tile))
                .await
                .unwrap_or(false)
        })
    }

    fn put(&self, tile: TileCoord, data: Vec<u8>) -> BoxFuture<'_, Result<(), PrefetchError>> {
        Box::pin(async move {
            let path = self.tile_path(tile);
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|source| PrefetchError::Io {
                        path: parent.to_path_buf(),
                        source,
                    })?;
            }

            // Tiles only appear under their final name once complete
            let partial = path.with_extension("png.part");
            tokio::fs::write(&partial, &data)
                .await
                .map_err(|source| PrefetchError::Io {
                    path: partial.clone(),
                    source,
                })?;
            tokio::fs::rename(&partial, &path)
                .await
                .map_err(|source| PrefetchError::Io {
                    path: path.clone(),
                    source,
                })?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_tile_path_layout() {
        let store = DiskTileStore::new("/cache");
        assert_eq!(
            store.tile_path(TileCoord::new(13, 4380, 3044)),
            PathBuf::from("/cache/13/4380/3044.png")
        );
    }

    #[tokio::test]
    async fn test_put_then_contains() {
        let temp = TempDir::new().unwrap();
        let store = DiskTileStore::new(temp.path());
        let tile = TileCoord::new(2, 1, 3);

        assert!(!store.contains(tile).await);
        store.put(tile, vec![1, 2, 3]).await.unwrap();
        assert!(store.contains(tile).await);

        let bytes = std::fs::read(store.tile_path(tile)).unwrap();
        assert_eq!(bytes, vec![1, 2, 3]);
        assert!(!store.tile_path(tile).with_extension("png.part").exists());
    }
}
