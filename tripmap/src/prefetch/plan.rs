//! Tile enumeration for a bounding box.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::geo::{lat_lon_to_tile, TileCoord, MAX_LAT, MAX_ZOOM, MIN_LAT};

use super::error::PrefetchError;

/// A geographic bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TileBounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl TileBounds {
    /// Build a validated bounding box. Boxes crossing the antimeridian are
    /// rejected.
    pub fn new(north: f64, south: f64, east: f64, west: f64) -> Result<Self, PrefetchError> {
        for lat in [north, south] {
            if !(MIN_LAT..=MAX_LAT).contains(&lat) {
                return Err(PrefetchError::InvalidBounds(format!(
                    "latitude {} outside ±{}",
                    lat, MAX_LAT
                )));
            }
        }
        for lng in [east, west] {
            if !(-180.0..=180.0).contains(&lng) {
                return Err(PrefetchError::InvalidBounds(format!(
                    "longitude {} outside ±180",
                    lng
                )));
            }
        }
        if south > north {
            return Err(PrefetchError::InvalidBounds(format!(
                "south {} is north of {}",
                south, north
            )));
        }
        if west > east {
            return Err(PrefetchError::InvalidBounds(format!(
                "west {} is east of {}",
                west, east
            )));
        }
        Ok(Self {
            north,
            south,
            east,
            west,
        })
    }
}

/// Inclusive x and y tile ranges covering `bounds` at `zoom`.
fn tile_ranges(
    bounds: &TileBounds,
    zoom: u8,
) -> Result<(RangeInclusive<u32>, RangeInclusive<u32>), PrefetchError> {
    let a = lat_lon_to_tile(bounds.south, bounds.west, zoom)?;
    let b = lat_lon_to_tile(bounds.north, bounds.east, zoom)?;
    Ok((a.x.min(b.x)..=a.x.max(b.x), a.y.min(b.y)..=a.y.max(b.y)))
}

fn check_zoom_range(min_zoom: u8, max_zoom: u8) -> Result<(), PrefetchError> {
    if min_zoom > max_zoom || max_zoom > MAX_ZOOM {
        return Err(PrefetchError::InvalidZoomRange {
            min: min_zoom,
            max: max_zoom,
        });
    }
    Ok(())
}

/// Number of tiles [`plan_tiles`] would return, computed without
/// enumerating them. Saturates at `u64::MAX`.
pub fn count_tiles(bounds: &TileBounds, min_zoom: u8, max_zoom: u8) -> Result<u64, PrefetchError> {
    check_zoom_range(min_zoom, max_zoom)?;

    let mut total: u64 = 0;
    for zoom in min_zoom..=max_zoom {
        let (xs, ys) = tile_ranges(bounds, zoom)?;
        let width = u64::from(xs.end() - xs.start()) + 1;
        let height = u64::from(ys.end() - ys.start()) + 1;
        total = width
            .checked_mul(height)
            .and_then(|n| total.checked_add(n))
            .unwrap_or(u64::MAX);
    }
    Ok(total)
}

/// Every tile covering `bounds` for each zoom in `min_zoom..=max_zoom`,
/// ordered by zoom, then x, then y.
///
/// Fails with [`PrefetchError::TooManyTiles`] before allocating when the
/// plan would exceed `max_tiles`.
pub fn plan_tiles(
    bounds: &TileBounds,
    min_zoom: u8,
    max_zoom: u8,
    max_tiles: u64,
) -> Result<Vec<TileCoord>, PrefetchError> {
    let count = count_tiles(bounds, min_zoom, max_zoom)?;
    if count > max_tiles {
        return Err(PrefetchError::TooManyTiles {
            count,
            limit: max_tiles,
        });
    }

    let mut tiles = Vec::with_capacity(count as usize);
    for zoom in min_zoom..=max_zoom {
        let (xs, ys) = tile_ranges(bounds, zoom)?;
        for x in xs {
            for y in ys.clone() {
                tiles.push(TileCoord::new(zoom, x, y));
            }
        }
    }

    tracing::debug!(
        tiles = tiles.len(),
        min_zoom,
        max_zoom,
        "Planned tile download"
    );
    Ok(tiles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prefetch::config::DEFAULT_MAX_TILES;

    const LIMIT: u64 = DEFAULT_MAX_TILES;

    fn rome() -> TileBounds {
        TileBounds::new(41.94, 41.87, 12.54, 12.43).unwrap()
    }

    #[test]
    fn test_rome_tile_counts() {
        let tiles = plan_tiles(&rome(), 13, 16, LIMIT).unwrap();
        assert_eq!(tiles.len(), 519);

        let at_13: Vec<_> = tiles.iter().filter(|t| t.zoom == 13).collect();
        assert_eq!(at_13.len(), 12);
        assert_eq!(*at_13[0], TileCoord::new(13, 4378, 3042));
        assert_eq!(*at_13[11], TileCoord::new(13, 4381, 3044));
    }

    #[test]
    fn test_tiles_are_ordered() {
        let tiles = plan_tiles(&rome(), 13, 15, LIMIT).unwrap();
        let mut sorted = tiles.clone();
        sorted.sort();
        assert_eq!(tiles, sorted);
    }

    #[test]
    fn test_single_zoom() {
        let tiles = plan_tiles(&rome(), 14, 14, LIMIT).unwrap();
        assert_eq!(tiles.len(), 30);
        assert!(tiles.iter().all(|t| t.zoom == 14));
    }

    #[test]
    fn test_point_box_is_one_tile_per_zoom() {
        let bounds = TileBounds::new(41.9, 41.9, 12.5, 12.5).unwrap();
        let tiles = plan_tiles(&bounds, 0, 5, LIMIT).unwrap();
        assert_eq!(tiles.len(), 6);
    }

    #[test]
    fn test_invalid_zoom_range() {
        assert!(matches!(
            plan_tiles(&rome(), 16, 13, LIMIT),
            Err(PrefetchError::InvalidZoomRange { .. })
        ));
        assert!(plan_tiles(&rome(), 13, 20, LIMIT).is_err());
    }

    #[test]
    fn test_invalid_bounds() {
        assert!(TileBounds::new(41.8, 41.9, 12.5, 12.4).is_err());
        assert!(TileBounds::new(41.9, 41.8, 12.4, 12.5).is_err());
        assert!(TileBounds::new(89.0, 41.8, 12.5, 12.4).is_err());
        assert!(TileBounds::new(41.9, 41.8, 181.0, 12.4).is_err());
    }

    #[test]
    fn test_count_matches_plan() {
        assert_eq!(count_tiles(&rome(), 13, 16).unwrap(), 519);
        assert_eq!(count_tiles(&rome(), 14, 14).unwrap(), 30);
    }

    #[test]
    fn test_world_at_max_zoom_is_rejected_before_planning() {
        let world = TileBounds::new(85.0, -85.0, 180.0, -180.0).unwrap();

        let count = count_tiles(&world, 0, MAX_ZOOM).unwrap();
        assert!(count > 1u64 << 36);

        match plan_tiles(&world, 0, MAX_ZOOM, LIMIT) {
            Err(PrefetchError::TooManyTiles { count: c, limit }) => {
                assert_eq!(c, count);
                assert_eq!(limit, LIMIT);
            }
            other => panic!("expected TooManyTiles, got {:?}", other.map(|t| t.len())),
        }
    }

    #[test]
    fn test_limit_is_inclusive() {
        assert_eq!(plan_tiles(&rome(), 13, 16, 519).unwrap().len(), 519);
        assert!(matches!(
            plan_tiles(&rome(), 13, 16, 518),
            Err(PrefetchError::TooManyTiles { count: 519, limit: 518 })
        ));
    }
}
