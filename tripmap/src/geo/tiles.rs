//! Web Mercator tile coordinates
//!
//! Conversions between latitude/longitude and the `z/x/y` slippy-map tile
//! scheme used by OpenStreetMap-style tile servers.

use std::f64::consts::PI;

use thiserror::Error;

/// Maximum latitude representable in Web Mercator.
pub const MAX_LAT: f64 = 85.05112878;

/// Minimum latitude representable in Web Mercator.
pub const MIN_LAT: f64 = -85.05112878;

/// Highest zoom level served by standard tile servers.
pub const MAX_ZOOM: u8 = 19;

/// Errors from tile coordinate conversion.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TileError {
    #[error("Invalid latitude: {0} (must be within ±85.05112878)")]
    InvalidLatitude(f64),

    #[error("Invalid longitude: {0} (must be within ±180)")]
    InvalidLongitude(f64),

    #[error("Invalid zoom level: {0} (max {MAX_ZOOM})")]
    InvalidZoom(u8),
}

/// A slippy-map tile address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileCoord {
    pub zoom: u8,
    pub x: u32,
    pub y: u32,
}

impl TileCoord {
    pub fn new(zoom: u8, x: u32, y: u32) -> Self {
        Self { zoom, x, y }
    }
}

impl std::fmt::Display for TileCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

/// Converts geographic coordinates to the tile containing them.
///
/// Longitude 180.0 is clamped into the last column.
#[inline]
pub fn lat_lon_to_tile(lat: f64, lon: f64, zoom: u8) -> Result<TileCoord, TileError> {
    if !(MIN_LAT..=MAX_LAT).contains(&lat) {
        return Err(TileError::InvalidLatitude(lat));
    }
    if !(-180.0..=180.0).contains(&lon) {
        return Err(TileError::InvalidLongitude(lon));
    }
    if zoom > MAX_ZOOM {
        return Err(TileError::InvalidZoom(zoom));
    }

    let n = 2.0_f64.powi(zoom as i32);
    let max_index = n as u32 - 1;

    let x = (((lon + 180.0) / 360.0 * n).floor() as u32).min(max_index);
    let lat_rad = lat.to_radians();
    let y = (((1.0 - lat_rad.tan().asinh() / PI) / 2.0 * n).floor() as u32).min(max_index);

    Ok(TileCoord { zoom, x, y })
}

/// Returns the latitude/longitude of a tile's northwest corner.
#[inline]
pub fn tile_to_lat_lon(tile: &TileCoord) -> (f64, f64) {
    let n = 2.0_f64.powi(tile.zoom as i32);
    let lon = tile.x as f64 / n * 360.0 - 180.0;
    let y = tile.y as f64 / n;
    let lat = (PI * (1.0 - 2.0 * y)).sinh().atan().to_degrees();
    (lat, lon)
}
