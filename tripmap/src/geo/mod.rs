//! Geographic helpers
//!
//! Great-circle distance between two points, human-readable distance
//! formatting, and Web Mercator tile math used by the offline prefetcher.

mod tiles;

pub use tiles::{
    lat_lon_to_tile, tile_to_lat_lon, TileCoord, TileError, MAX_LAT, MAX_ZOOM, MIN_LAT,
};

use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters used for great-circle distances.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Great-circle distance to another point in meters.
    #[inline]
    pub fn distance_to(&self, other: &LatLng) -> f64 {
        haversine_distance(self.lat, self.lng, other.lat, other.lng)
    }
}

impl std::fmt::Display for LatLng {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6},{:.6}", self.lat, self.lng)
    }
}

/// Haversine distance between two points in meters.
#[inline]
pub fn haversine_distance(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    // Clamp guards against tiny negative values from rounding near antipodes
    let c = 2.0 * a.sqrt().atan2((1.0 - a).max(0.0).sqrt());
    EARTH_RADIUS_M * c
}

/// Format a distance for display: whole meters below 1 km, otherwise
/// kilometers with one decimal.
pub fn format_distance(meters: f64) -> String {
    if meters < 1000.0 {
        format!("{}m", meters.round() as i64)
    } else {
        format!("{:.1}km", meters / 1000.0)
    }
}
