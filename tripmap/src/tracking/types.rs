//! Value types shared by the tracking components.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geo::LatLng;

/// A single fix reported by the geolocation source.
///
/// Samples are ephemeral: the tracker keeps at most the latest raw sample
/// and the latest rendered one, never a history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionSample {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Accuracy radius in meters.
    pub accuracy_m: f64,
    /// Heading in degrees clockwise from true north, when the platform has one.
    #[serde(default)]
    pub heading: Option<f64>,
    /// Capture time in milliseconds since the Unix epoch.
    pub timestamp_ms: i64,
}

impl PositionSample {
    pub fn new(latitude: f64, longitude: f64, accuracy_m: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy_m,
            heading: None,
            timestamp_ms: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn with_heading(mut self, heading: f64) -> Self {
        self.heading = Some(heading);
        self
    }

    pub fn with_timestamp_ms(mut self, timestamp_ms: i64) -> Self {
        self.timestamp_ms = timestamp_ms;
        self
    }

    pub fn position(&self) -> LatLng {
        LatLng::new(self.latitude, self.longitude)
    }
}

/// Sensor accuracy mode for the continuous subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccuracyMode {
    /// GPS-grade accuracy; used while the device is moving.
    #[default]
    High,
    /// Network/coarse accuracy; used while the device is stationary.
    Low,
}

impl fmt::Display for AccuracyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccuracyMode::High => write!(f, "high"),
            AccuracyMode::Low => write!(f, "low"),
        }
    }
}

/// Options passed to the geolocation source when subscribing or asking for
/// a one-shot position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    pub enable_high_accuracy: bool,
    pub timeout: Duration,
    /// Maximum age of a cached fix the platform may return. `None` for
    /// one-shot requests, which never accept a cached fix.
    pub maximum_age: Option<Duration>,
}

/// Opaque handle of a live position subscription, issued by the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchId(pub u64);

impl fmt::Display for WatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "watch#{}", self.0)
    }
}

/// Identity of one tracking session, from `start` to `stop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session#{}", self.0)
    }
}

/// Errors reported by the geolocation source.
///
/// The numeric codes match the platform geolocation API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeolocationError {
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Position unavailable{}", detail(.0))]
    PositionUnavailable(Option<String>),

    #[error("Location request timed out")]
    Timeout,
}

fn detail(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|m| format!(": {}", m))
        .unwrap_or_default()
}

impl GeolocationError {
    /// Build from a platform error code (1 = denied, 2 = unavailable, 3 = timeout).
    ///
    /// Unknown codes are treated as an unavailable position.
    pub fn from_code(code: u16, message: Option<String>) -> Self {
        match code {
            1 => GeolocationError::PermissionDenied,
            3 => GeolocationError::Timeout,
            _ => GeolocationError::PositionUnavailable(message),
        }
    }

    /// Platform error code.
    pub fn code(&self) -> u16 {
        match self {
            GeolocationError::PermissionDenied => 1,
            GeolocationError::PositionUnavailable(_) => 2,
            GeolocationError::Timeout => 3,
        }
    }
}

/// Platform permission state for location access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionState {
    /// The platform cannot report permission state.
    #[default]
    Unknown,
    Granted,
    Prompt,
    Denied,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_roundtrip() {
        assert_eq!(
            GeolocationError::from_code(1, None),
            GeolocationError::PermissionDenied
        );
        assert_eq!(GeolocationError::from_code(3, None), GeolocationError::Timeout);
        assert_eq!(GeolocationError::from_code(2, None).code(), 2);
        assert_eq!(GeolocationError::from_code(99, None).code(), 2);
    }

    #[test]
    fn test_error_display() {
        let err = GeolocationError::PositionUnavailable(Some("no satellites".to_string()));
        assert_eq!(err.to_string(), "Position unavailable: no satellites");
        assert_eq!(
            GeolocationError::PositionUnavailable(None).to_string(),
            "Position unavailable"
        );
    }

    #[test]
    fn test_sample_builders() {
        let sample = PositionSample::new(41.9, 12.5, 8.0)
            .with_heading(90.0)
            .with_timestamp_ms(1_000);
        assert_eq!(sample.heading, Some(90.0));
        assert_eq!(sample.timestamp_ms, 1_000);
        assert_eq!(sample.position(), LatLng::new(41.9, 12.5));
    }

    #[test]
    fn test_sample_deserializes_without_heading() {
        let json = r#"{"latitude":41.9,"longitude":12.5,"accuracy_m":5.0,"timestamp_ms":7}"#;
        let sample: PositionSample = serde_json::from_str(json).unwrap();
        assert_eq!(sample.heading, None);
        assert_eq!(sample.timestamp_ms, 7);
    }

    #[test]
    fn test_mode_display() {
        assert_eq!(AccuracyMode::High.to_string(), "high");
        assert_eq!(AccuracyMode::Low.to_string(), "low");
    }
}
