//! Configuration for live position tracking.
//!
//! Every timing and threshold constant the tracker uses lives here so the
//! INI layer (`[tracking]` section) can override it.

use std::time::Duration;

use super::types::{AccuracyMode, PositionOptions};

/// Default minimum interval between two map renders.
pub const DEFAULT_RENDER_INTERVAL: Duration = Duration::from_millis(1000);

/// Default distance under which a sample counts as stationary (meters).
pub const DEFAULT_STATIONARY_DISTANCE_M: f64 = 5.0;

/// Default number of stationary samples that must be exceeded before the
/// subscription drops to low accuracy (~30s at the nominal cadence).
pub const DEFAULT_STATIONARY_SAMPLE_LIMIT: u32 = 6;

/// Default maximum time tracking may stay alive while the app is hidden.
pub const DEFAULT_MAX_HIDDEN: Duration = Duration::from_secs(5 * 60);

/// Default number of consecutive errors that terminates tracking.
pub const DEFAULT_MAX_CONSECUTIVE_ERRORS: u32 = 5;

/// Default zoom floor when centring the map on the user.
pub const DEFAULT_LOCATE_ZOOM: u8 = 16;

/// Default timeout for a one-shot position request.
pub const DEFAULT_ONE_SHOT_TIMEOUT: Duration = Duration::from_secs(10);

/// Subscription parameters for one accuracy mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionProfile {
    /// How long the platform may take to produce a fix.
    pub timeout: Duration,
    /// Maximum age of a cached fix the platform may deliver.
    pub maximum_age: Duration,
}

impl SubscriptionProfile {
    /// High accuracy: 15s timeout, 5s cache.
    pub const HIGH: Self = Self {
        timeout: Duration::from_secs(15),
        maximum_age: Duration::from_secs(5),
    };

    /// Low accuracy: 30s timeout, 15s cache.
    pub const LOW: Self = Self {
        timeout: Duration::from_secs(30),
        maximum_age: Duration::from_secs(15),
    };
}

/// Tunables for the live tracker.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingConfig {
    /// Minimum interval between renders.
    pub render_interval: Duration,

    /// Distance from the last rendered position under which a sample is
    /// considered stationary.
    pub stationary_distance_m: f64,

    /// Stationary samples that must be exceeded in high accuracy mode
    /// before switching to low accuracy.
    pub stationary_sample_limit: u32,

    /// Maximum hidden duration before tracking is stopped.
    pub max_hidden: Duration,

    /// Consecutive errors that force tracking to stop.
    pub max_consecutive_errors: u32,

    /// Subscription parameters in high accuracy mode.
    pub high_accuracy: SubscriptionProfile,

    /// Subscription parameters in low accuracy mode.
    pub low_accuracy: SubscriptionProfile,

    /// Zoom floor used when centring the map on a position.
    pub locate_zoom: u8,

    /// Timeout for one-shot position requests.
    pub one_shot_timeout: Duration,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            render_interval: DEFAULT_RENDER_INTERVAL,
            stationary_distance_m: DEFAULT_STATIONARY_DISTANCE_M,
            stationary_sample_limit: DEFAULT_STATIONARY_SAMPLE_LIMIT,
            max_hidden: DEFAULT_MAX_HIDDEN,
            max_consecutive_errors: DEFAULT_MAX_CONSECUTIVE_ERRORS,
            high_accuracy: SubscriptionProfile::HIGH,
            low_accuracy: SubscriptionProfile::LOW,
            locate_zoom: DEFAULT_LOCATE_ZOOM,
            one_shot_timeout: DEFAULT_ONE_SHOT_TIMEOUT,
        }
    }
}

impl TrackingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the render interval.
    pub fn with_render_interval(mut self, interval: Duration) -> Self {
        self.render_interval = interval;
        self
    }

    /// Set the maximum hidden duration.
    pub fn with_max_hidden(mut self, max_hidden: Duration) -> Self {
        self.max_hidden = max_hidden;
        self
    }

    /// Set the consecutive error limit.
    pub fn with_max_consecutive_errors(mut self, limit: u32) -> Self {
        self.max_consecutive_errors = limit;
        self
    }

    /// Subscription options for the given accuracy mode.
    pub fn watch_options(&self, mode: AccuracyMode) -> PositionOptions {
        let profile = match mode {
            AccuracyMode::High => self.high_accuracy,
            AccuracyMode::Low => self.low_accuracy,
        };
        PositionOptions {
            enable_high_accuracy: mode == AccuracyMode::High,
            timeout: profile.timeout,
            maximum_age: Some(profile.maximum_age),
        }
    }

    /// Options for a one-shot high accuracy request.
    pub fn one_shot_options(&self) -> PositionOptions {
        PositionOptions {
            enable_high_accuracy: true,
            timeout: self.one_shot_timeout,
            maximum_age: None,
        }
    }
}
