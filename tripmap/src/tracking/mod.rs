//! Live position tracking.
//!
//! Continuously samples device location, adapts the sensor's accuracy mode
//! to how much the device is moving, throttles map updates, recovers from
//! sensor errors and stops itself when left running in the background.
//!
//! # Architecture
//!
//! ```text
//! GeolocationSource ──► PositionSampler ──► AccuracyController ─┐
//!        ▲                    │                                 │ resubscribe
//!        └────────────────────┼─────────────────────────────────┘
//!                             ▼
//!                      RenderThrottle ──► MapSurface
//!
//! LifecycleGuard and ErrorPolicy wrap the subscription itself.
//! ```
//!
//! [`LiveTracker`] owns every component and is the only thing that mutates
//! them. [`TrackingService`] drives it from a tokio task.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use tripmap::tracking::{event_channel, AlwaysVisible, LiveTracker, TrackingConfig, TrackingService};
//! use tokio_util::sync::CancellationToken;
//!
//! let (events_tx, events_rx) = event_channel();
//! let tracker = LiveTracker::new(
//!     TrackingConfig::default(),
//!     source,
//!     map,
//!     notifier,
//!     Arc::new(AlwaysVisible),
//! );
//! let (service, handle) = TrackingService::new(tracker, events_rx);
//! tokio::spawn(service.run(CancellationToken::new()));
//! handle.start();
//! ```

mod accuracy;
mod config;
mod controller;
mod errors;
mod lifecycle;
mod notice;
mod presentation;
mod sampler;
mod service;
mod source;
mod throttle;
mod types;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use accuracy::AccuracyController;
pub use config::{
    SubscriptionProfile, TrackingConfig, DEFAULT_LOCATE_ZOOM, DEFAULT_MAX_CONSECUTIVE_ERRORS,
    DEFAULT_MAX_HIDDEN, DEFAULT_ONE_SHOT_TIMEOUT, DEFAULT_RENDER_INTERVAL,
    DEFAULT_STATIONARY_DISTANCE_M, DEFAULT_STATIONARY_SAMPLE_LIMIT,
};
pub use controller::LiveTracker;
pub use errors::{ErrorDecision, ErrorPolicy};
pub use lifecycle::{GuardAction, LifecycleGuard};
pub use notice::TrackingNotice;
pub use presentation::{AlwaysVisible, MapSurface, TrackingNotifier, VisibilityHost};
pub use sampler::{PositionSampler, SampleObservation};
pub use service::{TrackerCommand, TrackerSnapshot, TrackingHandle, TrackingService};
pub use source::{
    event_channel, GeolocationSource, TrackerEvent, TrackerEventReceiver, TrackerEventSender,
};
pub use throttle::RenderThrottle;
pub use types::{
    AccuracyMode, GeolocationError, PermissionState, PositionOptions, PositionSample, SessionId,
    WatchId,
};
