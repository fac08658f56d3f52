//! Geolocation source abstraction.
//!
//! The platform location service is modelled as a command interface
//! ([`GeolocationSource`]) plus an event stream ([`TrackerEvent`]). Commands
//! are issued synchronously by the tracker; results arrive later as events
//! on the tracker's inbound channel, tagged with the [`WatchId`] of the
//! subscription that produced them.
//!
//! ```text
//!   LiveTracker ──watch_position/clear_watch──► GeolocationSource
//!        ▲                                            │
//!        └────────── TrackerEvent::Position ◄─────────┘
//!                    TrackerEvent::Error
//! ```

use tokio::sync::mpsc;

use super::types::{GeolocationError, PermissionState, PositionOptions, PositionSample, WatchId};

/// Platform location service.
///
/// Implementations deliver asynchronous results through a
/// [`TrackerEventSender`]. Events from a watch must be emitted in order and
/// must carry the id returned by the `watch_position` call that created it.
pub trait GeolocationSource: Send + Sync {
    /// Whether the platform offers geolocation at all.
    fn is_available(&self) -> bool {
        true
    }

    /// Current permission state, if the platform can report it.
    fn permission_state(&self) -> PermissionState {
        PermissionState::Unknown
    }

    /// Open a continuous position subscription.
    fn watch_position(&self, options: PositionOptions) -> WatchId;

    /// Cancel a subscription. Unknown or already-cleared ids are ignored.
    fn clear_watch(&self, watch: WatchId);

    /// Request a single position fix, answered with
    /// [`TrackerEvent::CurrentPosition`].
    fn request_current_position(&self, options: PositionOptions);
}

/// Asynchronous input to the tracker from its environment.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackerEvent {
    /// A subscription produced a fix.
    Position {
        watch: WatchId,
        sample: PositionSample,
    },

    /// A subscription reported an error.
    Error {
        watch: WatchId,
        error: GeolocationError,
    },

    /// Answer to a one-shot request.
    CurrentPosition(Result<PositionSample, GeolocationError>),

    /// The host application was hidden (`true`) or shown (`false`).
    VisibilityChanged { hidden: bool },

    /// The platform permission state changed.
    PermissionChanged(PermissionState),
}

/// Sending half of the tracker's inbound event channel.
pub type TrackerEventSender = mpsc::UnboundedSender<TrackerEvent>;

/// Receiving half of the tracker's inbound event channel.
pub type TrackerEventReceiver = mpsc::UnboundedReceiver<TrackerEvent>;

/// Create the inbound event channel.
pub fn event_channel() -> (TrackerEventSender, TrackerEventReceiver) {
    mpsc::unbounded_channel()
}
