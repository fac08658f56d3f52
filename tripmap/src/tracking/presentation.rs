//! Outbound collaborators: map surface, user notifier, lifecycle host.
//!
//! All three are write-only sinks from the tracker's point of view. The
//! tracker pushes updates and never reads state back.

/// Map layer that draws the live position indicator.
pub trait MapSurface: Send + Sync {
    /// Create the indicator on first call; move it and resize its accuracy
    /// circle in place afterwards.
    fn upsert_position_indicator(&self, lat: f64, lng: f64, accuracy_m: f64);

    /// Remove the indicator if present.
    fn remove_position_indicator(&self);

    /// Centre the view on a point, zooming in to at least `min_zoom`.
    fn pan_to(&self, lat: f64, lng: f64, min_zoom: u8);
}

/// User-facing feedback channel.
pub trait TrackingNotifier: Send + Sync {
    /// Show a short status message (toast).
    fn notify(&self, message: &str);

    /// Reflect whether live tracking is on in the toggle control.
    fn set_toggle_state(&self, active: bool);
}

/// Host that delivers visibility changes as
/// [`TrackerEvent::VisibilityChanged`](super::TrackerEvent::VisibilityChanged).
pub trait VisibilityHost: Send + Sync {
    /// Start delivering visibility events.
    fn subscribe(&self);

    /// Stop delivering visibility events.
    fn unsubscribe(&self);
}

/// Visibility host for environments without a hidden state.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysVisible;

impl VisibilityHost for AlwaysVisible {
    fn subscribe(&self) {}

    fn unsubscribe(&self) {}
}
