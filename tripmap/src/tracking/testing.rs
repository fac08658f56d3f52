//! Recording collaborators for exercising the tracker without a platform.
//!
//! Every fake records the calls it receives so tests can assert on exact
//! call sequences. They are cheap to share behind `Arc`.
//!
//! Built for this crate's own tests, and for other crates with the `testing`
//! feature.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use parking_lot::Mutex;

use super::presentation::{MapSurface, TrackingNotifier, VisibilityHost};
use super::source::GeolocationSource;
use super::types::{PermissionState, PositionOptions, WatchId};

/// A call received by [`RecordingSource`].
#[derive(Debug, Clone, PartialEq)]
pub enum SourceCall {
    Watch {
        watch: WatchId,
        options: PositionOptions,
    },
    Clear(WatchId),
    CurrentPosition(PositionOptions),
}

/// Geolocation source that hands out sequential watch ids and records calls.
///
/// Events are never produced by the source itself: tests push
/// [`TrackerEvent`](super::TrackerEvent)s into the tracker directly.
#[derive(Debug)]
pub struct RecordingSource {
    calls: Mutex<Vec<SourceCall>>,
    next_watch: AtomicU64,
    available: AtomicBool,
    permission: Mutex<PermissionState>,
}

impl Default for RecordingSource {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingSource {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            next_watch: AtomicU64::new(1),
            available: AtomicBool::new(true),
            permission: Mutex::new(PermissionState::Unknown),
        }
    }

    /// A source on a platform without geolocation.
    pub fn unavailable() -> Self {
        let source = Self::new();
        source.set_available(false);
        source
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn set_permission(&self, state: PermissionState) {
        *self.permission.lock() = state;
    }

    pub fn calls(&self) -> Vec<SourceCall> {
        self.calls.lock().clone()
    }

    /// Every watch opened, with its options, in order.
    pub fn watches(&self) -> Vec<(WatchId, PositionOptions)> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                SourceCall::Watch { watch, options } => Some((*watch, *options)),
                _ => None,
            })
            .collect()
    }

    /// Every watch cleared, in order.
    pub fn cleared(&self) -> Vec<WatchId> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                SourceCall::Clear(watch) => Some(*watch),
                _ => None,
            })
            .collect()
    }

    /// Watches opened and not yet cleared.
    pub fn open_watches(&self) -> Vec<WatchId> {
        let cleared = self.cleared();
        self.watches()
            .into_iter()
            .map(|(watch, _)| watch)
            .filter(|watch| !cleared.contains(watch))
            .collect()
    }

    pub fn one_shot_requests(&self) -> Vec<PositionOptions> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                SourceCall::CurrentPosition(options) => Some(*options),
                _ => None,
            })
            .collect()
    }
}

impl GeolocationSource for RecordingSource {
    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    fn permission_state(&self) -> PermissionState {
        *self.permission.lock()
    }

    fn watch_position(&self, options: PositionOptions) -> WatchId {
        let watch = WatchId(self.next_watch.fetch_add(1, Ordering::SeqCst));
        self.calls.lock().push(SourceCall::Watch { watch, options });
        watch
    }

    fn clear_watch(&self, watch: WatchId) {
        self.calls.lock().push(SourceCall::Clear(watch));
    }

    fn request_current_position(&self, options: PositionOptions) {
        self.calls.lock().push(SourceCall::CurrentPosition(options));
    }
}

/// A call received by [`RecordingMap`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MapCall {
    Upsert { lat: f64, lng: f64, accuracy_m: f64 },
    Remove,
    PanTo { lat: f64, lng: f64, min_zoom: u8 },
}

#[derive(Debug, Default)]
pub struct RecordingMap {
    calls: Mutex<Vec<MapCall>>,
}

impl RecordingMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<MapCall> {
        self.calls.lock().clone()
    }

    pub fn upserts(&self) -> Vec<MapCall> {
        self.calls
            .lock()
            .iter()
            .filter(|call| matches!(call, MapCall::Upsert { .. }))
            .copied()
            .collect()
    }

    pub fn pans(&self) -> Vec<MapCall> {
        self.calls
            .lock()
            .iter()
            .filter(|call| matches!(call, MapCall::PanTo { .. }))
            .copied()
            .collect()
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }
}

impl MapSurface for RecordingMap {
    fn upsert_position_indicator(&self, lat: f64, lng: f64, accuracy_m: f64) {
        self.calls.lock().push(MapCall::Upsert {
            lat,
            lng,
            accuracy_m,
        });
    }

    fn remove_position_indicator(&self) {
        self.calls.lock().push(MapCall::Remove);
    }

    fn pan_to(&self, lat: f64, lng: f64, min_zoom: u8) {
        self.calls.lock().push(MapCall::PanTo { lat, lng, min_zoom });
    }
}

#[derive(Debug, Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
    toggles: Mutex<Vec<bool>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }

    pub fn last_message(&self) -> Option<String> {
        self.messages.lock().last().cloned()
    }

    pub fn toggle_states(&self) -> Vec<bool> {
        self.toggles.lock().clone()
    }

    /// Current toggle state as last pushed, `false` if never set.
    pub fn toggle_active(&self) -> bool {
        self.toggles.lock().last().copied().unwrap_or(false)
    }
}

impl TrackingNotifier for RecordingNotifier {
    fn notify(&self, message: &str) {
        self.messages.lock().push(message.to_string());
    }

    fn set_toggle_state(&self, active: bool) {
        self.toggles.lock().push(active);
    }
}

#[derive(Debug, Default)]
pub struct RecordingVisibilityHost {
    subscribed: AtomicBool,
    subscribe_count: AtomicUsize,
}

impl RecordingVisibilityHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscribed.load(Ordering::SeqCst)
    }

    pub fn subscribe_count(&self) -> usize {
        self.subscribe_count.load(Ordering::SeqCst)
    }
}

impl VisibilityHost for RecordingVisibilityHost {
    fn subscribe(&self) {
        self.subscribed.store(true, Ordering::SeqCst);
        self.subscribe_count.fetch_add(1, Ordering::SeqCst);
    }

    fn unsubscribe(&self) {
        self.subscribed.store(false, Ordering::SeqCst);
    }
}
