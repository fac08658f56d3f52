//! Terminal stand-ins for the tracker's platform collaborators.

use std::sync::Arc;
use std::time::Instant;

use console::style;
use parking_lot::Mutex;
use tripmap::geo::format_distance;
use tripmap::tracking::{
    GeolocationError, GeolocationSource, MapSurface, PermissionState, PositionOptions,
    PositionSample, TrackerEvent, TrackerEventSender, TrackingNotifier, VisibilityHost, WatchId,
};

/// Script-time clock for log prefixes.
#[derive(Debug, Clone)]
pub struct SimClock {
    started: Instant,
    speed: f64,
}

impl SimClock {
    pub fn new(speed: f64) -> Self {
        Self {
            started: Instant::now(),
            speed,
        }
    }

    /// Elapsed script time, e.g. `[   12.0s]`.
    pub fn label(&self) -> String {
        let secs = self.started.elapsed().as_secs_f64() * self.speed;
        format!("[{:>8.1}s]", secs)
    }
}

/// Prints map updates and counts renders.
pub struct ConsoleMap {
    clock: SimClock,
    renders: Mutex<usize>,
}

impl ConsoleMap {
    pub fn new(clock: SimClock) -> Self {
        Self {
            clock,
            renders: Mutex::new(0),
        }
    }

    pub fn renders(&self) -> usize {
        *self.renders.lock()
    }
}

impl MapSurface for ConsoleMap {
    fn upsert_position_indicator(&self, lat: f64, lng: f64, accuracy_m: f64) {
        *self.renders.lock() += 1;
        println!(
            "{} {} {:.5}, {:.5} (±{})",
            style(self.clock.label()).dim(),
            style("map").cyan(),
            lat,
            lng,
            format_distance(accuracy_m)
        );
    }

    fn remove_position_indicator(&self) {
        println!(
            "{} {} indicator removed",
            style(self.clock.label()).dim(),
            style("map").cyan()
        );
    }

    fn pan_to(&self, lat: f64, lng: f64, min_zoom: u8) {
        println!(
            "{} {} pan to {:.5}, {:.5} at zoom {}+",
            style(self.clock.label()).dim(),
            style("map").cyan(),
            lat,
            lng,
            min_zoom
        );
    }
}

/// Prints toasts and toggle changes.
pub struct ConsoleNotifier {
    clock: SimClock,
    notices: Mutex<usize>,
}

impl ConsoleNotifier {
    pub fn new(clock: SimClock) -> Self {
        Self {
            clock,
            notices: Mutex::new(0),
        }
    }

    pub fn notices(&self) -> usize {
        *self.notices.lock()
    }
}

impl TrackingNotifier for ConsoleNotifier {
    fn notify(&self, message: &str) {
        *self.notices.lock() += 1;
        println!(
            "{} {} {}",
            style(self.clock.label()).dim(),
            style("toast").yellow(),
            message
        );
    }

    fn set_toggle_state(&self, active: bool) {
        let state = if active {
            style("on").green()
        } else {
            style("off").red()
        };
        println!(
            "{} {} {}",
            style(self.clock.label()).dim(),
            style("toggle").magenta(),
            state
        );
    }
}

/// Visibility host that only records whether the tracker is listening.
#[derive(Default)]
pub struct ConsoleVisibility {
    subscribed: Mutex<bool>,
}

impl ConsoleVisibility {
    pub fn is_subscribed(&self) -> bool {
        *self.subscribed.lock()
    }
}

impl VisibilityHost for ConsoleVisibility {
    fn subscribe(&self) {
        *self.subscribed.lock() = true;
    }

    fn unsubscribe(&self) {
        *self.subscribed.lock() = false;
    }
}

#[derive(Debug, Default)]
struct ReplayState {
    next_watch: u64,
    active: Option<WatchId>,
    last_fix: Option<PositionSample>,
    permission: PermissionState,
}

/// Geolocation source fed from a script.
///
/// Scripted fixes and errors go to whichever watch is open when they are
/// emitted; with no open watch they are dropped.
pub struct ReplaySource {
    events: TrackerEventSender,
    clock: SimClock,
    state: Mutex<ReplayState>,
}

impl ReplaySource {
    pub fn new(events: TrackerEventSender, clock: SimClock) -> Arc<Self> {
        Arc::new(Self {
            events,
            clock,
            state: Mutex::new(ReplayState::default()),
        })
    }

    pub fn emit_position(&self, sample: PositionSample) {
        let watch = {
            let mut state = self.state.lock();
            state.last_fix = Some(sample);
            state.active
        };
        match watch {
            Some(watch) => self.send(TrackerEvent::Position { watch, sample }),
            None => self.dropped("position"),
        }
    }

    pub fn emit_error(&self, error: GeolocationError) {
        match self.state.lock().active {
            Some(watch) => self.send(TrackerEvent::Error { watch, error }),
            None => self.dropped("error"),
        }
    }

    pub fn set_permission(&self, permission: PermissionState) {
        self.state.lock().permission = permission;
        self.send(TrackerEvent::PermissionChanged(permission));
    }

    fn send(&self, event: TrackerEvent) {
        if self.events.send(event).is_err() {
            tracing::debug!("Tracker stopped; scripted event discarded");
        }
    }

    fn dropped(&self, what: &str) {
        println!(
            "{} {} {} dropped, no open watch",
            style(self.clock.label()).dim(),
            style("gps").blue(),
            what
        );
    }
}

impl GeolocationSource for ReplaySource {
    fn permission_state(&self) -> PermissionState {
        self.state.lock().permission
    }

    fn watch_position(&self, options: PositionOptions) -> WatchId {
        let watch = {
            let mut state = self.state.lock();
            state.next_watch += 1;
            let watch = WatchId(state.next_watch);
            state.active = Some(watch);
            watch
        };
        let mode = if options.enable_high_accuracy {
            "high"
        } else {
            "low"
        };
        println!(
            "{} {} {} opened ({} accuracy)",
            style(self.clock.label()).dim(),
            style("gps").blue(),
            watch,
            mode
        );
        watch
    }

    fn clear_watch(&self, watch: WatchId) {
        let mut state = self.state.lock();
        if state.active == Some(watch) {
            state.active = None;
            println!(
                "{} {} {} cleared",
                style(self.clock.label()).dim(),
                style("gps").blue(),
                watch
            );
        }
    }

    fn request_current_position(&self, _options: PositionOptions) {
        let reply = self
            .state
            .lock()
            .last_fix
            .ok_or_else(|| GeolocationError::PositionUnavailable(Some("no fix yet".to_string())));
        self.send(TrackerEvent::CurrentPosition(reply));
    }
}
