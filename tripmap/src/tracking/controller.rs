//! The live tracking controller.
//!
//! [`LiveTracker`] owns every piece of tracking state: the session and its
//! subscription handle, the sampler, the accuracy controller, the render
//! throttle, the lifecycle guard and the error policy. All mutation goes
//! through its methods.
//!
//! The tracker never sleeps and never spawns. Time is passed in explicitly;
//! the owner asks [`LiveTracker::next_deadline`] when to call
//! [`LiveTracker::poll_timers`] next. [`TrackingService`](super::TrackingService)
//! does this on a tokio runtime.
//!
//! # Subscription identity
//!
//! Every event from the live subscription carries the [`WatchId`] it was
//! issued under. Events whose id is not the session's current watch are
//! dropped, so callbacks from a handle cancelled during a mode switch can
//! never reach the new subscription's state.
//!
//! The subscription is replaced at most once per tick. When a burst delivered
//! at one instant flips the accuracy mode back after a switch, the live handle
//! is left alone and the switch is retried on the next sample.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use super::accuracy::AccuracyController;
use super::config::TrackingConfig;
use super::errors::{ErrorDecision, ErrorPolicy};
use super::lifecycle::{GuardAction, LifecycleGuard};
use super::notice::TrackingNotice;
use super::presentation::{MapSurface, TrackingNotifier, VisibilityHost};
use super::sampler::PositionSampler;
use super::source::{GeolocationSource, TrackerEvent};
use super::throttle::RenderThrottle;
use super::types::{
    AccuracyMode, GeolocationError, PermissionState, PositionSample, SessionId, WatchId,
};

/// The active subscription.
#[derive(Debug)]
struct TrackingSession {
    id: SessionId,
    watch: WatchId,
    /// Accuracy mode `watch` was opened with.
    mode: AccuracyMode,
    /// When `watch` last replaced another handle.
    resubscribed_at: Option<Instant>,
    started_at: Instant,
    /// The map has been centered on this session's first render.
    centered: bool,
}

/// Live position tracking controller.
pub struct LiveTracker {
    source: Arc<dyn GeolocationSource>,
    map: Arc<dyn MapSurface>,
    notifier: Arc<dyn TrackingNotifier>,
    visibility: Arc<dyn VisibilityHost>,
    config: TrackingConfig,

    session: Option<TrackingSession>,
    next_session: u64,

    sampler: PositionSampler,
    accuracy: AccuracyController,
    throttle: RenderThrottle,
    guard: LifecycleGuard,
    errors: ErrorPolicy,
}

impl fmt::Debug for LiveTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveTracker")
            .field("config", &self.config)
            .field("session", &self.session)
            .field("mode", &self.accuracy.mode())
            .field("throttle", &self.throttle)
            .field("guard", &self.guard)
            .field("errors", &self.errors)
            .finish_non_exhaustive()
    }
}

impl LiveTracker {
    pub fn new(
        config: TrackingConfig,
        source: Arc<dyn GeolocationSource>,
        map: Arc<dyn MapSurface>,
        notifier: Arc<dyn TrackingNotifier>,
        visibility: Arc<dyn VisibilityHost>,
    ) -> Self {
        Self {
            sampler: PositionSampler::new(config.stationary_distance_m),
            accuracy: AccuracyController::new(config.stationary_sample_limit),
            throttle: RenderThrottle::new(config.render_interval),
            guard: LifecycleGuard::new(config.max_hidden),
            errors: ErrorPolicy::new(config.max_consecutive_errors),
            source,
            map,
            notifier,
            visibility,
            config,
            session: None,
            next_session: 1,
        }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Start tracking.
    ///
    /// Returns `false` without side effects on the session when one is
    /// already active. When the platform cannot track, the user is told why
    /// and no session is created.
    pub fn start(&mut self, now: Instant) -> bool {
        if let Some(session) = &self.session {
            tracing::debug!(session = %session.id, "Start ignored, already tracking");
            return false;
        }

        if !self.source.is_available() {
            tracing::warn!("Geolocation not available on this platform");
            self.notify(TrackingNotice::Unavailable);
            return false;
        }

        if self.source.permission_state() == PermissionState::Denied {
            tracing::warn!("Location permission denied, not starting");
            self.notify(TrackingNotice::PermissionDenied);
            return false;
        }

        self.sampler.reset();
        self.accuracy.reset();
        self.throttle.reset();
        self.guard.reset();
        self.errors.reset();

        let watch = self
            .source
            .watch_position(self.config.watch_options(AccuracyMode::High));
        let id = SessionId(self.next_session);
        self.next_session += 1;

        self.session = Some(TrackingSession {
            id,
            watch,
            mode: AccuracyMode::High,
            resubscribed_at: None,
            started_at: now,
            centered: false,
        });
        self.visibility.subscribe();

        tracing::info!(session = %id, watch = %watch, "Live tracking started");
        self.notify(TrackingNotice::Enabled);
        self.notifier.set_toggle_state(true);
        true
    }

    /// Stop tracking at the user's request.
    pub fn stop(&mut self) {
        self.teardown(TrackingNotice::Disabled);
    }

    /// Start when inactive, stop when active.
    pub fn toggle(&mut self, now: Instant) {
        if self.is_tracking() {
            self.stop();
        } else {
            self.start(now);
        }
    }

    /// Tear down the session and tell the user with `notice`.
    ///
    /// Leaves no subscription, no armed timer and no visibility observer.
    fn teardown(&mut self, notice: TrackingNotice) {
        let Some(session) = self.session.take() else {
            tracing::debug!("Stop ignored, not tracking");
            return;
        };

        self.source.clear_watch(session.watch);
        self.throttle.reset();
        self.sampler.reset();
        self.accuracy.reset();
        self.errors.reset();
        self.guard.reset();
        self.visibility.unsubscribe();
        self.map.remove_position_indicator();

        tracing::info!(
            session = %session.id,
            watch = %session.watch,
            reason = ?notice,
            "Live tracking stopped"
        );
        self.notify(notice);
        self.notifier.set_toggle_state(false);
    }

    // =========================================================================
    // One-shot locate
    // =========================================================================

    /// Center the map on the user.
    ///
    /// Uses the last known fix while tracking; otherwise asks the source for
    /// a one-shot position, answered later by
    /// [`TrackerEvent::CurrentPosition`].
    pub fn locate_me(&mut self) {
        if self.is_tracking() {
            if let Some(sample) = self.sampler.last_known() {
                self.map
                    .pan_to(sample.latitude, sample.longitude, self.config.locate_zoom);
                return;
            }
        }

        if !self.source.is_available() {
            self.notify(TrackingNotice::Unavailable);
            return;
        }

        self.notify(TrackingNotice::Locating);
        self.source
            .request_current_position(self.config.one_shot_options());
    }

    fn on_located(&mut self, result: Result<PositionSample, GeolocationError>) {
        match result {
            Ok(sample) => {
                if !self.is_tracking() {
                    self.map.upsert_position_indicator(
                        sample.latitude,
                        sample.longitude,
                        sample.accuracy_m,
                    );
                }
                self.map
                    .pan_to(sample.latitude, sample.longitude, self.config.locate_zoom);
            }
            Err(error) => {
                tracing::warn!(error = %error, "One-shot locate failed");
                self.notify(TrackingNotice::LocateFailed);
            }
        }
    }

    // =========================================================================
    // Events and timers
    // =========================================================================

    /// Handle one inbound event.
    pub fn handle_event(&mut self, event: TrackerEvent, now: Instant) {
        match event {
            TrackerEvent::Position { watch, sample } => {
                if self.is_current(watch) {
                    self.on_position(sample, now);
                }
            }
            TrackerEvent::Error { watch, error } => {
                if self.is_current(watch) {
                    self.on_error(&error);
                }
            }
            TrackerEvent::CurrentPosition(result) => self.on_located(result),
            TrackerEvent::VisibilityChanged { hidden } => self.on_visibility(hidden, now),
            TrackerEvent::PermissionChanged(state) => self.on_permission(state),
        }
    }

    /// Earliest armed timer deadline, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        [self.throttle.deadline(), self.guard.deadline()]
            .into_iter()
            .flatten()
            .min()
    }

    /// Fire every timer whose deadline has passed.
    pub fn poll_timers(&mut self, now: Instant) {
        if let Some(sample) = self.throttle.fire(now) {
            self.render(sample);
        }

        if self.guard.fire(now, self.is_tracking()) == GuardAction::AutoStop {
            self.teardown(TrackingNotice::AutoStopped);
        }
    }

    fn is_current(&self, watch: WatchId) -> bool {
        match &self.session {
            Some(session) if session.watch == watch => true,
            Some(session) => {
                tracing::debug!(stale = %watch, current = %session.watch, "Dropping stale callback");
                false
            }
            None => {
                tracing::debug!(stale = %watch, "Dropping callback, not tracking");
                false
            }
        }
    }

    fn on_position(&mut self, sample: PositionSample, now: Instant) {
        self.errors.on_success();

        let reference = self.throttle.last_rendered_position();
        let observation = self.sampler.observe(&sample, reference);

        self.accuracy.evaluate(observation.stationary_count);
        self.sync_subscription(now);

        if let Some(sample) = self.throttle.offer(sample, now) {
            self.render(sample);
        }
    }

    fn on_error(&mut self, error: &GeolocationError) {
        match self.errors.on_error(error) {
            ErrorDecision::Continue(notice) => self.notify(notice),
            ErrorDecision::Stop(notice) => self.teardown(notice),
        }
    }

    fn on_visibility(&mut self, hidden: bool, now: Instant) {
        match self.guard.on_visibility(hidden, now, self.is_tracking()) {
            GuardAction::Suspend => self.throttle.suspend(),
            GuardAction::Resume { hidden_for } => {
                tracing::debug!(
                    hidden_for_ms = hidden_for.as_millis() as u64,
                    "Re-establishing subscription"
                );
                self.resubscribe(self.accuracy.mode(), now);
                if let Some(sample) = self.throttle.resume(now) {
                    self.render(sample);
                }
            }
            GuardAction::AutoStop | GuardAction::None => {}
        }
    }

    fn on_permission(&mut self, state: PermissionState) {
        tracing::debug!(state = ?state, "Permission state changed");
        if state == PermissionState::Denied && self.is_tracking() {
            self.on_error(&GeolocationError::PermissionDenied);
        }
    }

    /// Bring the live handle in line with the accuracy mode, at most once
    /// per tick.
    fn sync_subscription(&mut self, now: Instant) {
        let wanted = self.accuracy.mode();
        let Some(session) = &self.session else {
            return;
        };
        if session.mode == wanted {
            return;
        }
        if session.resubscribed_at == Some(now) {
            tracing::debug!(
                live = %session.mode,
                wanted = %wanted,
                "Mode switch deferred, already resubscribed this tick"
            );
            return;
        }
        self.resubscribe(wanted, now);
    }

    /// Replace the live subscription. The old handle is cleared before the
    /// new one is opened.
    fn resubscribe(&mut self, mode: AccuracyMode, now: Instant) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        let old = session.watch;
        self.source.clear_watch(old);
        session.watch = self.source.watch_position(self.config.watch_options(mode));
        session.mode = mode;
        session.resubscribed_at = Some(now);

        tracing::info!(
            session = %session.id,
            old = %old,
            new = %session.watch,
            mode = %mode,
            "Subscription replaced"
        );
    }

    fn render(&mut self, sample: PositionSample) {
        self.map
            .upsert_position_indicator(sample.latitude, sample.longitude, sample.accuracy_m);

        if let Some(session) = self.session.as_mut() {
            if !session.centered {
                session.centered = true;
                self.map
                    .pan_to(sample.latitude, sample.longitude, self.config.locate_zoom);
            }
        }
    }

    fn notify(&self, notice: TrackingNotice) {
        self.notifier.notify(notice.message());
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn is_tracking(&self) -> bool {
        self.session.is_some()
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.session.as_ref().map(|s| s.id)
    }

    /// Handle of the live subscription.
    pub fn current_watch(&self) -> Option<WatchId> {
        self.session.as_ref().map(|s| s.watch)
    }

    /// When the current session started.
    pub fn started_at(&self) -> Option<Instant> {
        self.session.as_ref().map(|s| s.started_at)
    }

    pub fn accuracy_mode(&self) -> AccuracyMode {
        self.accuracy.mode()
    }

    /// Accuracy mode of the live subscription. Trails
    /// [`accuracy_mode`](Self::accuracy_mode) for the rest of a tick in which
    /// a switch was deferred.
    pub fn subscribed_mode(&self) -> Option<AccuracyMode> {
        self.session.as_ref().map(|s| s.mode)
    }

    pub fn consecutive_errors(&self) -> u32 {
        self.errors.consecutive()
    }

    pub fn stationary_count(&self) -> u32 {
        self.sampler.stationary_count()
    }

    /// Latest raw fix of the current session.
    pub fn last_known(&self) -> Option<&PositionSample> {
        self.sampler.last_known()
    }

    pub fn is_hidden(&self) -> bool {
        self.guard.is_hidden()
    }

    pub fn config(&self) -> &TrackingConfig {
        &self.config
    }
}
