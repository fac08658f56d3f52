//! Visibility lifecycle guard.
//!
//! Keeps short app switches from killing tracking while stopping a session
//! that has been left running in the background for too long.
//!
//! # State Machine
//!
//! ```text
//!            hidden (tracking)              timer fires (hidden, tracking)
//!   Visible ──────────────────► HiddenWaitingAutoStop ──────────────────► Stopped
//!      ▲                               │
//!      └──────── visible ──────────────┘
//! ```
//!
//! The guard is inert while no session exists: visibility events are
//! ignored and no timer is armed.

use std::time::{Duration, Instant};

/// Internal state of the guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GuardState {
    /// Host is visible; nothing armed.
    Visible,

    /// Host is hidden; tracking stops at `auto_stop_at` unless shown again.
    HiddenWaitingAutoStop {
        hidden_since: Instant,
        auto_stop_at: Instant,
    },

    /// Tracking was stopped by the guard.
    Stopped,
}

/// What the tracker must do after a visibility change or timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardAction {
    /// Nothing to do.
    None,
    /// Host went hidden: pause rendering.
    Suspend,
    /// Host came back: re-establish the subscription and resume rendering.
    Resume { hidden_for: Duration },
    /// Hidden too long: stop tracking.
    AutoStop,
}

/// Watches host visibility on behalf of the tracker.
#[derive(Debug)]
pub struct LifecycleGuard {
    state: GuardState,
    max_hidden: Duration,
}

impl LifecycleGuard {
    pub fn new(max_hidden: Duration) -> Self {
        Self {
            state: GuardState::Visible,
            max_hidden,
        }
    }

    /// Back to visible with nothing armed.
    pub fn reset(&mut self) {
        self.state = GuardState::Visible;
    }

    /// Handle a visibility change.
    pub fn on_visibility(&mut self, hidden: bool, now: Instant, tracking: bool) -> GuardAction {
        if !tracking {
            return GuardAction::None;
        }

        match (self.state, hidden) {
            (GuardState::Visible, true) => {
                let auto_stop_at = now + self.max_hidden;
                tracing::info!(
                    max_hidden_secs = self.max_hidden.as_secs(),
                    "Host hidden, auto-stop armed"
                );
                self.state = GuardState::HiddenWaitingAutoStop {
                    hidden_since: now,
                    auto_stop_at,
                };
                GuardAction::Suspend
            }
            (GuardState::HiddenWaitingAutoStop { hidden_since, .. }, false) => {
                let hidden_for = now.saturating_duration_since(hidden_since);
                tracing::info!(
                    hidden_for_ms = hidden_for.as_millis() as u64,
                    "Host visible again, auto-stop disarmed"
                );
                self.state = GuardState::Visible;
                GuardAction::Resume { hidden_for }
            }
            _ => GuardAction::None,
        }
    }

    /// Fire the auto-stop timer if due.
    pub fn fire(&mut self, now: Instant, tracking: bool) -> GuardAction {
        match self.state {
            GuardState::HiddenWaitingAutoStop { auto_stop_at, .. } if now >= auto_stop_at => {
                if !tracking {
                    self.state = GuardState::Visible;
                    return GuardAction::None;
                }
                tracing::info!("Hidden beyond limit, stopping tracking");
                self.state = GuardState::Stopped;
                GuardAction::AutoStop
            }
            _ => GuardAction::None,
        }
    }

    /// Deadline of the armed auto-stop timer.
    pub fn deadline(&self) -> Option<Instant> {
        match self.state {
            GuardState::HiddenWaitingAutoStop { auto_stop_at, .. } => Some(auto_stop_at),
            _ => None,
        }
    }

    /// When the host went hidden, if it is hidden now.
    pub fn hidden_since(&self) -> Option<Instant> {
        match self.state {
            GuardState::HiddenWaitingAutoStop { hidden_since, .. } => Some(hidden_since),
            _ => None,
        }
    }

    /// Whether the host is currently hidden.
    pub fn is_hidden(&self) -> bool {
        matches!(self.state, GuardState::HiddenWaitingAutoStop { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAX_HIDDEN: Duration = Duration::from_secs(300);

    #[test]
    fn test_inert_without_tracking() {
        let mut guard = LifecycleGuard::new(MAX_HIDDEN);
        let t0 = Instant::now();
        assert_eq!(guard.on_visibility(true, t0, false), GuardAction::None);
        assert!(!guard.is_hidden());
        assert!(guard.deadline().is_none());
    }

    #[test]
    fn test_hidden_arms_timer() {
        let mut guard = LifecycleGuard::new(MAX_HIDDEN);
        let t0 = Instant::now();
        assert_eq!(guard.on_visibility(true, t0, true), GuardAction::Suspend);
        assert!(guard.is_hidden());
        assert_eq!(guard.hidden_since(), Some(t0));
        assert_eq!(guard.deadline(), Some(t0 + MAX_HIDDEN));
    }

    #[test]
    fn test_repeated_hidden_keeps_first_deadline() {
        let mut guard = LifecycleGuard::new(MAX_HIDDEN);
        let t0 = Instant::now();
        guard.on_visibility(true, t0, true);
        assert_eq!(
            guard.on_visibility(true, t0 + Duration::from_secs(10), true),
            GuardAction::None
        );
        assert_eq!(guard.deadline(), Some(t0 + MAX_HIDDEN));
    }

    #[test]
    fn test_visible_before_deadline_disarms() {
        let mut guard = LifecycleGuard::new(MAX_HIDDEN);
        let t0 = Instant::now();
        guard.on_visibility(true, t0, true);

        let action = guard.on_visibility(false, t0 + Duration::from_secs(60), true);
        assert_eq!(
            action,
            GuardAction::Resume {
                hidden_for: Duration::from_secs(60)
            }
        );
        assert!(guard.deadline().is_none());
        assert_eq!(
            guard.fire(t0 + Duration::from_secs(400), true),
            GuardAction::None
        );
    }

    #[test]
    fn test_timer_stops_tracking() {
        let mut guard = LifecycleGuard::new(MAX_HIDDEN);
        let t0 = Instant::now();
        guard.on_visibility(true, t0, true);

        assert_eq!(
            guard.fire(t0 + MAX_HIDDEN - Duration::from_millis(1), true),
            GuardAction::None
        );
        assert_eq!(guard.fire(t0 + MAX_HIDDEN, true), GuardAction::AutoStop);
        assert!(!guard.is_hidden());
        assert!(guard.deadline().is_none());
    }

    #[test]
    fn test_visible_while_visible_is_noop() {
        let mut guard = LifecycleGuard::new(MAX_HIDDEN);
        assert_eq!(
            guard.on_visibility(false, Instant::now(), true),
            GuardAction::None
        );
    }

    #[test]
    fn test_reset() {
        let mut guard = LifecycleGuard::new(MAX_HIDDEN);
        guard.on_visibility(true, Instant::now(), true);
        guard.reset();
        assert!(!guard.is_hidden());
        assert!(guard.deadline().is_none());
    }
}
