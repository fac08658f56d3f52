//! Async driver for [`LiveTracker`].
//!
//! The service owns the tracker and runs a single loop that serializes
//! everything that can touch tracking state:
//!
//! ```text
//!   platform adapters ──TrackerEvent──┐
//!                                     │
//!   TrackingHandle ──TrackerCommand───┼──► select! ──► LiveTracker
//!                                     │
//!   sleep_until(next_deadline) ───────┘
//! ```
//!
//! Nothing runs in parallel with the tracker; the loop is the event loop.

use std::time::Instant;

use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::controller::LiveTracker;
use super::source::TrackerEventReceiver;
use super::types::{AccuracyMode, SessionId, WatchId};

/// User-initiated requests.
#[derive(Debug)]
pub enum TrackerCommand {
    Start,
    Stop,
    Toggle,
    LocateMe,
    Snapshot(oneshot::Sender<TrackerSnapshot>),
}

/// Point-in-time view of the tracker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackerSnapshot {
    pub tracking: bool,
    pub session: Option<SessionId>,
    pub watch: Option<WatchId>,
    pub mode: AccuracyMode,
    pub consecutive_errors: u32,
    pub stationary_count: u32,
    pub hidden: bool,
}

impl From<&LiveTracker> for TrackerSnapshot {
    fn from(tracker: &LiveTracker) -> Self {
        Self {
            tracking: tracker.is_tracking(),
            session: tracker.session_id(),
            watch: tracker.current_watch(),
            mode: tracker.accuracy_mode(),
            consecutive_errors: tracker.consecutive_errors(),
            stationary_count: tracker.stationary_count(),
            hidden: tracker.is_hidden(),
        }
    }
}

/// Cloneable handle for sending commands to a running [`TrackingService`].
#[derive(Debug, Clone)]
pub struct TrackingHandle {
    commands: mpsc::UnboundedSender<TrackerCommand>,
}

impl TrackingHandle {
    pub fn start(&self) -> bool {
        self.send(TrackerCommand::Start)
    }

    pub fn stop(&self) -> bool {
        self.send(TrackerCommand::Stop)
    }

    pub fn toggle(&self) -> bool {
        self.send(TrackerCommand::Toggle)
    }

    pub fn locate_me(&self) -> bool {
        self.send(TrackerCommand::LocateMe)
    }

    /// Ask the service for a snapshot.
    ///
    /// Events queued before this call are handled first. Returns `None` if
    /// the service has exited.
    pub async fn snapshot(&self) -> Option<TrackerSnapshot> {
        let (tx, rx) = oneshot::channel();
        if !self.send(TrackerCommand::Snapshot(tx)) {
            return None;
        }
        rx.await.ok()
    }

    fn send(&self, command: TrackerCommand) -> bool {
        match self.commands.send(command) {
            Ok(()) => true,
            Err(e) => {
                warn!(command = ?e.0, "Tracking service is not running");
                false
            }
        }
    }
}

/// Runs a [`LiveTracker`] on the tokio runtime.
pub struct TrackingService {
    tracker: LiveTracker,
    events: TrackerEventReceiver,
    commands: mpsc::UnboundedReceiver<TrackerCommand>,
}

impl TrackingService {
    pub fn new(tracker: LiveTracker, events: TrackerEventReceiver) -> (Self, TrackingHandle) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let service = Self {
            tracker,
            events,
            commands: command_rx,
        };
        (
            service,
            TrackingHandle {
                commands: command_tx,
            },
        )
    }

    /// Run until shutdown, or until every input is closed and no timer is
    /// armed. Tracking is stopped on exit and the tracker is handed back.
    pub async fn run(self, shutdown: CancellationToken) -> LiveTracker {
        let Self {
            mut tracker,
            mut events,
            mut commands,
        } = self;

        let mut events_open = true;
        let mut commands_open = true;

        info!("Tracking service starting");

        loop {
            let deadline = tracker.next_deadline();
            if !events_open && !commands_open && deadline.is_none() {
                debug!("All inputs closed");
                break;
            }

            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    info!("Tracking service shutting down");
                    break;
                }

                event = events.recv(), if events_open => match event {
                    Some(event) => tracker.handle_event(event, now()),
                    None => {
                        debug!("Event channel closed");
                        events_open = false;
                    }
                },

                command = commands.recv(), if commands_open => match command {
                    Some(command) => Self::handle_command(&mut tracker, command),
                    None => {
                        debug!("Command channel closed");
                        commands_open = false;
                    }
                },

                _ = sleep_until(deadline) => tracker.poll_timers(now()),
            }
        }

        tracker.stop();
        info!("Tracking service stopped");
        tracker
    }

    fn handle_command(tracker: &mut LiveTracker, command: TrackerCommand) {
        debug!(command = ?command, "Tracker command");
        match command {
            TrackerCommand::Start => {
                tracker.start(now());
            }
            TrackerCommand::Stop => tracker.stop(),
            TrackerCommand::Toggle => tracker.toggle(now()),
            TrackerCommand::LocateMe => tracker.locate_me(),
            TrackerCommand::Snapshot(reply) => {
                let _ = reply.send(TrackerSnapshot::from(&*tracker));
            }
        }
    }
}

/// Current time on the tokio clock, so paused-time tests stay consistent.
fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await,
        None => std::future::pending().await,
    }
}
