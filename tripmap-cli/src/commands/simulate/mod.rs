//! `tripmap simulate`: replay a scripted GPS trace through the live tracker.
//!
//! The tracker runs exactly as it would behind a real map. Scripted fixes,
//! errors, visibility and permission changes are fed to it on a wall clock
//! compressed by `--speed`; map updates and toasts are printed as they
//! happen.

mod script;
mod terminal;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use console::style;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tripmap::config::ConfigFile;
use tripmap::tracking::{
    event_channel, GeolocationError, LiveTracker, TrackerEvent, TrackerEventSender,
    TrackingConfig, TrackingHandle, TrackingService,
};

use crate::error::CliError;

use self::script::{Action, Script};
use self::terminal::{ConsoleMap, ConsoleNotifier, ConsoleVisibility, ReplaySource, SimClock};

/// Slowest accepted `--speed`.
pub const MIN_SPEED: f64 = 0.01;

/// Fastest accepted `--speed`.
pub const MAX_SPEED: f64 = 1000.0;

#[derive(Debug, Args)]
pub struct SimulateArgs {
    /// JSON script of timed steps
    pub script: PathBuf,

    /// Time compression factor (2.0 runs twice as fast)
    #[arg(long, default_value_t = 1.0)]
    pub speed: f64,
}

pub fn run(args: SimulateArgs, config: &ConfigFile) -> Result<(), CliError> {
    if !(MIN_SPEED..=MAX_SPEED).contains(&args.speed) {
        return Err(CliError::Config(format!(
            "--speed must be between {} and {}, got {}",
            MIN_SPEED, MAX_SPEED, args.speed
        )));
    }
    let tracking = scaled(&config.tracking, args.speed)?;

    let script = Script::load(&args.script)?;
    println!(
        "Replaying {} ({} steps, {}x)",
        args.script.display(),
        script.steps.len(),
        args.speed
    );
    println!();

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    ctrlc::set_handler(move || signal.cancel())
        .map_err(|e| CliError::Config(format!("Failed to set signal handler: {}", e)))?;

    super::runtime()?.block_on(replay(script, tracking, args.speed, shutdown))
}

/// Divide every tracker duration that the script can observe by `speed`.
fn scaled(config: &TrackingConfig, speed: f64) -> Result<TrackingConfig, CliError> {
    Ok(config
        .clone()
        .with_render_interval(scale(config.render_interval, speed)?)
        .with_max_hidden(scale(config.max_hidden, speed)?))
}

/// `duration / speed`, or an error when the result does not fit a `Duration`.
fn scale(duration: Duration, speed: f64) -> Result<Duration, CliError> {
    Duration::try_from_secs_f64(duration.as_secs_f64() / speed).map_err(|_| {
        CliError::Config(format!(
            "{:?} at --speed {} is out of range",
            duration, speed
        ))
    })
}

async fn replay(
    script: Script,
    config: TrackingConfig,
    speed: f64,
    shutdown: CancellationToken,
) -> Result<(), CliError> {
    let clock = SimClock::new(speed);
    let (events, events_rx) = event_channel();
    let source = ReplaySource::new(events.clone(), clock.clone());
    let map = Arc::new(ConsoleMap::new(clock.clone()));
    let notifier = Arc::new(ConsoleNotifier::new(clock.clone()));
    let visibility = Arc::new(ConsoleVisibility::default());

    let tail = config.render_interval * 2;
    let tracker = LiveTracker::new(
        config,
        source.clone(),
        map.clone(),
        notifier.clone(),
        visibility.clone(),
    );
    let (service, handle) = TrackingService::new(tracker, events_rx);
    let task = tokio::spawn(service.run(shutdown.clone()));

    if script.autostart {
        handle.start();
    }

    let base = Instant::now();
    for step in &script.steps {
        let due = base + scale(Duration::from_millis(step.at_ms), speed)?;
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            _ = tokio::time::sleep_until(due) => {}
        }
        tracing::debug!(at_ms = step.at_ms, action = ?step.action, "Script step");
        apply(&step.action, &source, &events, &visibility, &handle);
    }

    // Let a pending throttled render land before reporting.
    tokio::select! {
        _ = shutdown.cancelled() => {}
        _ = tokio::time::sleep(tail) => {}
    }
    let snapshot = handle.snapshot().await;

    shutdown.cancel();
    let tracker = task
        .await
        .map_err(|e| CliError::Runtime(format!("Tracking task failed: {}", e)))?;
    tracing::debug!(tracking = tracker.is_tracking(), "Tracker returned");

    println!();
    println!("{}", style("Replay finished").green().bold());
    if let Some(snapshot) = snapshot {
        let state = if snapshot.tracking { "on" } else { "off" };
        println!("  Tracking at end: {}", state);
        println!("  Accuracy mode:   {}", snapshot.mode);
        println!("  Error streak:    {}", snapshot.consecutive_errors);
    }
    println!("  Renders:         {}", map.renders());
    println!("  Notices:         {}", notifier.notices());

    Ok(())
}

fn apply(
    action: &Action,
    source: &ReplaySource,
    events: &TrackerEventSender,
    visibility: &ConsoleVisibility,
    handle: &TrackingHandle,
) {
    match action {
        Action::Position { .. } => {
            if let Some(sample) = action.sample() {
                source.emit_position(sample);
            }
        }
        Action::Error { code, message } => {
            source.emit_error(GeolocationError::from_code(*code, message.clone()));
        }
        Action::Hidden | Action::Visible => {
            let hidden = matches!(action, Action::Hidden);
            if visibility.is_subscribed() {
                let _ = events.send(TrackerEvent::VisibilityChanged { hidden });
            }
        }
        Action::Permission { state } => source.set_permission(*state),
        Action::Start => {
            handle.start();
        }
        Action::Stop => {
            handle.stop();
        }
        Action::Toggle => {
            handle.toggle();
        }
        Action::Locate => {
            handle.locate_me();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speed_scales_tracker_timers() {
        let config = scaled(&TrackingConfig::default(), 10.0).unwrap();
        assert_eq!(config.render_interval, Duration::from_millis(100));
        assert_eq!(config.max_hidden, Duration::from_secs(30));
        assert_eq!(config.stationary_sample_limit, 6);
    }

    #[test]
    fn test_rejects_speed_out_of_range() {
        for speed in [0.0, -1.0, 1e-300, 0.009, 1000.5, f64::NAN, f64::INFINITY] {
            let args = SimulateArgs {
                script: PathBuf::from("unused.json"),
                speed,
            };
            assert!(
                matches!(run(args, &ConfigFile::default()), Err(CliError::Config(_))),
                "speed {} accepted",
                speed
            );
        }
    }

    #[test]
    fn test_slowest_speed_scales_longest_step() {
        let due = scale(Duration::from_millis(script::MAX_STEP_MS), MIN_SPEED).unwrap();
        let expected = Duration::from_millis(script::MAX_STEP_MS) * 100;
        assert!(due.abs_diff(expected) < Duration::from_millis(1));
    }

    #[test]
    fn test_oversized_config_duration_is_an_error() {
        let config = TrackingConfig::default().with_max_hidden(Duration::MAX);
        assert!(matches!(
            scaled(&config, MIN_SPEED),
            Err(CliError::Config(_))
        ));
    }
}
