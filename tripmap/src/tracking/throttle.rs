//! Render throttle for the position indicator.
//!
//! Decouples the sensor cadence (sub-second in high accuracy mode) from map
//! redraws. At most one render happens per `interval`; samples that arrive
//! inside the window overwrite a single pending slot and the scheduled
//! render picks up whichever sample is freshest when it fires.
//!
//! ```text
//!  sample ─► pending (latest wins)
//!              │
//!              ├─ interval elapsed since last render ─► render now
//!              ├─ no render scheduled ─► schedule at last_render + interval
//!              └─ render scheduled ─► nothing (it will pick up pending)
//! ```
//!
//! The throttle never touches the map itself: it returns the sample to draw
//! and the tracker pushes it to the [`MapSurface`](super::MapSurface).

use std::time::{Duration, Instant};

use crate::geo::LatLng;

use super::types::PositionSample;

/// Rate limiter between raw samples and map renders.
#[derive(Debug)]
pub struct RenderThrottle {
    interval: Duration,

    /// Freshest sample not yet rendered.
    pending: Option<PositionSample>,

    /// Last sample pushed to the map.
    last_rendered: Option<PositionSample>,

    /// When the last render happened.
    last_render_at: Option<Instant>,

    /// Deadline of the single scheduled render, if any.
    deadline: Option<Instant>,

    /// Rendering is paused while the host is hidden.
    suspended: bool,
}

impl RenderThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            pending: None,
            last_rendered: None,
            last_render_at: None,
            deadline: None,
            suspended: false,
        }
    }

    /// Clear all render state and cancel the scheduled render.
    pub fn reset(&mut self) {
        self.pending = None;
        self.last_rendered = None;
        self.last_render_at = None;
        self.deadline = None;
        self.suspended = false;
    }

    /// Offer a new sample.
    ///
    /// Returns the sample to render immediately, or `None` when the render
    /// was deferred to the scheduled deadline.
    pub fn offer(&mut self, sample: PositionSample, now: Instant) -> Option<PositionSample> {
        self.pending = Some(sample);

        if self.suspended {
            return None;
        }

        if self.is_due(now) {
            return self.render_pending(now);
        }

        if self.deadline.is_none() {
            let deadline = self.next_allowed_render(now);
            tracing::trace!(
                wait_ms = deadline.saturating_duration_since(now).as_millis() as u64,
                "Render deferred"
            );
            self.deadline = Some(deadline);
        }
        None
    }

    /// Fire the scheduled render if its deadline has passed.
    ///
    /// Returns the freshest pending sample to render, if any.
    pub fn fire(&mut self, now: Instant) -> Option<PositionSample> {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                if self.suspended {
                    return None;
                }
                self.render_pending(now)
            }
            _ => None,
        }
    }

    /// Pause rendering. Incoming samples still update the pending slot.
    pub fn suspend(&mut self) {
        self.suspended = true;
        self.deadline = None;
    }

    /// Resume rendering, flushing the pending sample under the usual rate
    /// limit.
    pub fn resume(&mut self, now: Instant) -> Option<PositionSample> {
        self.suspended = false;
        if self.pending.is_none() {
            return None;
        }
        if self.is_due(now) {
            return self.render_pending(now);
        }
        if self.deadline.is_none() {
            self.deadline = Some(self.next_allowed_render(now));
        }
        None
    }

    /// Deadline of the scheduled render.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Sample waiting for the next render.
    pub fn pending(&self) -> Option<&PositionSample> {
        self.pending.as_ref()
    }

    /// Last sample pushed to the map.
    pub fn last_rendered(&self) -> Option<&PositionSample> {
        self.last_rendered.as_ref()
    }

    /// Position of the last rendered sample.
    pub fn last_rendered_position(&self) -> Option<LatLng> {
        self.last_rendered.map(|s| s.position())
    }

    /// When the last render happened.
    pub fn last_render_at(&self) -> Option<Instant> {
        self.last_render_at
    }

    /// Whether rendering is paused.
    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    fn is_due(&self, now: Instant) -> bool {
        self.last_render_at
            .map_or(true, |at| now.saturating_duration_since(at) >= self.interval)
    }

    fn next_allowed_render(&self, now: Instant) -> Instant {
        self.last_render_at
            .map_or(now, |at| at + self.interval)
    }

    fn render_pending(&mut self, now: Instant) -> Option<PositionSample> {
        let sample = self.pending.take()?;
        self.last_rendered = Some(sample);
        self.last_render_at = Some(now);
        self.deadline = None;
        Some(sample)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTERVAL: Duration = Duration::from_millis(1000);

    fn sample(n: u32) -> PositionSample {
        PositionSample::new(41.9 + n as f64 * 1e-4, 12.5, n as f64).with_timestamp_ms(n as i64)
    }

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    #[test]
    fn test_first_sample_renders_immediately() {
        let mut throttle = RenderThrottle::new(INTERVAL);
        let t0 = Instant::now();

        let rendered = throttle.offer(sample(1), t0);
        assert_eq!(rendered, Some(sample(1)));
        assert_eq!(throttle.last_render_at(), Some(t0));
        assert!(throttle.pending().is_none());
        assert!(throttle.deadline().is_none());
    }

    #[test]
    fn test_burst_is_coalesced_into_latest() {
        let mut throttle = RenderThrottle::new(INTERVAL);
        let t0 = Instant::now();

        throttle.offer(sample(1), t0);
        assert_eq!(throttle.offer(sample(2), t0 + ms(100)), None);
        assert_eq!(throttle.deadline(), Some(t0 + INTERVAL));
        assert_eq!(throttle.offer(sample(3), t0 + ms(200)), None);
        assert_eq!(throttle.offer(sample(4), t0 + ms(300)), None);

        // Deadline unchanged by later samples
        assert_eq!(throttle.deadline(), Some(t0 + INTERVAL));

        // Firing early does nothing
        assert_eq!(throttle.fire(t0 + ms(999)), None);

        let rendered = throttle.fire(t0 + INTERVAL);
        assert_eq!(rendered, Some(sample(4)));
        assert!(throttle.deadline().is_none());
        assert_eq!(throttle.last_rendered(), Some(&sample(4)));
    }

    #[test]
    fn test_sample_after_interval_renders_immediately() {
        let mut throttle = RenderThrottle::new(INTERVAL);
        let t0 = Instant::now();

        throttle.offer(sample(1), t0);
        let rendered = throttle.offer(sample(2), t0 + ms(1500));
        assert_eq!(rendered, Some(sample(2)));
        assert_eq!(throttle.last_render_at(), Some(t0 + ms(1500)));
    }

    #[test]
    fn test_fire_without_pending_renders_nothing() {
        let mut throttle = RenderThrottle::new(INTERVAL);
        let t0 = Instant::now();

        throttle.offer(sample(1), t0);
        throttle.offer(sample(2), t0 + ms(500));
        assert_eq!(throttle.fire(t0 + INTERVAL), Some(sample(2)));
        assert_eq!(throttle.fire(t0 + ms(3000)), None);
    }

    #[test]
    fn test_accuracy_comes_from_rendered_sample() {
        let mut throttle = RenderThrottle::new(INTERVAL);
        let t0 = Instant::now();

        throttle.offer(PositionSample::new(41.9, 12.5, 50.0), t0);
        throttle.offer(PositionSample::new(41.9, 12.5, 8.0), t0 + ms(100));

        // The pending sample's accuracy is not visible until it renders
        assert_eq!(throttle.last_rendered().map(|s| s.accuracy_m), Some(50.0));
        throttle.fire(t0 + INTERVAL);
        assert_eq!(throttle.last_rendered().map(|s| s.accuracy_m), Some(8.0));
    }

    #[test]
    fn test_suspend_keeps_pending_and_cancels_deadline() {
        let mut throttle = RenderThrottle::new(INTERVAL);
        let t0 = Instant::now();

        throttle.offer(sample(1), t0);
        throttle.offer(sample(2), t0 + ms(100));
        throttle.suspend();
        assert!(throttle.deadline().is_none());

        assert_eq!(throttle.offer(sample(3), t0 + ms(5000)), None);
        assert!(throttle.deadline().is_none());
        assert_eq!(throttle.pending(), Some(&sample(3)));

        assert_eq!(throttle.resume(t0 + ms(6000)), Some(sample(3)));
        assert!(!throttle.is_suspended());
    }

    #[test]
    fn test_resume_inside_window_schedules() {
        let mut throttle = RenderThrottle::new(INTERVAL);
        let t0 = Instant::now();

        throttle.offer(sample(1), t0);
        throttle.suspend();
        throttle.offer(sample(2), t0 + ms(200));
        assert_eq!(throttle.resume(t0 + ms(400)), None);
        assert_eq!(throttle.deadline(), Some(t0 + INTERVAL));
        assert_eq!(throttle.fire(t0 + INTERVAL), Some(sample(2)));
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut throttle = RenderThrottle::new(INTERVAL);
        let t0 = Instant::now();
        throttle.offer(sample(1), t0);
        throttle.offer(sample(2), t0 + ms(10));
        throttle.reset();

        assert!(throttle.pending().is_none());
        assert!(throttle.last_rendered().is_none());
        assert!(throttle.deadline().is_none());
        assert!(throttle.last_render_at().is_none());
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_render_rate_and_freshness(gaps in proptest::collection::vec(0u64..2500, 1..60)) {
                let mut throttle = RenderThrottle::new(INTERVAL);
                let t0 = Instant::now();

                // (render time, index of rendered sample, samples received so far)
                let mut renders: Vec<(Instant, usize, usize)> = Vec::new();
                // arrival time of each sample
                let mut arrivals: Vec<Instant> = Vec::new();
                let mut now = t0;

                for (index, gap) in gaps.iter().enumerate() {
                    now += ms(*gap);
                    if let Some(deadline) = throttle.deadline() {
                        if deadline <= now {
                            if let Some(s) = throttle.fire(deadline) {
                                renders.push((deadline, s.timestamp_ms as usize, arrivals.len()));
                            }
                        }
                    }
                    arrivals.push(now);
                    if let Some(s) = throttle.offer(sample(index as u32), now) {
                        renders.push((now, s.timestamp_ms as usize, arrivals.len()));
                    }
                }
                if let Some(deadline) = throttle.deadline() {
                    if let Some(s) = throttle.fire(deadline) {
                        renders.push((deadline, s.timestamp_ms as usize, arrivals.len()));
                    }
                }

                // At most one render per interval
                for pair in renders.windows(2) {
                    prop_assert!(pair[1].0.duration_since(pair[0].0) >= INTERVAL);
                }

                // Each render shows the latest sample received before it fired
                for (_, shown, received) in &renders {
                    prop_assert_eq!(*shown, *received - 1);
                }

                // Every sample is rendered or superseded within one interval
                for (index, arrived) in arrivals.iter().enumerate() {
                    let covered = renders
                        .iter()
                        .any(|(at, shown, _)| *shown >= index && *at <= *arrived + INTERVAL);
                    prop_assert!(covered, "sample {} not rendered in time", index);
                }
            }
        }
    }
}
