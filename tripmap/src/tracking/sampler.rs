//! Raw sample intake and stationarity detection.
//!
//! The sampler records the latest raw fix and counts how many consecutive
//! fixes stayed close to the last *rendered* position. The reference point
//! only moves when a render happens, so with sparse renders stationary
//! detection lags behind the raw stream.

use crate::geo::LatLng;

use super::types::PositionSample;

/// Stationarity verdict for one sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleObservation {
    /// Distance from the reference point, if there was one.
    pub distance_m: Option<f64>,
    /// Consecutive stationary samples after this one.
    pub stationary_count: u32,
}

impl SampleObservation {
    /// Whether this sample broke a stationary streak (or started fresh).
    pub fn moved(&self) -> bool {
        self.stationary_count == 0
    }
}

/// Tracks the last known fix and the stationary streak.
#[derive(Debug)]
pub struct PositionSampler {
    stationary_distance_m: f64,
    last_known: Option<PositionSample>,
    stationary_count: u32,
}

impl PositionSampler {
    pub fn new(stationary_distance_m: f64) -> Self {
        Self {
            stationary_distance_m,
            last_known: None,
            stationary_count: 0,
        }
    }

    /// Forget the last fix and the stationary streak.
    pub fn reset(&mut self) {
        self.last_known = None;
        self.stationary_count = 0;
    }

    /// Record a sample and update the stationary streak against `reference`,
    /// the last rendered position.
    ///
    /// Without a reference the sample counts as movement.
    pub fn observe(
        &mut self,
        sample: &PositionSample,
        reference: Option<LatLng>,
    ) -> SampleObservation {
        self.last_known = Some(*sample);

        let distance_m = reference.map(|r| r.distance_to(&sample.position()));
        match distance_m {
            Some(d) if d < self.stationary_distance_m => {
                self.stationary_count = self.stationary_count.saturating_add(1);
            }
            _ => self.stationary_count = 0,
        }

        tracing::trace!(
            distance_m = ?distance_m,
            stationary_count = self.stationary_count,
            "Sample observed"
        );

        SampleObservation {
            distance_m,
            stationary_count: self.stationary_count,
        }
    }

    /// Latest raw fix, rendered or not.
    pub fn last_known(&self) -> Option<&PositionSample> {
        self.last_known.as_ref()
    }

    /// Current stationary streak.
    pub fn stationary_count(&self) -> u32 {
        self.stationary_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(lat: f64, lng: f64) -> PositionSample {
        PositionSample::new(lat, lng, 10.0)
    }

    #[test]
    fn test_no_reference_counts_as_movement() {
        let mut sampler = PositionSampler::new(5.0);
        let obs = sampler.observe(&sample(41.9, 12.5), None);
        assert!(obs.moved());
        assert_eq!(obs.distance_m, None);
        assert_eq!(sampler.last_known().map(|s| s.latitude), Some(41.9));
    }

    #[test]
    fn test_close_samples_build_streak() {
        let mut sampler = PositionSampler::new(5.0);
        let reference = Some(LatLng::new(41.9, 12.5));

        for expected in 1..=4 {
            let obs = sampler.observe(&sample(41.90001, 12.5), reference);
            assert_eq!(obs.stationary_count, expected);
        }
    }

    #[test]
    fn test_far_sample_resets_streak() {
        let mut sampler = PositionSampler::new(5.0);
        let reference = Some(LatLng::new(41.9, 12.5));

        sampler.observe(&sample(41.90001, 12.5), reference);
        sampler.observe(&sample(41.90001, 12.5), reference);
        assert_eq!(sampler.stationary_count(), 2);

        // ~11m north
        let obs = sampler.observe(&sample(41.9001, 12.5), reference);
        assert!(obs.moved());
        assert!(obs.distance_m.unwrap() > 5.0);
    }

    #[test]
    fn test_distance_measured_from_reference_not_last_raw() {
        let mut sampler = PositionSampler::new(5.0);
        let reference = Some(LatLng::new(41.9, 12.5));

        // Creep north ~3m per sample: each step is small, but the third
        // sample is ~9m from the reference.
        sampler.observe(&sample(41.90003, 12.5), reference);
        assert_eq!(sampler.stationary_count(), 1);
        sampler.observe(&sample(41.90006, 12.5), reference);
        assert_eq!(sampler.stationary_count(), 0);
        sampler.observe(&sample(41.90008, 12.5), reference);
        assert_eq!(sampler.stationary_count(), 0);
    }

    #[test]
    fn test_reset_clears_state() {
        let mut sampler = PositionSampler::new(5.0);
        let reference = Some(LatLng::new(41.9, 12.5));
        sampler.observe(&sample(41.9, 12.5), reference);
        sampler.reset();
        assert_eq!(sampler.stationary_count(), 0);
        assert!(sampler.last_known().is_none());
    }
}
