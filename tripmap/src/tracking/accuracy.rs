//! Accuracy mode selection.
//!
//! Drops the subscription to low accuracy after a sustained stationary
//! streak and returns to high accuracy on the first sign of movement.
//!
//! # State Machine
//!
//! ```text
//!          stationary_count > limit
//!   High ───────────────────────────► Low
//!     ▲                                │
//!     └──────── stationary_count == 0 ─┘
//! ```
//!
//! The controller only decides; the tracker performs the resubscription.

use super::types::AccuracyMode;

/// Chooses the accuracy mode from the stationary streak.
#[derive(Debug)]
pub struct AccuracyController {
    mode: AccuracyMode,
    stationary_sample_limit: u32,
}

impl AccuracyController {
    pub fn new(stationary_sample_limit: u32) -> Self {
        Self {
            mode: AccuracyMode::High,
            stationary_sample_limit,
        }
    }

    /// Current mode.
    pub fn mode(&self) -> AccuracyMode {
        self.mode
    }

    /// Back to high accuracy for a fresh session.
    pub fn reset(&mut self) {
        self.mode = AccuracyMode::High;
    }

    /// Evaluate one sample's stationary streak.
    ///
    /// Returns the new mode when a switch is required, `None` otherwise.
    pub fn evaluate(&mut self, stationary_count: u32) -> Option<AccuracyMode> {
        let next = match self.mode {
            AccuracyMode::High if stationary_count > self.stationary_sample_limit => {
                AccuracyMode::Low
            }
            AccuracyMode::Low if stationary_count == 0 => AccuracyMode::High,
            _ => return None,
        };

        tracing::info!(
            from = %self.mode,
            to = %next,
            stationary_count,
            "Accuracy mode switch"
        );
        self.mode = next;
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_high() {
        let controller = AccuracyController::new(6);
        assert_eq!(controller.mode(), AccuracyMode::High);
    }

    #[test]
    fn test_limit_must_be_exceeded() {
        let mut controller = AccuracyController::new(6);
        for count in 0..=6 {
            assert_eq!(controller.evaluate(count), None);
        }
        assert_eq!(controller.evaluate(7), Some(AccuracyMode::Low));
        assert_eq!(controller.mode(), AccuracyMode::Low);
    }

    #[test]
    fn test_switches_down_only_once() {
        let mut controller = AccuracyController::new(6);
        assert_eq!(controller.evaluate(7), Some(AccuracyMode::Low));
        assert_eq!(controller.evaluate(8), None);
        assert_eq!(controller.evaluate(50), None);
    }

    #[test]
    fn test_movement_in_low_returns_to_high() {
        let mut controller = AccuracyController::new(6);
        controller.evaluate(7);
        assert_eq!(controller.evaluate(0), Some(AccuracyMode::High));
        assert_eq!(controller.mode(), AccuracyMode::High);
    }

    #[test]
    fn test_movement_in_high_is_noop() {
        let mut controller = AccuracyController::new(6);
        assert_eq!(controller.evaluate(0), None);
    }

    #[test]
    fn test_reset() {
        let mut controller = AccuracyController::new(6);
        controller.evaluate(7);
        controller.reset();
        assert_eq!(controller.mode(), AccuracyMode::High);
    }
}
