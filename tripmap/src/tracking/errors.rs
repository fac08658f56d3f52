//! Sensor error classification.
//!
//! Transient errors are surfaced as a passive notice and the subscription
//! keeps running. Permission denial and a run of consecutive failures are
//! terminal. The consecutive-failure limit applies to every class and takes
//! precedence over the per-class decision.

use super::notice::TrackingNotice;
use super::types::GeolocationError;

/// Decision for one sensor error. Each decision carries exactly one notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorDecision {
    /// Keep the subscription, show the notice.
    Continue(TrackingNotice),
    /// Tear down the session, show the notice.
    Stop(TrackingNotice),
}

impl ErrorDecision {
    pub fn notice(&self) -> TrackingNotice {
        match self {
            ErrorDecision::Continue(notice) | ErrorDecision::Stop(notice) => *notice,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ErrorDecision::Stop(_))
    }
}

/// Counts consecutive sensor errors and classifies each one.
#[derive(Debug)]
pub struct ErrorPolicy {
    consecutive: u32,
    limit: u32,
}

impl ErrorPolicy {
    pub fn new(limit: u32) -> Self {
        Self {
            consecutive: 0,
            limit,
        }
    }

    /// Classify an error and bump the consecutive counter.
    pub fn on_error(&mut self, error: &GeolocationError) -> ErrorDecision {
        self.consecutive = self.consecutive.saturating_add(1);

        let decision = if self.consecutive >= self.limit {
            ErrorDecision::Stop(TrackingNotice::GpsUnavailable)
        } else {
            match error {
                GeolocationError::PermissionDenied => {
                    ErrorDecision::Stop(TrackingNotice::PermissionDenied)
                }
                GeolocationError::PositionUnavailable(_) => {
                    ErrorDecision::Continue(TrackingNotice::SignalLost)
                }
                GeolocationError::Timeout => ErrorDecision::Continue(TrackingNotice::SlowFix),
            }
        };

        if decision.is_terminal() {
            tracing::warn!(
                error = %error,
                consecutive = self.consecutive,
                limit = self.limit,
                "Terminal geolocation error"
            );
        } else {
            tracing::debug!(
                error = %error,
                consecutive = self.consecutive,
                "Transient geolocation error"
            );
        }

        decision
    }

    /// A good sample clears the streak.
    pub fn on_success(&mut self) {
        if self.consecutive > 0 {
            tracing::debug!(cleared = self.consecutive, "Error streak cleared");
        }
        self.consecutive = 0;
    }

    pub fn reset(&mut self) {
        self.consecutive = 0;
    }

    pub fn consecutive(&self) -> u32 {
        self.consecutive
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unavailable() -> GeolocationError {
        GeolocationError::PositionUnavailable(None)
    }

    #[test]
    fn test_transient_classes() {
        let mut policy = ErrorPolicy::new(5);
        assert_eq!(
            policy.on_error(&unavailable()),
            ErrorDecision::Continue(TrackingNotice::SignalLost)
        );
        assert_eq!(
            policy.on_error(&GeolocationError::Timeout),
            ErrorDecision::Continue(TrackingNotice::SlowFix)
        );
        assert_eq!(policy.consecutive(), 2);
    }

    #[test]
    fn test_permission_denied_is_terminal_on_first_error() {
        let mut policy = ErrorPolicy::new(5);
        assert_eq!(
            policy.on_error(&GeolocationError::PermissionDenied),
            ErrorDecision::Stop(TrackingNotice::PermissionDenied)
        );
    }

    #[test]
    fn test_limit_stops_on_fifth_error() {
        let mut policy = ErrorPolicy::new(5);
        for _ in 0..4 {
            assert!(!policy.on_error(&GeolocationError::Timeout).is_terminal());
        }
        assert_eq!(
            policy.on_error(&GeolocationError::Timeout),
            ErrorDecision::Stop(TrackingNotice::GpsUnavailable)
        );
    }

    #[test]
    fn test_limit_overrides_permission_class() {
        let mut policy = ErrorPolicy::new(5);
        for _ in 0..4 {
            policy.on_error(&unavailable());
        }
        let decision = policy.on_error(&GeolocationError::PermissionDenied);
        assert_eq!(decision.notice(), TrackingNotice::GpsUnavailable);
        assert!(decision.is_terminal());
    }

    #[test]
    fn test_success_resets_from_one_below_limit() {
        let mut policy = ErrorPolicy::new(5);
        for _ in 0..4 {
            policy.on_error(&unavailable());
        }
        assert_eq!(policy.consecutive(), 4);

        policy.on_success();
        assert_eq!(policy.consecutive(), 0);

        // Four more transient errors stay transient
        for _ in 0..4 {
            assert!(!policy.on_error(&unavailable()).is_terminal());
        }
    }
}
