//! User-visible status messages emitted by the tracker.

use std::fmt;

/// Every message the tracker can show the user.
///
/// Keeping them in one enum lets tests assert on *which* notice was shown
/// without matching on wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingNotice {
    /// Tracking was switched on.
    Enabled,
    /// Tracking was switched off by the user.
    Disabled,
    /// The platform has no geolocation support.
    Unavailable,
    /// Location permission is denied; terminal.
    PermissionDenied,
    /// The fix was lost; the subscription keeps running.
    SignalLost,
    /// The fix is slow to arrive; the subscription keeps running.
    SlowFix,
    /// Too many consecutive errors; terminal.
    GpsUnavailable,
    /// Stopped after staying hidden too long.
    AutoStopped,
    /// A one-shot locate request was issued.
    Locating,
    /// A one-shot locate request failed.
    LocateFailed,
}

impl TrackingNotice {
    /// Message text shown to the user.
    pub fn message(&self) -> &'static str {
        match self {
            TrackingNotice::Enabled => "Live location on",
            TrackingNotice::Disabled => "Live location off",
            TrackingNotice::Unavailable => "GPS not available",
            TrackingNotice::PermissionDenied => {
                "Location permission denied. Allow location access in your settings to use live tracking"
            }
            TrackingNotice::SignalLost => "GPS signal lost, retrying...",
            TrackingNotice::SlowFix => "Location is taking longer than expected...",
            TrackingNotice::GpsUnavailable => "Live location stopped: GPS unavailable",
            TrackingNotice::AutoStopped => "Live location stopped to save battery",
            TrackingNotice::Locating => "Finding you...",
            TrackingNotice::LocateFailed => "Could not get location",
        }
    }

    /// Whether this notice reports the end of a session the user did not ask for.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TrackingNotice::PermissionDenied
                | TrackingNotice::GpsUnavailable
                | TrackingNotice::AutoStopped
        )
    }
}

impl fmt::Display for TrackingNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enabled_and_disabled_are_distinct() {
        assert_ne!(
            TrackingNotice::Enabled.message(),
            TrackingNotice::Disabled.message()
        );
    }

    #[test]
    fn test_terminal_notices() {
        assert!(TrackingNotice::PermissionDenied.is_terminal());
        assert!(TrackingNotice::GpsUnavailable.is_terminal());
        assert!(TrackingNotice::AutoStopped.is_terminal());
        assert!(!TrackingNotice::SignalLost.is_terminal());
        assert!(!TrackingNotice::SlowFix.is_terminal());
    }

    #[test]
    fn test_display_matches_message() {
        assert_eq!(
            TrackingNotice::GpsUnavailable.to_string(),
            TrackingNotice::GpsUnavailable.message()
        );
    }
}
