//! Simulation script format.
//!
//! ```json
//! {
//!   "steps": [
//!     { "at_ms": 0,      "type": "position", "lat": 41.9, "lng": 12.5, "accuracy_m": 8 },
//!     { "at_ms": 1000,   "type": "error", "code": 3 },
//!     { "at_ms": 5000,   "type": "hidden" },
//!     { "at_ms": 65000,  "type": "visible" },
//!     { "at_ms": 70000,  "type": "permission", "state": "denied" }
//!   ]
//! }
//! ```
//!
//! Steps run in `at_ms` order. Tracking starts before the first step
//! unless `autostart` is `false`.

use std::path::Path;

use serde::Deserialize;
use tripmap::tracking::{PermissionState, PositionSample};

use crate::error::CliError;

/// Latest accepted step time: one week of script time.
pub const MAX_STEP_MS: u64 = 7 * 24 * 60 * 60 * 1000;

#[derive(Debug, Deserialize)]
pub struct Script {
    #[serde(default = "default_autostart")]
    pub autostart: bool,
    pub steps: Vec<Step>,
}

fn default_autostart() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct Step {
    /// Script time of the step, from the start of the run.
    pub at_ms: u64,
    #[serde(flatten)]
    pub action: Action,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    Position {
        lat: f64,
        lng: f64,
        #[serde(default = "default_accuracy")]
        accuracy_m: f64,
        #[serde(default)]
        heading: Option<f64>,
    },
    Error {
        code: u16,
        #[serde(default)]
        message: Option<String>,
    },
    Hidden,
    Visible,
    Permission {
        state: PermissionState,
    },
    Start,
    Stop,
    Toggle,
    Locate,
}

fn default_accuracy() -> f64 {
    10.0
}

impl Action {
    /// Build the sample for a `position` step.
    pub fn sample(&self) -> Option<PositionSample> {
        match self {
            Action::Position {
                lat,
                lng,
                accuracy_m,
                heading,
            } => {
                let sample = PositionSample::new(*lat, *lng, *accuracy_m);
                Some(match heading {
                    Some(h) => sample.with_heading(*h),
                    None => sample,
                })
            }
            _ => None,
        }
    }
}

impl Script {
    pub fn load(path: &Path) -> Result<Self, CliError> {
        let text = std::fs::read_to_string(path).map_err(|source| CliError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text).map_err(|message| CliError::Script {
            path: path.to_path_buf(),
            message,
        })
    }

    fn parse(text: &str) -> Result<Self, String> {
        let script: Script = serde_json::from_str(text).map_err(|e| e.to_string())?;

        if let Some(step) = script.steps.iter().find(|s| s.at_ms > MAX_STEP_MS) {
            return Err(format!(
                "step at {}ms is past the {}ms limit",
                step.at_ms, MAX_STEP_MS
            ));
        }

        if let Some(pair) = script.steps.windows(2).find(|w| w[1].at_ms < w[0].at_ms) {
            return Err(format!(
                "steps out of order: {}ms after {}ms",
                pair[1].at_ms, pair[0].at_ms
            ));
        }
        Ok(script)
    }
}
