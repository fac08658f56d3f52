//! Tripmap - trip planning map core.
//!
//! Live position tracking with adaptive accuracy, throttled rendering and
//! battery-aware lifecycle handling, plus offline tile prefetch.

pub mod config;
pub mod geo;
pub mod logging;
pub mod prefetch;
pub mod tracking;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
