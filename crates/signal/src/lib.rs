//! # Signal Continuity
//!
//! Classifies GPS fixes by accuracy, accumulates the distance and time
//! signals used for combined metering, and bridges signal outages with a
//! dead-reckoning estimate.

mod dead_reckoning;
mod estimator;
mod state;

pub use self::dead_reckoning::*;
pub use self::estimator::*;
pub use self::state::*;
