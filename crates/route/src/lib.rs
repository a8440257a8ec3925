//! # Route
//!
//! Records the path of a trip in a bounded buffer while it runs and
//! compresses it for storage when it ends: temporal downsampling followed by
//! Douglas-Peucker simplification with a tolerance that grows with trip
//! length.

mod compress;
mod live;
mod point;

pub use self::compress::*;
pub use self::live::*;
pub use self::point::*;
