//! # Regional Surcharge
//!
//! Decides whether a regional surcharge applies to the running trip.
//!
//! In realistic mode the trip is anchored to the business zone (province or
//! metropolitan city) it departed from and a surcharge applies while the
//! vehicle is outside that zone. Fun mode counts neighbourhood changes
//! instead, which the fare calculator bills as a flat amount per change.

mod boundary;
mod mode;
mod rates;
mod region;

pub use self::boundary::*;
pub use self::mode::*;
pub use self::rates::*;
pub use self::region::*;
