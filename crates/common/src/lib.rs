//! # Metering Common
//!
//! Types shared by the signal, surcharge, tariff and route crates.

mod clock;
mod geo;
mod place;
mod sample;

pub use self::clock::*;
pub use self::geo::*;
pub use self::place::*;
pub use self::sample::*;
