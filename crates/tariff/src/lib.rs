//! # Tariff
//!
//! Converts the metering accumulators into a fare using combined metering:
//! distance driven above the low-speed threshold and time spent below it
//! share one pool of billing units, charged at the zone's per-unit rate once
//! the free base distance is used up.
//!
//! Each time-of-day zone (day, night 1, night 2) has its own independent
//! rate table.

mod calculator;
mod error;
mod repository;
mod table;
mod zone;

pub use self::calculator::*;
pub use self::error::*;
pub use self::repository::*;
pub use self::table::*;
pub use self::zone::*;
