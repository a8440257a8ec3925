//! # Meter
//!
//! GPS taxi-fare metering engine. Location fixes drive the signal
//! estimator; reverse-geocoded places drive the regional surcharge; the
//! tariff calculator turns both into a fare; the live route is compressed
//! when the trip closes.
//!
//! [`TripSession`] owns all of that for one trip and is driven
//! synchronously. [`MeterService`] wraps it in a tokio task for hosts that
//! deliver fixes, ticks and geocode results concurrently.

mod config;
mod error;
mod geocode;
mod service;
mod session;
mod settings;

pub use common;
pub use route;
pub use signal;
pub use surcharge;
pub use tariff;

pub use self::config::Config;
pub use self::error::{Error, Result};
pub use self::geocode::{GeocodeGate, GeocodeRequest, GeocodeTicket, Geocoder};
pub use self::service::{Command, MeterHandle, MeterService};
pub use self::session::{MeterSnapshot, TripSession, TripSummary};
pub use self::settings::{Settings, StaticSettings};
