use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::haversine_distance_m;

/// A single GPS fix as delivered by the host location provider.
///
/// `speed` is in m/s with a negative value meaning "unknown"; a negative
/// `horizontal_accuracy` marks the fix as invalid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationSample {
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: DateTime<Utc>,
    pub speed: f64,
    pub horizontal_accuracy: f64,
}

impl LocationSample {
    #[must_use]
    pub const fn new(
        latitude: f64, longitude: f64, timestamp: DateTime<Utc>, speed: f64,
        horizontal_accuracy: f64,
    ) -> Self {
        Self { latitude, longitude, timestamp, speed, horizontal_accuracy }
    }

    #[must_use]
    pub fn has_known_speed(&self) -> bool {
        self.speed >= 0.0
    }

    /// Speed in km/h, clamped to zero when unknown.
    #[must_use]
    pub fn speed_kmh(&self) -> f64 {
        ms_to_kmh(self.speed.max(0.0))
    }

    /// Great-circle distance to `other` in meters.
    #[must_use]
    pub fn distance_to(&self, other: &Self) -> f64 {
        haversine_distance_m(self.latitude, self.longitude, other.latitude, other.longitude)
    }
}

#[must_use]
pub fn kmh_to_ms(kmh: f64) -> f64 {
    kmh / 3.6
}

#[must_use]
pub fn ms_to_kmh(ms: f64) -> f64 {
    ms * 3.6
}
