use chrono::{DateTime, Utc};
use common::{LocationSample, haversine_distance_m};
use serde::{Deserialize, Serialize};

/// A stored route point. `speed` is km/h and never negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutePoint {
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: DateTime<Utc>,
    pub speed: f64,
    pub accuracy: f64,
}

impl RoutePoint {
    #[must_use]
    pub fn distance_to(&self, other: &Self) -> f64 {
        haversine_distance_m(self.latitude, self.longitude, other.latitude, other.longitude)
    }
}

impl From<&LocationSample> for RoutePoint {
    fn from(sample: &LocationSample) -> Self {
        Self {
            latitude: sample.latitude,
            longitude: sample.longitude,
            timestamp: sample.timestamp,
            speed: sample.speed_kmh(),
            accuracy: sample.horizontal_accuracy,
        }
    }
}
