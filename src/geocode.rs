//! Reverse-geocoding seam and request gating.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::Place;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Resolves a coordinate to a place. Implemented by the host.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn reverse_geocode(&self, latitude: f64, longitude: f64) -> Result<Place>;
}

/// Sequence number handed out with every issued request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GeocodeTicket(u64);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeocodeRequest {
    pub ticket: GeocodeTicket,
    pub latitude: f64,
    pub longitude: f64,
}

/// Rate limits reverse-geocode requests and discards out-of-order results.
///
/// Only the most recently issued ticket is accepted, so a slow response
/// never overwrites a newer one.
#[derive(Debug, Clone, Default)]
pub struct GeocodeGate {
    interval: Duration,
    last_issued_at: Option<DateTime<Utc>>,
    latest: u64,
}

impl GeocodeGate {
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self { interval, ..Self::default() }
    }

    /// Issues a request for the coordinate if the interval has elapsed since
    /// the previous one.
    pub fn request(&mut self, latitude: f64, longitude: f64, now: DateTime<Utc>) -> Option<GeocodeRequest> {
        if let Some(last) = self.last_issued_at {
            let elapsed = (now - last).to_std().unwrap_or_default();
            if elapsed < self.interval {
                return None;
            }
        }

        self.latest += 1;
        self.last_issued_at = Some(now);
        Some(GeocodeRequest { ticket: GeocodeTicket(self.latest), latitude, longitude })
    }

    /// Whether a result carrying `ticket` may be applied.
    #[must_use]
    pub fn accept(&self, ticket: GeocodeTicket) -> bool {
        let current = ticket.0 == self.latest && self.latest > 0;
        if !current {
            debug!(
                monotonic_counter.stale_geocode_results = 1,
                ticket = ticket.0,
                latest = self.latest,
                "stale geocode result discarded"
            );
        }
        current
    }

    /// Forgets the schedule. Tickets keep increasing so results from before
    /// the reset stay stale.
    pub fn reset(&mut self) {
        self.last_issued_at = None;
        self.latest += 1;
    }
}
