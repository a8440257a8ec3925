use chrono::{DateTime, Utc};
use common::Place;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::mode::{SurchargeMode, SurchargeStatus};
use crate::rates::{city_rate, is_special_zone_exception, same_zone};

/// Boundary-crossing state for realistic mode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundaryState {
    pub departure_zone: Option<String>,
    pub current_zone: Option<String>,
    pub is_outside: bool,
    /// Incremented once per inside-to-outside transition.
    pub boundary_cross_count: u32,
    /// Meters driven while the surcharge was active.
    pub surcharge_distance: f64,
    /// Seconds spent while the surcharge was active.
    pub surcharge_duration: f64,
}

/// Tracks the trip against its departure business zone.
///
/// Moving between two zones that are both outside the departure zone is not
/// a new crossing; only returning inside and leaving again is.
#[derive(Debug, Clone, Default)]
pub struct BoundaryTracker {
    state: BoundaryState,
    rate: f64,
    last_active_at: Option<DateTime<Utc>>,
}

impl BoundaryTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Anchors the trip to the business zone of its departure place.
    pub fn start_tracking(&mut self, departure: &Place) {
        self.reset();

        let zone = departure.business_zone();
        if zone.is_empty() {
            debug!("departure zone unknown, boundary tracking deferred");
            return;
        }

        self.rate = city_rate(zone);
        self.state.departure_zone = Some(zone.to_string());
        self.state.current_zone = Some(zone.to_string());
        info!(departure_zone = %zone, rate = self.rate, "boundary tracking started");
    }

    #[must_use]
    pub fn departure_zone(&self) -> Option<&str> {
        self.state.departure_zone.as_deref()
    }

    #[must_use]
    pub const fn is_tracking(&self) -> bool {
        self.state.departure_zone.is_some()
    }

    #[must_use]
    pub const fn state(&self) -> &BoundaryState {
        &self.state
    }

    #[must_use]
    pub const fn boundary_cross_count(&self) -> u32 {
        self.state.boundary_cross_count
    }

    #[must_use]
    pub const fn is_outside(&self) -> bool {
        self.state.is_outside
    }

    /// Current status without applying a new place.
    #[must_use]
    pub fn status(&self, mode: SurchargeMode) -> SurchargeStatus {
        if mode != SurchargeMode::Realistic || !self.state.is_outside {
            return self.zones(SurchargeStatus::inactive());
        }
        self.zones(SurchargeStatus { is_active: true, rate: self.rate, ..SurchargeStatus::inactive() })
    }

    /// Applies a newly resolved place.
    ///
    /// `distance_delta` is the distance driven since the previous update and
    /// only counts towards the surcharge distance while already outside.
    pub fn update(
        &mut self, place: &Place, distance_delta: f64, now: DateTime<Utc>, mode: SurchargeMode,
    ) -> SurchargeStatus {
        if mode != SurchargeMode::Realistic {
            return SurchargeStatus::inactive();
        }

        // no departure zone yet, the first resolved place becomes it
        let Some(departure) = self.state.departure_zone.clone() else {
            self.start_tracking(place);
            return self.status(mode);
        };

        let current = place.business_zone();
        if current.is_empty() {
            debug!("no business zone resolved, boundary state unchanged");
            return self.zones(SurchargeStatus::inactive());
        }
        self.state.current_zone = Some(current.to_string());

        let inside = same_zone(&departure, current)
            || is_special_zone_exception(
                &departure,
                current,
                place.locality_name(),
                place.sub_locality_name(),
            );

        if inside {
            if self.state.is_outside {
                info!(departure_zone = %departure, current_zone = %current, "returned to departure zone");
            }
            self.state.is_outside = false;
            self.last_active_at = None;
            return self.status(mode);
        }

        if self.state.is_outside {
            self.state.surcharge_distance += distance_delta.max(0.0);
            if let Some(last) = self.last_active_at {
                self.state.surcharge_duration += seconds_between(last, now);
            }
        } else {
            self.state.is_outside = true;
            self.state.boundary_cross_count += 1;
            info!(
                monotonic_counter.boundary_crossings = 1,
                departure_zone = %departure,
                current_zone = %current,
                rate = self.rate,
                "left departure zone, surcharge active"
            );
        }
        self.last_active_at = Some(now);

        self.status(mode)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn zones(&self, status: SurchargeStatus) -> SurchargeStatus {
        SurchargeStatus {
            departure_zone: self.state.departure_zone.clone(),
            current_zone: self.state.current_zone.clone(),
            ..status
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    ((to - from).num_milliseconds() as f64 / 1000.0).max(0.0)
}
