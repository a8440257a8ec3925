//! # Trip Session
//!
//! Single owner of the state for one trip. Samples, ticks and geocode
//! results are applied strictly one at a time through `&mut self`; callers
//! that receive them concurrently serialize through [`MeterService`].
//!
//! [`MeterService`]: crate::MeterService

use std::sync::Arc;

use chrono::{DateTime, Utc};
use common::{Clock, LocationSample, Place, SystemClock, kmh_to_ms};
use route::{CompressedRoute, LiveRoute, RoutePoint};
use serde::{Deserialize, Serialize};
use signal::{Accumulators, DeadReckoningState, SampleUpdate, SignalEstimator, SignalState, TickUpdate};
use surcharge::{BoundaryState, BoundaryTracker, RegionChangeCounter, SurchargeMode, SurchargeStatus};
use tariff::{FareBreakdown, FareCalculator, FareInput, TariffRepository, TariffZone};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::geocode::{GeocodeGate, GeocodeRequest, GeocodeTicket};
use crate::settings::Settings;

/// Live view of the meter, published after every change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeterSnapshot {
    pub trip_id: Option<Uuid>,
    pub fare: i64,
    pub breakdown: FareBreakdown,
    pub signal_state: SignalState,
    pub dead_reckoning_state: DeadReckoningState,
    /// Running dead-reckoning estimate, not yet in the totals (meters).
    pub estimated_distance: f64,
    pub totals: Accumulators,
    pub surcharge: SurchargeStatus,
    pub boundary_cross_count: u32,
    pub region_changes: u32,
    pub current_region: Option<String>,
}

/// Closed trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripSummary {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    /// seconds
    pub duration: i64,
    pub tariff: String,
    pub mode: SurchargeMode,
    pub fare: i64,
    pub breakdown: FareBreakdown,
    pub totals: Accumulators,
    pub start_region: Option<String>,
    pub end_region: Option<String>,
    pub region_changes: u32,
    pub boundary: BoundaryState,
    pub route: CompressedRoute,
}

#[derive(Debug, Clone, Copy)]
struct ActiveTrip {
    id: Uuid,
    started_at: DateTime<Utc>,
}

/// Orchestrates the signal estimator, surcharge tracking, fare calculation
/// and the live route for one trip at a time.
pub struct TripSession {
    clock: Arc<dyn Clock>,
    settings: Arc<dyn Settings>,
    repository: TariffRepository,
    calculator: FareCalculator,
    mode: SurchargeMode,
    signal: SignalEstimator,
    boundary: BoundaryTracker,
    regions: RegionChangeCounter,
    route: LiveRoute,
    geocode: GeocodeGate,
    surcharge: SurchargeStatus,
    trip: Option<ActiveTrip>,
    last_fix: Option<LocationSample>,
    distance_at_geocode: f64,
}

impl TripSession {
    #[must_use]
    pub fn new(config: &Config, settings: Arc<dyn Settings>, clock: Arc<dyn Clock>) -> Self {
        let repository = TariffRepository::new(config.default_region.clone());
        let calculator = FareCalculator::new(repository.resolve(repository.default_region()).clone());

        Self {
            clock,
            settings,
            repository,
            calculator,
            mode: SurchargeMode::Off,
            signal: SignalEstimator::new(config.signal()),
            boundary: BoundaryTracker::new(),
            regions: RegionChangeCounter::new(),
            route: LiveRoute::new(config.route()),
            geocode: GeocodeGate::new(config.geocode_interval),
            surcharge: SurchargeStatus::inactive(),
            trip: None,
            last_fix: None,
            distance_at_geocode: 0.0,
        }
    }

    /// Session reading the wall clock in the configured time zone.
    #[must_use]
    pub fn with_system_clock(config: &Config, settings: Arc<dyn Settings>) -> Self {
        Self::new(config, settings, Arc::new(SystemClock::from_timezone(config.timezone)))
    }

    /// Tariff tables, for loading user tables between trips.
    pub const fn repository_mut(&mut self) -> &mut TariffRepository {
        &mut self.repository
    }

    #[must_use]
    pub const fn repository(&self) -> &TariffRepository {
        &self.repository
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.trip.is_some()
    }

    #[must_use]
    pub fn trip_id(&self) -> Option<Uuid> {
        self.trip.map(|trip| trip.id)
    }

    #[must_use]
    pub const fn calculator(&self) -> &FareCalculator {
        &self.calculator
    }

    /// Starts a new trip after a full reset, returning its id.
    ///
    /// The tariff, surcharge mode and low-speed threshold are fixed for the
    /// trip from the current settings. A known departure place starts
    /// boundary tracking immediately; otherwise the first resolved place
    /// becomes the departure.
    pub fn start(&mut self, departure: Option<&Place>) -> Uuid {
        self.reset();

        let table = self.repository.resolve(&self.settings.current_tariff()).clone();
        self.signal.set_low_speed_threshold(kmh_to_ms(table.low_speed_threshold_kmh));
        self.calculator =
            FareCalculator::new(table).with_flat_surcharge_amount(self.settings.flat_surcharge_amount());
        self.mode = self.settings.effective_mode();

        if let Some(place) = departure {
            self.boundary.start_tracking(place);
            self.regions.observe(place);
        }

        let trip = ActiveTrip { id: Uuid::new_v4(), started_at: self.clock.now_utc() };
        self.trip = Some(trip);
        info!(
            trip_id = %trip.id,
            tariff = %self.calculator.table().code,
            mode = %self.mode,
            departure_zone = ?self.boundary.departure_zone(),
            "trip started"
        );
        trip.id
    }

    /// Applies one location fix. Ignored when no trip is running.
    pub fn on_sample(&mut self, sample: &LocationSample) -> Option<SampleUpdate> {
        self.trip?;

        let update = self.signal.on_sample(sample);
        if !update.state.is_lost() {
            self.route.push(RoutePoint::from(sample));
            self.last_fix = Some(*sample);
        }
        if let Some(recovered) = update.recovered {
            info!(
                estimated_m = recovered.estimated_distance,
                elapsed_s = recovered.elapsed_time,
                expired = recovered.is_expired,
                "estimate applied on recovery"
            );
        }
        debug!(state = %update.state, delta_m = ?update.accepted_delta, "sample applied");
        Some(update)
    }

    /// Advances the watchdog and dead reckoning to the clock's now.
    pub fn tick(&mut self) -> Option<TickUpdate> {
        self.trip?;
        Some(self.signal.tick(self.clock.now_utc()))
    }

    /// Next reverse-geocode request for the latest good fix, if one is due.
    pub fn geocode_request(&mut self) -> Option<GeocodeRequest> {
        self.trip?;
        if self.signal.signal_state().is_lost() {
            return None;
        }
        let fix = self.last_fix?;
        self.geocode.request(fix.latitude, fix.longitude, fix.timestamp)
    }

    /// Applies a geocode result. Returns `true` when it changed the
    /// surcharge inputs; stale tickets and failures leave state unchanged.
    pub fn on_geocode(&mut self, ticket: GeocodeTicket, result: anyhow::Result<Place>) -> bool {
        if self.trip.is_none() || !self.geocode.accept(ticket) {
            return false;
        }

        let place = match result {
            Ok(place) => place,
            Err(err) => {
                let err = Error::GeocodeFailed(format!("{err:#}"));
                warn!(code = err.code(), description = %err.description(), "surcharge unchanged");
                return false;
            }
        };

        let total = self.signal.total_distance();
        let delta = total - self.distance_at_geocode;
        self.distance_at_geocode = total;

        self.surcharge = self.boundary.update(&place, delta, self.clock.now_utc(), self.mode);
        self.regions.observe(&place);
        true
    }

    /// Current fare.
    #[must_use]
    pub fn fare(&self) -> i64 {
        self.calculator.fare(&self.fare_input())
    }

    #[must_use]
    pub fn breakdown(&self) -> FareBreakdown {
        self.calculator.breakdown(&self.fare_input())
    }

    #[must_use]
    pub fn snapshot(&self) -> MeterSnapshot {
        let breakdown = self.breakdown();
        MeterSnapshot {
            trip_id: self.trip_id(),
            fare: breakdown.total_fare,
            breakdown,
            signal_state: self.signal.signal_state(),
            dead_reckoning_state: self.signal.dead_reckoning_state(),
            estimated_distance: self.signal.live_estimated_distance(),
            totals: self.signal.totals(),
            surcharge: self.surcharge.clone(),
            boundary_cross_count: self.boundary.boundary_cross_count(),
            region_changes: self.regions.change_count(),
            current_region: self.regions.current_region().map(ToString::to_string),
        }
    }

    /// Closes the trip: flushes dead reckoning, compresses the route and
    /// resets the session.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoActiveTrip`] when no trip is running.
    pub fn stop(&mut self) -> Result<TripSummary> {
        let Some(trip) = self.trip else {
            return Err(Error::NoActiveTrip);
        };

        let ended_at = self.clock.now_utc();
        if let Some(flushed) = self.signal.stop(ended_at) {
            info!(estimated_m = flushed.estimated_distance, "estimate applied at trip end");
        }

        let breakdown = self.breakdown();
        let route = self.route.finish();
        let summary = TripSummary {
            id: trip.id,
            started_at: trip.started_at,
            ended_at,
            duration: (ended_at - trip.started_at).num_seconds().max(0),
            tariff: self.calculator.table().code.clone(),
            mode: self.mode,
            fare: breakdown.total_fare,
            breakdown,
            totals: self.signal.totals(),
            start_region: self.regions.start_region().map(ToString::to_string),
            end_region: self.regions.current_region().map(ToString::to_string),
            region_changes: self.regions.change_count(),
            boundary: self.boundary.state().clone(),
            route,
        };

        info!(
            trip_id = %summary.id,
            fare = summary.fare,
            distance_m = summary.totals.total_distance,
            duration_s = summary.duration,
            route_points = summary.route.points.len(),
            "trip stopped"
        );

        self.reset();
        Ok(summary)
    }

    /// Drops all trip state. Results of in-flight geocode requests become
    /// stale.
    pub fn reset(&mut self) {
        self.signal.reset();
        self.boundary.reset();
        self.regions.reset();
        self.route.reset();
        self.geocode.reset();
        self.surcharge = SurchargeStatus::inactive();
        self.trip = None;
        self.last_fix = None;
        self.distance_at_geocode = 0.0;
    }

    fn fare_input(&self) -> FareInput {
        FareInput {
            high_speed_distance: self.signal.high_speed_distance(),
            low_speed_duration: self.signal.low_speed_duration(),
            zone: TariffZone::at(self.clock.now_utc(), self.clock.timezone()),
            mode: self.mode,
            surcharge: self.surcharge.clone(),
            region_changes: self.regions.change_count(),
        }
    }
}
