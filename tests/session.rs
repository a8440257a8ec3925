#![allow(missing_docs)]


use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use chrono::{TimeZone, Utc};
use meter::common::Place;
use meter::signal::{DeadReckoningState, SignalState};
use meter::surcharge::SurchargeMode;
use meter::tariff::TariffZone;
use meter::{Config, Error, StaticSettings, TripSession};
use pretty_assertions::assert_eq;

use crate::provider::{CITY_LIMIT, ManualClock, afternoon, east, init_tracing};

fn config() -> Config {
    Config {
        timezone: chrono_tz::Asia::Seoul,
        default_region: "seoul".to_string(),
        geocode_interval: Duration::from_secs(10),
        tick_interval: Duration::from_secs(1),
        signal_loss_timeout: Duration::from_secs(5),
        route_max_points: 10_000,
    }
}

fn session(settings: StaticSettings, clock: &Arc<ManualClock>) -> TripSession {
    init_tracing();
    TripSession::new(&config(), Arc::new(settings), Arc::<ManualClock>::clone(clock))
}

fn city(longitude: f64) -> Place {
    if longitude < CITY_LIMIT {
        Place::area("Seoul").with_locality("Gangnam-gu")
    } else {
        Place::area("Gyeonggi-do").with_locality("Seongnam-si")
    }
}

// Three kilometres east at 36 km/h, leaving Seoul half way.
#[test]
fn realistic_trip_across_city_limit() {
    let clock = Arc::new(ManualClock::new(afternoon()));
    let mut session = session(StaticSettings::default(), &clock);
    let id = session.start(Some(&Place::area("Seoul")));

    for second in 0..=300 {
        let at = afternoon() + chrono::Duration::seconds(i64::from(second));
        let sample = east(f64::from(second) * 10.0, at, 10.0, 5.0);
        let update = session.on_sample(&sample).unwrap();
        assert_eq!(update.state, SignalState::Normal);

        if let Some(request) = session.geocode_request() {
            assert!(session.on_geocode(request.ticket, Ok(city(request.longitude))));
        }
        clock.advance(1);
    }

    let snapshot = session.snapshot();
    assert!(snapshot.surcharge.is_active);
    assert_eq!(snapshot.surcharge.departure_zone.as_deref(), Some("Seoul"));
    assert_eq!(snapshot.surcharge.current_zone.as_deref(), Some("Gyeonggi-do"));
    assert_eq!(snapshot.boundary_cross_count, 1);

    let summary = session.stop().unwrap();
    assert_eq!(summary.id, id);
    assert_eq!(summary.duration, 301);
    assert_eq!(summary.tariff, "seoul");
    assert_eq!(summary.mode, SurchargeMode::Realistic);

    // 22 distance units beyond the 12.2 base units, 20 % on the 1000 marginal
    assert_eq!(summary.breakdown.base_fare, 4_800);
    assert_eq!(summary.breakdown.region_surcharge, 200);
    assert_eq!(summary.fare, 6_000);

    assert!((summary.totals.total_distance - 3_000.0).abs() < 1.0);
    assert_eq!(summary.boundary.boundary_cross_count, 1);
    assert!((summary.boundary.surcharge_distance - 1_500.0).abs() < 1.0);
    assert!((summary.boundary.surcharge_duration - 150.0).abs() < f64::EPSILON);

    assert_eq!(summary.start_region.as_deref(), Some("Seoul"));
    assert_eq!(summary.end_region.as_deref(), Some("Seongnam-si"));
    assert_eq!(summary.region_changes, 2);

    let first = summary.route.points.first().unwrap();
    let last = summary.route.points.last().unwrap();
    assert_eq!(first.timestamp, afternoon());
    assert_eq!(last.timestamp, afternoon() + chrono::Duration::seconds(300));
    assert!((first.speed - 36.0).abs() < 1e-9);

    assert!(!session.is_active());
    assert_eq!(session.stop(), Err(Error::NoActiveTrip));
}

#[test]
fn fun_mode_charges_per_neighbourhood() {
    let clock = Arc::new(ManualClock::new(afternoon()));
    let settings = StaticSettings { surcharge_mode: SurchargeMode::Fun, ..StaticSettings::default() };
    let mut session = session(settings, &clock);
    session.start(None);

    let neighbourhoods = [("Gangnam-gu", "Yeoksam-dong"), ("Gangnam-gu", "Samseong-dong"), ("Songpa-gu", "Jamsil-dong")];
    for (step, (locality, sub_locality)) in (0_i64..).zip(neighbourhoods) {
        let at = afternoon() + chrono::Duration::seconds(step * 10);
        session.on_sample(&east(0.0, at, 0.0, 5.0));

        let request = session.geocode_request().unwrap();
        let place = Place::area("Seoul").with_locality(locality).with_sub_locality(sub_locality);
        assert!(session.on_geocode(request.ticket, Ok(place)));
    }

    let snapshot = session.snapshot();
    assert_eq!(snapshot.region_changes, 2);
    assert_eq!(snapshot.current_region.as_deref(), Some("Songpa-gu Jamsil-dong"));
    assert!(!snapshot.surcharge.is_active);
    assert_eq!(snapshot.breakdown.region_surcharge, 4_000);
    assert_eq!(snapshot.fare, 4_800 + 2 * 2_000);
}

#[test]
fn stale_geocode_result_is_discarded() {
    let clock = Arc::new(ManualClock::new(afternoon()));
    let mut session = session(StaticSettings::default(), &clock);
    session.start(Some(&Place::area("Seoul")));

    session.on_sample(&east(0.0, afternoon(), 10.0, 5.0));
    let first = session.geocode_request().unwrap();

    // a request inside the interval is not issued
    session.on_sample(&east(50.0, afternoon() + chrono::Duration::seconds(5), 10.0, 5.0));
    assert!(session.geocode_request().is_none());

    session.on_sample(&east(2_000.0, afternoon() + chrono::Duration::seconds(10), 10.0, 5.0));
    let second = session.geocode_request().unwrap();

    assert!(session.on_geocode(second.ticket, Ok(city(second.longitude))));
    assert!(!session.on_geocode(first.ticket, Ok(city(first.longitude))));

    let snapshot = session.snapshot();
    assert!(snapshot.surcharge.is_active);
    assert_eq!(snapshot.surcharge.current_zone.as_deref(), Some("Gyeonggi-do"));
    assert_eq!(snapshot.boundary_cross_count, 1);
}

#[test]
fn failed_geocode_changes_nothing() {
    let clock = Arc::new(ManualClock::new(afternoon()));
    let mut session = session(StaticSettings::default(), &clock);
    session.start(Some(&Place::area("Seoul")));

    session.on_sample(&east(0.0, afternoon(), 10.0, 5.0));
    let request = session.geocode_request().unwrap();
    assert!(!session.on_geocode(request.ticket, Err(anyhow!("request timed out"))));

    let snapshot = session.snapshot();
    assert!(!snapshot.surcharge.is_active);
    assert_eq!(snapshot.boundary_cross_count, 0);
}

#[test]
fn geocode_results_from_previous_trip_are_stale() {
    let clock = Arc::new(ManualClock::new(afternoon()));
    let mut session = session(StaticSettings::default(), &clock);
    session.start(Some(&Place::area("Seoul")));

    session.on_sample(&east(0.0, afternoon(), 10.0, 5.0));
    let request = session.geocode_request().unwrap();

    session.start(Some(&Place::area("Seoul")));
    assert!(!session.on_geocode(request.ticket, Ok(Place::area("Busan"))));
    assert_eq!(session.snapshot().boundary_cross_count, 0);
}

// 72 km/h into a tunnel: the watchdog declares the loss, dead reckoning
// runs on ticks, and the estimate lands in the totals on recovery.
#[test]
fn tunnel_keeps_the_meter_running() {
    let clock = Arc::new(ManualClock::new(afternoon()));
    let mut session = session(StaticSettings::default(), &clock);
    session.start(None);

    for second in 0..=10 {
        let at = afternoon() + chrono::Duration::seconds(i64::from(second));
        session.on_sample(&east(f64::from(second) * 20.0, at, 20.0, 5.0));
        clock.advance(1);
    }

    // clock is at 11 s; ticks up to 70 s
    let mut lost_at = None;
    for second in 11..=70 {
        let update = session.tick().unwrap();
        if update.timed_out {
            lost_at = Some(second);
        }
        if second < 70 {
            clock.advance(1);
        }
    }
    assert_eq!(lost_at, Some(16));

    let snapshot = session.snapshot();
    assert_eq!(snapshot.signal_state, SignalState::Lost);
    assert_eq!(snapshot.dead_reckoning_state, DeadReckoningState::Active);
    assert!((snapshot.estimated_distance - 1_080.0).abs() < 1e-6);
    assert!(session.geocode_request().is_none());

    clock.advance(1);
    let update = session.on_sample(&east(5_000.0, afternoon() + chrono::Duration::seconds(71), 20.0, 5.0)).unwrap();
    assert_eq!(update.previous, SignalState::Lost);
    // the recovery fix extends the estimate to 71 s
    assert!((update.recovered.unwrap().estimated_distance - 1_100.0).abs() < 1e-6);

    let totals = session.snapshot().totals;
    assert!((totals.estimated_distance - 1_100.0).abs() < 1e-6);
    assert!((totals.total_distance - 1_300.0).abs() < 1.0);
    assert!((totals.high_speed_distance - totals.total_distance).abs() < 1e-9);
}

#[test]
fn night_fare() {
    let late = chrono_tz::Asia::Seoul.with_ymd_and_hms(2025, 6, 10, 23, 30, 0).unwrap().with_timezone(&Utc);
    let clock = Arc::new(ManualClock::new(late));
    let mut session = session(StaticSettings::default(), &clock);
    session.start(None);

    let snapshot = session.snapshot();
    assert_eq!(snapshot.breakdown.zone, TariffZone::Night2);
    assert_eq!(snapshot.fare, 6_700);
    assert_eq!(session.fare(), 6_700);
}

#[test]
fn tariff_comes_from_settings() {
    let clock = Arc::new(ManualClock::new(afternoon()));
    let settings = StaticSettings { tariff: "custom_1".to_string(), ..StaticSettings::default() };
    let mut session = session(settings, &clock);

    let json = r#"[{
        "code": "custom_1",
        "name": "Slow city",
        "day": {"baseFare": 3000, "baseDistanceMeters": 1000, "distanceUnitMeters": 100,
                "distanceFarePerUnit": 50, "timeUnitSeconds": 60, "timeFarePerUnit": 50},
        "night1": {"baseFare": 3600, "baseDistanceMeters": 1000, "distanceUnitMeters": 100,
                   "distanceFarePerUnit": 60, "timeUnitSeconds": 60, "timeFarePerUnit": 60},
        "night2": {"baseFare": 4200, "baseDistanceMeters": 1000, "distanceUnitMeters": 100,
                   "distanceFarePerUnit": 70, "timeUnitSeconds": 60, "timeFarePerUnit": 70},
        "lowSpeedThresholdKmh": 30.0
    }]"#;
    assert_eq!(session.repository_mut().load_json(json).unwrap(), 1);

    session.start(None);
    assert_eq!(session.calculator().table().code, "custom_1");

    // 20 km/h is below this table's threshold, so it is metered as time
    for second in 0..=10 {
        let at = afternoon() + chrono::Duration::seconds(i64::from(second));
        session.on_sample(&east(f64::from(second) * 5.56, at, 5.56, 5.0));
    }

    let totals = session.snapshot().totals;
    assert!(totals.high_speed_distance.abs() < f64::EPSILON);
    assert!((totals.low_speed_duration - 10.0).abs() < f64::EPSILON);
    assert_eq!(session.fare(), 3_000);
}

#[test]
fn unknown_tariff_falls_back() {
    let clock = Arc::new(ManualClock::new(afternoon()));
    let settings = StaticSettings { tariff: "jeju".to_string(), ..StaticSettings::default() };
    let mut session = session(settings, &clock);

    session.start(None);
    assert_eq!(session.calculator().table().code, "seoul");
    assert_eq!(session.fare(), 4_800);
}
