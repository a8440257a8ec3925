use std::time::Duration;

use chrono::{DateTime, Utc};
use common::{LocationSample, kmh_to_ms};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::dead_reckoning::{
    DeadReckoning, DeadReckoningConfig, DeadReckoningResult, DeadReckoningState,
    LastKnownLocation,
};
use crate::state::SignalState;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalConfig {
    /// Speed (m/s) splitting distance metering from time metering.
    pub low_speed_threshold: f64,
    /// Fixes at or above this accuracy (meters) are not used for distance.
    pub max_accuracy: f64,
    /// Deltas longer than this (meters) are discarded as noise.
    pub max_jump: f64,
    /// Without a fix for this long the signal counts as lost.
    pub signal_loss_timeout: Duration,
    pub dead_reckoning: DeadReckoningConfig,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            low_speed_threshold: kmh_to_ms(15.0),
            max_accuracy: 50.0,
            max_jump: 100.0,
            signal_loss_timeout: Duration::from_secs(5),
            dead_reckoning: DeadReckoningConfig::default(),
        }
    }
}

/// Running totals fed to the tariff calculator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Accumulators {
    /// All accepted movement plus applied estimates (meters), for display.
    pub total_distance: f64,
    /// Distance travelled at or above the low-speed threshold (meters).
    pub high_speed_distance: f64,
    /// Time spent below the low-speed threshold (seconds).
    pub low_speed_duration: f64,
    /// Sum of all dead-reckoning estimates applied this trip (meters).
    pub estimated_distance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleUpdate {
    pub state: SignalState,
    pub previous: SignalState,
    /// Distance delta added to the totals, if the fix was used.
    pub accepted_delta: Option<f64>,
    /// Estimate flushed because the signal came back.
    pub recovered: Option<DeadReckoningResult>,
}

impl SampleUpdate {
    #[must_use]
    pub fn changed(&self) -> bool {
        self.state != self.previous
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickUpdate {
    pub state: SignalState,
    pub dead_reckoning: DeadReckoningState,
    /// Live estimate of the running session (meters).
    pub estimated_distance: f64,
    /// Set when the tick itself declared the signal lost.
    pub timed_out: bool,
}

/// Owns the signal state, the metering accumulators and the dead-reckoning
/// session for one trip.
#[derive(Debug, Clone, Default)]
pub struct SignalEstimator {
    config: SignalConfig,
    state: SignalState,
    dead_reckoning: DeadReckoning,
    totals: Accumulators,
    last_known: Option<LastKnownLocation>,
    last_valid: Option<LocationSample>,
    last_valid_speed: f64,
    last_accepted: Option<LocationSample>,
    last_fix_at: Option<DateTime<Utc>>,
}

impl SignalEstimator {
    #[must_use]
    pub fn new(config: SignalConfig) -> Self {
        Self { config, dead_reckoning: DeadReckoning::new(config.dead_reckoning), ..Self::default() }
    }

    #[must_use]
    pub const fn config(&self) -> &SignalConfig {
        &self.config
    }

    /// Updates the speed used to split distance and time metering.
    pub fn set_low_speed_threshold(&mut self, threshold: f64) {
        self.config.low_speed_threshold = threshold;
    }

    #[must_use]
    pub const fn signal_state(&self) -> SignalState {
        self.state
    }

    #[must_use]
    pub const fn dead_reckoning_state(&self) -> DeadReckoningState {
        self.dead_reckoning.state()
    }

    #[must_use]
    pub const fn dead_reckoning(&self) -> &DeadReckoning {
        &self.dead_reckoning
    }

    #[must_use]
    pub const fn is_estimating(&self) -> bool {
        self.dead_reckoning.is_estimating()
    }

    /// Live estimate of the running dead-reckoning session (meters).
    #[must_use]
    pub const fn live_estimated_distance(&self) -> f64 {
        self.dead_reckoning.estimated_distance()
    }

    #[must_use]
    pub const fn totals(&self) -> Accumulators {
        self.totals
    }

    #[must_use]
    pub const fn high_speed_distance(&self) -> f64 {
        self.totals.high_speed_distance
    }

    #[must_use]
    pub const fn low_speed_duration(&self) -> f64 {
        self.totals.low_speed_duration
    }

    #[must_use]
    pub const fn total_distance(&self) -> f64 {
        self.totals.total_distance
    }

    #[must_use]
    pub const fn last_known_location(&self) -> Option<&LastKnownLocation> {
        self.last_known.as_ref()
    }

    /// Processes one fix: updates the signal state, drives dead reckoning
    /// on loss and recovery, then accumulates distance and time.
    pub fn on_sample(&mut self, sample: &LocationSample) -> SampleUpdate {
        self.last_fix_at = Some(sample.timestamp);

        let previous = self.state;
        let next = SignalState::classify(sample.horizontal_accuracy);
        let mut recovered = None;

        match next {
            SignalState::Lost => {
                self.enter_lost(sample.timestamp, "poor accuracy");
            }
            SignalState::Normal | SignalState::Weak => {
                if previous.is_lost() {
                    info!(accuracy_m = sample.horizontal_accuracy, "gps signal restored");
                    recovered = self.flush(sample.timestamp);
                } else if previous != next {
                    info!(from = %previous, to = %next, "gps signal state changed");
                }
                self.state = next;
                self.last_known = None;
                self.last_valid = Some(*sample);
                if sample.has_known_speed() {
                    self.last_valid_speed = sample.speed;
                }
            }
        }

        let accepted_delta = self.accumulate(sample);
        SampleUpdate { state: self.state, previous, accepted_delta, recovered }
    }

    /// Periodic tick: signal-loss watchdog plus one dead-reckoning step.
    pub fn tick(&mut self, now: DateTime<Utc>) -> TickUpdate {
        let mut timed_out = false;
        if !self.state.is_lost()
            && let Some(last_fix_at) = self.last_fix_at
            && (now - last_fix_at).to_std().is_ok_and(|gap| gap > self.config.signal_loss_timeout)
        {
            self.enter_lost(now, "no location update");
            timed_out = true;
        }

        let dead_reckoning = self.dead_reckoning.tick(now);
        TickUpdate {
            state: self.state,
            dead_reckoning,
            estimated_distance: self.dead_reckoning.estimated_distance(),
            timed_out,
        }
    }

    /// Flushes any running dead-reckoning session into the totals.
    pub fn stop(&mut self, now: DateTime<Utc>) -> Option<DeadReckoningResult> {
        self.flush(now)
    }

    pub fn reset(&mut self) {
        self.dead_reckoning.reset();
        self.state = SignalState::Normal;
        self.totals = Accumulators::default();
        self.last_known = None;
        self.last_valid = None;
        self.last_valid_speed = 0.0;
        self.last_accepted = None;
        self.last_fix_at = None;
    }

    fn enter_lost(&mut self, at: DateTime<Utc>, reason: &str) {
        if self.state.is_lost() {
            return;
        }

        error!(reason = reason, "gps signal lost");
        self.state = SignalState::Lost;

        if self.last_known.is_none()
            && let Some(location) = self.last_valid
        {
            let info =
                LastKnownLocation { location, speed: self.last_valid_speed, lost_at: at };
            info!(speed_ms = info.speed, "last known location captured");
            self.last_known = Some(info);
        }

        let started = match &self.last_known {
            Some(info) => self.dead_reckoning.start(info),
            None => {
                warn!("dead reckoning not started, no last known location");
                false
            }
        };

        // a running estimate covers the gap; without one the first fix after
        // recovery measures it from the last accepted fix
        if started {
            self.last_accepted = None;
        }
    }

    fn flush(&mut self, now: DateTime<Utc>) -> Option<DeadReckoningResult> {
        let result = self.dead_reckoning.stop(now)?;
        self.apply(&result);
        Some(result)
    }

    fn apply(&mut self, result: &DeadReckoningResult) {
        if result.estimated_distance <= 0.0 {
            return;
        }

        self.totals.total_distance += result.estimated_distance;
        self.totals.estimated_distance += result.estimated_distance;

        if result.last_known_speed >= self.config.low_speed_threshold {
            self.totals.high_speed_distance += result.estimated_distance;
            info!(estimated_m = result.estimated_distance, "estimate applied as distance");
        } else {
            self.totals.low_speed_duration += result.elapsed_time;
            info!(elapsed_s = result.elapsed_time, "estimate applied as time");
        }

        if result.is_expired {
            warn!(
                total_estimated_m = self.totals.estimated_distance,
                "expired estimate applied"
            );
        }
    }

    fn accumulate(&mut self, sample: &LocationSample) -> Option<f64> {
        let accuracy = sample.horizontal_accuracy;
        if !(0.0..self.config.max_accuracy).contains(&accuracy) {
            debug!(accuracy_m = accuracy, "fix ignored for distance");
            return None;
        }

        let is_high_speed = sample.speed >= self.config.low_speed_threshold;
        let mut accepted_delta = None;

        if let Some(previous) = self.last_accepted {
            let delta = sample.distance_to(&previous);
            if delta > self.config.max_jump {
                debug!(
                    monotonic_counter.discarded_jumps = 1,
                    delta_m = delta,
                    "implausible jump discarded"
                );
            } else {
                self.totals.total_distance += delta;
                if is_high_speed {
                    self.totals.high_speed_distance += delta;
                }
                accepted_delta = Some(delta);
            }

            if !is_high_speed && sample.has_known_speed() {
                let elapsed = (sample.timestamp - previous.timestamp)
                    .to_std()
                    .map_or(0.0, |elapsed| elapsed.as_secs_f64());
                self.totals.low_speed_duration += elapsed;
            }
        }

        self.last_accepted = Some(*sample);
        accepted_delta
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration as ChronoDuration, TimeZone};

    use super::*;

    const LAT: f64 = 37.5665;
    const LON: f64 = 126.978;

    fn at(second: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 12, 22, 9, 0, 0).unwrap() + ChronoDuration::seconds(second)
    }

    fn fix(second: i64, north: f64, speed: f64, accuracy: f64) -> LocationSample {
        LocationSample::new(LAT + north, LON, at(second), speed, accuracy)
    }

    #[test]
    fn high_speed_distance() {
        let mut estimator = SignalEstimator::default();
        estimator.on_sample(&fix(0, 0.0, 20.0, 10.0));
        estimator.on_sample(&fix(3, 0.0005, 20.0, 10.0));
        estimator.on_sample(&fix(6, 0.001, 20.0, 10.0));

        assert!((estimator.high_speed_distance() - 111.2).abs() < 0.5);
        assert!((estimator.total_distance() - estimator.high_speed_distance()).abs() < 1e-9);
        assert!(estimator.low_speed_duration().abs() < f64::EPSILON);
    }

    #[test]
    fn low_speed_time() {
        let mut estimator = SignalEstimator::default();
        estimator.on_sample(&fix(0, 0.0, 2.0, 10.0));
        estimator.on_sample(&fix(1, 0.00001, 0.0, 10.0));
        estimator.on_sample(&fix(2, 0.00002, 2.0, 10.0));

        assert!((estimator.low_speed_duration() - 2.0).abs() < 1e-9);
        assert!(estimator.high_speed_distance().abs() < f64::EPSILON);
        assert!(estimator.total_distance() > 0.0);
    }

    #[test]
    fn unknown_speed_adds_no_time() {
        let mut estimator = SignalEstimator::default();
        estimator.on_sample(&fix(0, 0.0, -1.0, 10.0));
        estimator.on_sample(&fix(4, 0.0, -1.0, 10.0));

        assert!(estimator.low_speed_duration().abs() < f64::EPSILON);
        assert!(estimator.high_speed_distance().abs() < f64::EPSILON);
    }

    #[test]
    fn jump_is_discarded() {
        let mut estimator = SignalEstimator::default();
        estimator.on_sample(&fix(0, 0.0, 20.0, 10.0));
        let update = estimator.on_sample(&fix(1, 0.002, 20.0, 10.0));

        assert_eq!(update.accepted_delta, None);
        assert_eq!(update.state, SignalState::Normal);
        assert!(estimator.total_distance().abs() < f64::EPSILON);
    }

    #[test]
    fn inaccurate_fix_not_used_for_distance() {
        let mut estimator = SignalEstimator::default();
        estimator.on_sample(&fix(0, 0.0, 20.0, 10.0));
        let update = estimator.on_sample(&fix(3, 0.0005, 20.0, 60.0));

        assert_eq!(update.state, SignalState::Weak);
        assert!(update.changed());
        assert_eq!(update.accepted_delta, None);
        assert!(estimator.total_distance().abs() < f64::EPSILON);
    }

    #[test]
    fn loss_and_recovery() {
        let mut estimator = SignalEstimator::default();
        estimator.on_sample(&fix(0, 0.0, 20.0, 10.0));

        let lost = estimator.on_sample(&fix(1, 0.0, -1.0, 150.0));
        assert_eq!(lost.state, SignalState::Lost);
        assert!(estimator.is_estimating());
        let captured = estimator.last_known_location().unwrap();
        assert!((captured.speed - 20.0).abs() < f64::EPSILON);
        assert_eq!(captured.lost_at, at(1));

        for second in 2..=11 {
            estimator.tick(at(second));
        }
        assert!((estimator.live_estimated_distance() - 200.0).abs() < 1e-9);

        let recovered = estimator.on_sample(&fix(11, 0.002, 20.0, 10.0));
        let result = recovered.recovered.unwrap();
        assert!((result.estimated_distance - 200.0).abs() < 1e-9);
        assert_eq!(recovered.state, SignalState::Normal);
        assert_eq!(recovered.accepted_delta, None);
        assert!(!estimator.is_estimating());

        let totals = estimator.totals();
        assert!((totals.total_distance - 200.0).abs() < 1e-9);
        assert!((totals.high_speed_distance - 200.0).abs() < 1e-9);
        assert!((totals.estimated_distance - 200.0).abs() < 1e-9);
    }

    #[test]
    fn slow_estimate_counts_as_time() {
        let mut estimator = SignalEstimator::default();
        estimator.on_sample(&fix(0, 0.0, 2.5, 10.0));
        estimator.on_sample(&fix(1, 0.0, 2.5, 500.0));
        assert!(estimator.is_estimating());

        for second in 2..=21 {
            estimator.tick(at(second));
        }
        estimator.on_sample(&fix(21, 0.0, 2.5, 10.0));

        assert!((estimator.low_speed_duration() - 20.0).abs() < 1e-9);
        assert!(estimator.high_speed_distance().abs() < f64::EPSILON);
        assert!((estimator.total_distance() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn stationary_loss() {
        let mut estimator = SignalEstimator::default();
        estimator.on_sample(&fix(0, 0.0, 1.0, 10.0));
        estimator.on_sample(&fix(1, 0.0, 1.0, -1.0));

        assert_eq!(estimator.signal_state(), SignalState::Lost);
        assert!(!estimator.is_estimating());
        assert_eq!(estimator.dead_reckoning_state(), DeadReckoningState::Inactive);
    }

    #[test]
    fn stationary_outage_is_billed_as_time() {
        let mut estimator = SignalEstimator::default();
        estimator.on_sample(&fix(0, 0.0, 0.0, 10.0));
        estimator.on_sample(&fix(10, 0.0, 0.0, 10.0));
        assert!((estimator.low_speed_duration() - 10.0).abs() < 1e-9);

        estimator.on_sample(&fix(11, 0.0, -1.0, 150.0));
        assert_eq!(estimator.signal_state(), SignalState::Lost);
        assert!(!estimator.is_estimating());

        // ten minutes parked underground, then the signal returns in place
        let recovered = estimator.on_sample(&fix(611, 0.0, 0.0, 10.0));
        assert_eq!(recovered.recovered, None);
        assert!(recovered.accepted_delta.is_some());
        estimator.on_sample(&fix(621, 0.00001, 0.0, 10.0));

        assert!((estimator.low_speed_duration() - 621.0).abs() < 1e-9);
        assert!(estimator.high_speed_distance().abs() < f64::EPSILON);
    }

    #[test]
    fn moving_outage_does_not_double_count() {
        let mut estimator = SignalEstimator::default();
        estimator.on_sample(&fix(0, 0.0, 20.0, 10.0));
        estimator.on_sample(&fix(1, 0.0, -1.0, 150.0));
        assert!(estimator.is_estimating());

        for second in 2..=4 {
            estimator.tick(at(second));
        }
        let update = estimator.on_sample(&fix(4, 0.0005, 20.0, 10.0));
        assert_eq!(update.accepted_delta, None);
        assert!((estimator.total_distance() - 60.0).abs() < 1e-9);
    }

    #[test]
    fn watchdog_declares_loss() {
        let mut estimator = SignalEstimator::default();
        estimator.on_sample(&fix(0, 0.0, 20.0, 10.0));

        let quiet = estimator.tick(at(5));
        assert!(!quiet.timed_out);
        assert_eq!(quiet.state, SignalState::Normal);

        let update = estimator.tick(at(6));
        assert!(update.timed_out);
        assert_eq!(update.state, SignalState::Lost);
        assert_eq!(update.dead_reckoning, DeadReckoningState::Active);

        let again = estimator.tick(at(7));
        assert!(!again.timed_out);
    }

    #[test]
    fn stop_flushes_and_reset_clears() {
        let mut estimator = SignalEstimator::default();
        estimator.on_sample(&fix(0, 0.0, 20.0, 10.0));
        estimator.on_sample(&fix(1, 0.0, 20.0, 200.0));
        estimator.tick(at(2));
        estimator.tick(at(3));

        let result = estimator.stop(at(3)).unwrap();
        assert!((result.estimated_distance - 40.0).abs() < 1e-9);
        assert!((estimator.total_distance() - 40.0).abs() < 1e-9);
        assert!(estimator.stop(at(4)).is_none());

        estimator.reset();
        assert_eq!(estimator.totals(), Accumulators::default());
        assert_eq!(estimator.signal_state(), SignalState::Normal);
        assert!(estimator.last_known_location().is_none());
    }
}
