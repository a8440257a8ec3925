use std::time::Duration;

use chrono::{DateTime, Utc};
use common::{LocationSample, kmh_to_ms, ms_to_kmh};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeadReckoningConfig {
    /// Estimation stops growing once the session is this old.
    pub max_duration: Duration,
    /// Speeds below this (m/s) are treated as stationary and never start a session.
    pub min_speed: f64,
    /// Speed cap (m/s) applied to the last known speed.
    pub max_speed: f64,
}

impl Default for DeadReckoningConfig {
    fn default() -> Self {
        Self {
            max_duration: Duration::from_secs(300),
            min_speed: kmh_to_ms(5.0),
            max_speed: kmh_to_ms(200.0),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeadReckoningState {
    #[default]
    Inactive,
    Active,
    Expired,
}

/// Snapshot of the last good fix, captured when the signal is lost.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastKnownLocation {
    pub location: LocationSample,
    /// m/s
    pub speed: f64,
    pub lost_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeadReckoningResult {
    /// meters
    pub estimated_distance: f64,
    /// seconds
    pub elapsed_time: f64,
    /// m/s, after capping
    pub last_known_speed: f64,
    pub is_expired: bool,
}

/// Distance estimate for a single signal outage.
///
/// `Inactive -> Active` on [`start`](Self::start) with a valid speed,
/// `Active -> Expired` once `max_duration` has elapsed, and back to
/// `Inactive` on [`stop`](Self::stop). The estimate only grows while
/// `Active` and is frozen once `Expired`.
#[derive(Debug, Clone, Default)]
pub struct DeadReckoning {
    config: DeadReckoningConfig,
    state: DeadReckoningState,
    started_at: Option<DateTime<Utc>>,
    capped_speed: f64,
    estimated_distance: f64,
    elapsed_time: f64,
    last_estimated_distance: f64,
}

impl DeadReckoning {
    #[must_use]
    pub fn new(config: DeadReckoningConfig) -> Self {
        Self { config, ..Self::default() }
    }

    #[must_use]
    pub const fn state(&self) -> DeadReckoningState {
        self.state
    }

    #[must_use]
    pub const fn is_estimating(&self) -> bool {
        matches!(self.state, DeadReckoningState::Active)
    }

    /// Live estimate for the current session (meters).
    #[must_use]
    pub const fn estimated_distance(&self) -> f64 {
        self.estimated_distance
    }

    /// Seconds since the session started, frozen at expiry.
    #[must_use]
    pub const fn elapsed_time(&self) -> f64 {
        self.elapsed_time
    }

    #[must_use]
    pub const fn capped_speed(&self) -> f64 {
        self.capped_speed
    }

    /// Estimate returned by the most recent [`stop`](Self::stop).
    #[must_use]
    pub const fn last_estimated_distance(&self) -> f64 {
        self.last_estimated_distance
    }

    /// Starts a session from the last good fix.
    ///
    /// Returns `false` without changing state when a session is already
    /// running or the speed is unknown or below the stationary threshold.
    pub fn start(&mut self, info: &LastKnownLocation) -> bool {
        if self.state != DeadReckoningState::Inactive {
            debug!(state = ?self.state, "dead reckoning already running");
            return false;
        }

        if info.speed.is_nan() || info.speed < self.config.min_speed {
            info!(speed_kmh = ms_to_kmh(info.speed), "dead reckoning not started, speed below threshold");
            return false;
        }

        self.capped_speed = info.speed.min(self.config.max_speed);
        self.estimated_distance = 0.0;
        self.elapsed_time = 0.0;
        self.started_at = Some(info.lost_at);
        self.state = DeadReckoningState::Active;

        info!(speed_kmh = ms_to_kmh(self.capped_speed), "dead reckoning started");
        true
    }

    /// Grows the estimate to `now`. Ticks may arrive at any cadence; the
    /// estimate always covers the wall time since the loss.
    pub fn tick(&mut self, now: DateTime<Utc>) -> DeadReckoningState {
        self.advance(now);
        self.state
    }

    /// Ends the session and hands back the estimate.
    ///
    /// Returns `None` when no session was running.
    pub fn stop(&mut self, now: DateTime<Utc>) -> Option<DeadReckoningResult> {
        if self.state == DeadReckoningState::Inactive {
            return None;
        }

        self.advance(now);
        let is_expired = self.state == DeadReckoningState::Expired;

        let result = DeadReckoningResult {
            estimated_distance: self.estimated_distance,
            elapsed_time: self.elapsed_time,
            last_known_speed: self.capped_speed,
            is_expired,
        };

        info!(
            estimated_m = result.estimated_distance,
            elapsed_s = result.elapsed_time,
            expired = is_expired,
            "dead reckoning stopped"
        );

        self.last_estimated_distance = result.estimated_distance;
        self.clear();
        Some(result)
    }

    /// Drops any running session without reporting it.
    pub fn reset(&mut self) {
        self.clear();
        self.last_estimated_distance = 0.0;
    }

    fn advance(&mut self, now: DateTime<Utc>) {
        let (DeadReckoningState::Active, Some(started_at)) = (self.state, self.started_at) else {
            return;
        };

        let max_duration = self.config.max_duration.as_secs_f64();
        let elapsed = seconds_between(started_at, now).min(max_duration);
        if elapsed > self.elapsed_time {
            self.estimated_distance += self.capped_speed * (elapsed - self.elapsed_time);
            self.elapsed_time = elapsed;
        }

        if elapsed >= max_duration {
            self.state = DeadReckoningState::Expired;
            warn!(estimated_m = self.estimated_distance, "dead reckoning expired");
        }
    }

    fn clear(&mut self) {
        self.state = DeadReckoningState::Inactive;
        self.started_at = None;
        self.capped_speed = 0.0;
        self.estimated_distance = 0.0;
        self.elapsed_time = 0.0;
    }
}

#[allow(clippy::cast_precision_loss)]
fn seconds_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    ((to - from).num_milliseconds() as f64 / 1000.0).max(0.0)
}
