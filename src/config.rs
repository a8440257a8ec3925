use std::env;
use std::time::Duration;

use chrono_tz::Tz;
use route::LiveRouteConfig;
use signal::SignalConfig;
use tariff::DEFAULT_REGION;

/// Runtime configuration for the meter.
#[derive(Debug, Clone)]
pub struct Config {
    /// Time zone used to pick the tariff zone.
    pub timezone: Tz,
    /// Tariff region used when the selected one is unknown or invalid.
    pub default_region: String,
    /// Minimum spacing of reverse-geocode requests.
    pub geocode_interval: Duration,
    /// Watchdog and dead-reckoning tick cadence of the service loop.
    pub tick_interval: Duration,
    /// Without a fix for this long the signal counts as lost.
    pub signal_loss_timeout: Duration,
    /// Live route buffer cap.
    pub route_max_points: usize,
}

impl Config {
    #[must_use]
    pub fn from_env() -> Self {
        let timezone = env::var("TIMEZONE")
            .ok()
            .and_then(|value| value.parse::<Tz>().ok())
            .unwrap_or(chrono_tz::Asia::Seoul);
        let default_region = env::var("DEFAULT_REGION")
            .ok()
            .map(|value| value.trim().to_ascii_lowercase())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_REGION.to_string());

        Self {
            timezone,
            default_region,
            geocode_interval: Duration::from_secs(env_u64("GEOCODE_INTERVAL", 10)),
            tick_interval: Duration::from_millis(env_u64("TICK_INTERVAL_MS", 1_000).max(1)),
            signal_loss_timeout: Duration::from_secs(env_u64("SIGNAL_LOSS_TIMEOUT", 5)),
            route_max_points: env_usize("ROUTE_MAX_POINTS", 10_000),
        }
    }

    /// Signal settings derived from this configuration.
    #[must_use]
    pub fn signal(&self) -> SignalConfig {
        SignalConfig { signal_loss_timeout: self.signal_loss_timeout, ..SignalConfig::default() }
    }

    /// Live route settings derived from this configuration.
    #[must_use]
    pub fn route(&self) -> LiveRouteConfig {
        let defaults = LiveRouteConfig::default();
        let max_points = self.route_max_points.max(2);
        LiveRouteConfig {
            max_points,
            simplify_threshold: defaults.simplify_threshold.min(max_points),
            simplify_target: defaults.simplify_target.min(max_points / 2),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key).ok().and_then(|value| value.trim().parse::<u64>().ok()).unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    env::var(key).ok().and_then(|value| value.trim().parse::<usize>().ok()).unwrap_or(default)
}
