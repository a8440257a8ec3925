use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::zone::TariffZone;

/// Region used when a requested tariff table cannot be resolved.
pub const DEFAULT_REGION: &str = "seoul";

/// Flat amount per neighbourhood change in fun mode.
pub const DEFAULT_FLAT_SURCHARGE: i64 = 2000;

/// Rates for one time-of-day zone. Money in currency units, distances in
/// meters, times in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FareComponents {
    pub base_fare: i64,
    pub base_distance_meters: i64,
    pub distance_unit_meters: i64,
    pub distance_fare_per_unit: i64,
    pub time_unit_seconds: i64,
    pub time_fare_per_unit: i64,
}

impl FareComponents {
    fn validate(&self, zone: TariffZone, errors: &mut Vec<String>) {
        let mut check = |ok: bool, rule: &str| {
            if !ok {
                errors.push(format!("{zone}: {rule}"));
            }
        };

        check((0..=100_000).contains(&self.base_fare), "base fare must be between 0 and 100000");
        check(
            (1..=10_000).contains(&self.base_distance_meters),
            "base distance must be between 1 and 10000 m",
        );
        check(
            (1..=1_000).contains(&self.distance_unit_meters),
            "distance unit must be between 1 and 1000 m",
        );
        check(
            (0..=10_000).contains(&self.distance_fare_per_unit),
            "distance fare must be between 0 and 10000",
        );
        check((1..=300).contains(&self.time_unit_seconds), "time unit must be between 1 and 300 s");
        check((0..=10_000).contains(&self.time_fare_per_unit), "time fare must be between 0 and 10000");
    }
}

/// Tariff of one region: independent rates per time-of-day zone plus the
/// region-wide metering settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TariffTable {
    pub code: String,
    pub name: String,
    pub day: FareComponents,
    pub night1: FareComponents,
    pub night2: FareComponents,
    /// Below this speed time is metered instead of distance.
    #[serde(default = "default_low_speed_threshold")]
    pub low_speed_threshold_kmh: f64,
    /// Fares are rounded half-up to a multiple of this.
    #[serde(default = "default_rounding_unit")]
    pub rounding_unit: i64,
    #[serde(default = "default_flat_surcharge")]
    pub flat_surcharge_amount: i64,
}

const fn default_low_speed_threshold() -> f64 {
    15.0
}

const fn default_rounding_unit() -> i64 {
    10
}

const fn default_flat_surcharge() -> i64 {
    DEFAULT_FLAT_SURCHARGE
}

impl TariffTable {
    /// Rates for `zone`.
    #[must_use]
    pub const fn components(&self, zone: TariffZone) -> &FareComponents {
        match zone {
            TariffZone::Day => &self.day,
            TariffZone::Night1 => &self.night1,
            TariffZone::Night2 => &self.night2,
        }
    }

    /// Returns every violated rule; empty when the table is usable.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push("name must not be empty".to_string());
        }
        for zone in [TariffZone::Day, TariffZone::Night1, TariffZone::Night2] {
            self.components(zone).validate(zone, &mut errors);
        }
        if self.rounding_unit < 1 {
            errors.push("rounding unit must be at least 1".to_string());
        }
        errors
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }

    /// Validates the table, returning it unchanged when usable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTable`] listing every violated rule.
    pub fn validated(self) -> Result<Self, Error> {
        let errors = self.validate();
        if errors.is_empty() {
            return Ok(self);
        }
        Err(Error::InvalidTable { code: self.code, errors })
    }

    /// Seoul metropolitan tariff.
    #[must_use]
    pub fn seoul() -> Self {
        Self::metropolitan("seoul", "서울")
    }

    /// Gyeonggi province tariff.
    #[must_use]
    pub fn gyeonggi() -> Self {
        Self::metropolitan("gyeonggi", "경기")
    }

    /// Incheon metropolitan tariff.
    #[must_use]
    pub fn incheon() -> Self {
        Self::metropolitan("incheon", "인천")
    }

    /// Tables shipped with the meter.
    #[must_use]
    pub fn built_in() -> Vec<Self> {
        vec![Self::seoul(), Self::gyeonggi(), Self::incheon()]
    }

    fn metropolitan(code: &str, name: &str) -> Self {
        let zone = |base_fare, fare_per_unit| FareComponents {
            base_fare,
            base_distance_meters: 1_600,
            distance_unit_meters: 131,
            distance_fare_per_unit: fare_per_unit,
            time_unit_seconds: 30,
            time_fare_per_unit: fare_per_unit,
        };

        Self {
            code: code.to_string(),
            name: name.to_string(),
            day: zone(4_800, 100),
            night1: zone(5_800, 120),
            night2: zone(6_700, 140),
            low_speed_threshold_kmh: default_low_speed_threshold(),
            rounding_unit: default_rounding_unit(),
            flat_surcharge_amount: DEFAULT_FLAT_SURCHARGE,
        }
    }
}
