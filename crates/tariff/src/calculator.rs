use serde::{Deserialize, Serialize};
use surcharge::{SurchargeMode, SurchargeStatus};

use crate::table::{FareComponents, TariffTable};
use crate::zone::TariffZone;

/// Metering signals for one fare calculation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FareInput {
    /// Meters driven at or above the low-speed threshold.
    pub high_speed_distance: f64,
    /// Seconds spent below the low-speed threshold.
    pub low_speed_duration: f64,
    pub zone: TariffZone,
    pub mode: SurchargeMode,
    /// Realistic-mode surcharge.
    pub surcharge: SurchargeStatus,
    /// Fun-mode neighbourhood changes.
    pub region_changes: u32,
}

/// Fare split for display.
///
/// `distance_fare + time_fare` is the marginal fare. `night_surcharge` is
/// how much more the night zone costs than the day zone for the same trip;
/// it is already included in the other fields and is not added again.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FareBreakdown {
    pub zone: TariffZone,
    pub base_fare: i64,
    pub distance_fare: i64,
    pub time_fare: i64,
    pub region_surcharge: i64,
    pub night_surcharge: i64,
    pub total_fare: i64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Units {
    distance: f64,
    time: f64,
    extra: i64,
}

/// Computes fares from one region's tariff table.
#[derive(Debug, Clone)]
pub struct FareCalculator {
    table: TariffTable,
    flat_surcharge_amount: i64,
}

impl FareCalculator {
    #[must_use]
    pub fn new(table: TariffTable) -> Self {
        let flat_surcharge_amount = table.flat_surcharge_amount;
        Self { table, flat_surcharge_amount }
    }

    /// Overrides the table's fun-mode amount per region change.
    #[must_use]
    pub const fn with_flat_surcharge_amount(mut self, amount: i64) -> Self {
        self.flat_surcharge_amount = amount;
        self
    }

    #[must_use]
    pub const fn table(&self) -> &TariffTable {
        &self.table
    }

    /// Total fare in currency units.
    #[must_use]
    pub fn fare(&self, input: &FareInput) -> i64 {
        let rates = self.table.components(input.zone);
        let marginal = marginal_fare(rates, Self::units(rates, input));
        let surcharge = self.region_surcharge(input, marginal);
        round_to_unit(rates.base_fare + marginal + surcharge, self.table.rounding_unit)
    }

    /// Fare with the marginal part split into distance and time shares.
    #[must_use]
    pub fn breakdown(&self, input: &FareInput) -> FareBreakdown {
        let rates = self.table.components(input.zone);
        let units = Self::units(rates, input);
        let marginal = marginal_fare(rates, units);
        let region_surcharge = self.region_surcharge(input, marginal);

        let metered = units.distance + units.time;
        let distance_fare = if metered > 0.0 {
            floor_to_i64(to_f64(marginal) * units.distance / metered)
        } else {
            0
        };

        let night_surcharge = if input.zone.is_night() {
            let day = &self.table.day;
            let day_fare = day.base_fare + marginal_fare(day, Self::units(day, input));
            (rates.base_fare + marginal - day_fare).max(0)
        } else {
            0
        };

        FareBreakdown {
            zone: input.zone,
            base_fare: rates.base_fare,
            distance_fare,
            time_fare: marginal - distance_fare,
            region_surcharge,
            night_surcharge,
            total_fare: round_to_unit(
                rates.base_fare + marginal + region_surcharge,
                self.table.rounding_unit,
            ),
        }
    }

    fn units(rates: &FareComponents, input: &FareInput) -> Units {
        let distance_unit = to_f64(rates.distance_unit_meters.max(1));
        let time_unit = to_f64(rates.time_unit_seconds.max(1));

        let distance = non_negative(input.high_speed_distance) / distance_unit;
        let time = non_negative(input.low_speed_duration) / time_unit;
        let base = to_f64(rates.base_distance_meters.max(0)) / distance_unit;

        Units { distance, time, extra: floor_to_i64((distance + time - base).max(0.0)) }
    }

    fn region_surcharge(&self, input: &FareInput, marginal: i64) -> i64 {
        match input.mode {
            SurchargeMode::Realistic if input.surcharge.is_active => {
                truncate_to_i64(to_f64(marginal) * input.surcharge.rate.max(0.0))
            }
            SurchargeMode::Fun => i64::from(input.region_changes) * self.flat_surcharge_amount,
            SurchargeMode::Realistic | SurchargeMode::Off => 0,
        }
    }
}

/// Rounds half up to a multiple of `unit`. Units below 2 leave `value`
/// unchanged.
#[must_use]
pub const fn round_to_unit(value: i64, unit: i64) -> i64 {
    if unit <= 1 {
        return value;
    }
    (value + unit / 2).div_euclid(unit) * unit
}

const fn marginal_fare(rates: &FareComponents, units: Units) -> i64 {
    units.extra * rates.distance_fare_per_unit
}

fn non_negative(value: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value.max(0.0) }
}

#[allow(clippy::cast_precision_loss)]
const fn to_f64(value: i64) -> f64 {
    value as f64
}

#[allow(clippy::cast_possible_truncation)]
fn floor_to_i64(value: f64) -> i64 {
    value.floor() as i64
}

#[allow(clippy::cast_possible_truncation)]
fn truncate_to_i64(value: f64) -> i64 {
    value.trunc() as i64
}
