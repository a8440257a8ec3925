use serde::{Deserialize, Serialize};
use surcharge::SurchargeMode;
use tariff::{DEFAULT_FLAT_SURCHARGE, DEFAULT_REGION};

/// User preferences read at trip start. Persisting them is the host's job.
pub trait Settings: Send + Sync {
    /// Region code of the selected tariff table.
    fn current_tariff(&self) -> String;

    fn surcharge_mode(&self) -> SurchargeMode;

    /// Fun-mode amount charged per region change.
    fn flat_surcharge_amount(&self) -> i64;

    fn is_region_surcharge_enabled(&self) -> bool;

    /// Mode actually applied to the trip: disabling region surcharges wins
    /// over the selected mode.
    fn effective_mode(&self) -> SurchargeMode {
        if self.is_region_surcharge_enabled() { self.surcharge_mode() } else { SurchargeMode::Off }
    }
}

/// Fixed settings, for hosts that pass preferences in once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticSettings {
    pub tariff: String,
    pub surcharge_mode: SurchargeMode,
    pub flat_surcharge_amount: i64,
    pub region_surcharge_enabled: bool,
}

impl Default for StaticSettings {
    fn default() -> Self {
        Self {
            tariff: DEFAULT_REGION.to_string(),
            surcharge_mode: SurchargeMode::Realistic,
            flat_surcharge_amount: DEFAULT_FLAT_SURCHARGE,
            region_surcharge_enabled: true,
        }
    }
}

impl Settings for StaticSettings {
    fn current_tariff(&self) -> String {
        self.tariff.clone()
    }

    fn surcharge_mode(&self) -> SurchargeMode {
        self.surcharge_mode
    }

    fn flat_surcharge_amount(&self) -> i64 {
        self.flat_surcharge_amount
    }

    fn is_region_surcharge_enabled(&self) -> bool {
        self.region_surcharge_enabled
    }
}
