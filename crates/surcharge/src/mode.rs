use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// How regional surcharges are applied to a trip.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurchargeMode {
    /// Percentage of the marginal fare while outside the departure business zone.
    #[default]
    Realistic,
    /// Flat amount for every neighbourhood change.
    Fun,
    Off,
}

impl Display for SurchargeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Realistic => "realistic",
            Self::Fun => "fun",
            Self::Off => "off",
        };
        f.write_str(name)
    }
}

/// Surcharge currently in force.
///
/// `rate` is a fraction (0.2 = 20 %) and is zero whenever `is_active` is
/// false.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurchargeStatus {
    pub is_active: bool,
    pub rate: f64,
    pub departure_zone: Option<String>,
    pub current_zone: Option<String>,
}

impl SurchargeStatus {
    #[must_use]
    pub const fn inactive() -> Self {
        Self { is_active: false, rate: 0.0, departure_zone: None, current_zone: None }
    }

    /// Whole-number percentage for display, e.g. `20`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn rate_percentage(&self) -> i64 {
        (self.rate * 100.0).round() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercase_names() {
        let json = serde_json::to_string(&SurchargeMode::Realistic).unwrap();
        assert_eq!(json, "\"realistic\"");
        let mode: SurchargeMode = serde_json::from_str("\"fun\"").unwrap();
        assert_eq!(mode, SurchargeMode::Fun);
        assert_eq!(SurchargeMode::Off.to_string(), "off");
    }

    #[test]
    fn inactive_has_no_rate() {
        let status = SurchargeStatus::inactive();
        assert!(!status.is_active);
        assert_eq!(status.rate_percentage(), 0);
    }
}
