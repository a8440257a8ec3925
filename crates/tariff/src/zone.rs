use std::fmt::{self, Display};

use chrono::{DateTime, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Time-of-day rate zone.
///
/// Day is 04:00-22:00, Night1 is 22:00-23:00 and 02:00-04:00, Night2 is
/// 23:00-02:00 (local time).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TariffZone {
    #[default]
    Day,
    Night1,
    Night2,
}

impl TariffZone {
    /// Zone for a local hour of day (0-23).
    #[must_use]
    pub const fn from_hour(hour: u32) -> Self {
        match hour {
            22 | 2 | 3 => Self::Night1,
            23 | 0 | 1 => Self::Night2,
            _ => Self::Day,
        }
    }

    /// Zone in force at `at`, using the wall clock of `timezone`.
    #[must_use]
    pub fn at(at: DateTime<Utc>, timezone: Tz) -> Self {
        Self::from_hour(at.with_timezone(&timezone).hour())
    }

    #[must_use]
    pub const fn is_night(self) -> bool {
        !matches!(self, Self::Day)
    }
}

impl Display for TariffZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Day => "day",
            Self::Night1 => "night1",
            Self::Night2 => "night2",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use chrono_tz::Asia::Seoul;

    use super::*;

    fn seoul(hour: u32, minute: u32) -> DateTime<Utc> {
        Seoul.with_ymd_and_hms(2025, 12, 22, hour, minute, 0).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn boundaries() {
        assert_eq!(TariffZone::at(seoul(21, 59), Seoul), TariffZone::Day);
        assert_eq!(TariffZone::at(seoul(22, 0), Seoul), TariffZone::Night1);
        assert_eq!(TariffZone::at(seoul(22, 59), Seoul), TariffZone::Night1);
        assert_eq!(TariffZone::at(seoul(23, 0), Seoul), TariffZone::Night2);
        assert_eq!(TariffZone::at(seoul(0, 30), Seoul), TariffZone::Night2);
        assert_eq!(TariffZone::at(seoul(1, 59), Seoul), TariffZone::Night2);
        assert_eq!(TariffZone::at(seoul(2, 0), Seoul), TariffZone::Night1);
        assert_eq!(TariffZone::at(seoul(3, 59), Seoul), TariffZone::Night1);
        assert_eq!(TariffZone::at(seoul(4, 0), Seoul), TariffZone::Day);
    }

    #[test]
    fn uses_local_wall_clock() {
        // 13:30 UTC is 22:30 in Seoul
        let at = Utc.with_ymd_and_hms(2025, 12, 22, 13, 30, 0).unwrap();
        assert_eq!(TariffZone::at(at, Seoul), TariffZone::Night1);
        assert_eq!(TariffZone::at(at, chrono_tz::UTC), TariffZone::Day);
    }

    #[test]
    fn night_flag() {
        assert!(!TariffZone::Day.is_night());
        assert!(TariffZone::Night1.is_night());
        assert!(TariffZone::Night2.is_night());
    }
}
