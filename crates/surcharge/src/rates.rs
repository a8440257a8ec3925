/// Surcharge rate applied when a departure zone is not listed.
pub const DEFAULT_CITY_RATE: f64 = 0.20;

struct CityRate {
    names: &'static [&'static str],
    rate: f64,
}

const CITY_RATES: &[CityRate] = &[
    CityRate { names: &["seoul", "서울특별시", "서울"], rate: 0.20 },
    CityRate { names: &["busan", "부산광역시", "부산"], rate: 0.30 },
    CityRate { names: &["incheon", "인천광역시", "인천"], rate: 0.30 },
    CityRate { names: &["daegu", "대구광역시", "대구"], rate: 0.20 },
    CityRate { names: &["gwangju", "광주광역시"], rate: 0.20 },
    CityRate { names: &["daejeon", "대전광역시", "대전"], rate: 0.30 },
    CityRate { names: &["ulsan", "울산광역시", "울산"], rate: 0.20 },
    CityRate { names: &["sejong", "세종특별자치시", "세종"], rate: 0.20 },
    CityRate { names: &["gyeonggi", "경기도", "경기"], rate: 0.20 },
];

const SEOUL: &[&str] = &["seoul", "서울"];

// Administratively separate but part of Seoul's taxi business zone.
const SEOUL_INTEGRATED: &[&str] = &["gwangmyeong", "광명"];

// Shared between Seoul and neighbouring cities.
const SEOUL_SHARED: &[&str] = &["wirye", "위례"];

/// Surcharge rate for trips departing from `zone`.
///
/// Names match when either contains the other, ignoring ASCII case, so
/// "Seoul", "Seoul Special City" and "서울특별시" all resolve to Seoul.
#[must_use]
pub fn city_rate(zone: &str) -> f64 {
    let zone = normalize(zone);
    if zone.is_empty() {
        return DEFAULT_CITY_RATE;
    }

    CITY_RATES
        .iter()
        .find(|city| city.names.iter().any(|name| zone.contains(name) || name.contains(&zone)))
        .map_or(DEFAULT_CITY_RATE, |city| city.rate)
}

/// Whether a zone outside the departure zone still belongs to its business
/// zone.
///
/// Only Seoul has exceptions: Gwangmyeong (matched on area or locality) and
/// Wirye (matched on locality or sub-locality).
#[must_use]
pub fn is_special_zone_exception(
    departure_zone: &str, area: &str, locality: Option<&str>, sub_locality: Option<&str>,
) -> bool {
    if !contains_any(&normalize(departure_zone), SEOUL) {
        return false;
    }

    let area = normalize(area);
    let locality = normalize(locality.unwrap_or_default());
    let sub_locality = normalize(sub_locality.unwrap_or_default());

    contains_any(&area, SEOUL_INTEGRATED)
        || contains_any(&locality, SEOUL_INTEGRATED)
        || contains_any(&locality, SEOUL_SHARED)
        || contains_any(&sub_locality, SEOUL_SHARED)
}

/// Case-insensitive comparison of two zone names.
#[must_use]
pub fn same_zone(a: &str, b: &str) -> bool {
    normalize(a) == normalize(b)
}

fn contains_any(value: &str, names: &[&str]) -> bool {
    !value.is_empty() && names.iter().any(|name| value.contains(name))
}

fn normalize(value: &str) -> String {
    value.trim().to_ascii_lowercase()
}
