//! Distance helpers.
//!
//! Haversine is used for accumulated trip distance. The local planar
//! projection is only meant for short segments (route simplification).

pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Great-circle distance between two WGS84 coordinates in meters.
#[must_use]
pub fn haversine_distance_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();
    let a = (dlat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_M * c
}

/// Projects `(lat, lon)` onto a flat plane centred on `(origin_lat, origin_lon)`.
///
/// Returns `(x, y)` in meters, x pointing east and y north.
#[must_use]
pub fn project_local(origin_lat: f64, origin_lon: f64, lat: f64, lon: f64) -> (f64, f64) {
    let meters_per_degree = EARTH_RADIUS_M.to_radians();
    let x = (lon - origin_lon) * meters_per_degree * origin_lat.to_radians().cos();
    let y = (lat - origin_lat) * meters_per_degree;
    (x, y)
}
