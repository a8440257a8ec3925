use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::compress::{CompressedRoute, compress, simplify, tolerance_for};
use crate::point::RoutePoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveRouteConfig {
    /// Hard cap on buffered points.
    pub max_points: usize,
    /// Buffer size that triggers in-trip simplification.
    pub simplify_threshold: usize,
    /// Size in-trip simplification aims for.
    pub simplify_target: usize,
}

impl Default for LiveRouteConfig {
    fn default() -> Self {
        Self { max_points: 10_000, simplify_threshold: 5_000, simplify_target: 3_000 }
    }
}

/// Tolerance escalation stops once it reaches this (meters).
const MAX_ESCALATED_TOLERANCE: f64 = 100.0;

/// Minimum spacing between buffered points for a trip of `distance` meters.
#[must_use]
pub fn point_interval_for(distance: f64) -> f64 {
    match distance {
        d if d < 10_000.0 => 5.0,
        d if d < 50_000.0 => 20.0,
        d if d < 100_000.0 => 50.0,
        d if d < 300_000.0 => 100.0,
        _ => 200.0,
    }
}

/// Route buffer for the running trip.
///
/// Point spacing widens as the trip gets longer and the buffer is
/// simplified in place when it grows past the threshold, so memory stays
/// bounded for arbitrarily long trips. The accumulated distance is measured
/// on the raw stream and is unaffected by simplification.
#[derive(Debug, Clone, Default)]
pub struct LiveRoute {
    config: LiveRouteConfig,
    points: Vec<RoutePoint>,
    last_raw: Option<RoutePoint>,
    distance: f64,
    interval: f64,
    raw_count: usize,
}

impl LiveRoute {
    #[must_use]
    pub fn new(config: LiveRouteConfig) -> Self {
        Self { config, interval: point_interval_for(0.0), ..Self::default() }
    }

    #[must_use]
    pub fn points(&self) -> &[RoutePoint] {
        &self.points
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Raw path length in meters.
    #[must_use]
    pub const fn distance(&self) -> f64 {
        self.distance
    }

    /// Points offered to the buffer since the last reset.
    #[must_use]
    pub const fn raw_count(&self) -> usize {
        self.raw_count
    }

    /// Offers a point, returning `true` when it was buffered.
    pub fn push(&mut self, point: RoutePoint) -> bool {
        self.raw_count += 1;

        let Some(previous) = self.last_raw.replace(point) else {
            self.interval = point_interval_for(0.0);
            self.points.push(point);
            return true;
        };

        self.distance += point.distance_to(&previous);
        let interval = point_interval_for(self.distance);
        if interval > self.interval {
            self.interval = interval;
            info!(interval_m = interval, distance_km = self.distance / 1000.0, "route point interval widened");
        }

        if let Some(last_kept) = self.points.last()
            && point.distance_to(last_kept) < self.interval
        {
            return false;
        }

        self.points.push(point);
        if self.points.len() > self.config.simplify_threshold {
            self.shrink();
        }
        true
    }

    /// Closes the route: appends the latest raw point if it was not buffered
    /// and compresses the result. The buffer is left empty.
    pub fn finish(&mut self) -> CompressedRoute {
        if let Some(last) = self.last_raw
            && self.points.last() != Some(&last)
        {
            self.points.push(last);
        }

        let route = compress(&self.points, self.distance);
        self.reset();
        route
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.config);
    }

    fn shrink(&mut self) {
        let before = self.points.len();
        let mut tolerance = tolerance_for(self.distance);
        let mut simplified = simplify(&self.points, tolerance);

        while simplified.len() > self.config.simplify_target && tolerance < MAX_ESCALATED_TOLERANCE {
            tolerance *= 1.5;
            simplified = simplify(&self.points, tolerance);
        }

        if simplified.len() > self.config.max_points {
            debug!(points = simplified.len(), "route still above cap, thinning");
            simplified = thin(&simplified);
        }

        info!(before, after = simplified.len(), tolerance_m = tolerance, "route simplified");
        self.points = simplified;
    }
}

/// Drops every other interior point, keeping both endpoints.
fn thin(points: &[RoutePoint]) -> Vec<RoutePoint> {
    let last = points.len().saturating_sub(1);
    points
        .iter()
        .enumerate()
        .filter(|(index, _)| *index == 0 || *index == last || index % 2 == 0)
        .map(|(_, point)| *point)
        .collect()
}
