use std::time::Duration;

use common::project_local;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::point::RoutePoint;

/// Minimum spacing between points kept by [`downsample`].
pub const DOWNSAMPLE_INTERVAL: Duration = Duration::from_secs(5);

/// Storage-ready route.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompressedRoute {
    pub points: Vec<RoutePoint>,
    /// Points handed to compression.
    pub input_count: usize,
    /// Douglas-Peucker tolerance used (meters).
    pub tolerance: f64,
}

/// Simplification tolerance for a trip of `trip_distance` meters.
#[must_use]
pub fn tolerance_for(trip_distance: f64) -> f64 {
    if trip_distance < 100_000.0 {
        10.0
    } else if trip_distance < 300_000.0 {
        20.0
    } else {
        30.0
    }
}

/// Downsamples then simplifies `points`.
///
/// First and last points always survive unchanged.
#[must_use]
pub fn compress(points: &[RoutePoint], trip_distance: f64) -> CompressedRoute {
    let tolerance = tolerance_for(trip_distance);
    let sampled = downsample(points, DOWNSAMPLE_INTERVAL);
    let simplified = simplify(&sampled, tolerance);

    info!(
        input = points.len(),
        sampled = sampled.len(),
        output = simplified.len(),
        tolerance_m = tolerance,
        "route compressed"
    );

    CompressedRoute { points: simplified, input_count: points.len(), tolerance }
}

/// Keeps the first point, every point at least `interval` after the
/// previously kept one, and the last point.
#[must_use]
pub fn downsample(points: &[RoutePoint], interval: Duration) -> Vec<RoutePoint> {
    let Some((first, rest)) = points.split_first() else {
        return Vec::new();
    };

    let mut kept = vec![*first];
    let mut last_kept = *first;
    for point in rest {
        let elapsed = (point.timestamp - last_kept.timestamp).to_std().unwrap_or_default();
        if elapsed >= interval {
            kept.push(*point);
            last_kept = *point;
        }
    }

    if let Some(last) = points.last()
        && points.len() > 1
        && last_kept != *last
    {
        kept.push(*last);
    }
    kept
}

/// Douglas-Peucker simplification over a local planar projection.
///
/// Iterative, so very long routes cannot overflow the stack. Ties on the
/// maximum distance go to the earliest point, which makes the result stable
/// when applied again with the same tolerance.
#[must_use]
pub fn simplify(points: &[RoutePoint], tolerance: f64) -> Vec<RoutePoint> {
    if points.len() <= 2 {
        return points.to_vec();
    }

    let mut keep = vec![false; points.len()];
    keep[0] = true;
    keep[points.len() - 1] = true;

    let mut stack = vec![(0, points.len() - 1)];
    while let Some((start, end)) = stack.pop() {
        if end - start < 2 {
            continue;
        }

        let mut max_distance = 0.0;
        let mut split = start;
        for (index, point) in points.iter().enumerate().take(end).skip(start + 1) {
            let distance = segment_distance(point, &points[start], &points[end]);
            if distance > max_distance {
                max_distance = distance;
                split = index;
            }
        }

        if max_distance > tolerance {
            keep[split] = true;
            stack.push((start, split));
            stack.push((split, end));
        }
    }

    points.iter().zip(keep).filter_map(|(point, keep)| keep.then_some(*point)).collect()
}

/// Distance in meters from `point` to the segment `start`-`end`.
fn segment_distance(point: &RoutePoint, start: &RoutePoint, end: &RoutePoint) -> f64 {
    let project = |p: &RoutePoint| project_local(start.latitude, start.longitude, p.latitude, p.longitude);
    let (px, py) = project(point);
    let (ex, ey) = project(end);

    let length_sq = ex.mul_add(ex, ey * ey);
    if length_sq == 0.0 {
        return px.hypot(py);
    }

    let t = (px.mul_add(ex, py * ey) / length_sq).clamp(0.0, 1.0);
    (px - t * ex).hypot(py - t * ey)
}
