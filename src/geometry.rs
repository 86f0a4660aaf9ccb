//! Pure geometry for path editing.
//!
//! The segment projection works in the raw lat/lng coordinate plane, not on
//! the geodesic: at trail scale (a few km) the planar approximation is more
//! than precise enough to pick the nearest segment, and it keeps the math
//! branch-free and exact for ties. Path length, in contrast, is haversine —
//! it is shown to users in meters.

use geo::{Distance, Haversine, Point};

use crate::Position;

/// Distance from point `p` to the closest point on segment `a`-`b`, in the
/// lat/lng coordinate plane.
///
/// Computes the projection parameter `t = dot(p-a, b-a) / |b-a|^2`, clamps it
/// to `[0, 1]` and returns the distance from `p` to the clamped point. A
/// degenerate segment (`a == b`) degrades to the distance from `p` to `a`.
pub fn point_to_segment_distance(p: Position, a: Position, b: Position) -> f64 {
    let (x, y) = (p.lng, p.lat);
    let (x1, y1) = (a.lng, a.lat);
    let (x2, y2) = (b.lng, b.lat);

    let dx = x2 - x1;
    let dy = y2 - y1;
    let len_sq = dx * dx + dy * dy;

    let t = if len_sq == 0.0 {
        0.0
    } else {
        (((x - x1) * dx + (y - y1) * dy) / len_sq).clamp(0.0, 1.0)
    };

    let px = x1 + t * dx;
    let py = y1 + t * dy;
    ((x - px).powi(2) + (y - py).powi(2)).sqrt()
}

/// Insertion index for placing point `p` into the polyline `coords`.
///
/// For a path of N >= 2 points, evaluates the N-1 consecutive segments and
/// returns `i + 1` for the segment `[i, i+1]` closest to `p`; ties are broken
/// by the first minimum encountered. For `coords.len() <= 1` the point is
/// appended (`coords.len()` is returned). The result is always a valid
/// insertion index in `[0, coords.len()]`.
pub fn nearest_insertion_index(coords: &[Position], p: Position) -> usize {
    if coords.len() <= 1 {
        return coords.len();
    }

    let mut best_idx = 1;
    let mut best_dist = f64::INFINITY;

    for i in 0..coords.len() - 1 {
        let d = point_to_segment_distance(p, coords[i], coords[i + 1]);
        if d < best_dist {
            best_dist = d;
            best_idx = i + 1;
        }
    }
    best_idx
}

/// Total haversine length of a polyline in meters.
pub fn path_length_meters(coords: &[Position]) -> f64 {
    coords
        .windows(2)
        .map(|w| haversine_distance(w[0], w[1]))
        .sum()
}

/// Haversine distance between two positions in meters.
pub fn haversine_distance(a: Position, b: Position) -> f64 {
    Haversine::distance(Point::new(a.lng, a.lat), Point::new(b.lng, b.lat))
}
