//! Intersection tests and overlap measures for footprint polygons.
//!
//! Footprints are oriented rectangles, so the boolean test uses separating
//! axes over convex polygons. `overlap_area` is the higher-fidelity
//! clipping measure used when the solver runs with
//! [`OverlapMeasure::ClippedArea`](crate::config::OverlapMeasure).

use super::utils_2d::{cross_2d, dot_2d, point_in_polygon, polygon_area, sub_2d};
use super::EPSILON;

/// Crossing point of segments `a0..a1` and `b0..b1` with both parameters.
///
/// Returns `(point, t, s)` where `point = a0 + t (a1 - a0) = b0 + s (b1 - b0)`
/// and both parameters lie in `[0, 1]`. Parallel segments never cross.
pub fn segment_intersection(
    a0: [f64; 2], a1: [f64; 2],
    b0: [f64; 2], b1: [f64; 2],
) -> Option<([f64; 2], f64, f64)> {
    let da = sub_2d(a1, a0);
    let db = sub_2d(b1, b0);
    let denom = cross_2d(da, db);
    if denom.abs() < 1e-10 {
        return None;
    }

    let w = sub_2d(b0, a0);
    let t = cross_2d(w, db) / denom;
    let s = cross_2d(w, da) / denom;
    let unit = 0.0..=1.0;
    if unit.contains(&t) && unit.contains(&s) {
        Some(([a0[0] + t * da[0], a0[1] + t * da[1]], t, s))
    } else {
        None
    }
}

/// Project every vertex onto `axis` and return (min, max).
fn project_onto_axis(polygon: &[[f64; 2]], axis: [f64; 2]) -> (f64, f64) {
    polygon.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
        let d = dot_2d(*p, axis);
        (lo.min(d), hi.max(d))
    })
}

/// Separating-axis test for two convex polygons.
///
/// Polygons that only touch along an edge or at a corner (overlap depth
/// below `EPSILON` on some axis) are reported as not intersecting.
pub fn polygons_intersect(a: &[[f64; 2]], b: &[[f64; 2]]) -> bool {
    if a.len() < 3 || b.len() < 3 {
        return false;
    }

    for polygon in [a, b] {
        let n = polygon.len();
        for i in 0..n {
            let edge = sub_2d(polygon[(i + 1) % n], polygon[i]);
            let len = (edge[0] * edge[0] + edge[1] * edge[1]).sqrt();
            if len < EPSILON {
                continue;
            }
            // Edge normal; unnormalized projections would scale the tolerance
            let axis = [-edge[1] / len, edge[0] / len];
            let (a_lo, a_hi) = project_onto_axis(a, axis);
            let (b_lo, b_hi) = project_onto_axis(b, axis);
            let depth = a_hi.min(b_hi) - a_lo.max(b_lo);
            if depth <= EPSILON {
                return false;
            }
        }
    }

    true
}

/// Smallest translation of `b` that ends its overlap with `a`.
///
/// Searches the edge normals of both convex polygons and returns the axis
/// with the least push, or `None` when the polygons do not intersect.
pub fn separation_vector(a: &[[f64; 2]], b: &[[f64; 2]]) -> Option<[f64; 2]> {
    if !polygons_intersect(a, b) {
        return None;
    }

    let mut best: Option<([f64; 2], f64)> = None;
    for polygon in [a, b] {
        let n = polygon.len();
        for i in 0..n {
            let edge = sub_2d(polygon[(i + 1) % n], polygon[i]);
            let len = (edge[0] * edge[0] + edge[1] * edge[1]).sqrt();
            if len < EPSILON {
                continue;
            }
            let axis = [-edge[1] / len, edge[0] / len];
            let (a_lo, a_hi) = project_onto_axis(a, axis);
            let (b_lo, b_hi) = project_onto_axis(b, axis);
            // Push b along +axis past a_hi, or along -axis below a_lo
            let forward = a_hi - b_lo;
            let backward = b_hi - a_lo;
            let (dir, push) = if forward <= backward { (axis, forward) } else { ([-axis[0], -axis[1]], backward) };
            if best.map_or(true, |(_, p)| push < p) {
                best = Some((dir, push));
            }
        }
    }
    best.map(|(dir, push)| [dir[0] * push, dir[1] * push])
}

/// Does the ray `origin + t * direction` (t >= 0) hit any edge of `polygon`?
///
/// A ray that starts inside the polygon counts as a hit.
pub fn ray_intersects_polygon(origin: [f64; 2], direction: [f64; 2], polygon: &[[f64; 2]]) -> bool {
    if polygon.len() < 3 {
        return false;
    }
    if point_in_polygon(origin, polygon) {
        return true;
    }

    let n = polygon.len();
    for i in 0..n {
        let p = polygon[i];
        let q = polygon[(i + 1) % n];
        let edge = sub_2d(q, p);
        let denom = cross_2d(direction, edge);
        if denom.abs() < 1e-12 {
            continue;
        }
        let w = sub_2d(p, origin);
        let t = cross_2d(w, edge) / denom;
        let s = cross_2d(w, direction) / denom;
        if t >= 0.0 && (-EPSILON..=1.0 + EPSILON).contains(&s) {
            return true;
        }
    }
    false
}

/// Area of the intersection of two convex polygons.
///
/// Collects the edge-edge crossings plus the corners of each polygon lying
/// inside the other, orders them by polar angle around their mean and
/// applies the shoelace formula. Disjoint or degenerate inputs yield 0.
pub fn overlap_area(a: &[[f64; 2]], b: &[[f64; 2]]) -> f64 {
    if a.len() < 3 || b.len() < 3 {
        return 0.0;
    }

    let mut vertices: Vec<[f64; 2]> = Vec::with_capacity(a.len() * b.len() + a.len() + b.len());

    let (na, nb) = (a.len(), b.len());
    for i in 0..na {
        for j in 0..nb {
            if let Some((p, _, _)) = segment_intersection(a[i], a[(i + 1) % na], b[j], b[(j + 1) % nb]) {
                vertices.push(p);
            }
        }
    }
    vertices.extend(a.iter().copied().filter(|p| point_in_polygon(*p, b)));
    vertices.extend(b.iter().copied().filter(|p| point_in_polygon(*p, a)));

    if vertices.len() < 3 {
        return 0.0;
    }

    let n = vertices.len() as f64;
    let cx = vertices.iter().map(|p| p[0]).sum::<f64>() / n;
    let cy = vertices.iter().map(|p| p[1]).sum::<f64>() / n;

    vertices.sort_by(|p, q| {
        let ap = (p[1] - cy).atan2(p[0] - cx);
        let aq = (q[1] - cy).atan2(q[0] - cx);
        ap.total_cmp(&aq)
    });

    let area = polygon_area(&vertices);
    if area.is_finite() {
        area
    } else {
        0.0
    }
}

/// Intersection over union of two convex polygons, 0 when either is degenerate.
pub fn intersection_over_union(a: &[[f64; 2]], b: &[[f64; 2]]) -> f64 {
    let inter = overlap_area(a, b);
    let union = polygon_area(a) + polygon_area(b) - inter;
    if union > EPSILON {
        inter / union
    } else {
        0.0
    }
}
