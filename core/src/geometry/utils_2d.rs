//! Plain `[f64; 2]` helpers shared by the footprint, boundary and loss code.

use super::EPSILON;

// =============================================================================
// Points and vectors
// =============================================================================

/// Component-wise equality within `EPSILON`.
#[inline]
pub fn points_equal(a: [f64; 2], b: [f64; 2]) -> bool {
    (a[0] - b[0]).abs() < EPSILON && (a[1] - b[1]).abs() < EPSILON
}

/// Component-wise difference `a - b`.
#[inline]
pub fn sub_2d(a: [f64; 2], b: [f64; 2]) -> [f64; 2] {
    [a[0] - b[0], a[1] - b[1]]
}

/// Component-wise sum.
#[inline]
pub fn add_2d(a: [f64; 2], b: [f64; 2]) -> [f64; 2] {
    [a[0] + b[0], a[1] + b[1]]
}

/// Vector scaled by `s`.
#[inline]
pub fn scale_2d(v: [f64; 2], s: f64) -> [f64; 2] {
    [v[0] * s, v[1] * s]
}

/// 2D dot product.
#[inline]
pub fn dot_2d(a: [f64; 2], b: [f64; 2]) -> f64 {
    a[0] * b[0] + a[1] * b[1]
}

/// z of the 3D cross product; positive when `b` turns counter-clockwise from `a`.
#[inline]
pub fn cross_2d(a: [f64; 2], b: [f64; 2]) -> f64 {
    a[0] * b[1] - a[1] * b[0]
}

/// Euclidean length of `v`.
#[inline]
pub fn length_2d(v: [f64; 2]) -> f64 {
    v[0].hypot(v[1])
}

/// Squared distance, for comparisons that can skip the root.
#[inline]
pub fn distance_squared(a: [f64; 2], b: [f64; 2]) -> f64 {
    let d = sub_2d(b, a);
    dot_2d(d, d)
}

/// Euclidean distance between two points.
#[inline]
pub fn distance(a: [f64; 2], b: [f64; 2]) -> f64 {
    length_2d(sub_2d(b, a))
}

/// Point halfway between `a` and `b`.
#[inline]
pub fn midpoint(a: [f64; 2], b: [f64; 2]) -> [f64; 2] {
    [(a[0] + b[0]) * 0.5, (a[1] + b[1]) * 0.5]
}

/// Unit vector along `v`, or zero for a vector shorter than `EPSILON`.
#[inline]
pub fn normalize_2d(v: [f64; 2]) -> [f64; 2] {
    let len = length_2d(v);
    if len < EPSILON {
        [0.0, 0.0]
    } else {
        scale_2d(v, 1.0 / len)
    }
}

/// Counter-clockwise rotation by `radians`.
#[inline]
pub fn rotate_2d(v: [f64; 2], radians: f64) -> [f64; 2] {
    let (s, c) = radians.sin_cos();
    [c * v[0] - s * v[1], s * v[0] + c * v[1]]
}

/// Quarter turn clockwise.
#[inline]
pub fn perpendicular_cw(v: [f64; 2]) -> [f64; 2] {
    [v[1], -v[0]]
}

// =============================================================================
// Segments
// =============================================================================

/// Nearest point of segment `start..end` to `point`.
///
/// A zero-length segment collapses to `start`.
pub fn closest_point_on_segment(start: [f64; 2], end: [f64; 2], point: [f64; 2]) -> [f64; 2] {
    let seg = sub_2d(end, start);
    let len_sq = dot_2d(seg, seg);
    if len_sq < EPSILON * EPSILON {
        return start;
    }
    let t = (dot_2d(sub_2d(point, start), seg) / len_sq).clamp(0.0, 1.0);
    add_2d(start, scale_2d(seg, t))
}

// =============================================================================
// Polygons
// =============================================================================

/// Shoelace area, positive for counter-clockwise winding.
pub fn polygon_signed_area(vertices: &[[f64; 2]]) -> f64 {
    if vertices.len() < 3 {
        return 0.0;
    }
    let twice: f64 = vertices
        .iter()
        .zip(vertices.iter().cycle().skip(1))
        .map(|(p, q)| cross_2d(*p, *q))
        .sum();
    twice * 0.5
}

/// Unsigned shoelace area.
pub fn polygon_area(vertices: &[[f64; 2]]) -> f64 {
    polygon_signed_area(vertices).abs()
}

/// Area centroid; falls back to the vertex mean for degenerate rings.
pub fn polygon_centroid(vertices: &[[f64; 2]]) -> [f64; 2] {
    if vertices.is_empty() {
        return [0.0, 0.0];
    }

    let mean = {
        let n = vertices.len() as f64;
        let sum = vertices.iter().fold([0.0, 0.0], |acc, p| add_2d(acc, *p));
        scale_2d(sum, 1.0 / n)
    };
    let area = polygon_signed_area(vertices);
    if area.abs() <= EPSILON {
        return mean;
    }

    let weighted = vertices
        .iter()
        .zip(vertices.iter().cycle().skip(1))
        .fold([0.0, 0.0], |acc, (p, q)| {
            let w = cross_2d(*p, *q);
            add_2d(acc, scale_2d(add_2d(*p, *q), w))
        });
    scale_2d(weighted, 1.0 / (6.0 * area))
}

/// Non-zero winding containment test; handles concave rings.
pub fn point_in_polygon(point: [f64; 2], polygon: &[[f64; 2]]) -> bool {
    if polygon.len() < 3 {
        return false;
    }

    let mut winding = 0i32;
    for (a, b) in polygon.iter().zip(polygon.iter().cycle().skip(1)) {
        let side = cross_2d(sub_2d(*b, *a), sub_2d(point, *a));
        if a[1] <= point[1] {
            if b[1] > point[1] && side > 0.0 {
                winding += 1;
            }
        } else if b[1] <= point[1] && side < 0.0 {
            winding -= 1;
        }
    }
    winding != 0
}
