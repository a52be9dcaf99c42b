//! Oriented footprint boxes.
//!
//! An entity's footprint is a `width x depth` rectangle centred on its
//! position. The facing unit vector `u` is the local +depth axis (the
//! front); the local +width axis is `u` rotated a quarter turn clockwise.

use std::f64::consts::FRAC_PI_2;

use super::utils_2d::{add_2d, normalize_2d, perpendicular_cw, scale_2d};

/// Indices of the two back corners in the array returned by [`entity_polygon`].
pub const BACK_CORNERS: [usize; 2] = [0, 3];

/// Local corner offsets in units of half-extents, paired with the output order.
const LOCAL_CORNERS: [[f64; 2]; 4] = [[-1.0, -1.0], [-1.0, 1.0], [1.0, 1.0], [1.0, -1.0]];

/// Footprint rectangle of an entity in the floor plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientedBox {
    pub center: [f64; 2],
    /// Half width and half depth.
    pub half_extents: [f64; 2],
    /// Unit facing vector (local +depth).
    pub facing: [f64; 2],
}

impl OrientedBox {
    pub fn new(center: [f64; 2], width: f64, depth: f64, facing: [f64; 2]) -> Self {
        Self {
            center,
            half_extents: [width / 2.0, depth / 2.0],
            facing,
        }
    }

    /// Local offsets `(lx, ly)` of the four corners, matching [`corners`](Self::corners).
    pub fn local_corners(&self) -> [[f64; 2]; 4] {
        LOCAL_CORNERS.map(|c| [c[0] * self.half_extents[0], c[1] * self.half_extents[1]])
    }

    /// World corners: `center + lx * right + ly * facing`.
    pub fn corners(&self) -> [[f64; 2]; 4] {
        let right = perpendicular_cw(self.facing);
        self.local_corners().map(|[lx, ly]| {
            add_2d(self.center, add_2d(scale_2d(right, lx), scale_2d(self.facing, ly)))
        })
    }

    /// Half of the smaller footprint dimension.
    pub fn half_minor(&self) -> f64 {
        self.half_extents[0].min(self.half_extents[1])
    }

    /// Radius of the circle through the corners.
    pub fn circumradius(&self) -> f64 {
        self.half_extents[0].hypot(self.half_extents[1])
    }
}

/// Four corners of an entity footprint, back-left first, clockwise in the
/// local frame: `(-w/2,-d/2), (-w/2,d/2), (w/2,d/2), (w/2,-d/2)`.
pub fn entity_polygon(center: [f64; 2], size: [f64; 2], facing: [f64; 2]) -> [[f64; 2]; 4] {
    OrientedBox::new(center, size[0], size[1], facing).corners()
}

/// Facing unit vector for a yaw angle `rz` in radians.
pub fn facing_from_rotation(rz: f64) -> [f64; 2] {
    let (s, c) = (rz - FRAC_PI_2).sin_cos();
    [c, s]
}

/// Yaw angle in radians for a facing vector. A zero vector maps to facing `-y`.
pub fn rotation_from_facing(facing: [f64; 2]) -> f64 {
    let u = normalize_2d(facing);
    if u == [0.0, 0.0] {
        return 0.0;
    }
    u[1].atan2(u[0]) + FRAC_PI_2
}
