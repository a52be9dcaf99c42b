use nalgebra as na;

pub type Point3 = na::Point3<f64>;

pub const EPSILON: f64 = 1e-6;

/// Default tolerance for "corner outside the room" checks.
pub const BOUNDARY_EPSILON: f64 = 0.01;

pub trait ApproxEq {
    fn approx_eq(&self, other: &Self) -> bool;
}

impl ApproxEq for f64 {
    fn approx_eq(&self, other: &Self) -> bool {
        (self - other).abs() < EPSILON
    }
}

impl ApproxEq for Point3 {
    fn approx_eq(&self, other: &Self) -> bool {
        na::distance_squared(self, other) < EPSILON * EPSILON
    }
}

impl ApproxEq for [f64; 2] {
    fn approx_eq(&self, other: &Self) -> bool {
        utils_2d::points_equal(*self, *other)
    }
}

pub mod utils_2d;

pub mod intersection;
pub use intersection::*;

pub mod obb;
pub use obb::{entity_polygon, OrientedBox};

pub mod boundary;
pub use boundary::{BoundaryProjection, RoomBoundary, Wall};
