//! Room boundary: containment, projection and wall queries.

use super::utils_2d::{
    closest_point_on_segment, distance, distance_squared, midpoint, normalize_2d, point_in_polygon,
    polygon_centroid, polygon_signed_area, sub_2d,
};
use super::EPSILON;
use crate::error::{LayoutError, LayoutResult};

/// One boundary edge. Edge `i` runs from vertex `i` to vertex `i + 1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wall {
    pub index: usize,
    pub start: [f64; 2],
    pub end: [f64; 2],
    /// Unit direction with the room interior on its left.
    pub direction: [f64; 2],
}

impl Wall {
    pub fn midpoint(&self) -> [f64; 2] {
        midpoint(self.start, self.end)
    }

    pub fn length(&self) -> f64 {
        distance(self.start, self.end)
    }

    /// Distance from `point` to this wall, clamped to the segment.
    pub fn distance_to(&self, point: [f64; 2]) -> f64 {
        distance(point, closest_point_on_segment(self.start, self.end, point))
    }
}

/// Nearest boundary point to a query point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundaryProjection {
    pub point: [f64; 2],
    pub edge: usize,
    pub distance: f64,
}

/// Simple polygon enclosing the layout.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomBoundary {
    vertices: Vec<[f64; 2]>,
    walls: Vec<Wall>,
    centroid: [f64; 2],
}

impl RoomBoundary {
    /// Build a boundary from an ordered vertex ring (either winding).
    pub fn new(vertices: Vec<[f64; 2]>) -> LayoutResult<Self> {
        if vertices.len() < 3 {
            return Err(LayoutError::InvalidBoundary(format!(
                "need at least 3 vertices, got {}",
                vertices.len()
            )));
        }
        if vertices.iter().any(|v| !v[0].is_finite() || !v[1].is_finite()) {
            return Err(LayoutError::InvalidBoundary("non-finite vertex".into()));
        }

        let signed_area = polygon_signed_area(&vertices);
        if signed_area.abs() < EPSILON {
            return Err(LayoutError::InvalidBoundary("zero area".into()));
        }

        let n = vertices.len();
        let mut walls = Vec::with_capacity(n);
        for i in 0..n {
            let start = vertices[i];
            let end = vertices[(i + 1) % n];
            if distance_squared(start, end) < EPSILON * EPSILON {
                return Err(LayoutError::InvalidBoundary(format!("edge {} has zero length", i)));
            }
            // Clockwise rings get their directions flipped so the interior stays on the left
            let along = normalize_2d(sub_2d(end, start));
            let direction = if signed_area > 0.0 { along } else { [-along[0], -along[1]] };
            walls.push(Wall { index: i, start, end, direction });
        }

        let centroid = polygon_centroid(&vertices);
        Ok(Self { vertices, walls, centroid })
    }

    pub fn vertices(&self) -> &[[f64; 2]] {
        &self.vertices
    }

    pub fn walls(&self) -> &[Wall] {
        &self.walls
    }

    pub fn wall(&self, index: usize) -> Option<&Wall> {
        self.walls.get(index)
    }

    pub fn centroid(&self) -> [f64; 2] {
        self.centroid
    }

    /// Is `point` inside the room or within `epsilon` of its boundary?
    pub fn contains(&self, point: [f64; 2], epsilon: f64) -> bool {
        if point_in_polygon(point, &self.vertices) {
            return true;
        }
        self.project_to_boundary(point)
            .map(|p| p.distance <= epsilon)
            .unwrap_or(false)
    }

    /// True if any corner lies outside the room by more than `epsilon`.
    pub fn violates_boundary(&self, corners: &[[f64; 2]], epsilon: f64) -> bool {
        corners.iter().any(|c| !self.contains(*c, epsilon))
    }

    /// Nearest point on the boundary, with the edge it lies on.
    pub fn project_to_boundary(&self, point: [f64; 2]) -> Option<BoundaryProjection> {
        self.walls
            .iter()
            .map(|wall| {
                let nearest = closest_point_on_segment(wall.start, wall.end, point);
                BoundaryProjection {
                    point: nearest,
                    edge: wall.index,
                    distance: distance(point, nearest),
                }
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }

    /// Distance from `point` to wall `index`, `None` if no such wall.
    pub fn distance_to_wall(&self, point: [f64; 2], index: usize) -> Option<f64> {
        self.wall(index).map(|w| w.distance_to(point))
    }

    /// Index of the wall nearest to `point`; ties go to the lower index.
    pub fn nearest_wall(&self, point: [f64; 2]) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for wall in &self.walls {
            let d = wall.distance_to(point);
            match best {
                Some((_, best_d)) if d >= best_d => {}
                _ => best = Some((wall.index, d)),
            }
        }
        best.map(|(i, _)| i)
    }
}
