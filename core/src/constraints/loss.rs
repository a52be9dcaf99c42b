//! Loss evaluators with hand-derived gradients.
//!
//! Each evaluator returns a non-negative value and the gradient with respect
//! to the subject's `(x, y)` center and raw facing vector `(ux, uy)`. Target
//! quantities are read from a snapshot and never receive gradient.

use thiserror::Error;

use crate::config::SolverConfig;
use crate::geometry::obb::BACK_CORNERS;
use crate::geometry::utils_2d::{closest_point_on_segment, dot_2d, length_2d, rotate_2d, sub_2d};
use crate::geometry::{ray_intersects_polygon, Wall, EPSILON};
use crate::scene::{Anchor, Entity, EntityId, EntityRef, SceneRegistry};

use super::types::{Constraint, ConstraintKind};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LossError {
    #[error("entity '{0}' is not in the scene")]
    MissingEntity(EntityId),

    #[error("'{0}' is not a wall")]
    NotAWall(EntityId),

    #[error("{kind} loss for '{subject}' is not finite")]
    NonFinite { kind: &'static str, subject: EntityId },

    #[error("direction from '{subject}' to '{target}' is undefined")]
    DegenerateDirection { subject: EntityId, target: EntityId },
}

/// Gradient with respect to one entity's free parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EntityGrad {
    pub position: [f64; 2],
    pub facing: [f64; 2],
}

impl EntityGrad {
    pub fn add(&mut self, other: &EntityGrad) {
        self.position[0] += other.position[0];
        self.position[1] += other.position[1];
        self.facing[0] += other.facing[0];
        self.facing[1] += other.facing[1];
    }

    pub fn scaled(&self, s: f64) -> EntityGrad {
        EntityGrad {
            position: [self.position[0] * s, self.position[1] * s],
            facing: [self.facing[0] * s, self.facing[1] * s],
        }
    }

    pub fn is_finite(&self) -> bool {
        self.position.iter().chain(self.facing.iter()).all(|v| v.is_finite())
    }

    /// Push a gradient on a footprint corner with local offset `(lx, ly)`
    /// back onto the center and facing.
    pub fn from_corner(local: [f64; 2], g: [f64; 2]) -> EntityGrad {
        let [lx, ly] = local;
        EntityGrad {
            position: g,
            facing: [g[0] * ly - g[1] * lx, g[0] * lx + g[1] * ly],
        }
    }
}

/// Value and subject gradient of one constraint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LossTerm {
    pub value: f64,
    pub subject: usize,
    pub grad: EntityGrad,
}

impl LossTerm {
    fn zero(subject: usize) -> Self {
        Self { value: 0.0, subject, grad: EntityGrad::default() }
    }
}

/// Facing rotated clockwise by `angle_deg`.
pub fn offset_facing(facing: [f64; 2], angle_deg: f64) -> [f64; 2] {
    rotate_2d(facing, -angle_deg.to_radians())
}

/// `1 - cos(v, w)` and its gradient with respect to `v`.
fn cosine_loss(v: [f64; 2], w: [f64; 2]) -> Option<(f64, [f64; 2])> {
    let nv = length_2d(v);
    let nw = length_2d(w);
    if nv < EPSILON || nw < EPSILON {
        return None;
    }
    let w_hat = [w[0] / nw, w[1] / nw];
    let cos = dot_2d(v, w_hat) / nv;
    let nv2 = nv * nv;
    let dcos = [w_hat[0] / nv - cos * v[0] / nv2, w_hat[1] / nv - cos * v[1] / nv2];
    Some((1.0 - cos, [-dcos[0], -dcos[1]]))
}

/// Evaluate one filtered constraint against the current scene.
pub fn evaluate(constraint: &Constraint, scene: &SceneRegistry, config: &SolverConfig) -> Result<LossTerm, LossError> {
    let subject_index = scene
        .furniture_index(&constraint.subject)
        .ok_or_else(|| LossError::MissingEntity(constraint.subject.clone()))?;
    let subject = &scene.entities()[subject_index];

    if constraint.kind.is_structural() {
        return Ok(LossTerm::zero(subject_index));
    }

    let target = scene
        .anchor(&constraint.target)
        .ok_or_else(|| LossError::MissingEntity(constraint.target.clone()))?;

    let (value, grad) = match &constraint.kind {
        ConstraintKind::Distance { min, max, weight } => {
            distance_loss(subject, &target, *min, *max, *weight, config.distance_cap)
        }
        ConstraintKind::PointTowards { angle } => {
            point_towards_loss(subject, &target, *angle).ok_or_else(|| LossError::DegenerateDirection {
                subject: constraint.subject.clone(),
                target: constraint.target.clone(),
            })?
        }
        ConstraintKind::AlignWith { angle } => {
            align_with_loss(subject, &target, *angle).ok_or_else(|| LossError::DegenerateDirection {
                subject: constraint.subject.clone(),
                target: constraint.target.clone(),
            })?
        }
        ConstraintKind::AgainstWall => {
            let wall = match target.reference {
                EntityRef::Wall(i) => scene.room().wall(i),
                _ => None,
            }
            .ok_or_else(|| LossError::NotAWall(constraint.target.clone()))?;
            against_wall_loss(subject, wall, config).ok_or_else(|| LossError::DegenerateDirection {
                subject: constraint.subject.clone(),
                target: constraint.target.clone(),
            })?
        }
        ConstraintKind::OnTopOf | ConstraintKind::SkipOverlap => (0.0, EntityGrad::default()),
    };

    if !value.is_finite() || !grad.is_finite() {
        return Err(LossError::NonFinite {
            kind: constraint.kind.label(),
            subject: constraint.subject.clone(),
        });
    }

    Ok(LossTerm { value, subject: subject_index, grad })
}

/// `w * clamp(relu(min² - d²) + relu(d² - max²), <= cap)` on center distance.
pub fn distance_loss(
    subject: &Entity,
    target: &Anchor,
    min: Option<f64>,
    max: Option<f64>,
    weight: f64,
    cap: f64,
) -> (f64, EntityGrad) {
    let delta = sub_2d(subject.xy(), target.position);
    let d2 = dot_2d(delta, delta);

    let mut raw = 0.0;
    let mut coeff = 0.0;
    let min = min.unwrap_or(0.0);
    if min * min > d2 {
        raw += min * min - d2;
        coeff -= 2.0;
    }
    if let Some(max) = max {
        if d2 > max * max {
            raw += d2 - max * max;
            coeff += 2.0;
        }
    }

    if raw > cap {
        // Saturated hinge: flat, no gradient
        return (weight * cap, EntityGrad::default());
    }

    let grad = EntityGrad {
        position: [weight * coeff * delta[0], weight * coeff * delta[1]],
        facing: [0.0, 0.0],
    };
    (weight * raw, grad)
}

/// `1 - cos(offset facing, direction to target)`, zero once the facing ray hits the target.
///
/// `None` when the subject sits on the target's center.
pub fn point_towards_loss(subject: &Entity, target: &Anchor, angle: f64) -> Option<(f64, EntityGrad)> {
    let v = offset_facing(subject.facing, angle);
    if let Some(polygon) = &target.polygon {
        if ray_intersects_polygon(subject.xy(), v, polygon) {
            return Some((0.0, EntityGrad::default()));
        }
    }

    let direction = sub_2d(target.position, subject.xy());
    let (value, dv) = cosine_loss(v, direction)?;
    let grad = EntityGrad {
        position: [0.0, 0.0],
        facing: rotate_2d(dv, angle.to_radians()),
    };
    Some((value, grad))
}

/// `1 - cos(offset facing, target facing)`.
pub fn align_with_loss(subject: &Entity, target: &Anchor, angle: f64) -> Option<(f64, EntityGrad)> {
    let v = offset_facing(subject.facing, angle);
    let (value, dv) = cosine_loss(v, target.facing?)?;
    let grad = EntityGrad {
        position: [0.0, 0.0],
        facing: rotate_2d(dv, angle.to_radians()),
    };
    Some((value, grad))
}

/// Back corners flush against `wall` plus the subject's side parallel to it.
///
/// Distance part: `clamp(sum of back-corner distances to the wall, <= cap)`.
/// Alignment part: `weight * (1 - cos(facing rotated 90° clockwise, wall direction))`.
pub fn against_wall_loss(subject: &Entity, wall: &Wall, config: &SolverConfig) -> Option<(f64, EntityGrad)> {
    let footprint = subject.footprint();
    let locals = footprint.local_corners();
    let corners = footprint.corners();

    let mut dist = 0.0;
    let mut grad = EntityGrad::default();
    for i in BACK_CORNERS {
        let nearest = closest_point_on_segment(wall.start, wall.end, corners[i]);
        let diff = sub_2d(corners[i], nearest);
        let d = length_2d(diff);
        dist += d;
        // Flush corners have no defined direction; leave them be
        if d > EPSILON {
            grad.add(&EntityGrad::from_corner(locals[i], [diff[0] / d, diff[1] / d]));
        }
    }
    if dist > config.wall_distance_cap {
        dist = config.wall_distance_cap;
        grad = EntityGrad::default();
    }

    let side = offset_facing(subject.facing, 90.0);
    let (misalign, dv) = cosine_loss(side, wall.direction)?;
    let d_facing = rotate_2d(dv, 90f64.to_radians());
    let w = config.wall_align_weight;
    grad.facing[0] += w * d_facing[0];
    grad.facing[1] += w * d_facing[1];

    Some((dist + w * misalign, grad))
}
