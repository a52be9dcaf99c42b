//! Hard correction passes: keep free entities inside the room and pin heights.

use tracing::{debug, warn};

use super::objective::overlap_exempt;
use crate::config::SolverConfig;
use crate::consistency::ExcludedPairs;
use crate::geometry::obb::{facing_from_rotation, rotation_from_facing};
use crate::geometry::separation_vector;
use crate::geometry::utils_2d::{add_2d, length_2d, scale_2d, sub_2d};
use crate::postprocess::snap_angle;
use crate::scene::SceneRegistry;

/// Clearance added on top of each separating push.
const SEPARATION_MARGIN: f64 = 1e-4;

/// Translate every free entity whose footprint escapes the room by its
/// worst corner's projection onto the boundary, up to `projection_passes`
/// times, then re-pin heights. Returns the number of translations applied.
pub fn project_into_room(scene: &mut SceneRegistry, config: &SolverConfig) -> usize {
    let mut moves = 0;

    for pass in 0..config.projection_passes {
        let mut moved_this_pass = 0;
        for i in 0..scene.entities().len() {
            let entity = &scene.entities()[i];
            if !entity.movable || entity.is_stacked() {
                continue;
            }

            let room = scene.room();
            let worst = entity
                .polygon()
                .iter()
                .filter(|c| !room.contains(**c, config.boundary_epsilon))
                .filter_map(|c| room.project_to_boundary(*c).map(|p| (*c, p)))
                .max_by(|a, b| a.1.distance.total_cmp(&b.1.distance));

            if let Some((corner, projection)) = worst {
                let shift = sub_2d(projection.point, corner);
                let entity = &mut scene.entities_mut()[i];
                let xy = add_2d(entity.xy(), shift);
                entity.set_xy(xy);
                moved_this_pass += 1;
            }
        }
        moves += moved_this_pass;
        if moved_this_pass == 0 {
            break;
        }
        debug!(pass, moved = moved_this_pass, "projection pass");
    }

    pin_heights(scene, config);
    moves
}

/// Floor entities rest at half their height, ceiling entities at the ceiling
/// height, stacked entities take their base's x,y and sit at
/// `base height + half their own height`. Frozen entities keep their pose.
pub fn pin_heights(scene: &mut SceneRegistry, config: &SolverConfig) {
    let n = scene.entities().len();
    for entity in scene.entities_mut() {
        if entity.movable && !entity.is_stacked() {
            entity.position.z = entity.resting_z(config.ceiling_height);
        }
    }

    // Repeat so chains settle base-first regardless of order
    for _ in 0..n {
        let mut changed = false;
        for i in 0..n {
            let (base, own_height, movable) = {
                let e = &scene.entities()[i];
                (e.stacked_on, e.height(), e.movable)
            };
            let Some(b) = base else { continue };
            if !movable {
                continue;
            }
            let (base_xy, base_height) = {
                let base = &scene.entities()[b];
                (base.xy(), base.height())
            };
            let entity = &mut scene.entities_mut()[i];
            let z = base_height + own_height / 2.0;
            if entity.xy() != base_xy || entity.position.z != z {
                entity.set_xy(base_xy);
                entity.position.z = z;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
}

/// Turn every movable facing onto the presentation grid of `rotation_snap_deg`.
pub fn snap_facings(scene: &mut SceneRegistry, config: &SolverConfig) {
    let step = config.rotation_snap_deg.to_radians();
    if step <= 0.0 {
        return;
    }
    for entity in scene.entities_mut().iter_mut().filter(|e| e.movable) {
        let rz = snap_angle(rotation_from_facing(entity.facing), step);
        entity.facing = facing_from_rotation(rz);
    }
}

/// Push apart every colliding non-exempt pair along its shallowest axis.
/// Frozen and stacked entities never move; two free entities split the push.
/// Returns the number of pairs that were separated.
pub fn separate_overlaps(scene: &mut SceneRegistry, excluded: &ExcludedPairs) -> usize {
    let n = scene.entities().len();
    let mut separated = 0;

    for i in 0..n {
        for j in (i + 1)..n {
            if overlap_exempt(scene, excluded, i, j) {
                continue;
            }
            let (a, b) = (&scene.entities()[i], &scene.entities()[j]);
            let Some(push) = separation_vector(&a.polygon(), &b.polygon()) else {
                continue;
            };
            let len = length_2d(push);
            if !len.is_finite() {
                continue;
            }
            let push = if len > 0.0 { scale_2d(push, (len + SEPARATION_MARGIN) / len) } else { [SEPARATION_MARGIN, 0.0] };

            let (move_a, move_b) = (a.movable && !a.is_stacked(), b.movable && !b.is_stacked());
            let share = match (move_a, move_b) {
                (true, true) => 0.5,
                (false, false) => continue,
                _ => 1.0,
            };

            let entities = scene.entities_mut();
            if move_a {
                let xy = sub_2d(entities[i].xy(), scale_2d(push, share));
                entities[i].set_xy(xy);
            }
            if move_b {
                let xy = add_2d(entities[j].xy(), scale_2d(push, share));
                entities[j].set_xy(xy);
            }
            separated += 1;
        }
    }
    separated
}

/// Final clean-up on the snapped poses: alternate separation and room
/// projection until neither changes anything. Returns the rounds used.
pub fn settle(scene: &mut SceneRegistry, excluded: &ExcludedPairs, config: &SolverConfig) -> usize {
    for round in 0..config.settle_passes {
        let separated = separate_overlaps(scene, excluded);
        let projected = project_into_room(scene, config);
        if separated == 0 && projected == 0 {
            return round;
        }
        debug!(round, separated, projected, "settle round");
    }
    warn!(passes = config.settle_passes, "settling did not converge");
    config.settle_passes
}
