//! Final placement extraction: stacking pins and rotation snapping.

use std::collections::BTreeMap;
use std::f64::consts::TAU;

use tracing::debug;

use crate::config::SolverConfig;
use crate::geometry::obb::rotation_from_facing;
use crate::scene::{EntityId, Placement, SceneRegistry, StackingMap};

/// Snap `angle` to the nearest multiple of `step` and wrap into `[0, 2π)`.
/// A non-positive step only wraps.
pub fn snap_angle(angle: f64, step: f64) -> f64 {
    let snapped = if step > 0.0 { (angle / step).round() * step } else { angle };
    let wrapped = snapped.rem_euclid(TAU);
    // rem_euclid can land on TAU itself through rounding
    if (TAU - wrapped).abs() < 1e-9 || wrapped.abs() < 1e-12 {
        0.0
    } else {
        wrapped
    }
}

pub struct PostProcessor;

impl PostProcessor {
    /// Build the caller-facing placement of every furniture entity.
    ///
    /// Stacked entities take their base's final x,y and sit at the base's
    /// height; every other entity keeps the solver's pose. Movable entities
    /// get all three rotation angles snapped; frozen entities keep theirs.
    pub fn apply(scene: &SceneRegistry, stacking: &StackingMap, config: &SolverConfig) -> BTreeMap<EntityId, Placement> {
        let step = config.rotation_snap_deg.to_radians();
        let mut placements = BTreeMap::new();

        for entity in scene.entities() {
            let rotation = if entity.movable {
                let rz = rotation_from_facing(entity.facing);
                [
                    snap_angle(entity.rotation[0], step),
                    snap_angle(entity.rotation[1], step),
                    snap_angle(rz, step),
                ]
            } else {
                entity.rotation
            };
            let p = entity.position;
            placements.insert(
                entity.id.clone(),
                Placement { position: [p.x, p.y, p.z], rotation },
            );
        }

        // One level of a stacking chain settles per pass
        for _ in 0..stacking.len() {
            for (subject, base) in stacking {
                Self::pin_on_base(scene, &mut placements, subject, base);
            }
        }

        debug!(placements = placements.len(), "post-processing done");
        placements
    }

    fn pin_on_base(
        scene: &SceneRegistry,
        placements: &mut BTreeMap<EntityId, Placement>,
        subject: &EntityId,
        base: &EntityId,
    ) {
        let (Some(base_entity), Some(base_placement)) = (scene.entity(base), placements.get(base).copied()) else {
            return;
        };
        if let Some(placement) = placements.get_mut(subject) {
            placement.position = [base_placement.position[0], base_placement.position[1], base_entity.height()];
        }
    }
}
