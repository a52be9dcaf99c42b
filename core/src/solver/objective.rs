//! Total loss: weighted overlap and boundary penalties plus constraint losses.

use std::collections::HashSet;

use tracing::{debug, warn};

use super::SolveContext;
use crate::config::{OverlapMeasure, SolverConfig};
use crate::constraints::{self, EntityGrad};
use crate::geometry::utils_2d::{dot_2d, sub_2d};
use crate::geometry::{intersection_over_union, overlap_area, polygons_intersect, EPSILON};
use crate::scene::SceneRegistry;
use crate::consistency::ExcludedPairs;

/// Loss breakdown and per-entity gradients at one point.
#[derive(Debug, Clone, Default)]
pub struct Evaluation {
    pub total: f64,
    pub overlap: f64,
    pub boundary: f64,
    pub constraints: f64,
    /// Indexed like `SceneRegistry::entities`.
    pub grads: Vec<EntityGrad>,
}

/// Pairs that never repel: stacked subjects, rugs, excluded pairs and frozen-frozen pairs.
pub fn overlap_exempt(scene: &SceneRegistry, excluded: &ExcludedPairs, i: usize, j: usize) -> bool {
    let (a, b) = (&scene.entities()[i], &scene.entities()[j]);
    a.is_stacked()
        || b.is_stacked()
        || a.is_rug()
        || b.is_rug()
        || (!a.movable && !b.movable)
        || excluded.contains(&a.id, &b.id)
}

/// Pairs of non-exempt entities whose footprints currently collide.
pub fn colliding_pairs(scene: &SceneRegistry, excluded: &ExcludedPairs) -> Vec<(usize, usize)> {
    let polygons: Vec<_> = scene.entities().iter().map(|e| e.polygon()).collect();
    let n = polygons.len();
    let mut pairs = Vec::new();
    for i in 0..n {
        for j in (i + 1)..n {
            if !overlap_exempt(scene, excluded, i, j) && polygons_intersect(&polygons[i], &polygons[j]) {
                pairs.push((i, j));
            }
        }
    }
    pairs
}

/// Squared-distance hinge toward the sum of circumradii, only for colliding pairs.
fn overlap_term(scene: &SceneRegistry, excluded: &ExcludedPairs, measure: OverlapMeasure, grads: &mut [EntityGrad]) -> f64 {
    let entities = scene.entities();
    let polygons: Vec<_> = entities.iter().map(|e| e.polygon()).collect();
    let mut total = 0.0;

    for i in 0..entities.len() {
        for j in (i + 1)..entities.len() {
            if overlap_exempt(scene, excluded, i, j) {
                continue;
            }
            let scale = match measure {
                OverlapMeasure::Intersects => {
                    if !polygons_intersect(&polygons[i], &polygons[j]) {
                        continue;
                    }
                    1.0
                }
                OverlapMeasure::ClippedArea => {
                    if overlap_area(&polygons[i], &polygons[j]) <= EPSILON {
                        continue;
                    }
                    1.0 + intersection_over_union(&polygons[i], &polygons[j])
                }
            };

            let m = entities[i].footprint().circumradius() + entities[j].footprint().circumradius();
            let delta = sub_2d(entities[i].xy(), entities[j].xy());
            let d2 = dot_2d(delta, delta);
            if d2 >= m * m {
                continue;
            }
            total += scale * (m * m - d2);

            // Coincident centers have no gradient; split them along +x
            let g = if d2 < EPSILON * EPSILON {
                [2.0 * m * scale, 0.0]
            } else {
                [-2.0 * delta[0] * scale, -2.0 * delta[1] * scale]
            };
            grads[i].position[0] += g[0];
            grads[i].position[1] += g[1];
            grads[j].position[0] -= g[0];
            grads[j].position[1] -= g[1];
        }
    }
    total
}

/// Pull escaped corners of free entities toward the room centroid.
fn boundary_term(scene: &SceneRegistry, config: &SolverConfig, grads: &mut [EntityGrad]) -> f64 {
    let room = scene.room();
    let centroid = room.centroid();
    let mut total = 0.0;

    for (i, entity) in scene.entities().iter().enumerate() {
        if !entity.movable || entity.is_stacked() {
            continue;
        }
        let footprint = entity.footprint();
        let locals = footprint.local_corners();
        for (k, corner) in footprint.corners().iter().enumerate() {
            if room.contains(*corner, config.boundary_epsilon) {
                continue;
            }
            let delta = sub_2d(*corner, centroid);
            total += config.boundary_pull * dot_2d(delta, delta);
            let g = [2.0 * config.boundary_pull * delta[0], 2.0 * config.boundary_pull * delta[1]];
            grads[i].add(&EntityGrad::from_corner(locals[k], g));
        }
    }
    total
}

/// Evaluate the full objective. Failing constraint terms contribute nothing;
/// each failing constraint is warned about once per solve (tracked in `warned`).
pub fn evaluate(ctx: &SolveContext, config: &SolverConfig, warned: &mut HashSet<usize>) -> Evaluation {
    let n = ctx.scene.entities().len();

    let mut overlap_grads = vec![EntityGrad::default(); n];
    let overlap = overlap_term(&ctx.scene, &ctx.excluded, config.overlap_measure, &mut overlap_grads);

    let mut boundary_grads = vec![EntityGrad::default(); n];
    let boundary = boundary_term(&ctx.scene, config, &mut boundary_grads);

    let mut grads = vec![EntityGrad::default(); n];
    for i in 0..n {
        grads[i].add(&overlap_grads[i].scaled(config.overlap_weight));
        grads[i].add(&boundary_grads[i].scaled(config.boundary_weight));
    }

    let mut constraint_total = 0.0;
    for (k, constraint) in ctx.constraints.iter().enumerate() {
        if constraint.kind.is_structural() {
            continue;
        }
        match constraints::evaluate(constraint, &ctx.scene, config) {
            Ok(term) => {
                constraint_total += term.value;
                grads[term.subject].add(&term.grad);
            }
            Err(err) => {
                if warned.insert(k) {
                    warn!(constraint = k, "{}; term skipped", err);
                } else {
                    debug!(constraint = k, "{}; term skipped", err);
                }
            }
        }
    }

    Evaluation {
        total: config.overlap_weight * overlap + config.boundary_weight * boundary + constraint_total,
        overlap,
        boundary,
        constraints: constraint_total,
        grads,
    }
}
