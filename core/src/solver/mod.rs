//! Projected-gradient layout solver.
//!
//! One run: project everything into the room, iterate Adam on the total
//! objective with periodic best-loss snapshots, re-projection and
//! learning-rate decay, then restore the best snapshot, snap facings to the
//! rotation grid and settle the snapped poses (separate overlaps, project
//! into the room). Frozen entities never move.

pub mod cancel;
pub mod objective;
pub mod optimizer;
pub mod params;
pub mod projection;

#[cfg(test)]
mod tests_solver;

pub use cancel::CancelToken;
pub use objective::{colliding_pairs, Evaluation};
pub use params::ParamLayout;

use std::collections::HashSet;
use std::time::Instant;

use nalgebra::DVector;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::SolverConfig;
use crate::consistency::ExcludedPairs;
use crate::constraints::{Constraint, EntityGrad};
use crate::scene::SceneRegistry;
use optimizer::{clip_grad_norm, Adam};

/// Everything one solve reads and mutates.
#[derive(Debug, Clone)]
pub struct SolveContext {
    pub scene: SceneRegistry,
    pub constraints: Vec<Constraint>,
    pub excluded: ExcludedPairs,
}

impl SolveContext {
    pub fn new(scene: SceneRegistry, constraints: Vec<Constraint>, excluded: ExcludedPairs) -> Self {
        Self { scene, constraints, excluded }
    }
}

/// Diagnostics of one solver run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SolveStats {
    /// Number of iterations performed
    pub iterations: usize,
    /// Loss at the first iteration
    pub initial_loss: Option<f64>,
    /// Lowest snapshotted loss (the state that was restored)
    pub best_loss: Option<f64>,
    /// Loss after the final projection
    pub final_loss: Option<f64>,
    /// Iterations whose update was skipped because the loss or gradient was not finite
    pub skipped_steps: usize,
    /// Stopped early by the cancel token or the time limit
    pub cancelled: bool,
    /// (iteration, loss) at every improving snapshot
    pub loss_history: Vec<(usize, f64)>,
    pub elapsed_ms: u64,
}

pub struct GradientSolver {
    config: SolverConfig,
}

impl GradientSolver {
    pub fn new(config: &SolverConfig) -> Self {
        Self { config: config.clone() }
    }

    fn should_stop(&self, cancel: &CancelToken, started: &Instant) -> bool {
        if cancel.is_cancelled() {
            return true;
        }
        self.config.time_limit_ms > 0 && started.elapsed().as_millis() >= self.config.time_limit_ms as u128
    }

    pub fn run(&self, ctx: &mut SolveContext, cancel: &CancelToken) -> SolveStats {
        let started = Instant::now();
        let config = &self.config;
        let mut stats = SolveStats::default();

        let layout = ParamLayout::new(&ctx.scene);
        if layout.is_empty() {
            info!("no movable entities, layout left unchanged");
            return stats;
        }

        let initial_moves = projection::project_into_room(&mut ctx.scene, config);
        debug!(params = layout.len(), initial_moves, "solver initialised");

        let mut params = layout.gather(&ctx.scene);
        let mut adam = Adam::new(params.len(), config);
        let mut best: Option<(f64, DVector<f64>)> = None;
        let mut warned = HashSet::new();
        let snapshot_interval = config.snapshot_interval.max(1);

        for step in 0..config.iterations {
            if self.should_stop(cancel, &started) {
                stats.cancelled = true;
                info!(step, "solve stopped early");
                break;
            }

            layout.scatter(&params, &mut ctx.scene);
            let eval = objective::evaluate(ctx, config, &mut warned);
            if step == 0 {
                stats.initial_loss = Some(eval.total);
            }

            if eval.total.is_finite() && eval.grads.iter().all(EntityGrad::is_finite) {
                if step % snapshot_interval == 0 && best.as_ref().map_or(true, |(loss, _)| eval.total < *loss) {
                    best = Some((eval.total, params.clone()));
                    stats.loss_history.push((step, eval.total));
                }
                let mut grad = layout.gradient(&eval.grads, &params);
                clip_grad_norm(&mut grad, config.grad_clip);
                adam.step(&mut params, &grad);
                layout.normalize_facings(&mut params);
            } else {
                stats.skipped_steps += 1;
                warn!(step, loss = eval.total, "non-finite loss, update skipped");
            }
            stats.iterations = step + 1;

            if config.projection_interval > 0 && (step + 1) % config.projection_interval == 0 {
                layout.scatter(&params, &mut ctx.scene);
                projection::project_into_room(&mut ctx.scene, config);
                params = layout.gather(&ctx.scene);
                adam.decay(config.lr_decay);
                debug!(
                    step,
                    loss = eval.total,
                    overlap = eval.overlap,
                    boundary = eval.boundary,
                    lr = adam.learning_rate(),
                    "checkpoint"
                );
            }
        }

        if let Some((loss, snapshot)) = best {
            stats.best_loss = Some(loss);
            params = snapshot;
        }
        layout.scatter(&params, &mut ctx.scene);
        // Snapping turns footprints, so settle on the snapped poses
        projection::snap_facings(&mut ctx.scene, config);
        let settle_rounds = projection::settle(&mut ctx.scene, &ctx.excluded, config);
        debug!(settle_rounds, "final poses settled");

        let final_eval = objective::evaluate(ctx, config, &mut warned);
        stats.final_loss = Some(final_eval.total);
        stats.elapsed_ms = started.elapsed().as_millis() as u64;

        info!(
            iterations = stats.iterations,
            best_loss = ?stats.best_loss,
            final_loss = final_eval.total,
            skipped = stats.skipped_steps,
            cancelled = stats.cancelled,
            elapsed_ms = stats.elapsed_ms,
            "solve finished"
        );
        stats
    }
}
