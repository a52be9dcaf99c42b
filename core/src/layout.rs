//! End-to-end pipeline: validate, filter, solve, post-process.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::SolverConfig;
use crate::consistency::{ConsistencyFilter, FilterLogEntry};
use crate::constraints::ConstraintRequest;
use crate::error::LayoutResult;
use crate::postprocess::PostProcessor;
use crate::scene::{EntityId, EntitySpec, Placement, SceneRegistry, VoidSpec};
use crate::solver::{CancelToken, GradientSolver, SolveContext, SolveStats};

/// Everything needed for one solve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutRequest {
    /// Room outline, edge `i` being wall `walls_<i>`.
    pub room: Vec<[f64; 2]>,
    pub entities: Vec<EntitySpec>,
    #[serde(default)]
    pub voids: Vec<VoidSpec>,
    #[serde(default)]
    pub constraints: Vec<ConstraintRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<SolverConfig>,
}

/// Final placements plus the filter transcript and solver diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutOutcome {
    pub placements: BTreeMap<EntityId, Placement>,
    pub transcript: Vec<FilterLogEntry>,
    pub stats: SolveStats,
}

pub struct LayoutSolver;

impl LayoutSolver {
    pub fn solve(request: &LayoutRequest) -> LayoutResult<LayoutOutcome> {
        Self::solve_with_cancel(request, &CancelToken::new())
    }

    /// Only malformed input is an error; everything after validation degrades.
    pub fn solve_with_cancel(request: &LayoutRequest, cancel: &CancelToken) -> LayoutResult<LayoutOutcome> {
        let config = request.config.clone().unwrap_or_default();
        let mut scene = SceneRegistry::new(request.room.clone(), &request.entities, &request.voids)?;

        let filtered = ConsistencyFilter::apply(&scene, &request.constraints, &config);
        scene.add_fixed_points(filtered.fixed_points);
        scene.apply_stacking(&filtered.stacking);

        let mut ctx = SolveContext::new(scene, filtered.constraints, filtered.excluded);
        let stats = GradientSolver::new(&config).run(&mut ctx, cancel);
        let placements = PostProcessor::apply(&ctx.scene, &filtered.stacking, &config);

        info!(
            entities = placements.len(),
            constraints = ctx.constraints.len(),
            "layout solved"
        );

        Ok(LayoutOutcome {
            placements,
            transcript: filtered.transcript,
            stats,
        })
    }
}
