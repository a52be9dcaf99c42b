//! Solver configuration.
//!
//! Every field has a default, so a request may carry a partial `config`
//! object (or none at all).

use serde::{Deserialize, Serialize};

use crate::geometry::BOUNDARY_EPSILON;

/// How pairwise collisions are detected and weighted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OverlapMeasure {
    /// Boolean separating-axis test gating a squared-distance hinge.
    #[default]
    Intersects,
    /// Polygon clipping: gate on positive intersection area, scale the hinge by (1 + IoU).
    ClippedArea,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Optimisation steps.
    pub iterations: usize,

    pub learning_rate: f64,
    pub adam_beta1: f64,
    pub adam_beta2: f64,
    pub adam_eps: f64,

    /// Global gradient-norm clip.
    pub grad_clip: f64,

    /// Multiplicative learning-rate decay applied every `projection_interval` steps.
    pub lr_decay: f64,

    /// Steps between best-loss snapshots.
    pub snapshot_interval: usize,

    /// Steps between boundary projection passes (and learning-rate decay).
    pub projection_interval: usize,

    /// Maximum passes per projection.
    pub projection_passes: usize,

    /// Separate-and-project rounds run on the snapped final poses.
    pub settle_passes: usize,

    pub overlap_weight: f64,
    pub boundary_weight: f64,

    /// Scale of the squared pull toward the room centroid for escaped corners.
    pub boundary_pull: f64,

    /// Tolerance for corners outside the room.
    pub boundary_epsilon: f64,

    /// Upper clamp of the distance-constraint hinge (before the weight).
    pub distance_cap: f64,

    /// Upper clamp of the summed back-corner wall distance.
    pub wall_distance_cap: f64,

    /// Weight of the parallel-to-wall term of AgainstWall.
    pub wall_align_weight: f64,

    /// Center height of ceiling-mounted entities.
    pub ceiling_height: f64,

    /// Distance requests accepted per subject (void targets not counted).
    pub max_distance_constraints: usize,

    /// Rotation snapping step in degrees (0 disables snapping).
    pub rotation_snap_deg: f64,

    /// Maximum computation time in milliseconds (0 = unlimited).
    pub time_limit_ms: u64,

    pub overlap_measure: OverlapMeasure,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            iterations: 400,
            learning_rate: 0.05,
            adam_beta1: 0.9,
            adam_beta2: 0.999,
            adam_eps: 1e-8,
            grad_clip: 1.0,
            lr_decay: 0.96,
            snapshot_interval: 10,
            projection_interval: 100,
            projection_passes: 3,
            settle_passes: 25,
            overlap_weight: 1000.0,
            boundary_weight: 500.0,
            boundary_pull: 0.1,
            boundary_epsilon: BOUNDARY_EPSILON,
            distance_cap: 1.0,
            wall_distance_cap: 10.0,
            wall_align_weight: 10.0,
            ceiling_height: 3.0,
            max_distance_constraints: 3,
            rotation_snap_deg: 45.0,
            time_limit_ms: 0,
            overlap_measure: OverlapMeasure::Intersects,
        }
    }
}

impl SolverConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the iteration budget.
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Sets the initial learning rate.
    pub fn with_learning_rate(mut self, lr: f64) -> Self {
        self.learning_rate = lr;
        self
    }

    /// Sets the time limit in milliseconds.
    pub fn with_time_limit(mut self, ms: u64) -> Self {
        self.time_limit_ms = ms;
        self
    }

    pub fn with_overlap_measure(mut self, measure: OverlapMeasure) -> Self {
        self.overlap_measure = measure;
        self
    }

    pub fn with_rotation_snap(mut self, degrees: f64) -> Self {
        self.rotation_snap_deg = degrees.max(0.0);
        self
    }

    pub fn with_max_distance_constraints(mut self, n: usize) -> Self {
        self.max_distance_constraints = n;
        self
    }

    pub fn with_ceiling_height(mut self, height: f64) -> Self {
        self.ceiling_height = height;
        self
    }
}
