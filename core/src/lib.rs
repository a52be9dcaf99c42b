pub mod config;
pub mod consistency;
pub mod constraints;
pub mod error;
pub mod geometry;
pub mod layout;
pub mod postprocess;
pub mod scene;
pub mod solver;

pub use config::{OverlapMeasure, SolverConfig};
pub use consistency::{ConsistencyFilter, FilterDecision, FilterLogEntry, FilterOutput, RejectReason, Rewrite};
pub use constraints::{Constraint, ConstraintKind, ConstraintRequest, Target};
pub use error::{LayoutError, LayoutResult};
pub use layout::{LayoutOutcome, LayoutRequest, LayoutSolver};
pub use postprocess::PostProcessor;
pub use scene::{EntityId, EntitySpec, Placement, SceneRegistry, StackingMap, VoidSpec};
pub use solver::{CancelToken, GradientSolver, SolveContext, SolveStats};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
