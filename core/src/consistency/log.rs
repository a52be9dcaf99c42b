//! Transcript of filter decisions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scene::EntityId;

/// Why a request was dropped.
#[derive(Debug, Error, Clone, PartialEq, Serialize, Deserialize)]
pub enum RejectReason {
    #[error("unknown entity '{0}'")]
    UnknownEntity(EntityId),

    #[error("subject '{0}' is not a piece of furniture")]
    InvalidSubject(EntityId),

    #[error("subject '{0}' is not movable")]
    FrozenSubject(EntityId),

    #[error("subject and target are the same entity")]
    SelfReference,

    #[error("a target is required")]
    MissingTarget,

    #[error("target '{target}' cannot be used with {kind}")]
    InvalidTarget { kind: String, target: String },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("identical constraint already accepted")]
    Duplicate,

    #[error("subject already has an against_wall constraint")]
    DuplicateWall,

    #[error("subject already has an orientation constraint")]
    DuplicateOrientation,

    #[error("subject already sits on '{0}'")]
    DuplicateParent(EntityId),

    #[error("stacking would form a cycle")]
    StackingCycle,

    #[error("subject already has {limit} distance constraints")]
    TooManyDistances { limit: usize },

    #[error("distance constraints are not supported for ceiling-mounted entities")]
    CeilingDistance,
}

/// How an accepted request was changed on the way in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Rewrite {
    /// AgainstWall retargeted to the wall nearest the subject.
    WallTarget { requested: Option<String>, chosen: EntityId },
    /// Distance bounds clamped against the current layout.
    DistanceBounds {
        requested: [Option<f64>; 2],
        clamped: [Option<f64>; 2],
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FilterDecision {
    Accepted,
    Rewritten(Rewrite),
    Rejected(RejectReason),
}

impl FilterDecision {
    pub fn is_accepted(&self) -> bool {
        !matches!(self, FilterDecision::Rejected(_))
    }
}

/// One transcript line per incoming request, in request order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterLogEntry {
    /// Position of the request in the caller's list.
    pub index: usize,
    pub kind: String,
    pub subject: EntityId,
    pub target: Option<String>,
    pub decision: FilterDecision,
    /// Human-readable summary.
    pub message: String,
}

fn fmt_bound(b: Option<f64>) -> String {
    match b {
        Some(v) => format!("{:.3}", v),
        None => "none".to_string(),
    }
}

pub(crate) fn describe(kind: &str, subject: &EntityId, target: Option<&str>, decision: &FilterDecision) -> String {
    let call = match target {
        Some(t) => format!("{}({}, {})", kind, subject, t),
        None => format!("{}({})", kind, subject),
    };
    match decision {
        FilterDecision::Accepted => call,
        FilterDecision::Rewritten(Rewrite::WallTarget { chosen, .. }) => {
            format!("(updated) {}({}, {})", kind, subject, chosen)
        }
        FilterDecision::Rewritten(Rewrite::DistanceBounds { requested, clamped }) => format!(
            "(updated) {} bounds [{}, {}] -> [{}, {}]",
            call,
            fmt_bound(requested[0]),
            fmt_bound(requested[1]),
            fmt_bound(clamped[0]),
            fmt_bound(clamped[1])
        ),
        FilterDecision::Rejected(reason) => format!("(rejected) {}: {}", call, reason),
    }
}
