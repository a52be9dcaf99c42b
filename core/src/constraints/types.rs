use serde::{Deserialize, Serialize};
use std::fmt;

use crate::scene::EntityId;

fn default_weight() -> f64 {
    1.0
}

/// Relationship kinds a caller may request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConstraintKind {
    /// Center distance within `[min, max]`. Missing bounds are open.
    Distance {
        #[serde(default)]
        min: Option<f64>,
        #[serde(default)]
        max: Option<f64>,
        #[serde(default = "default_weight")]
        weight: f64,
    },
    /// Face the target, with the facing offset by `angle` degrees.
    PointTowards {
        #[serde(default)]
        angle: f64,
    },
    /// Face the same way as the target (or along a wall), offset by `angle` degrees.
    AlignWith {
        #[serde(default)]
        angle: f64,
    },
    /// Back flush and parallel to the nearest wall.
    AgainstWall,
    /// Rest on top of the target.
    OnTopOf,
    /// Exclude the pair from overlap repulsion.
    SkipOverlap,
}

impl ConstraintKind {
    pub fn label(&self) -> &'static str {
        match self {
            ConstraintKind::Distance { .. } => "distance",
            ConstraintKind::PointTowards { .. } => "point_towards",
            ConstraintKind::AlignWith { .. } => "align_with",
            ConstraintKind::AgainstWall => "against_wall",
            ConstraintKind::OnTopOf => "on_top_of",
            ConstraintKind::SkipOverlap => "skip_overlap",
        }
    }

    pub fn is_orientation(&self) -> bool {
        matches!(self, ConstraintKind::PointTowards { .. } | ConstraintKind::AlignWith { .. })
    }

    /// Kinds that never produce a loss.
    pub fn is_structural(&self) -> bool {
        matches!(self, ConstraintKind::OnTopOf | ConstraintKind::SkipOverlap)
    }
}

/// A request target: a named entity or an absolute floor position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Target {
    Entity(EntityId),
    Point([f64; 2]),
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Entity(id) => write!(f, "{}", id),
            Target::Point(p) => write!(f, "({}, {})", p[0], p[1]),
        }
    }
}

impl From<&str> for Target {
    fn from(s: &str) -> Self {
        Target::Entity(EntityId::from(s))
    }
}

impl From<EntityId> for Target {
    fn from(id: EntityId) -> Self {
        Target::Entity(id)
    }
}

impl From<[f64; 2]> for Target {
    fn from(p: [f64; 2]) -> Self {
        Target::Point(p)
    }
}

/// Raw relationship request as produced by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstraintRequest {
    pub kind: ConstraintKind,
    pub subject: EntityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<Target>,
}

impl ConstraintRequest {
    pub fn new(kind: ConstraintKind, subject: impl Into<EntityId>, target: impl Into<Target>) -> Self {
        Self {
            kind,
            subject: subject.into(),
            target: Some(target.into()),
        }
    }

    pub fn distance(subject: &str, target: &str, min: Option<f64>, max: Option<f64>) -> Self {
        Self::new(ConstraintKind::Distance { min, max, weight: 1.0 }, subject, target)
    }

    pub fn against_wall(subject: &str) -> Self {
        Self {
            kind: ConstraintKind::AgainstWall,
            subject: subject.into(),
            target: None,
        }
    }
}

/// A filtered constraint with both ends resolved to registry ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    pub kind: ConstraintKind,
    pub subject: EntityId,
    pub target: EntityId,
}
