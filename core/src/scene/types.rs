use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Caller-supplied identifier of anything a constraint can reference:
/// furniture, walls (`walls_<i>`), voids and fixed-point anchors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

fn default_true() -> bool {
    true
}

/// Catalog entry for one piece of furniture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySpec {
    pub id: EntityId,
    /// Width, depth, height.
    pub size: [f64; 3],
    /// Current center. Missing means "not placed yet".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<[f64; 3]>,
    /// Euler angles in radians; only `rz` (yaw) is optimised.
    #[serde(default)]
    pub rotation: [f64; 3],
    /// Whether the solver may move this entity.
    #[serde(default = "default_true", alias = "optimize")]
    pub movable: bool,
    #[serde(default)]
    pub on_ceiling: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl EntitySpec {
    pub fn new(id: impl Into<EntityId>, width: f64, depth: f64, height: f64) -> Self {
        Self {
            id: id.into(),
            size: [width, depth, height],
            position: None,
            rotation: [0.0; 3],
            movable: true,
            on_ceiling: false,
            category: None,
        }
    }

    pub fn at(mut self, x: f64, y: f64, z: f64) -> Self {
        self.position = Some([x, y, z]);
        self
    }

    pub fn rotated(mut self, rz: f64) -> Self {
        self.rotation[2] = rz;
        self
    }

    pub fn frozen(mut self) -> Self {
        self.movable = false;
        self
    }

    pub fn on_ceiling(mut self) -> Self {
        self.on_ceiling = true;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

/// Door or window opening. Never moved; only usable as a distance anchor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoidSpec {
    pub id: EntityId,
    pub center: [f64; 2],
    /// Width, depth.
    pub size: [f64; 2],
    #[serde(default)]
    pub rotation: f64,
}

/// Final pose of one entity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub position: [f64; 3],
    pub rotation: [f64; 3],
}

/// Subject -> base ("subject sits on top of base").
pub type StackingMap = BTreeMap<EntityId, EntityId>;
