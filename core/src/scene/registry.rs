//! Per-solve registry of everything a constraint can name.
//!
//! Built once from a request snapshot; the solver mutates furniture poses
//! in place and the post-processor reads them back out.

use std::collections::HashMap;

use tracing::debug;

use super::types::{EntityId, EntitySpec, StackingMap, VoidSpec};
use crate::error::{LayoutError, LayoutResult};
use crate::geometry::obb::{facing_from_rotation, OrientedBox};
use crate::geometry::{Point3, RoomBoundary};

/// Prefix of the synthetic ids given to room walls.
pub const WALL_PREFIX: &str = "walls_";

/// Prefix of the synthetic ids given to absolute-position anchors.
pub const FIXED_POINT_PREFIX: &str = "fixed_point_";

/// Runtime state of one piece of furniture.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: EntityId,
    /// Width, depth, height.
    pub size: [f64; 3],
    pub position: Point3,
    /// Rotation as supplied by the caller.
    pub rotation: [f64; 3],
    /// Unit facing vector derived from the yaw; this is what the solver moves.
    pub facing: [f64; 2],
    pub movable: bool,
    pub on_ceiling: bool,
    pub category: Option<String>,
    /// Index of the entity this one sits on.
    pub stacked_on: Option<usize>,
}

impl Entity {
    pub fn xy(&self) -> [f64; 2] {
        [self.position.x, self.position.y]
    }

    pub fn set_xy(&mut self, xy: [f64; 2]) {
        self.position.x = xy[0];
        self.position.y = xy[1];
    }

    pub fn width(&self) -> f64 {
        self.size[0]
    }

    pub fn depth(&self) -> f64 {
        self.size[1]
    }

    pub fn height(&self) -> f64 {
        self.size[2]
    }

    pub fn footprint(&self) -> OrientedBox {
        OrientedBox::new(self.xy(), self.width(), self.depth(), self.facing)
    }

    pub fn polygon(&self) -> [[f64; 2]; 4] {
        self.footprint().corners()
    }

    pub fn half_minor(&self) -> f64 {
        self.width().min(self.depth()) / 2.0
    }

    pub fn is_stacked(&self) -> bool {
        self.stacked_on.is_some()
    }

    /// Rugs lie flat under other furniture and never repel it.
    pub fn is_rug(&self) -> bool {
        let rug = |s: &str| s.to_ascii_lowercase().contains("rug");
        rug(self.id.as_str()) || self.category.as_deref().map(rug).unwrap_or(false)
    }

    /// Center height when resting on the floor or hanging from the ceiling.
    pub fn resting_z(&self, ceiling_height: f64) -> f64 {
        if self.on_ceiling {
            ceiling_height
        } else {
            self.height() / 2.0
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VoidRegion {
    pub id: EntityId,
    pub center: [f64; 2],
    pub size: [f64; 2],
    pub facing: [f64; 2],
}

impl VoidRegion {
    pub fn polygon(&self) -> [[f64; 2]; 4] {
        OrientedBox::new(self.center, self.size[0], self.size[1], self.facing).corners()
    }
}

/// Absolute 2D anchor materialised from a point-valued constraint target.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedPoint {
    pub id: EntityId,
    pub position: [f64; 2],
}

/// What an id refers to, with its index in the owning collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityRef {
    Furniture(usize),
    Wall(usize),
    Void(usize),
    FixedPoint(usize),
}

/// Read-only view of a constraint target, detached from the optimisation.
#[derive(Debug, Clone, PartialEq)]
pub struct Anchor {
    pub reference: EntityRef,
    /// Furniture/void center, wall midpoint, or the fixed point itself.
    pub position: [f64; 2],
    /// Furniture/void facing or wall direction. Fixed points have none.
    pub facing: Option<[f64; 2]>,
    pub polygon: Option<[[f64; 2]; 4]>,
    pub half_minor: f64,
    pub on_ceiling: bool,
}

#[derive(Debug, Clone)]
pub struct SceneRegistry {
    room: RoomBoundary,
    entities: Vec<Entity>,
    voids: Vec<VoidRegion>,
    fixed_points: Vec<FixedPoint>,
    index: HashMap<EntityId, EntityRef>,
}

fn check_finite(values: &[f64]) -> bool {
    values.iter().all(|v| v.is_finite())
}

impl SceneRegistry {
    /// Validate the snapshot and build the registry.
    ///
    /// Entities without a position start at the room centroid.
    pub fn new(room: Vec<[f64; 2]>, entities: &[EntitySpec], voids: &[VoidSpec]) -> LayoutResult<Self> {
        let room = RoomBoundary::new(room)?;
        let mut index = HashMap::new();

        for wall in room.walls() {
            index.insert(Self::wall_id(wall.index), EntityRef::Wall(wall.index));
        }

        let centroid = room.centroid();
        let mut built = Vec::with_capacity(entities.len());
        for (i, spec) in entities.iter().enumerate() {
            let invalid = |reason: &str| LayoutError::InvalidEntity {
                id: spec.id.to_string(),
                reason: reason.to_string(),
            };
            if !check_finite(&spec.size) || spec.size[0] <= 0.0 || spec.size[1] <= 0.0 || spec.size[2] < 0.0 {
                return Err(invalid("footprint must be finite and positive"));
            }
            if !check_finite(&spec.rotation) {
                return Err(invalid("non-finite rotation"));
            }
            let position = match spec.position {
                Some(p) if check_finite(&p) => Point3::new(p[0], p[1], p[2]),
                Some(_) => return Err(invalid("non-finite position")),
                None => Point3::new(centroid[0], centroid[1], spec.size[2] / 2.0),
            };
            if index.insert(spec.id.clone(), EntityRef::Furniture(i)).is_some() {
                return Err(LayoutError::DuplicateId(spec.id.to_string()));
            }
            built.push(Entity {
                id: spec.id.clone(),
                size: spec.size,
                position,
                rotation: spec.rotation,
                facing: facing_from_rotation(spec.rotation[2]),
                movable: spec.movable,
                on_ceiling: spec.on_ceiling,
                category: spec.category.clone(),
                stacked_on: None,
            });
        }

        let mut void_regions = Vec::with_capacity(voids.len());
        for (i, spec) in voids.iter().enumerate() {
            if !check_finite(&spec.center) || !check_finite(&spec.size) || !spec.rotation.is_finite()
                || spec.size[0] <= 0.0 || spec.size[1] <= 0.0
            {
                return Err(LayoutError::InvalidEntity {
                    id: spec.id.to_string(),
                    reason: "void must have a finite center and positive size".into(),
                });
            }
            if index.insert(spec.id.clone(), EntityRef::Void(i)).is_some() {
                return Err(LayoutError::DuplicateId(spec.id.to_string()));
            }
            void_regions.push(VoidRegion {
                id: spec.id.clone(),
                center: spec.center,
                size: spec.size,
                facing: facing_from_rotation(spec.rotation),
            });
        }

        debug!(
            entities = built.len(),
            voids = void_regions.len(),
            walls = room.walls().len(),
            "scene registry built"
        );

        Ok(Self {
            room,
            entities: built,
            voids: void_regions,
            fixed_points: Vec::new(),
            index,
        })
    }

    pub fn wall_id(index: usize) -> EntityId {
        EntityId(format!("{}{}", WALL_PREFIX, index))
    }

    pub fn room(&self) -> &RoomBoundary {
        &self.room
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn entities_mut(&mut self) -> &mut [Entity] {
        &mut self.entities
    }

    pub fn voids(&self) -> &[VoidRegion] {
        &self.voids
    }

    pub fn fixed_points(&self) -> &[FixedPoint] {
        &self.fixed_points
    }

    pub fn resolve(&self, id: &EntityId) -> Option<EntityRef> {
        self.index.get(id).copied()
    }

    pub fn contains(&self, id: &EntityId) -> bool {
        self.index.contains_key(id)
    }

    pub fn furniture_index(&self, id: &EntityId) -> Option<usize> {
        match self.resolve(id)? {
            EntityRef::Furniture(i) => Some(i),
            _ => None,
        }
    }

    pub fn entity(&self, id: &EntityId) -> Option<&Entity> {
        self.furniture_index(id).map(|i| &self.entities[i])
    }

    /// Snapshot of whatever `id` names, for use as a constraint target.
    pub fn anchor(&self, id: &EntityId) -> Option<Anchor> {
        let reference = self.resolve(id)?;
        let anchor = match reference {
            EntityRef::Furniture(i) => {
                let e = &self.entities[i];
                Anchor {
                    reference,
                    position: e.xy(),
                    facing: Some(e.facing),
                    polygon: Some(e.polygon()),
                    half_minor: e.half_minor(),
                    on_ceiling: e.on_ceiling,
                }
            }
            EntityRef::Wall(i) => {
                let w = self.room.wall(i)?;
                Anchor {
                    reference,
                    position: w.midpoint(),
                    facing: Some(w.direction),
                    polygon: None,
                    half_minor: 0.0,
                    on_ceiling: false,
                }
            }
            EntityRef::Void(i) => {
                let v = &self.voids[i];
                Anchor {
                    reference,
                    position: v.center,
                    facing: Some(v.facing),
                    polygon: Some(v.polygon()),
                    half_minor: v.size[0].min(v.size[1]) / 2.0,
                    on_ceiling: false,
                }
            }
            EntityRef::FixedPoint(i) => Anchor {
                reference,
                position: self.fixed_points[i].position,
                facing: None,
                polygon: None,
                half_minor: 0.0,
                on_ceiling: false,
            },
        };
        Some(anchor)
    }

    /// First `fixed_point_<n>` id not taken by the registry or by `pending`.
    pub fn next_fixed_point_id(&self, pending: &[FixedPoint]) -> EntityId {
        let mut n = self.fixed_points.len() + pending.len();
        loop {
            let id = EntityId(format!("{}{}", FIXED_POINT_PREFIX, n));
            if !self.contains(&id) && !pending.iter().any(|p| p.id == id) {
                return id;
            }
            n += 1;
        }
    }

    /// Register anchors created by the consistency filter. Ids already in use are skipped.
    pub fn add_fixed_points(&mut self, points: impl IntoIterator<Item = FixedPoint>) {
        for point in points {
            if self.contains(&point.id) {
                tracing::warn!(id = %point.id, "fixed point id already registered, skipping");
                continue;
            }
            let i = self.fixed_points.len();
            self.index.insert(point.id.clone(), EntityRef::FixedPoint(i));
            self.fixed_points.push(point);
        }
    }

    /// Record subject -> base links on the entities. Unknown ids are ignored.
    pub fn apply_stacking(&mut self, stacking: &StackingMap) {
        for entity in &mut self.entities {
            entity.stacked_on = None;
        }
        for (subject, base) in stacking {
            if let (Some(s), Some(b)) = (self.furniture_index(subject), self.furniture_index(base)) {
                if s != b {
                    self.entities[s].stacked_on = Some(b);
                }
            }
        }
    }
}
