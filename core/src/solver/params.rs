//! Flat parameter vector for the optimiser.
//!
//! Each movable entity owns a raw facing pair `(rx, ry)`; movable entities
//! that are not stacked also own their `(x, y)` center. Frozen entities
//! have no slots and therefore never move.

use nalgebra::DVector;

use crate::constraints::EntityGrad;
use crate::geometry::utils_2d::length_2d;
use crate::geometry::EPSILON;
use crate::scene::SceneRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSlot {
    pub entity: usize,
    pub position: Option<usize>,
    pub facing: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ParamLayout {
    slots: Vec<ParamSlot>,
    len: usize,
}

impl ParamLayout {
    pub fn new(scene: &SceneRegistry) -> Self {
        let mut slots = Vec::new();
        let mut len = 0;
        for (i, entity) in scene.entities().iter().enumerate() {
            if !entity.movable {
                continue;
            }
            let position = if entity.is_stacked() {
                None
            } else {
                len += 2;
                Some(len - 2)
            };
            slots.push(ParamSlot { entity: i, position, facing: len });
            len += 2;
        }
        Self { slots, len }
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn slots(&self) -> &[ParamSlot] {
        &self.slots
    }

    /// Read the current poses out of the scene.
    pub fn gather(&self, scene: &SceneRegistry) -> DVector<f64> {
        let mut params = DVector::zeros(self.len);
        for slot in &self.slots {
            let entity = &scene.entities()[slot.entity];
            if let Some(p) = slot.position {
                params[p] = entity.position.x;
                params[p + 1] = entity.position.y;
            }
            params[slot.facing] = entity.facing[0];
            params[slot.facing + 1] = entity.facing[1];
        }
        params
    }

    /// Write `params` back into the scene. Facings are stored normalised;
    /// a collapsed facing keeps the entity's previous one.
    pub fn scatter(&self, params: &DVector<f64>, scene: &mut SceneRegistry) {
        let entities = scene.entities_mut();
        for slot in &self.slots {
            let entity = &mut entities[slot.entity];
            if let Some(p) = slot.position {
                entity.set_xy([params[p], params[p + 1]]);
            }
            let raw = [params[slot.facing], params[slot.facing + 1]];
            let len = length_2d(raw);
            if len > EPSILON && len.is_finite() {
                entity.facing = [raw[0] / len, raw[1] / len];
            }
        }
    }

    /// Chain per-entity gradients (taken at the unit facing) onto the raw parameters.
    pub fn gradient(&self, grads: &[EntityGrad], params: &DVector<f64>) -> DVector<f64> {
        let mut out = DVector::zeros(self.len);
        for slot in &self.slots {
            let Some(g) = grads.get(slot.entity) else {
                continue;
            };
            if let Some(p) = slot.position {
                out[p] = g.position[0];
                out[p + 1] = g.position[1];
            }
            let raw = [params[slot.facing], params[slot.facing + 1]];
            let len = length_2d(raw);
            if len > EPSILON {
                // d(r/|r|)/dr = (I - u u^T) / |r|
                let u = [raw[0] / len, raw[1] / len];
                let along = g.facing[0] * u[0] + g.facing[1] * u[1];
                out[slot.facing] = (g.facing[0] - along * u[0]) / len;
                out[slot.facing + 1] = (g.facing[1] - along * u[1]) / len;
            }
        }
        out
    }

    /// Project every raw facing back onto the unit circle.
    pub fn normalize_facings(&self, params: &mut DVector<f64>) {
        for slot in &self.slots {
            let raw = [params[slot.facing], params[slot.facing + 1]];
            let len = length_2d(raw);
            if len > EPSILON && len.is_finite() {
                params[slot.facing] = raw[0] / len;
                params[slot.facing + 1] = raw[1] / len;
            }
        }
    }
}
