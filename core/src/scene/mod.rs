//! Scene model: caller-facing entity descriptions and the per-solve registry.

pub mod types;
pub use types::*;

pub mod registry;
pub use registry::{Anchor, Entity, EntityRef, FixedPoint, SceneRegistry, VoidRegion};

#[cfg(test)]
mod tests_registry;
