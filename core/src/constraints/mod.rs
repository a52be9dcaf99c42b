//! Typed constraint model and its differentiable losses.

pub mod types;
pub use types::*;

pub mod loss;
pub use loss::{evaluate, EntityGrad, LossError, LossTerm};
