//! Animation state machines.
//!
//! Each animation is a plain-data state advanced by a pure step function:
//! given a target and the current graph time it returns the new value, the
//! new state and whether the animation has settled.

pub mod classic;
pub mod easing;
pub mod smooth;
pub mod spring;

use serde::{Deserialize, Serialize};

pub use classic::ClassicAnimationState;
pub use easing::ClassicAnimationCurve;
pub use smooth::SmoothValueState;
pub use spring::{SpringAnimationState, SpringParams};

use crate::model::value::approx_eq;

/// Result of a single animation step.
#[derive(Debug, Clone, PartialEq)]
pub struct Advanced<S> {
    pub value: Vec<f64>,
    pub state: S,
    pub settled: bool,
}

/// The animation sub-state of a node. At most one is active at a time.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum AnimationState {
    Spring(SpringAnimationState),
    Classic(ClassicAnimationState),
    SmoothValue(SmoothValueState),
}

impl AnimationState {
    pub fn kind(&self) -> AnimationKind {
        match self {
            AnimationState::Spring(_) => AnimationKind::Spring,
            AnimationState::Classic(_) => AnimationKind::Classic,
            AnimationState::SmoothValue(_) => AnimationKind::SmoothValue,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AnimationKind {
    Spring,
    Classic,
    SmoothValue,
}

pub(crate) fn approx_eq_components(a: &[f64], b: &[f64]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| approx_eq(*x, *y))
}
