use serde::{Deserialize, Serialize};

use super::easing::ClassicAnimationCurve;
use super::{Advanced, approx_eq_components};

/// Fixed-duration eased animation.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ClassicAnimationState {
    pub from: Vec<f64>,
    pub to: Vec<f64>,
    pub current: Vec<f64>,
    pub start_time: Option<f64>,
}

impl ClassicAnimationState {
    /// Advances toward `target`. A new target restarts the animation from the
    /// current value at `now`.
    pub fn advance(
        &self,
        target: &[f64],
        now: f64,
        duration: f64,
        curve: ClassicAnimationCurve,
    ) -> Advanced<Self> {
        let mut next = self.clone();
        if next.current.len() != target.len() {
            next = Self {
                current: vec![0.0; target.len()],
                ..Self::default()
            };
        }
        if next.start_time.is_none() || !approx_eq_components(&next.to, target) {
            next.from = next.current.clone();
            next.to = target.to_vec();
            next.start_time = Some(now);
        }

        let elapsed = now - next.start_time.unwrap_or(now);
        let finished = duration <= 0.0
            || elapsed >= duration
            || approx_eq_components(&next.from, &next.to);
        if finished {
            next.current = next.to.clone();
            return Advanced {
                value: next.current.clone(),
                settled: true,
                state: next,
            };
        }

        let eased = curve.apply(elapsed / duration);
        next.current = next
            .from
            .iter()
            .zip(&next.to)
            .map(|(a, b)| a + (b - a) * eased)
            .collect();
        Advanced {
            value: next.current.clone(),
            settled: false,
            state: next,
        }
    }
}
