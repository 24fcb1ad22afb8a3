use serde::{Deserialize, Serialize};

use super::Advanced;

/// Exponential low-pass toward a target.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct SmoothValueState {
    pub current: Vec<f64>,
    pub last_time: Option<f64>,
}

impl SmoothValueState {
    pub const DEFAULT_HYSTERESIS: f64 = 0.4;

    /// `hysteresis` is the share of the remaining distance kept per 60 Hz frame.
    pub fn advance(&self, target: &[f64], now: f64, hysteresis: f64, epsilon: f64) -> Advanced<Self> {
        let mut next = self.clone();
        if next.current.len() != target.len() {
            next.current = vec![0.0; target.len()];
            next.last_time = None;
        }
        let frames = match next.last_time {
            Some(last) => ((now - last) * 60.0).max(0.0),
            None => 0.0,
        };
        next.last_time = Some(now);

        let keep = hysteresis.clamp(0.0, 0.999).powf(frames);
        for (value, goal) in next.current.iter_mut().zip(target) {
            *value = goal + (*value - goal) * keep;
        }

        let settled = next
            .current
            .iter()
            .zip(target)
            .all(|(v, t)| (v - t).abs() < epsilon);
        if settled {
            next.current = target.to_vec();
        }
        Advanced {
            value: next.current.clone(),
            settled,
            state: next,
        }
    }

    /// Jumps straight to `target`.
    pub fn reset_to(&self, target: &[f64], now: f64) -> Self {
        Self {
            current: target.to_vec(),
            last_time: Some(now),
        }
    }
}
