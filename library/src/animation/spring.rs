//! Spring physics animation.
//!
//! RK4-integrated damped harmonic oscillator, one per animated component.

use log::warn;
use serde::{Deserialize, Serialize};

use super::{Advanced, approx_eq_components};
use crate::config::SpringTolerance;

/// Largest step handed to the integrator; longer ticks are subdivided.
const MAX_SUBSTEP: f64 = 1.0 / 240.0;

/// Frames in a row a spring must be calm before it reports settled.
const CALM_FRAMES_TO_SETTLE: u32 = 2;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct SpringParams {
    pub mass: f64,
    pub stiffness: f64,
    pub damping: f64,
}

impl Default for SpringParams {
    fn default() -> Self {
        Self {
            mass: 1.0,
            stiffness: 130.5,
            damping: 18.85,
        }
    }
}

impl SpringParams {
    pub const DEFAULT_BOUNCINESS: f64 = 5.0;
    pub const DEFAULT_SPEED: f64 = 10.0;

    /// Converts designer-facing bounciness/speed into physical parameters.
    pub fn from_pop(bounciness: f64, speed: f64) -> Self {
        let b = project_normal(normalize(bounciness / 1.7, 0.0, 20.0), 0.0, 0.8);
        let s = normalize(speed / 1.7, 0.0, 20.0);
        let tension = project_normal(s, 0.5, 200.0);
        let friction = quadratic_out_interpolation(b, no_bounce_friction(tension), 0.01);
        Self {
            mass: 1.0,
            stiffness: (tension - 30.0) * 3.62 + 194.0,
            damping: (friction - 8.0) * 3.0 + 25.0,
        }
    }

    /// Replaces unusable parameters with the defaults. Mass must be positive;
    /// stiffness and damping must be finite.
    pub fn sanitized(self) -> Self {
        let defaults = Self::default();
        let finite_or = |value: f64, fallback: f64| if value.is_finite() { value } else { fallback };
        Self {
            mass: if self.mass.is_finite() && self.mass > 0.0 {
                self.mass
            } else {
                defaults.mass
            },
            stiffness: finite_or(self.stiffness, defaults.stiffness),
            damping: finite_or(self.damping, defaults.damping),
        }
    }

    /// Critical damping for this spring's stiffness and mass.
    pub fn critical_damping(&self) -> f64 {
        2.0 * (self.stiffness * self.mass).sqrt()
    }
}

fn normalize(value: f64, start: f64, end: f64) -> f64 {
    (value - start) / (end - start)
}

fn project_normal(n: f64, start: f64, end: f64) -> f64 {
    start + n * (end - start)
}

fn linear_interpolation(t: f64, start: f64, end: f64) -> f64 {
    t * end + (1.0 - t) * start
}

fn quadratic_out_interpolation(t: f64, start: f64, end: f64) -> f64 {
    linear_interpolation(2.0 * t - t * t, start, end)
}

/// Friction that removes all bounce for a given tension (fitted polynomials).
fn no_bounce_friction(tension: f64) -> f64 {
    let cubic = |x: f64, a: f64, b: f64, c: f64, d: f64| a * x.powi(3) + b * x.powi(2) + c * x + d;
    if tension <= 18.0 {
        cubic(tension, 0.0007, -0.031, 0.64, 1.28)
    } else if tension <= 44.0 {
        cubic(tension, 0.000044, -0.006, 0.36, 2.0)
    } else {
        cubic(tension, 0.00000045, -0.000332, 0.1078, 5.84)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct SpringAnimationState {
    pub position: Vec<f64>,
    pub velocity: Vec<f64>,
    pub target: Vec<f64>,
    pub params: Option<SpringParams>,
    pub last_time: Option<f64>,
    pub calm_frames: u32,
}

impl SpringAnimationState {
    /// Advances the spring to `now`, pulling toward `target`.
    pub fn advance(
        &self,
        target: &[f64],
        now: f64,
        params: SpringParams,
        tolerance: &SpringTolerance,
    ) -> Advanced<Self> {
        let params = params.sanitized();
        let mut next = self.clone();
        if next.position.len() != target.len() {
            next.position = vec![0.0; target.len()];
            next.velocity = vec![0.0; target.len()];
            next.target = vec![0.0; target.len()];
            next.last_time = None;
            next.calm_frames = 0;
        }
        if !approx_eq_components(&next.target, target) {
            next.target = target.to_vec();
            next.calm_frames = 0;
        }
        if next.params != Some(params) {
            if next.params.is_some() {
                next.velocity.iter_mut().for_each(|v| *v = 0.0);
            }
            next.params = Some(params);
            next.calm_frames = 0;
        }

        let dt = match next.last_time {
            Some(last) => (now - last).clamp(0.0, tolerance.max_step),
            None => 0.0,
        };
        next.last_time = Some(now);

        if params.stiffness <= 0.0 && params.damping <= 0.0 {
            return next.snap();
        }

        if dt > 0.0 {
            let steps = (dt / MAX_SUBSTEP).ceil().max(1.0) as usize;
            let h = dt / steps as f64;
            for i in 0..next.position.len() {
                let (mut x, mut v) = (next.position[i], next.velocity[i]);
                for _ in 0..steps {
                    (x, v) = rk4_step(x, v, next.target[i], &params, h);
                }
                next.position[i] = x;
                next.velocity[i] = v;
            }
            if next.position.iter().chain(&next.velocity).any(|c| !c.is_finite()) {
                warn!("Spring diverged with {:?}; snapping to target", params);
                return next.snap();
            }
        }

        let calm = next
            .position
            .iter()
            .zip(&next.target)
            .all(|(x, t)| (x - t).abs() < tolerance.position_epsilon)
            && next
                .velocity
                .iter()
                .all(|v| v.abs() < tolerance.velocity_epsilon);
        next.calm_frames = if calm { next.calm_frames + 1 } else { 0 };

        if next.calm_frames >= CALM_FRAMES_TO_SETTLE {
            return next.snap();
        }
        Advanced {
            value: next.position.clone(),
            settled: false,
            state: next,
        }
    }

    fn snap(mut self) -> Advanced<Self> {
        self.position = self.target.clone();
        self.velocity.iter_mut().for_each(|v| *v = 0.0);
        Advanced {
            value: self.position.clone(),
            settled: true,
            state: self,
        }
    }
}

fn acceleration(x: f64, v: f64, target: f64, params: &SpringParams) -> f64 {
    let spring_force = -params.stiffness * (x - target);
    let damping_force = -params.damping * v;
    (spring_force + damping_force) / params.mass
}

fn rk4_step(x: f64, v: f64, target: f64, params: &SpringParams, dt: f64) -> (f64, f64) {
    let k1_v = acceleration(x, v, target, params);
    let k1_x = v;

    let k2_v = acceleration(x + k1_x * dt * 0.5, v + k1_v * dt * 0.5, target, params);
    let k2_x = v + k1_v * dt * 0.5;

    let k3_v = acceleration(x + k2_x * dt * 0.5, v + k2_v * dt * 0.5, target, params);
    let k3_x = v + k2_v * dt * 0.5;

    let k4_v = acceleration(x + k3_x * dt, v + k3_v * dt, target, params);
    let k4_x = v + k3_v * dt;

    (
        x + (k1_x + 2.0 * k2_x + 2.0 * k3_x + k4_x) * dt / 6.0,
        v + (k1_v + 2.0 * k2_v + 2.0 * k3_v + k4_v) * dt / 6.0,
    )
}
