use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

/// Easing curve of a classic animation.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ClassicAnimationCurve {
    #[default]
    Linear,
    QuadraticIn,
    QuadraticOut,
    QuadraticInOut,
    SinusoidalIn,
    SinusoidalOut,
    SinusoidalInOut,
    ExponentialIn,
    ExponentialOut,
    ExponentialInOut,
}

impl ClassicAnimationCurve {
    pub const ALL: [ClassicAnimationCurve; 10] = [
        Self::Linear,
        Self::QuadraticIn,
        Self::QuadraticOut,
        Self::QuadraticInOut,
        Self::SinusoidalIn,
        Self::SinusoidalOut,
        Self::SinusoidalInOut,
        Self::ExponentialIn,
        Self::ExponentialOut,
        Self::ExponentialInOut,
    ];

    /// Maps progress in `[0, 1]` to eased progress. Input is clamped.
    pub fn apply(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::QuadraticIn => t * t,
            Self::QuadraticOut => 1.0 - (1.0 - t) * (1.0 - t),
            Self::QuadraticInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            Self::SinusoidalIn => 1.0 - (t * PI / 2.0).cos(),
            Self::SinusoidalOut => (t * PI / 2.0).sin(),
            Self::SinusoidalInOut => -(PI * t).cos() / 2.0 + 0.5,
            Self::ExponentialIn => {
                if t == 0.0 {
                    0.0
                } else {
                    2.0_f64.powf(10.0 * t - 10.0)
                }
            }
            Self::ExponentialOut => {
                if t == 1.0 {
                    1.0
                } else {
                    1.0 - 2.0_f64.powf(-10.0 * t)
                }
            }
            Self::ExponentialInOut => {
                if t == 0.0 {
                    0.0
                } else if t == 1.0 {
                    1.0
                } else if t < 0.5 {
                    2.0_f64.powf(20.0 * t - 10.0) / 2.0
                } else {
                    (2.0 - 2.0_f64.powf(-20.0 * t + 10.0)) / 2.0
                }
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::QuadraticIn => "quadratic_in",
            Self::QuadraticOut => "quadratic_out",
            Self::QuadraticInOut => "quadratic_in_out",
            Self::SinusoidalIn => "sinusoidal_in",
            Self::SinusoidalOut => "sinusoidal_out",
            Self::SinusoidalInOut => "sinusoidal_in_out",
            Self::ExponentialIn => "exponential_in",
            Self::ExponentialOut => "exponential_out",
            Self::ExponentialInOut => "exponential_in_out",
        }
    }
}

impl fmt::Display for ClassicAnimationCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ClassicAnimationCurve {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        Self::ALL
            .iter()
            .copied()
            .find(|curve| curve.name() == wanted)
            .ok_or(())
    }
}
