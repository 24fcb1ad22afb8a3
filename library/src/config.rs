//! Runtime tuning knobs, loadable from TOML.

use crate::error::RuntimeError;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Tolerances for the spring integrator.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SpringTolerance {
    /// Maximum distance from the target still considered at rest.
    pub position_epsilon: f64,
    /// Maximum speed still considered at rest.
    pub velocity_epsilon: f64,
    /// Largest time delta integrated in a single tick, in seconds.
    /// Longer gaps (a paused prototype, a debugger break) are clamped.
    pub max_step: f64,
}

impl Default for SpringTolerance {
    fn default() -> Self {
        Self {
            position_epsilon: 1e-3,
            velocity_epsilon: 1e-2,
            max_step: 1.0 / 15.0,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Window, in seconds, during which a pulse counts as firing.
    pub pulse_threshold: f64,
    /// How many times a node may be visited within one tick.
    pub max_visits_per_node: u32,
    pub spring: SpringTolerance,
    pub smooth_epsilon: f64,
    /// Used by classic animations whose duration input is negative or not finite.
    pub classic_default_duration: f64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            pulse_threshold: 1.0 / 60.0,
            max_visits_per_node: 1,
            spring: SpringTolerance::default(),
            smooth_epsilon: 1e-3,
            classic_default_duration: 1.0,
        }
    }
}

impl RuntimeConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, RuntimeError> {
        Ok(toml::from_str(source)?)
    }

    pub fn to_toml_string(&self) -> Result<String, RuntimeError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Loads a config file, falling back to defaults when it is missing or broken.
pub fn load_config(path: &Path) -> RuntimeConfig {
    match fs::read_to_string(path) {
        Ok(content) => match RuntimeConfig::from_toml_str(&content) {
            Ok(config) => {
                info!("Loaded runtime config from {}", path.display());
                config
            }
            Err(e) => {
                warn!("Failed to parse runtime config, using defaults: {}", e);
                RuntimeConfig::default()
            }
        },
        Err(e) => {
            warn!("Failed to read runtime config, using defaults: {}", e);
            RuntimeConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RuntimeConfig::default();
        assert!((config.pulse_threshold - 1.0 / 60.0).abs() < 1e-12);
        assert_eq!(config.max_visits_per_node, 1);
        assert_eq!(config.classic_default_duration, 1.0);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = RuntimeConfig::from_toml_str(
            r#"
            max_visits_per_node = 4

            [spring]
            position_epsilon = 0.01
            "#,
        )
        .unwrap();
        assert_eq!(config.max_visits_per_node, 4);
        assert_eq!(config.spring.position_epsilon, 0.01);
        assert_eq!(config.spring.velocity_epsilon, 1e-2);
        assert_eq!(config.smooth_epsilon, 1e-3);
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let err = RuntimeConfig::from_toml_str("max_visits_per_node = \"many\"").unwrap_err();
        assert!(matches!(err, RuntimeError::Config(_)));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = RuntimeConfig {
            max_visits_per_node: 3,
            ..Default::default()
        };
        let text = config.to_toml_string().unwrap();
        assert_eq!(RuntimeConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = load_config(Path::new("/nonexistent/graph_runtime.toml"));
        assert_eq!(config, RuntimeConfig::default());
    }
}
