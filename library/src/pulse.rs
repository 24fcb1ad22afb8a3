//! Pulse detection and reversion.
//!
//! A pulse is a `PortValue::Pulse(t)` carrying the graph time at which it was
//! triggered. It reads as "firing" for one frame, after which the output that
//! produced it must be reset to the pulse zero.

use serde::{Deserialize, Serialize};

use crate::model::connection::PortCoordinate;
use crate::model::node::NodeId;
use crate::model::value::{DataType, PortValue};

/// Slack for graph times accumulated from frame durations.
const TIME_EPSILON: f64 = 1e-9;

/// Returns true while `graph_time` lies within `threshold` seconds after `pulse_at`.
///
/// `pulse_at == 0.0` is the pulse zero and never fires.
pub fn should_pulse(pulse_at: f64, graph_time: f64, threshold: f64) -> bool {
    if pulse_at == 0.0 {
        return false;
    }
    let age = graph_time - pulse_at;
    age >= -TIME_EPSILON && age < threshold - TIME_EPSILON
}

/// Whether a reversion scheduled for `apply_at` is due at `graph_time`.
pub fn is_due(apply_at: f64, graph_time: f64) -> bool {
    apply_at <= graph_time + TIME_EPSILON
}

pub fn is_firing(value: &PortValue, graph_time: f64, threshold: f64) -> bool {
    match value {
        PortValue::Pulse(at) => should_pulse(*at, graph_time, threshold),
        _ => false,
    }
}

/// Deferred write that resets a fired pulse output.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PulseReversion {
    pub coordinate: PortCoordinate,
    /// The pulse being reverted. The reversion is dropped if the output no
    /// longer holds this value when it comes due.
    pub pulse: PortValue,
    pub value: PortValue,
    pub apply_at: f64,
}

/// Reversion effects for every output of `node_id` that fires at `graph_time`.
pub fn reversion_effects(
    node_id: NodeId,
    outputs: &[PortValue],
    graph_time: f64,
    threshold: f64,
) -> Vec<PulseReversion> {
    outputs
        .iter()
        .enumerate()
        .filter_map(|(port, value)| match value {
            PortValue::Pulse(at) if should_pulse(*at, graph_time, threshold) => {
                Some(PulseReversion {
                    coordinate: PortCoordinate::output(node_id, port),
                    pulse: value.clone(),
                    value: PortValue::zero(DataType::Pulse),
                    apply_at: at + threshold,
                })
            }
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    const FRAME: f64 = 1.0 / 60.0;

    #[test]
    fn test_fires_for_one_frame_only() {
        assert!(should_pulse(1.0, 1.0, FRAME));
        assert!(should_pulse(1.0, 1.0 + FRAME / 2.0, FRAME));
        assert!(!should_pulse(1.0, 1.0 + FRAME, FRAME));
        assert!(!should_pulse(1.0, 0.99, FRAME));
    }

    #[test]
    fn test_next_frame_does_not_fire_again() {
        let mut t = 1.0;
        assert!(should_pulse(1.0, t, FRAME));
        t += FRAME;
        assert!(!should_pulse(1.0, t, FRAME));
        assert!(is_due(1.0 + FRAME, t));
    }

    #[test]
    fn test_pulse_zero_never_fires() {
        assert!(!should_pulse(0.0, 0.0, FRAME));
        assert!(!should_pulse(0.0, FRAME / 2.0, FRAME));
    }

    #[test]
    fn test_reversions_only_for_fired_pulses() {
        let node = Uuid::new_v4();
        let outputs = vec![
            PortValue::Pulse(2.0),
            PortValue::Number(2.0),
            PortValue::Pulse(1.0),
        ];
        let effects = reversion_effects(node, &outputs, 2.0, FRAME);
        assert_eq!(effects.len(), 1);
        assert_eq!(effects[0].coordinate, PortCoordinate::output(node, 0));
        assert_eq!(effects[0].value, PortValue::Pulse(0.0));
        assert!((effects[0].apply_at - (2.0 + FRAME)).abs() < 1e-12);
    }

    #[test]
    fn test_non_pulse_values_yield_nothing() {
        let effects = reversion_effects(Uuid::new_v4(), &[PortValue::Bool(true)], 1.0, FRAME);
        assert!(effects.is_empty());
    }
}
