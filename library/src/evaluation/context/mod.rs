//! Evaluation context — everything a node evaluator may read or mutate
//! during a single visit.

use uuid::Uuid;

use crate::config::RuntimeConfig;
use crate::model::coercion::{CoercionContext, coerce_with, is_truthy};
use crate::model::node::NodeId;
use crate::model::value::{DataType, PortValue};
use crate::pulse;
use crate::state::{EphemeralNodeState, MediaRequest, MediaSlot};

/// Per-visit context handed to a `NodeEvaluator`.
///
/// Inputs are already gathered from upstream cached outputs and coerced to
/// each port's declared type. Only the node's own ephemeral state is mutable.
pub struct NodeEvalContext<'a> {
    pub node_id: NodeId,
    pub type_id: &'a str,
    /// Current graph time in seconds.
    pub time: f64,
    pub config: &'a RuntimeConfig,
    pub state: &'a mut EphemeralNodeState,
    inputs: &'a [Vec<PortValue>],
    input_types: &'a [DataType],
    output_types: &'a [DataType],
    previous_outputs: &'a [PortValue],
    media_requests: &'a mut Vec<MediaRequest>,
}

/// Borrowed input data for building a `NodeEvalContext`.
pub struct NodePorts<'a> {
    /// One entry per input port; several values on fan-in ports.
    pub inputs: &'a [Vec<PortValue>],
    pub input_types: &'a [DataType],
    pub output_types: &'a [DataType],
    pub previous_outputs: &'a [PortValue],
}

impl<'a> NodeEvalContext<'a> {
    pub fn new(
        node_id: NodeId,
        type_id: &'a str,
        time: f64,
        config: &'a RuntimeConfig,
        state: &'a mut EphemeralNodeState,
        ports: NodePorts<'a>,
        media_requests: &'a mut Vec<MediaRequest>,
    ) -> Self {
        Self {
            node_id,
            type_id,
            time,
            config,
            state,
            inputs: ports.inputs,
            input_types: ports.input_types,
            output_types: ports.output_types,
            previous_outputs: ports.previous_outputs,
            media_requests,
        }
    }

    pub fn coercion(&self) -> CoercionContext {
        CoercionContext {
            graph_time: self.time,
            pulse_threshold: self.config.pulse_threshold,
        }
    }

    pub fn input_type(&self, port: usize) -> DataType {
        self.input_types
            .get(port)
            .copied()
            .unwrap_or(DataType::Number)
    }

    pub fn output_type(&self, port: usize) -> DataType {
        self.output_types
            .get(port)
            .copied()
            .unwrap_or(DataType::Number)
    }

    pub fn output_count(&self) -> usize {
        self.output_types.len()
    }

    /// First value on an input port, or the zero of its type.
    pub fn input(&self, port: usize) -> PortValue {
        self.inputs
            .get(port)
            .and_then(|values| values.first())
            .cloned()
            .unwrap_or_else(|| PortValue::zero(self.input_type(port)))
    }

    /// Every value arriving on an input port (more than one on fan-in ports).
    pub fn input_values(&self, port: usize) -> &[PortValue] {
        self.inputs.get(port).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn number(&self, port: usize) -> f64 {
        match coerce_with(&self.input(port), DataType::Number, &self.coercion()) {
            PortValue::Number(n) => n,
            _ => 0.0,
        }
    }

    pub fn truthy(&self, port: usize) -> bool {
        is_truthy(&self.input(port), &self.coercion())
    }

    /// True if a pulse on the port is firing and this node has not acted on
    /// it yet. Revisiting the node during the same pulse reads false.
    pub fn pulsed(&mut self, port: usize) -> bool {
        let (time, threshold) = (self.time, self.config.pulse_threshold);
        let firing = self
            .input_values(port)
            .iter()
            .filter_map(|v| match v {
                PortValue::Pulse(at) if pulse::should_pulse(*at, time, threshold) => Some(*at),
                _ => None,
            })
            .reduce(f64::max);
        let Some(at) = firing else {
            return false;
        };
        if self.state.consumed_pulses.get(&port) == Some(&at) {
            return false;
        }
        self.state.consumed_pulses.insert(port, at);
        true
    }

    /// Output cached by the previous visit, or the zero of its type.
    pub fn previous_output(&self, port: usize) -> PortValue {
        self.previous_outputs
            .get(port)
            .cloned()
            .unwrap_or_else(|| PortValue::zero(self.output_type(port)))
    }

    pub fn previous_outputs(&self) -> Vec<PortValue> {
        (0..self.output_count()).map(|i| self.previous_output(i)).collect()
    }

    /// Coerces `value` to the declared type of an output port.
    pub fn to_output_type(&self, port: usize, value: &PortValue) -> PortValue {
        coerce_with(value, self.output_type(port), &self.coercion())
    }

    /// Stores a fresh media request for this node and queues it for the host.
    pub fn request_media(&mut self, descriptor: &str) -> Uuid {
        let slot = MediaSlot::new(descriptor);
        let request_id = slot.request_id;
        self.media_requests.push(slot.request(self.node_id));
        self.state.media_slot = Some(slot);
        request_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_inputs_read_as_zero() {
        let config = RuntimeConfig::default();
        let mut state = EphemeralNodeState::default();
        let mut requests = Vec::new();
        let inputs = vec![vec![PortValue::Number(2.0)]];
        let mut ctx = NodeEvalContext::new(
            Uuid::new_v4(),
            "math.add",
            0.0,
            &config,
            &mut state,
            NodePorts {
                inputs: &inputs,
                input_types: &[DataType::Number, DataType::Pulse],
                output_types: &[DataType::Number],
                previous_outputs: &[],
            },
            &mut requests,
        );
        assert_eq!(ctx.input(0), PortValue::Number(2.0));
        assert_eq!(ctx.input(1), PortValue::Pulse(0.0));
        assert!(!ctx.pulsed(1));
        assert_eq!(ctx.previous_output(0), PortValue::Number(0.0));
        assert_eq!(ctx.number(7), 0.0);
    }

    #[test]
    fn test_pulse_is_consumed_once() {
        let config = RuntimeConfig::default();
        let mut state = EphemeralNodeState::default();
        let mut requests = Vec::new();
        let inputs = vec![vec![PortValue::Pulse(1.0)]];
        let ports = || NodePorts {
            inputs: &inputs,
            input_types: &[DataType::Pulse],
            output_types: &[],
            previous_outputs: &[],
        };
        let id = Uuid::new_v4();
        {
            let mut ctx =
                NodeEvalContext::new(id, "logic.counter", 1.0, &config, &mut state, ports(), &mut requests);
            assert!(ctx.pulsed(0));
            assert!(!ctx.pulsed(0));
        }
        let mut again =
            NodeEvalContext::new(id, "logic.counter", 1.0, &config, &mut state, ports(), &mut requests);
        assert!(!again.pulsed(0));
    }

    #[test]
    fn test_request_media_fills_slot() {
        let config = RuntimeConfig::default();
        let mut state = EphemeralNodeState::default();
        let mut requests = Vec::new();
        let node_id = Uuid::new_v4();
        let request_id = {
            let mut ctx = NodeEvalContext::new(
                node_id,
                "media.import",
                0.0,
                &config,
                &mut state,
                NodePorts {
                    inputs: &[],
                    input_types: &[],
                    output_types: &[DataType::Media],
                    previous_outputs: &[],
                },
                &mut requests,
            );
            ctx.request_media("cat.png")
        };
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].node_id, node_id);
        assert_eq!(state.media_slot.as_ref().map(|s| s.request_id), Some(request_id));
    }
}
