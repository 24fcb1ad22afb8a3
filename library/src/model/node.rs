//! Generic graph node.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::value::{DataType, PortValue};

pub type NodeId = Uuid;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct InputPort {
    pub label: String,
    pub data_type: DataType,
    /// Manual value, used while nothing is connected.
    pub value: PortValue,
    /// Declared type tracks the node's user-visible type.
    #[serde(default)]
    pub follows_node_type: bool,
    #[serde(default)]
    pub allows_fan_in: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct OutputPort {
    pub label: String,
    pub data_type: DataType,
    /// Cached result of the last evaluation. Not persisted.
    #[serde(skip)]
    pub value: PortValue,
    #[serde(default)]
    pub follows_node_type: bool,
}

impl InputPort {
    /// Plain input whose declared type is taken from its manual value.
    pub fn new(label: &str, value: PortValue) -> Self {
        Self {
            label: label.to_string(),
            data_type: value.data_type(),
            value,
            follows_node_type: false,
            allows_fan_in: false,
        }
    }
}

impl OutputPort {
    pub fn new(label: &str, data_type: DataType) -> Self {
        Self {
            label: label.to_string(),
            data_type,
            value: PortValue::zero(data_type),
            follows_node_type: false,
        }
    }
}

/// A node instance in the graph.
///
/// `type_id` references a `NodeTypeDefinition` in the `NodeRegistry`, which
/// determines the node's evaluator and port layout.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct GraphNode {
    pub id: NodeId,
    pub type_id: String,
    /// Type chosen by the user for type-changeable nodes.
    #[serde(default)]
    pub user_visible_type: Option<DataType>,
    pub inputs: Vec<InputPort>,
    pub outputs: Vec<OutputPort>,
}

impl GraphNode {
    pub fn new(type_id: &str, inputs: Vec<InputPort>, outputs: Vec<OutputPort>) -> Self {
        Self::new_with_id(Uuid::new_v4(), type_id, inputs, outputs)
    }

    pub fn new_with_id(
        id: NodeId,
        type_id: &str,
        inputs: Vec<InputPort>,
        outputs: Vec<OutputPort>,
    ) -> Self {
        Self {
            id,
            type_id: type_id.to_string(),
            user_visible_type: None,
            inputs,
            outputs,
        }
    }

    pub fn input_value(&self, port: usize) -> Option<&PortValue> {
        self.inputs.get(port).map(|p| &p.value)
    }

    pub fn output_value(&self, port: usize) -> Option<&PortValue> {
        self.outputs.get(port).map(|p| &p.value)
    }

    pub fn output_values(&self) -> Vec<PortValue> {
        self.outputs.iter().map(|p| p.value.clone()).collect()
    }

    /// Resets cached outputs to the zero of their declared type.
    pub fn reset_outputs(&mut self) {
        for output in &mut self.outputs {
            output.value = PortValue::zero(output.data_type);
        }
    }
}
