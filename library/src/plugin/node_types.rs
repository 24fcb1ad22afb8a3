//! Node type definitions for the data-flow graph.

use crate::animation::AnimationKind;
use crate::model::coercion::coerce;
use crate::model::node::{GraphNode, InputPort, OutputPort};
use crate::model::value::{DataType, PortValue};

/// Category of a node type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeCategory {
    /// Plain values and display nodes
    Core,
    /// Arithmetic (add, multiply, etc.)
    Math,
    /// Pulse-driven logic (counter, sample and hold, etc.)
    Logic,
    /// Time operations (stopwatch, delays)
    Time,
    /// Animations (classic, spring, pop, smooth)
    Animation,
    /// Media import and sampling
    Media,
    /// Plugin-defined custom category
    Custom,
}

impl std::fmt::Display for NodeCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            NodeCategory::Core => "Core",
            NodeCategory::Math => "Math",
            NodeCategory::Logic => "Logic",
            NodeCategory::Time => "Time",
            NodeCategory::Animation => "Animation",
            NodeCategory::Media => "Media",
            NodeCategory::Custom => "Custom",
        };
        write!(f, "{}", s)
    }
}

/// Definition of a port on a node type.
#[derive(Clone, Debug)]
pub struct PortDefinition {
    /// Label shown in the UI (e.g. "Duration")
    pub label: String,
    pub data_type: DataType,
    /// Value used when nothing is connected. Zero of the type when absent.
    pub default_value: Option<PortValue>,
    /// Declared type tracks the node's user-visible type.
    pub follows_node_type: bool,
    /// Input accepts more than one connection.
    pub allows_fan_in: bool,
}

impl PortDefinition {
    pub fn new(label: &str, data_type: DataType) -> Self {
        Self {
            label: label.to_string(),
            data_type,
            default_value: None,
            follows_node_type: false,
            allows_fan_in: false,
        }
    }

    pub fn with_default(mut self, value: PortValue) -> Self {
        self.default_value = Some(value);
        self
    }

    /// Port type follows the node's user-visible type.
    pub fn typed(mut self) -> Self {
        self.follows_node_type = true;
        self
    }

    pub fn fan_in(mut self) -> Self {
        self.allows_fan_in = true;
        self
    }

    fn resolved_type(&self, node_type: Option<DataType>) -> DataType {
        match node_type {
            Some(t) if self.follows_node_type => t,
            _ => self.data_type,
        }
    }

    fn initial_value(&self, data_type: DataType) -> PortValue {
        match &self.default_value {
            Some(value) => coerce(value, data_type),
            None => PortValue::zero(data_type),
        }
    }
}

/// Definition of a node type, registered in the `NodeRegistry`.
///
/// Describes what a node of this type looks like: its ports and how the
/// engine must schedule it. Node instances are `GraphNode` structs whose
/// `type_id` references a `NodeTypeDefinition`.
#[derive(Debug, Clone)]
pub struct NodeTypeDefinition {
    /// Unique type identifier (e.g. "math.add", "animation.spring")
    pub type_id: String,
    /// Human-readable name (e.g. "Classic Animation")
    pub display_name: String,
    pub category: NodeCategory,
    /// Description shown in tooltips
    pub description: String,
    pub inputs: Vec<PortDefinition>,
    pub outputs: Vec<PortDefinition>,
    /// Initial user-visible type for type-changeable nodes.
    pub default_type: Option<DataType>,
    /// Output reflects the input of the previous tick, so cycles through it are allowed.
    pub breaks_cycles: bool,
    /// Output depends on graph time even when inputs are unchanged. Hosts use
    /// it to keep ticking while such nodes exist; the engine itself relies on
    /// `will_run_again` instead.
    pub time_dependent: bool,
    /// Output may differ between runs with identical inputs. Visited nodes of
    /// such kinds are listed in `EvaluationResult::non_deterministic`.
    pub non_deterministic: bool,
    /// Animation sub-state dropped when the node's user-visible type changes.
    /// Other ephemeral state is kept.
    pub type_change_reset: Option<AnimationKind>,
}

impl NodeTypeDefinition {
    pub fn new(type_id: &str, display_name: &str, category: NodeCategory) -> Self {
        Self {
            type_id: type_id.to_string(),
            display_name: display_name.to_string(),
            category,
            description: String::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            default_type: None,
            breaks_cycles: false,
            time_dependent: false,
            non_deterministic: false,
            type_change_reset: None,
        }
    }

    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = desc.to_string();
        self
    }

    pub fn with_inputs(mut self, inputs: Vec<PortDefinition>) -> Self {
        self.inputs = inputs;
        self
    }

    pub fn with_outputs(mut self, outputs: Vec<PortDefinition>) -> Self {
        self.outputs = outputs;
        self
    }

    pub fn with_default_type(mut self, data_type: DataType) -> Self {
        self.default_type = Some(data_type);
        self
    }

    pub fn cycle_breaker(mut self) -> Self {
        self.breaks_cycles = true;
        self
    }

    pub fn time_dependent(mut self) -> Self {
        self.time_dependent = true;
        self
    }

    pub fn non_deterministic(mut self) -> Self {
        self.non_deterministic = true;
        self
    }

    pub fn resets_on_type_change(mut self, kind: AnimationKind) -> Self {
        self.type_change_reset = Some(kind);
        self
    }

    /// Creates a node instance with default port values.
    ///
    /// `user_type` overrides `default_type` for type-changeable nodes and is
    /// ignored otherwise.
    pub fn instantiate(&self, user_type: Option<DataType>) -> GraphNode {
        let node_type = self.default_type.map(|d| user_type.unwrap_or(d));
        let inputs = self
            .inputs
            .iter()
            .map(|def| {
                let data_type = def.resolved_type(node_type);
                InputPort {
                    label: def.label.clone(),
                    data_type,
                    value: def.initial_value(data_type),
                    follows_node_type: def.follows_node_type,
                    allows_fan_in: def.allows_fan_in,
                }
            })
            .collect();
        let outputs = self
            .outputs
            .iter()
            .map(|def| {
                let data_type = def.resolved_type(node_type);
                OutputPort {
                    label: def.label.clone(),
                    data_type,
                    value: PortValue::zero(data_type),
                    follows_node_type: def.follows_node_type,
                }
            })
            .collect();
        let mut node = GraphNode::new(&self.type_id, inputs, outputs);
        node.user_visible_type = node_type;
        node
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed_definition() -> NodeTypeDefinition {
        NodeTypeDefinition::new("core.value", "Value", NodeCategory::Core)
            .with_default_type(DataType::Number)
            .with_inputs(vec![
                PortDefinition::new("Value", DataType::Number)
                    .typed()
                    .with_default(PortValue::Number(1.0)),
                PortDefinition::new("Label", DataType::String),
            ])
            .with_outputs(vec![PortDefinition::new("Value", DataType::Number).typed()])
    }

    #[test]
    fn test_instantiate_uses_defaults() {
        let node = typed_definition().instantiate(None);
        assert_eq!(node.type_id, "core.value");
        assert_eq!(node.user_visible_type, Some(DataType::Number));
        assert_eq!(node.inputs[0].value, PortValue::Number(1.0));
        assert_eq!(node.inputs[1].value, PortValue::String(String::new()));
        assert_eq!(node.outputs[0].value, PortValue::Number(0.0));
    }

    #[test]
    fn test_instantiate_with_user_type() {
        let node = typed_definition().instantiate(Some(DataType::Bool));
        assert_eq!(node.inputs[0].data_type, DataType::Bool);
        assert_eq!(node.inputs[0].value, PortValue::Bool(true));
        assert_eq!(node.inputs[1].data_type, DataType::String);
        assert_eq!(node.outputs[0].data_type, DataType::Bool);
    }

    #[test]
    fn test_static_nodes_ignore_user_type() {
        let def = NodeTypeDefinition::new("math.multiply", "Multiply", NodeCategory::Math)
            .with_inputs(vec![PortDefinition::new("A", DataType::Number)])
            .with_outputs(vec![PortDefinition::new("Result", DataType::Number)]);
        let node = def.instantiate(Some(DataType::Color));
        assert_eq!(node.user_visible_type, None);
        assert_eq!(node.outputs[0].data_type, DataType::Number);
    }
}
