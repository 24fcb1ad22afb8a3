//! Built-in node type definitions.

mod animation;
mod logic;
mod math;
mod media;
mod time;
mod value;

use crate::model::value::{DataType, PortValue};
use crate::plugin::NodeRegistry;
use crate::plugin::node_types::{NodeCategory, NodeTypeDefinition, PortDefinition};

/// Register all built-in node type definitions.
pub(crate) fn register_all_node_types(registry: &mut NodeRegistry) {
    for def in all_node_definitions() {
        registry.register_node_type(def);
    }
}

pub fn all_node_definitions() -> Vec<NodeTypeDefinition> {
    let mut defs = Vec::new();
    defs.extend(value::value_nodes());
    defs.extend(math::math_nodes());
    defs.extend(logic::logic_nodes());
    defs.extend(time::time_nodes());
    defs.extend(animation::animation_nodes());
    defs.extend(media::media_nodes());
    defs
}

// ---------------------------------------------------------------------------
// Port helpers
// ---------------------------------------------------------------------------

fn port(label: &str, dt: DataType) -> PortDefinition {
    PortDefinition::new(label, dt)
}

fn number(label: &str, default: f64) -> PortDefinition {
    PortDefinition::new(label, DataType::Number).with_default(PortValue::Number(default))
}

fn pulse(label: &str) -> PortDefinition {
    PortDefinition::new(label, DataType::Pulse)
}

/// Port whose type follows the node type, declared as a number by default.
fn typed(label: &str) -> PortDefinition {
    PortDefinition::new(label, DataType::Number).typed()
}

fn node(type_id: &str, name: &str, cat: NodeCategory) -> NodeTypeDefinition {
    NodeTypeDefinition::new(type_id, name, cat)
}
