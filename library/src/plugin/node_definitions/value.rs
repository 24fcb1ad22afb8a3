use super::{node, typed};
use crate::model::value::DataType;
use crate::plugin::node_types::{NodeCategory, NodeTypeDefinition};

pub(super) fn value_nodes() -> Vec<NodeTypeDefinition> {
    vec![
        node("core.value", "Value", NodeCategory::Core)
            .with_description("Holds a value and passes it through; also used to display values")
            .with_default_type(DataType::Number)
            .with_inputs(vec![typed("Value")])
            .with_outputs(vec![typed("Value")]),
    ]
}
