use super::{node, typed};
use crate::model::value::{DataType, PortValue};
use crate::plugin::node_types::{NodeCategory, NodeTypeDefinition};

pub(super) fn math_nodes() -> Vec<NodeTypeDefinition> {
    let nc = NodeCategory::Math;
    vec![
        node("math.add", "Add", nc)
            .with_description("Sum of all inputs; the first input accepts several connections")
            .with_default_type(DataType::Number)
            .with_inputs(vec![typed("A").fan_in(), typed("B")])
            .with_outputs(vec![typed("Result")]),
        node("math.subtract", "Subtract", nc)
            .with_default_type(DataType::Number)
            .with_inputs(vec![typed("A"), typed("B")])
            .with_outputs(vec![typed("Result")]),
        node("math.multiply", "Multiply", nc)
            .with_default_type(DataType::Number)
            .with_inputs(vec![
                typed("A"),
                typed("B").with_default(PortValue::Number(1.0)),
            ])
            .with_outputs(vec![typed("Result")]),
        node("math.divide", "Divide", nc)
            .with_description("Division by zero yields zero")
            .with_default_type(DataType::Number)
            .with_inputs(vec![
                typed("A"),
                typed("B").with_default(PortValue::Number(1.0)),
            ])
            .with_outputs(vec![typed("Result")]),
    ]
}
