use super::{node, number, port, pulse, typed};
use crate::model::value::DataType;
use crate::plugin::node_types::{NodeCategory, NodeTypeDefinition};

pub(super) fn logic_nodes() -> Vec<NodeTypeDefinition> {
    use DataType::*;
    let nc = NodeCategory::Logic;
    vec![
        node("logic.pulse_on_change", "Pulse On Change", nc)
            .with_description("Pulses whenever the input differs from the previous evaluation")
            .with_default_type(Number)
            .with_inputs(vec![typed("Value")])
            .with_outputs(vec![port("Pulse", Pulse)]),
        node("logic.counter", "Counter", nc)
            .with_description("Counts pulses; wraps to zero at the maximum count when it is positive")
            .with_inputs(vec![
                pulse("Increase"),
                pulse("Decrease"),
                pulse("Jump"),
                number("Jump To", 0.0),
                number("Maximum Count", 0.0),
            ])
            .with_outputs(vec![port("Count", Number)]),
        node("logic.sample_and_hold", "Sample and Hold", nc)
            .with_default_type(Number)
            .with_inputs(vec![typed("Value"), pulse("Sample"), pulse("Reset")])
            .with_outputs(vec![typed("Value")]),
    ]
}
