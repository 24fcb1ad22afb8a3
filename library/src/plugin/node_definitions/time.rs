use super::{node, number, port, pulse, typed};
use crate::model::value::DataType;
use crate::plugin::node_types::{NodeCategory, NodeTypeDefinition};

pub(super) fn time_nodes() -> Vec<NodeTypeDefinition> {
    let nc = NodeCategory::Time;
    vec![
        node("time.stopwatch", "Stopwatch", nc)
            .with_description("Elapsed seconds while running")
            .time_dependent()
            .with_inputs(vec![pulse("Start"), pulse("Stop"), pulse("Reset")])
            .with_outputs(vec![port("Time", DataType::Number)]),
        node("time.delay_one", "Delay One", nc)
            .with_description("Outputs the input of the previous evaluation; may close a loop")
            .cycle_breaker()
            .with_default_type(DataType::Number)
            .with_inputs(vec![typed("Value")])
            .with_outputs(vec![typed("Value")]),
        node("time.delay", "Delay", nc)
            .with_description("Re-emits every input change after the given number of seconds")
            .time_dependent()
            .with_default_type(DataType::Number)
            .with_inputs(vec![typed("Value"), number("Delay", 1.0)])
            .with_outputs(vec![typed("Value")]),
    ]
}
