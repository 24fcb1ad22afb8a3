use super::{node, port, pulse};
use crate::model::value::DataType;
use crate::plugin::node_types::{NodeCategory, NodeTypeDefinition};

pub(super) fn media_nodes() -> Vec<NodeTypeDefinition> {
    let nc = NodeCategory::Media;
    vec![
        node("media.import", "Import Media", nc)
            .with_description("Requests media for a source descriptor; empty until resolved")
            .with_inputs(vec![port("Source", DataType::String)])
            .with_outputs(vec![port("Media", DataType::Media)]),
        node("media.sample_range", "Sample Range", nc)
            .with_description("Captures the media between a start and an end pulse")
            .with_inputs(vec![
                port("Media", DataType::Media),
                pulse("Start"),
                pulse("End"),
            ])
            .with_outputs(vec![port("Media", DataType::Media)]),
    ]
}
