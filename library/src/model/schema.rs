//! Versioned persistence envelope for graphs.
//!
//! Only the current schema version is accepted. Upgrading older documents is
//! left to an external migration step.

use serde::{Deserialize, Serialize};

use super::graph::Graph;
use crate::error::RuntimeError;

pub const CURRENT_SCHEMA_VERSION: u32 = 1;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct GraphDocument {
    pub version: u32,
    pub graph: Graph,
}

#[derive(Deserialize)]
struct VersionProbe {
    version: u32,
}

impl GraphDocument {
    pub fn new(graph: Graph) -> Self {
        Self {
            version: CURRENT_SCHEMA_VERSION,
            graph,
        }
    }

    pub fn load(json_str: &str) -> Result<Self, RuntimeError> {
        let probe: VersionProbe = serde_json::from_str(json_str)?;
        if probe.version != CURRENT_SCHEMA_VERSION {
            return Err(RuntimeError::UnsupportedSchemaVersion {
                found: probe.version,
                expected: CURRENT_SCHEMA_VERSION,
            });
        }
        let mut document: GraphDocument = serde_json::from_str(json_str)?;
        // Cached outputs are not persisted; start them from zero.
        document.graph.reset_outputs();
        Ok(document)
    }

    pub fn save(&self) -> Result<String, RuntimeError> {
        let current = GraphDocument {
            version: CURRENT_SCHEMA_VERSION,
            graph: self.graph.clone(),
        };
        Ok(serde_json::to_string(&current)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::connection::Connection;
    use crate::model::node::{GraphNode, InputPort, OutputPort};
    use crate::model::value::{DataType, PortValue};

    fn sample_graph() -> Graph {
        let mut graph = Graph::new();
        let make = || {
            GraphNode::new(
                "core.value",
                vec![InputPort {
                    label: "value".to_string(),
                    data_type: DataType::Bool,
                    value: PortValue::Bool(true),
                    follows_node_type: true,
                    allows_fan_in: false,
                }],
                vec![OutputPort {
                    label: "value".to_string(),
                    data_type: DataType::Bool,
                    value: PortValue::Bool(true),
                    follows_node_type: true,
                }],
            )
        };
        let a = graph.add_node(make());
        let b = graph.add_node(make());
        graph.add_connection(Connection::between(a, 0, b, 0)).unwrap();
        graph
    }

    #[test]
    fn test_save_and_load() {
        let document = GraphDocument::new(sample_graph());
        let json = document.save().unwrap();
        let loaded = GraphDocument::load(&json).unwrap();

        assert_eq!(loaded.version, CURRENT_SCHEMA_VERSION);
        assert_eq!(loaded.graph.node_ids(), document.graph.node_ids());
        assert_eq!(loaded.graph.connections(), document.graph.connections());
    }

    #[test]
    fn test_cached_outputs_are_not_persisted() {
        let json = GraphDocument::new(sample_graph()).save().unwrap();
        let loaded = GraphDocument::load(&json).unwrap();
        for node in loaded.graph.nodes() {
            assert_eq!(node.outputs[0].value, PortValue::Bool(false));
            assert_eq!(node.inputs[0].value, PortValue::Bool(true));
        }
    }

    #[test]
    fn test_rejects_other_versions() {
        let mut value: serde_json::Value =
            serde_json::from_str(&GraphDocument::new(Graph::new()).save().unwrap()).unwrap();
        value["version"] = serde_json::json!(CURRENT_SCHEMA_VERSION + 1);

        let err = GraphDocument::load(&value.to_string()).unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::UnsupportedSchemaVersion { found, .. } if found == CURRENT_SCHEMA_VERSION + 1
        ));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(GraphDocument::load("not json"), Err(RuntimeError::Json(_))));
    }
}
