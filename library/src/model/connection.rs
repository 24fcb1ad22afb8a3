//! Port coordinates and connections of the data-flow graph.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::node::NodeId;

/// Direction of a port.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum PortDirection {
    Input,
    Output,
}

/// Identifies a specific port on a specific node.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortCoordinate {
    pub node_id: NodeId,
    pub port: usize,
    pub direction: PortDirection,
}

impl PortCoordinate {
    pub fn input(node_id: NodeId, port: usize) -> Self {
        Self {
            node_id,
            port,
            direction: PortDirection::Input,
        }
    }

    pub fn output(node_id: NodeId, port: usize) -> Self {
        Self {
            node_id,
            port,
            direction: PortDirection::Output,
        }
    }
}

impl fmt::Display for PortCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dir = match self.direction {
            PortDirection::Input => "in",
            PortDirection::Output => "out",
        };
        write!(f, "{}.{}[{}]", self.node_id, dir, self.port)
    }
}

/// A directed edge from an output port to an input port.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Connection {
    pub id: Uuid,
    pub from: PortCoordinate,
    pub to: PortCoordinate,
}

impl Connection {
    pub fn new(from: PortCoordinate, to: PortCoordinate) -> Self {
        Self {
            id: Uuid::new_v4(),
            from,
            to,
        }
    }

    /// Convenience for `output(from_node, from_port) -> input(to_node, to_port)`.
    pub fn between(from_node: NodeId, from_port: usize, to_node: NodeId, to_port: usize) -> Self {
        Self::new(
            PortCoordinate::output(from_node, from_port),
            PortCoordinate::input(to_node, to_port),
        )
    }
}
