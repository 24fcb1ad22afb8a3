use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use super::coercion::coerce;
use super::connection::{Connection, PortCoordinate, PortDirection};
use super::graph_analysis;
use super::node::{GraphNode, NodeId};
use super::value::PortValue;
use crate::error::RuntimeError;

/// Nodes plus the directed edges between their ports.
///
/// Node insertion order is kept and used as the stable tie-break when
/// ordering evaluation.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Graph {
    nodes: HashMap<NodeId, GraphNode>,
    node_order: Vec<NodeId>,
    connections: Vec<Connection>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node: GraphNode) -> NodeId {
        let id = node.id;
        if self.nodes.insert(id, node).is_none() {
            self.node_order.push(id);
        }
        id
    }

    /// Removes a node together with every connection touching it.
    pub fn remove_node(&mut self, id: NodeId) -> Option<GraphNode> {
        let node = self.nodes.remove(&id)?;
        self.node_order.retain(|n| *n != id);
        self.connections
            .retain(|c| c.from.node_id != id && c.to.node_id != id);
        Some(node)
    }

    pub fn node(&self, id: NodeId) -> Option<&GraphNode> {
        self.nodes.get(&id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut GraphNode> {
        self.nodes.get_mut(&id)
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Node ids in insertion order.
    pub fn node_ids(&self) -> &[NodeId] {
        &self.node_order
    }

    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.node_order.iter().filter_map(|id| self.nodes.get(id))
    }

    pub fn node_count(&self) -> usize {
        self.node_order.len()
    }

    pub fn insertion_index(&self, id: NodeId) -> Option<usize> {
        self.node_order.iter().position(|n| *n == id)
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Adds a connection after checking that both ends exist and fan-in is allowed.
    pub fn add_connection(&mut self, connection: Connection) -> Result<Uuid, RuntimeError> {
        graph_analysis::validate_connection(self, &connection)
            .map_err(RuntimeError::InvalidConnection)?;
        let id = connection.id;
        self.connections.push(connection);
        Ok(id)
    }

    /// Inserts a connection without validation. Evaluation tolerates dangling edges.
    pub fn add_connection_unchecked(&mut self, connection: Connection) {
        self.connections.push(connection);
    }

    pub fn remove_connection(&mut self, id: Uuid) -> Option<Connection> {
        let index = self.connections.iter().position(|c| c.id == id)?;
        Some(self.connections.remove(index))
    }

    /// Sets the manual value of an input port, coerced to its declared type.
    pub fn set_input(&mut self, coordinate: PortCoordinate, value: PortValue) -> Result<(), RuntimeError> {
        if coordinate.direction != PortDirection::Input {
            return Err(RuntimeError::InvalidConnection(format!(
                "{} is not an input port",
                coordinate
            )));
        }
        let node = self
            .nodes
            .get_mut(&coordinate.node_id)
            .ok_or(RuntimeError::NodeNotFound(coordinate.node_id))?;
        let port = node.inputs.get_mut(coordinate.port).ok_or_else(|| {
            RuntimeError::InvalidConnection(format!("{} does not exist", coordinate))
        })?;
        port.value = coerce(&value, port.data_type);
        Ok(())
    }

    /// Cached output or manual input value at `coordinate`.
    pub fn port_value(&self, coordinate: PortCoordinate) -> Option<&PortValue> {
        match coordinate.direction {
            PortDirection::Output => self.node(coordinate.node_id)?.output_value(coordinate.port),
            PortDirection::Input => self.node(coordinate.node_id)?.input_value(coordinate.port),
        }
    }

    pub fn reset_outputs(&mut self) {
        for node in self.nodes.values_mut() {
            node.reset_outputs();
        }
    }
}
