//! Graph analysis utilities for the data-flow graph.
//!
//! These functions let the evaluation engine find the part of the graph that
//! has to be recomputed and the order in which to visit it.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use super::connection::{Connection, PortCoordinate, PortDirection};
use super::graph::Graph;
use super::node::NodeId;

/// Visit order for one evaluation pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvaluationOrder {
    /// Every node to visit, in order.
    pub order: Vec<NodeId>,
    /// Nodes caught in a cycle that no cycle-breaking node interrupts.
    /// They are also part of `order`, appended in insertion order.
    pub cyclic: Vec<NodeId>,
}

/// Connections feeding into a specific input port, in insertion order.
pub fn incoming_connections<'a>(
    graph: &'a Graph,
    coordinate: PortCoordinate,
) -> impl Iterator<Item = &'a Connection> + 'a {
    graph.connections().iter().filter(move |c| c.to == coordinate)
}

/// Nodes reading from a specific output port.
pub fn consumers_of(graph: &Graph, coordinate: PortCoordinate) -> Vec<NodeId> {
    let mut out = Vec::new();
    for conn in graph.connections() {
        if conn.from == coordinate
            && graph.contains_node(conn.to.node_id)
            && !out.contains(&conn.to.node_id)
        {
            out.push(conn.to.node_id);
        }
    }
    out
}

/// Direct successors of a node, deduplicated, in connection order.
pub fn successors(graph: &Graph, node_id: NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    for conn in graph.connections() {
        if conn.from.node_id == node_id
            && graph.contains_node(conn.to.node_id)
            && !out.contains(&conn.to.node_id)
        {
            out.push(conn.to.node_id);
        }
    }
    out
}

/// Every node reachable forward from `roots`, roots included.
///
/// Traversal stops at cycle-breaking nodes: their output only changes on the
/// next tick, so nothing behind them has to be recomputed now.
pub fn downstream_closure(
    graph: &Graph,
    roots: impl IntoIterator<Item = NodeId>,
    is_cycle_breaker: impl Fn(NodeId) -> bool,
) -> HashSet<NodeId> {
    let mut visited = HashSet::new();
    let mut queue = VecDeque::new();
    for root in roots {
        if graph.contains_node(root) && visited.insert(root) {
            queue.push_back(root);
        }
    }

    while let Some(current) = queue.pop_front() {
        for next in successors(graph, current) {
            if is_cycle_breaker(next) {
                continue;
            }
            if visited.insert(next) {
                queue.push_back(next);
            }
        }
    }
    visited
}

/// Orders `subset` for evaluation.
///
/// Cycle-breaking nodes come first since they only read values from the
/// previous tick. The rest is sorted with Kahn's algorithm, ties broken by
/// insertion order. Nodes left over by a cycle are appended in insertion order.
pub fn evaluation_order(
    graph: &Graph,
    subset: &HashSet<NodeId>,
    is_cycle_breaker: impl Fn(NodeId) -> bool,
) -> EvaluationOrder {
    let index: HashMap<NodeId, usize> = graph
        .node_ids()
        .iter()
        .enumerate()
        .map(|(i, id)| (*id, i))
        .collect();

    let mut members: Vec<(usize, NodeId)> = subset
        .iter()
        .filter_map(|id| index.get(id).map(|i| (*i, *id)))
        .collect();
    members.sort();

    let mut order: Vec<NodeId> = Vec::with_capacity(members.len());
    let mut rest: HashSet<NodeId> = HashSet::new();
    for (_, id) in &members {
        if is_cycle_breaker(*id) {
            order.push(*id);
        } else {
            rest.insert(*id);
        }
    }

    let mut in_degree: HashMap<NodeId, usize> = rest.iter().map(|id| (*id, 0)).collect();
    let mut adj: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
    for conn in graph.connections() {
        if rest.contains(&conn.from.node_id) && rest.contains(&conn.to.node_id) {
            adj.entry(conn.from.node_id).or_default().push(conn.to.node_id);
            if let Some(deg) = in_degree.get_mut(&conn.to.node_id) {
                *deg += 1;
            }
        }
    }

    let mut ready: BTreeSet<(usize, NodeId)> = in_degree
        .iter()
        .filter(|(_, deg)| **deg == 0)
        .map(|(id, _)| (index[id], *id))
        .collect();

    let mut emitted = HashSet::new();
    while let Some((_, node)) = ready.pop_first() {
        order.push(node);
        emitted.insert(node);
        for neighbor in adj.get(&node).into_iter().flatten() {
            if let Some(deg) = in_degree.get_mut(neighbor) {
                *deg -= 1;
                if *deg == 0 {
                    ready.insert((index[neighbor], *neighbor));
                }
            }
        }
    }

    let cyclic: Vec<NodeId> = members
        .iter()
        .map(|(_, id)| *id)
        .filter(|id| rest.contains(id) && !emitted.contains(id))
        .collect();
    order.extend(cyclic.iter().copied());

    EvaluationOrder { order, cyclic }
}

/// Validate a connection before adding it.
///
/// Checks:
/// - Both nodes and both ports exist
/// - The edge runs from an output to an input
/// - No self-connections
/// - At most one connection per input unless the port allows fan-in
pub fn validate_connection(graph: &Graph, conn: &Connection) -> Result<(), String> {
    if conn.from.direction != PortDirection::Output {
        return Err(format!("{} is not an output port", conn.from));
    }
    if conn.to.direction != PortDirection::Input {
        return Err(format!("{} is not an input port", conn.to));
    }

    let source = graph
        .node(conn.from.node_id)
        .ok_or_else(|| format!("Source node {} not found", conn.from.node_id))?;
    let dest = graph
        .node(conn.to.node_id)
        .ok_or_else(|| format!("Destination node {} not found", conn.to.node_id))?;

    if conn.from.node_id == conn.to.node_id {
        return Err("Cannot connect a node to itself".to_string());
    }

    if source.outputs.get(conn.from.port).is_none() {
        return Err(format!("Output port {} does not exist", conn.from));
    }
    let port = dest
        .inputs
        .get(conn.to.port)
        .ok_or_else(|| format!("Input port {} does not exist", conn.to))?;

    let existing: Vec<&Connection> = incoming_connections(graph, conn.to)
        .filter(|c| c.id != conn.id)
        .collect();
    if existing.iter().any(|c| c.from == conn.from) {
        return Err(format!("{} is already connected to {}", conn.from, conn.to));
    }
    if !existing.is_empty() && !port.allows_fan_in {
        return Err(format!("Input port {} already has a connection", conn.to));
    }

    Ok(())
}

/// Check if connecting `from_node → to_node` would close a cycle that no
/// cycle-breaking node interrupts.
pub fn would_create_cycle(
    graph: &Graph,
    from_node: NodeId,
    to_node: NodeId,
    is_cycle_breaker: impl Fn(NodeId) -> bool,
) -> bool {
    if is_cycle_breaker(from_node) || is_cycle_breaker(to_node) {
        return false;
    }
    let mut visited = HashSet::new();
    let mut queue = VecDeque::new();
    queue.push_back(to_node);

    while let Some(current) = queue.pop_front() {
        if current == from_node {
            return true;
        }
        if !visited.insert(current) {
            continue;
        }
        for next in successors(graph, current) {
            if !is_cycle_breaker(next) {
                queue.push_back(next);
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::node::{GraphNode, InputPort, OutputPort};
    use crate::model::value::{DataType, PortValue};

    fn number_node(type_id: &str, fan_in: bool) -> GraphNode {
        GraphNode::new(
            type_id,
            vec![InputPort {
                label: "in".to_string(),
                data_type: DataType::Number,
                value: PortValue::Number(0.0),
                follows_node_type: false,
                allows_fan_in: fan_in,
            }],
            vec![OutputPort {
                label: "out".to_string(),
                data_type: DataType::Number,
                value: PortValue::Number(0.0),
                follows_node_type: false,
            }],
        )
    }

    fn chain(len: usize) -> (Graph, Vec<NodeId>) {
        let mut graph = Graph::new();
        let ids: Vec<NodeId> = (0..len)
            .map(|_| graph.add_node(number_node("core.value", false)))
            .collect();
        for pair in ids.windows(2) {
            graph
                .add_connection(Connection::between(pair[0], 0, pair[1], 0))
                .unwrap();
        }
        (graph, ids)
    }

    #[test]
    fn test_closure_follows_edges_forward() {
        let (graph, ids) = chain(4);
        let closure = downstream_closure(&graph, [ids[1]], |_| false);
        assert_eq!(closure.len(), 3);
        assert!(!closure.contains(&ids[0]));
    }

    #[test]
    fn test_closure_stops_at_cycle_breaker() {
        let (graph, ids) = chain(4);
        let breaker = ids[2];
        let closure = downstream_closure(&graph, [ids[0]], |id| id == breaker);
        assert_eq!(closure, HashSet::from([ids[0], ids[1]]));
    }

    #[test]
    fn test_order_is_topological_regardless_of_insertion() {
        let mut graph = Graph::new();
        let sink = graph.add_node(number_node("core.value", false));
        let source = graph.add_node(number_node("core.value", false));
        graph
            .add_connection(Connection::between(source, 0, sink, 0))
            .unwrap();

        let subset = HashSet::from([sink, source]);
        let order = evaluation_order(&graph, &subset, |_| false);
        assert_eq!(order.order, vec![source, sink]);
        assert!(order.cyclic.is_empty());
    }

    #[test]
    fn test_independent_nodes_keep_insertion_order() {
        let mut graph = Graph::new();
        let ids: Vec<NodeId> = (0..5)
            .map(|_| graph.add_node(number_node("core.value", false)))
            .collect();
        let subset: HashSet<NodeId> = ids.iter().copied().collect();
        assert_eq!(evaluation_order(&graph, &subset, |_| false).order, ids);
    }

    #[test]
    fn test_cycle_without_breaker_is_reported() {
        let (mut graph, ids) = chain(3);
        graph.add_connection_unchecked(Connection::between(ids[2], 0, ids[0], 0));
        let subset: HashSet<NodeId> = ids.iter().copied().collect();
        let order = evaluation_order(&graph, &subset, |_| false);
        assert_eq!(order.cyclic, ids);
        assert_eq!(order.order, ids);
    }

    #[test]
    fn test_cycle_breaker_goes_first() {
        let (mut graph, ids) = chain(3);
        graph.add_connection_unchecked(Connection::between(ids[2], 0, ids[0], 0));
        let breaker = ids[1];
        let subset: HashSet<NodeId> = ids.iter().copied().collect();
        let order = evaluation_order(&graph, &subset, |id| id == breaker);
        assert_eq!(order.order, vec![ids[1], ids[2], ids[0]]);
        assert!(order.cyclic.is_empty());
    }

    #[test]
    fn test_validate_connection_self_loop() {
        let mut graph = Graph::new();
        let node = graph.add_node(number_node("core.value", false));
        let result = validate_connection(&graph, &Connection::between(node, 0, node, 0));
        assert!(result.unwrap_err().contains("itself"));
    }

    #[test]
    fn test_validate_connection_missing_port() {
        let (graph, ids) = chain(2);
        let result = validate_connection(&graph, &Connection::between(ids[0], 3, ids[1], 0));
        assert!(result.is_err());
    }

    #[test]
    fn test_fan_in_only_where_allowed() {
        let mut graph = Graph::new();
        let a = graph.add_node(number_node("core.value", false));
        let b = graph.add_node(number_node("core.value", false));
        let single = graph.add_node(number_node("core.value", false));
        let multi = graph.add_node(number_node("math.add", true));

        graph.add_connection(Connection::between(a, 0, single, 0)).unwrap();
        assert!(graph.add_connection(Connection::between(b, 0, single, 0)).is_err());

        graph.add_connection(Connection::between(a, 0, multi, 0)).unwrap();
        graph.add_connection(Connection::between(b, 0, multi, 0)).unwrap();
        assert!(graph.add_connection(Connection::between(b, 0, multi, 0)).is_err());
    }

    #[test]
    fn test_would_create_cycle_respects_breakers() {
        let (graph, ids) = chain(3);
        assert!(would_create_cycle(&graph, ids[2], ids[0], |_| false));
        let breaker = ids[1];
        assert!(!would_create_cycle(&graph, ids[2], ids[0], |id| id == breaker));
        assert!(!would_create_cycle(&graph, ids[0], ids[2], |_| false));
    }
}
