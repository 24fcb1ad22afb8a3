//! Evaluation engine: incremental, push-based evaluation of the data-flow graph.
//!
//! A call to [`EvalEngine::evaluate`] recomputes only the nodes downstream of
//! what changed since the previous tick, plus nodes that asked to run again.
//! Cached outputs live on the graph; ephemeral state lives in the engine.

use log::{debug, warn};
use ordered_float::OrderedFloat;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use uuid::Uuid;

use super::context::{NodeEvalContext, NodePorts};
use super::evaluator::{NodeEvaluator, find_evaluator};
use super::output::{Diagnostic, EvaluationResult, SideEffect};
use crate::config::RuntimeConfig;
use crate::error::RuntimeError;
use crate::model::coercion::{CoercionContext, coerce, coerce_with};
use crate::model::connection::{Connection, PortCoordinate, PortDirection};
use crate::model::graph::Graph;
use crate::model::graph_analysis::{
    consumers_of, downstream_closure, evaluation_order, incoming_connections, would_create_cycle,
};
use crate::model::node::{GraphNode, NodeId};
use crate::model::value::{DataType, PortValue};
use crate::plugin::{NodeRegistry, NodeTypeDefinition};
use crate::pulse;
use crate::state::media::{MediaResolutionReceiver, MediaResolutionSender, media_channel};
use crate::state::{EphemeralNodeState, EphemeralStateStore};

type ReversionKey = (OrderedFloat<f64>, PortCoordinate);

/// Outcome of visiting one node.
struct Visit {
    changed_ports: Vec<usize>,
    will_run_again: bool,
}

/// Holds the registered evaluators and node types, and all state that
/// survives between ticks.
pub struct EvalEngine {
    evaluators: Vec<Box<dyn NodeEvaluator>>,
    registry: NodeRegistry,
    config: RuntimeConfig,
    states: EphemeralStateStore,
    /// Pulse outputs waiting to fall back to the pulse zero, keyed by due time.
    /// The value is the pulse that has to still be present.
    pending_reversions: BTreeMap<ReversionKey, PortValue>,
    /// Nodes to visit on the next tick.
    scheduled: HashSet<NodeId>,
    media_tx: MediaResolutionSender,
    media_rx: MediaResolutionReceiver,
}

impl Default for EvalEngine {
    fn default() -> Self {
        Self::new(RuntimeConfig::default())
    }
}

impl EvalEngine {
    /// Engine with the built-in node types but no evaluators.
    pub fn new(config: RuntimeConfig) -> Self {
        let (media_tx, media_rx) = media_channel();
        Self {
            evaluators: Vec::new(),
            registry: NodeRegistry::with_builtin_nodes(),
            config,
            states: EphemeralStateStore::new(),
            pending_reversions: BTreeMap::new(),
            scheduled: HashSet::new(),
            media_tx,
            media_rx,
        }
    }

    /// Create an engine with all built-in evaluators registered.
    pub fn with_default_evaluators(config: RuntimeConfig) -> Self {
        use super::evaluators::animation::AnimationEvaluator;
        use super::evaluators::logic::LogicEvaluator;
        use super::evaluators::math::MathEvaluator;
        use super::evaluators::media::MediaEvaluator;
        use super::evaluators::time::TimeEvaluator;
        use super::evaluators::value::ValueEvaluator;

        let mut engine = Self::new(config);
        engine.register(Box::new(ValueEvaluator));
        engine.register(Box::new(MathEvaluator));
        engine.register(Box::new(LogicEvaluator));
        engine.register(Box::new(TimeEvaluator));
        engine.register(Box::new(AnimationEvaluator));
        engine.register(Box::new(MediaEvaluator));
        engine
    }

    /// Register a node evaluator.
    pub fn register(&mut self, evaluator: Box<dyn NodeEvaluator>) {
        self.evaluators.push(evaluator);
    }

    pub fn register_node_type(&mut self, def: NodeTypeDefinition) {
        self.registry.register_node_type(def);
    }

    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn state(&self, node_id: NodeId) -> Option<&EphemeralNodeState> {
        self.states.get(node_id)
    }

    /// Handle for delivering media resolutions from other tasks.
    pub fn media_sender(&self) -> MediaResolutionSender {
        self.media_tx.clone()
    }

    /// True while some node asked to run again or a pulse is waiting to revert.
    pub fn has_scheduled_work(&self) -> bool {
        !self.scheduled.is_empty() || !self.pending_reversions.is_empty()
    }

    // ---------------------------------------------------------------
    // Graph editing
    // ---------------------------------------------------------------

    /// Instantiates a registered node type into `graph` and schedules it.
    pub fn add_node(&mut self, graph: &mut Graph, type_id: &str) -> Result<NodeId, RuntimeError> {
        let node = self.registry.create_node(type_id)?;
        Ok(self.insert_node(graph, node))
    }

    pub fn add_typed_node(
        &mut self,
        graph: &mut Graph,
        type_id: &str,
        data_type: DataType,
    ) -> Result<NodeId, RuntimeError> {
        let node = self.registry.create_typed_node(type_id, Some(data_type))?;
        Ok(self.insert_node(graph, node))
    }

    fn insert_node(&mut self, graph: &mut Graph, node: GraphNode) -> NodeId {
        let id = graph.add_node(node);
        self.scheduled.insert(id);
        id
    }

    /// Adds a connection, refusing edges that would close a cycle without a
    /// cycle-breaking node in it.
    pub fn connect(&mut self, graph: &mut Graph, connection: Connection) -> Result<Uuid, RuntimeError> {
        let (from, to) = (connection.from.node_id, connection.to.node_id);
        let view: &Graph = graph;
        if would_create_cycle(view, from, to, |id| self.is_cycle_breaker(view, id)) {
            return Err(RuntimeError::InvalidConnection(format!(
                "{} -> {} would create a cycle without delay",
                connection.from, connection.to
            )));
        }
        let id = graph.add_connection(connection)?;
        self.scheduled.insert(to);
        Ok(id)
    }

    /// Removes a connection and schedules the node that lost an input.
    pub fn disconnect(&mut self, graph: &mut Graph, connection_id: Uuid) -> Option<Connection> {
        let removed = graph.remove_connection(connection_id)?;
        if graph.contains_node(removed.to.node_id) {
            self.scheduled.insert(removed.to.node_id);
        }
        Some(removed)
    }

    /// Removes a node together with its edges and ephemeral state.
    pub fn remove_node(&mut self, graph: &mut Graph, node_id: NodeId) -> Option<GraphNode> {
        let consumers: Vec<NodeId> = graph
            .connections()
            .iter()
            .filter(|c| c.from.node_id == node_id && c.to.node_id != node_id)
            .map(|c| c.to.node_id)
            .collect();
        let removed = graph.remove_node(node_id)?;
        self.states.remove(node_id);
        self.scheduled.remove(&node_id);
        self.pending_reversions
            .retain(|(_, coordinate), _| coordinate.node_id != node_id);
        self.scheduled.extend(consumers);
        Some(removed)
    }

    /// Switches the data type of a node's type-following ports.
    ///
    /// The first such input remembers its value per type, so switching back
    /// restores what the user had typed before.
    pub fn change_node_type(
        &mut self,
        graph: &mut Graph,
        node_id: NodeId,
        new_type: DataType,
    ) -> Result<(), RuntimeError> {
        let node = graph
            .node_mut(node_id)
            .ok_or(RuntimeError::NodeNotFound(node_id))?;
        let old_type = node
            .user_visible_type
            .ok_or_else(|| RuntimeError::TypeNotChangeable(node.type_id.clone()))?;
        if old_type == new_type {
            return Ok(());
        }

        let state = self.states.get_or_create(node_id);
        if let Some(port) = node.inputs.iter().find(|p| p.follows_node_type) {
            state
                .preserved_values_by_type
                .insert(old_type, port.value.clone());
        }
        let mut restored = state.preserved_values_by_type.get(&new_type).cloned();

        for port in node.inputs.iter_mut().filter(|p| p.follows_node_type) {
            port.data_type = new_type;
            port.value = match restored.take() {
                Some(value) => value,
                None => coerce(&port.value, new_type),
            };
        }
        for port in node.outputs.iter_mut().filter(|p| p.follows_node_type) {
            port.data_type = new_type;
            port.value = coerce(&port.value, new_type);
        }
        node.user_visible_type = Some(new_type);

        let kind = node.type_id.clone();
        self.notify_type_changed(node_id, old_type, new_type, &kind);
        Ok(())
    }

    /// Clears the animation sub-state `node_kind` declares as type-specific,
    /// and schedules the node.
    pub fn notify_type_changed(
        &mut self,
        node_id: NodeId,
        old_type: DataType,
        new_type: DataType,
        node_kind: &str,
    ) {
        let reset = self.registry.type_change_reset(node_kind);
        self.states.on_type_changed(node_id, old_type, new_type, reset);
        self.scheduled.insert(node_id);
    }

    /// Drops all ephemeral state and cached outputs, as on a prototype restart.
    ///
    /// Every node is scheduled, so the next `evaluate` recomputes the whole
    /// graph from scratch.
    pub fn reset_all_ephemeral_state(&mut self, graph: &mut Graph) {
        self.states.reset_all();
        self.pending_reversions.clear();
        let stale = self.media_rx.drain();
        if !stale.is_empty() {
            debug!("Discarded {} media resolutions on reset", stale.len());
        }
        graph.reset_outputs();
        self.scheduled = graph.node_ids().iter().copied().collect();
        debug!("Reset ephemeral state of {} nodes", graph.node_count());
    }

    // ---------------------------------------------------------------
    // Evaluation
    // ---------------------------------------------------------------

    /// Recomputes everything affected by `changed` at graph time `time`.
    ///
    /// Input coordinates mark their node dirty, output coordinates mark the
    /// nodes reading them. Nodes scheduled by the previous tick, due pulse
    /// reversions and freshly resolved media are folded in as well.
    pub fn evaluate(
        &mut self,
        graph: &mut Graph,
        changed: &HashSet<PortCoordinate>,
        time: f64,
    ) -> EvaluationResult {
        self.evaluate_from(graph, changed, &[], time)
    }

    /// Visits every node in the graph.
    pub fn evaluate_all(&mut self, graph: &mut Graph, time: f64) -> EvaluationResult {
        let all = graph.node_ids().to_vec();
        self.evaluate_from(graph, &HashSet::new(), &all, time)
    }

    fn evaluate_from(
        &mut self,
        graph: &mut Graph,
        changed: &HashSet<PortCoordinate>,
        extra_roots: &[NodeId],
        time: f64,
    ) -> EvaluationResult {
        let mut result = EvaluationResult::default();
        let mut roots: HashSet<NodeId> = extra_roots.iter().copied().collect();

        self.apply_media_resolutions(graph, &mut roots, &mut result);
        self.apply_due_reversions(graph, time, &mut roots, &mut result);

        let mut changed: Vec<PortCoordinate> = changed.iter().copied().collect();
        changed.sort();
        for coordinate in changed {
            if !Self::port_exists(graph, coordinate) {
                warn!("Ignoring change on missing port {}", coordinate);
                result
                    .diagnostics
                    .push(Diagnostic::MalformedCoordinate { coordinate });
            } else if coordinate.direction == PortDirection::Input {
                roots.insert(coordinate.node_id);
            } else {
                roots.extend(consumers_of(graph, coordinate));
            }
        }

        roots.extend(
            self.scheduled
                .drain()
                .filter(|id| graph.contains_node(*id)),
        );

        self.run_pass(graph, roots, time, &mut result);
        debug!(
            "Evaluated {} nodes at t={:.3}: {} outputs updated, {} diagnostics, {} scheduled",
            result.visited.len(),
            time,
            result.updated_outputs.len(),
            result.diagnostics.len(),
            result.scheduled.len()
        );
        result
    }

    fn apply_media_resolutions(
        &mut self,
        graph: &Graph,
        roots: &mut HashSet<NodeId>,
        result: &mut EvaluationResult,
    ) {
        for resolution in self.media_rx.drain() {
            if !graph.contains_node(resolution.node_id) {
                debug!("Media resolution for removed node {}", resolution.node_id);
                continue;
            }
            if !self.states.apply_media_resolution(&resolution) {
                debug!("Stale media resolution for {}", resolution.node_id);
                continue;
            }
            if resolution.media.is_none() {
                warn!("Media for node {} could not be resolved", resolution.node_id);
                result.diagnostics.push(Diagnostic::MediaUnresolved {
                    node_id: resolution.node_id,
                });
            }
            roots.insert(resolution.node_id);
        }
    }

    /// Writes the pulse zero to every pulse output whose reversion is due,
    /// unless the output fired again in the meantime.
    fn apply_due_reversions(
        &mut self,
        graph: &mut Graph,
        time: f64,
        roots: &mut HashSet<NodeId>,
        result: &mut EvaluationResult,
    ) {
        while let Some(entry) = self.pending_reversions.first_entry() {
            if !pulse::is_due(entry.key().0.into_inner(), time) {
                break;
            }
            let ((_, coordinate), expected) = entry.remove_entry();
            let Some(port) = graph
                .node_mut(coordinate.node_id)
                .and_then(|n| n.outputs.get_mut(coordinate.port))
            else {
                continue;
            };
            if port.value != expected {
                continue;
            }
            port.value = PortValue::Pulse(0.0);
            result
                .updated_outputs
                .insert(coordinate, PortValue::Pulse(0.0));
            roots.extend(consumers_of(graph, coordinate));
        }
    }

    fn run_pass(
        &mut self,
        graph: &mut Graph,
        roots: HashSet<NodeId>,
        time: f64,
        result: &mut EvaluationResult,
    ) {
        let breakers: HashSet<NodeId> = graph
            .nodes()
            .filter(|n| self.registry.breaks_cycles(&n.type_id))
            .map(|n| n.id)
            .collect();
        let is_breaker = |id: NodeId| breakers.contains(&id);

        let closure = downstream_closure(graph, roots, is_breaker);
        if closure.is_empty() {
            return;
        }
        self.report_dangling(graph, &closure, result);

        let order = evaluation_order(graph, &closure, is_breaker);
        if !order.cyclic.is_empty() {
            warn!("{} nodes form a cycle without delay", order.cyclic.len());
            result.diagnostics.push(Diagnostic::CycleWithoutDelay {
                nodes: order.cyclic.clone(),
            });
        }

        let mut queue: VecDeque<NodeId> = order.order.into();
        let mut queued: HashSet<NodeId> = queue.iter().copied().collect();
        let mut visits: HashMap<NodeId, u32> = HashMap::new();
        let mut capped: HashSet<NodeId> = HashSet::new();
        let mut next_tick: HashSet<NodeId> = HashSet::new();

        while let Some(node_id) = queue.pop_front() {
            queued.remove(&node_id);
            *visits.entry(node_id).or_insert(0) += 1;
            result.visited.push(node_id);
            let non_deterministic = graph
                .node(node_id)
                .is_some_and(|n| self.registry.is_non_deterministic(&n.type_id));
            if non_deterministic && !result.non_deterministic.contains(&node_id) {
                result.non_deterministic.push(node_id);
            }

            let Some(visit) = self.visit(graph, node_id, time, result) else {
                continue;
            };
            if visit.will_run_again {
                next_tick.insert(node_id);
            }

            for port in visit.changed_ports {
                for consumer in consumers_of(graph, PortCoordinate::output(node_id, port)) {
                    if breakers.contains(&consumer) {
                        next_tick.insert(consumer);
                        continue;
                    }
                    if queued.contains(&consumer) {
                        continue;
                    }
                    let seen = visits.get(&consumer).copied().unwrap_or(0);
                    if seen < self.config.max_visits_per_node {
                        queue.push_back(consumer);
                        queued.insert(consumer);
                    } else if capped.insert(consumer) {
                        warn!("Node {} reached the visit cap", consumer);
                        result
                            .diagnostics
                            .push(Diagnostic::VisitCapReached { node_id: consumer });
                    }
                }
            }
        }

        let mut scheduled: Vec<NodeId> = next_tick.iter().copied().collect();
        scheduled.sort_by_key(|id| graph.insertion_index(*id));
        result.scheduled = scheduled;
        self.scheduled = next_tick;
    }

    fn report_dangling(&self, graph: &Graph, closure: &HashSet<NodeId>, result: &mut EvaluationResult) {
        for conn in graph.connections() {
            if closure.contains(&conn.to.node_id) && !Self::connection_is_live(graph, conn) {
                warn!("Skipping dangling connection {} -> {}", conn.from, conn.to);
                result.diagnostics.push(Diagnostic::DanglingConnection {
                    from: conn.from,
                    to: conn.to,
                });
            }
        }
    }

    /// Visits one node: gathers inputs, runs its evaluator and stores the outputs.
    /// Returns `None` when the node could not be evaluated.
    fn visit(
        &mut self,
        graph: &mut Graph,
        node_id: NodeId,
        time: f64,
        result: &mut EvaluationResult,
    ) -> Option<Visit> {
        let node = graph.node(node_id)?;
        let type_id = node.type_id.clone();
        let Some(evaluator) = find_evaluator(&self.evaluators, &type_id) else {
            warn!("No evaluator for node {} of kind '{}'", node_id, type_id);
            result.diagnostics.push(Diagnostic::UnknownNodeKind { node_id, type_id });
            return None;
        };

        let coercion = CoercionContext {
            graph_time: time,
            pulse_threshold: self.config.pulse_threshold,
        };
        let inputs = Self::gather_inputs(graph, node, &coercion);
        let input_types: Vec<DataType> = node.inputs.iter().map(|p| p.data_type).collect();
        let output_types: Vec<DataType> = node.outputs.iter().map(|p| p.data_type).collect();
        let previous = node.output_values();

        let mut requests = Vec::new();
        let output = {
            let state = self.states.get_or_create(node_id);
            let ports = NodePorts {
                inputs: &inputs,
                input_types: &input_types,
                output_types: &output_types,
                previous_outputs: &previous,
            };
            let mut ctx = NodeEvalContext::new(
                node_id,
                &type_id,
                time,
                &self.config,
                state,
                ports,
                &mut requests,
            );
            evaluator.evaluate(&mut ctx)
        };

        let values: Vec<PortValue> = output_types
            .iter()
            .enumerate()
            .map(|(i, data_type)| match output.values.get(i) {
                Some(value) => coerce_with(value, *data_type, &coercion),
                None => PortValue::zero(*data_type),
            })
            .collect();

        let mut reversions =
            pulse::reversion_effects(node_id, &values, time, self.config.pulse_threshold);
        let mut changed_ports = Vec::new();
        let node = graph.node_mut(node_id)?;
        for (i, value) in values.into_iter().enumerate() {
            let Some(port) = node.outputs.get_mut(i) else {
                continue;
            };
            if port.value == value {
                continue;
            }
            // Only a newly cached pulse schedules a reversion.
            if let Some(index) = reversions.iter().position(|r| r.coordinate.port == i) {
                let reversion = reversions.swap_remove(index);
                self.pending_reversions.insert(
                    (OrderedFloat(reversion.apply_at), reversion.coordinate),
                    reversion.pulse.clone(),
                );
                result.side_effects.push(SideEffect::PulseReversion(reversion));
            }
            let coordinate = PortCoordinate::output(node_id, i);
            port.value = value.clone();
            result.updated_outputs.insert(coordinate, value);
            changed_ports.push(i);
        }

        result
            .side_effects
            .extend(requests.into_iter().map(SideEffect::MediaRequest));

        Some(Visit {
            changed_ports,
            will_run_again: output.will_run_again,
        })
    }

    /// Collects the values arriving at each input port.
    ///
    /// Connected ports read the cached outputs of their sources, unconnected
    /// ports fall back to their manual value. Either way the values are
    /// coerced to the port's declared type. Dangling edges are skipped.
    fn gather_inputs(
        graph: &Graph,
        node: &GraphNode,
        coercion: &CoercionContext,
    ) -> Vec<Vec<PortValue>> {
        node.inputs
            .iter()
            .enumerate()
            .map(|(i, port)| {
                let mut values = Vec::new();
                for conn in incoming_connections(graph, PortCoordinate::input(node.id, i)) {
                    if !port.allows_fan_in && !values.is_empty() {
                        break;
                    }
                    if conn.from.direction != PortDirection::Output {
                        continue;
                    }
                    let source = graph
                        .node(conn.from.node_id)
                        .and_then(|n| n.output_value(conn.from.port));
                    if let Some(value) = source {
                        values.push(coerce_with(value, port.data_type, coercion));
                    }
                }
                if values.is_empty() {
                    values.push(coerce_with(&port.value, port.data_type, coercion));
                }
                values
            })
            .collect()
    }

    fn is_cycle_breaker(&self, graph: &Graph, node_id: NodeId) -> bool {
        graph
            .node(node_id)
            .is_some_and(|n| self.registry.breaks_cycles(&n.type_id))
    }

    fn port_exists(graph: &Graph, coordinate: PortCoordinate) -> bool {
        graph.node(coordinate.node_id).is_some_and(|n| match coordinate.direction {
            PortDirection::Input => coordinate.port < n.inputs.len(),
            PortDirection::Output => coordinate.port < n.outputs.len(),
        })
    }

    fn connection_is_live(graph: &Graph, conn: &Connection) -> bool {
        conn.from.direction == PortDirection::Output
            && conn.to.direction == PortDirection::Input
            && Self::port_exists(graph, conn.from)
            && Self::port_exists(graph, conn.to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::node::{InputPort, OutputPort};

    const FRAME: f64 = 1.0 / 60.0;

    fn engine() -> EvalEngine {
        EvalEngine::with_default_evaluators(RuntimeConfig::default())
    }

    fn changed(coords: &[PortCoordinate]) -> HashSet<PortCoordinate> {
        coords.iter().copied().collect()
    }

    fn output(graph: &Graph, node_id: NodeId, port: usize) -> PortValue {
        graph
            .port_value(PortCoordinate::output(node_id, port))
            .cloned()
            .unwrap()
    }

    fn value_node(engine: &mut EvalEngine, graph: &mut Graph, value: f64) -> NodeId {
        let id = engine.add_node(graph, "core.value").unwrap();
        graph
            .set_input(PortCoordinate::input(id, 0), PortValue::Number(value))
            .unwrap();
        id
    }

    #[test]
    fn test_evaluate_all_computes_chain() {
        let mut engine = engine();
        let mut graph = Graph::new();
        let a = value_node(&mut engine, &mut graph, 2.0);
        let b = value_node(&mut engine, &mut graph, 3.0);
        let add = engine.add_node(&mut graph, "math.add").unwrap();
        engine.connect(&mut graph, Connection::between(a, 0, add, 0)).unwrap();
        engine.connect(&mut graph, Connection::between(b, 0, add, 1)).unwrap();

        let result = engine.evaluate_all(&mut graph, 0.0);
        assert_eq!(output(&graph, add, 0), PortValue::Number(5.0));
        assert!(result.diagnostics.is_empty());
        assert_eq!(result.visited.last(), Some(&add));
    }

    #[test]
    fn test_incremental_only_visits_downstream() {
        let mut engine = engine();
        let mut graph = Graph::new();
        let a = value_node(&mut engine, &mut graph, 1.0);
        let b = value_node(&mut engine, &mut graph, 1.0);
        let add = engine.add_node(&mut graph, "math.add").unwrap();
        engine.connect(&mut graph, Connection::between(a, 0, add, 0)).unwrap();
        engine.evaluate_all(&mut graph, 0.0);

        graph
            .set_input(PortCoordinate::input(a, 0), PortValue::Number(4.0))
            .unwrap();
        let result = engine.evaluate(&mut graph, &changed(&[PortCoordinate::input(a, 0)]), FRAME);
        assert_eq!(result.visited, vec![a, add]);
        assert!(!result.visited.contains(&b));
        assert_eq!(output(&graph, add, 0), PortValue::Number(4.0));
    }

    #[test]
    fn test_unchanged_output_stops_propagation() {
        let mut engine = engine();
        let mut graph = Graph::new();
        let a = value_node(&mut engine, &mut graph, 1.0);
        let b = engine.add_node(&mut graph, "core.value").unwrap();
        engine.connect(&mut graph, Connection::between(a, 0, b, 0)).unwrap();
        engine.evaluate_all(&mut graph, 0.0);

        let result = engine.evaluate(&mut graph, &changed(&[PortCoordinate::input(a, 0)]), FRAME);
        assert!(result.updated_outputs.is_empty());
        // b is still visited because it lies in the closure.
        assert_eq!(result.visited, vec![a, b]);
    }

    #[test]
    fn test_malformed_coordinate_reported() {
        let mut engine = engine();
        let mut graph = Graph::new();
        let a = value_node(&mut engine, &mut graph, 1.0);
        engine.evaluate_all(&mut graph, 0.0);

        let bogus = PortCoordinate::input(a, 7);
        let result = engine.evaluate(&mut graph, &changed(&[bogus]), FRAME);
        assert_eq!(
            result.diagnostics,
            vec![Diagnostic::MalformedCoordinate { coordinate: bogus }]
        );
        assert!(result.visited.is_empty());
    }

    #[test]
    fn test_unknown_kind_is_skipped() {
        let mut engine = engine();
        let mut graph = Graph::new();
        let node = GraphNode::new(
            "vendor.mystery",
            vec![InputPort::new("In", PortValue::Number(1.0))],
            vec![OutputPort::new("Out", DataType::Number)],
        );
        let id = graph.add_node(node);
        let result = engine.evaluate_all(&mut graph, 0.0);
        assert_eq!(
            result.diagnostics,
            vec![Diagnostic::UnknownNodeKind {
                node_id: id,
                type_id: "vendor.mystery".to_string()
            }]
        );
    }

    #[test]
    fn test_dangling_connection_falls_back_to_manual_value() {
        let mut engine = engine();
        let mut graph = Graph::new();
        let b = value_node(&mut engine, &mut graph, 9.0);
        let ghost = Uuid::new_v4();
        graph.add_connection_unchecked(Connection::between(ghost, 0, b, 0));

        let result = engine.evaluate_all(&mut graph, 0.0);
        assert_eq!(output(&graph, b, 0), PortValue::Number(9.0));
        assert!(matches!(
            result.diagnostics.as_slice(),
            [Diagnostic::DanglingConnection { .. }]
        ));
    }

    #[test]
    fn test_connect_rejects_cycle_without_delay() {
        let mut engine = engine();
        let mut graph = Graph::new();
        let a = engine.add_node(&mut graph, "core.value").unwrap();
        let b = engine.add_node(&mut graph, "core.value").unwrap();
        engine.connect(&mut graph, Connection::between(a, 0, b, 0)).unwrap();
        let err = engine.connect(&mut graph, Connection::between(b, 0, a, 0));
        assert!(matches!(err, Err(RuntimeError::InvalidConnection(_))));

        let delay = engine.add_node(&mut graph, "time.delay_one").unwrap();
        engine.connect(&mut graph, Connection::between(b, 0, delay, 0)).unwrap();
        engine.connect(&mut graph, Connection::between(delay, 0, a, 0)).unwrap();
    }

    #[test]
    fn test_cycle_without_delay_diagnosed_and_capped() {
        let mut engine = engine();
        let mut graph = Graph::new();
        let a = value_node(&mut engine, &mut graph, 1.0);
        let b = engine.add_node(&mut graph, "math.add").unwrap();
        graph.add_connection_unchecked(Connection::between(a, 0, b, 0));
        graph.add_connection_unchecked(Connection::between(b, 0, a, 0));

        let result = engine.evaluate_all(&mut graph, 0.0);
        assert!(result
            .diagnostics
            .iter()
            .any(|d| matches!(d, Diagnostic::CycleWithoutDelay { nodes } if nodes.len() == 2)));
        assert!(result.visited.len() <= 2);
    }

    #[test]
    fn test_pulse_reverts_next_tick() {
        let mut engine = engine();
        let mut graph = Graph::new();
        let src = value_node(&mut engine, &mut graph, 0.0);
        let detector = engine.add_node(&mut graph, "logic.pulse_on_change").unwrap();
        engine
            .connect(&mut graph, Connection::between(src, 0, detector, 0))
            .unwrap();
        engine.evaluate_all(&mut graph, 0.0);

        graph
            .set_input(PortCoordinate::input(src, 0), PortValue::Number(1.0))
            .unwrap();
        let t = 1.0;
        let result = engine.evaluate(&mut graph, &changed(&[PortCoordinate::input(src, 0)]), t);
        assert_eq!(output(&graph, detector, 0), PortValue::Pulse(t));
        assert_eq!(result.pulse_reversions().count(), 1);
        assert!(engine.has_scheduled_work());

        let result = engine.evaluate(&mut graph, &HashSet::new(), t + FRAME);
        assert_eq!(output(&graph, detector, 0), PortValue::Pulse(0.0));
        assert_eq!(
            result
                .updated_outputs
                .get(&PortCoordinate::output(detector, 0)),
            Some(&PortValue::Pulse(0.0))
        );
        assert!(!engine.has_scheduled_work());
    }

    #[test]
    fn test_running_node_is_rescheduled() {
        let mut engine = engine();
        let mut graph = Graph::new();
        let watch = engine.add_node(&mut graph, "time.stopwatch").unwrap();
        graph
            .set_input(PortCoordinate::input(watch, 0), PortValue::Pulse(0.5))
            .unwrap();
        let result = engine.evaluate_all(&mut graph, 0.5);
        assert_eq!(result.scheduled, vec![watch]);

        let result = engine.evaluate(&mut graph, &HashSet::new(), 1.5);
        assert_eq!(result.visited, vec![watch]);
        assert_eq!(output(&graph, watch, 0), PortValue::Number(1.0));
    }

    #[test]
    fn test_change_node_type_restores_preserved_value() {
        let mut engine = engine();
        let mut graph = Graph::new();
        let id = engine
            .add_typed_node(&mut graph, "core.value", DataType::Number)
            .unwrap();
        graph
            .set_input(PortCoordinate::input(id, 0), PortValue::Number(42.0))
            .unwrap();

        engine
            .change_node_type(&mut graph, id, DataType::String)
            .unwrap();
        let node = graph.node(id).unwrap();
        assert_eq!(node.inputs[0].data_type, DataType::String);
        assert_eq!(node.outputs[0].data_type, DataType::String);
        assert_eq!(node.user_visible_type, Some(DataType::String));

        graph
            .set_input(PortCoordinate::input(id, 0), PortValue::String("hi".into()))
            .unwrap();
        engine
            .change_node_type(&mut graph, id, DataType::Number)
            .unwrap();
        assert_eq!(graph.node(id).unwrap().inputs[0].value, PortValue::Number(42.0));
        engine
            .change_node_type(&mut graph, id, DataType::String)
            .unwrap();
        assert_eq!(
            graph.node(id).unwrap().inputs[0].value,
            PortValue::String("hi".into())
        );
    }

    #[test]
    fn test_change_node_type_clears_only_declared_animation() {
        let mut engine = engine();
        let mut graph = Graph::new();
        let src = value_node(&mut engine, &mut graph, 1.0);
        let spring = engine.add_node(&mut graph, "animation.spring").unwrap();
        let smooth = engine.add_node(&mut graph, "animation.smooth").unwrap();
        engine.connect(&mut graph, Connection::between(src, 0, spring, 0)).unwrap();
        engine.connect(&mut graph, Connection::between(src, 0, smooth, 0)).unwrap();
        engine.evaluate_all(&mut graph, 0.0);
        engine.evaluate(&mut graph, &HashSet::new(), FRAME);

        engine
            .change_node_type(&mut graph, spring, DataType::Position)
            .unwrap();
        engine
            .change_node_type(&mut graph, smooth, DataType::Position)
            .unwrap();

        assert!(engine.state(spring).unwrap().animation.is_none());
        assert_eq!(
            engine.state(smooth).unwrap().animation.as_ref().map(|a| a.kind()),
            Some(crate::animation::AnimationKind::SmoothValue)
        );
    }

    #[test]
    fn test_change_type_on_fixed_node_fails() {
        let mut engine = engine();
        let mut graph = Graph::new();
        let id = engine.add_node(&mut graph, "time.stopwatch").unwrap();
        let err = engine.change_node_type(&mut graph, id, DataType::String);
        assert!(matches!(err, Err(RuntimeError::TypeNotChangeable(_))));
    }

    #[test]
    fn test_remove_node_drops_state_and_reversions() {
        let mut engine = engine();
        let mut graph = Graph::new();
        let src = value_node(&mut engine, &mut graph, 0.0);
        let detector = engine.add_node(&mut graph, "logic.pulse_on_change").unwrap();
        engine
            .connect(&mut graph, Connection::between(src, 0, detector, 0))
            .unwrap();
        engine.evaluate_all(&mut graph, 0.0);
        graph
            .set_input(PortCoordinate::input(src, 0), PortValue::Number(1.0))
            .unwrap();
        engine.evaluate(&mut graph, &changed(&[PortCoordinate::input(src, 0)]), 1.0);
        assert!(engine.state(detector).is_some());

        engine.remove_node(&mut graph, detector);
        assert!(engine.state(detector).is_none());
        assert!(!engine.has_scheduled_work());
        assert!(graph.connections().is_empty());
    }

    #[test]
    fn test_reset_schedules_every_node() {
        let mut engine = engine();
        let mut graph = Graph::new();
        let a = value_node(&mut engine, &mut graph, 3.0);
        engine.evaluate_all(&mut graph, 0.0);
        assert_eq!(output(&graph, a, 0), PortValue::Number(3.0));

        engine.reset_all_ephemeral_state(&mut graph);
        assert_eq!(output(&graph, a, 0), PortValue::Number(0.0));
        assert!(engine.has_scheduled_work());
        let result = engine.evaluate(&mut graph, &HashSet::new(), 0.0);
        assert_eq!(result.visited, vec![a]);
        assert_eq!(output(&graph, a, 0), PortValue::Number(3.0));
    }
}
