//! Evaluation outputs: per-node results and the per-tick summary.

use std::collections::BTreeMap;
use thiserror::Error;

use crate::model::connection::PortCoordinate;
use crate::model::node::NodeId;
use crate::model::value::PortValue;
use crate::pulse::PulseReversion;
use crate::state::MediaRequest;

/// What a node evaluator produced for one visit.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeOutput {
    /// One value per output port.
    pub values: Vec<PortValue>,
    /// The node must be visited again on the next tick even if its inputs do
    /// not change (running animation, stopwatch, pending queue).
    pub will_run_again: bool,
}

impl NodeOutput {
    pub fn new(values: Vec<PortValue>) -> Self {
        Self {
            values,
            will_run_again: false,
        }
    }

    pub fn single(value: PortValue) -> Self {
        Self::new(vec![value])
    }

    pub fn running(mut self, will_run_again: bool) -> Self {
        self.will_run_again = will_run_again;
        self
    }
}

/// Deferred work the host has to carry out.
#[derive(Debug, Clone, PartialEq)]
pub enum SideEffect {
    PulseReversion(PulseReversion),
    MediaRequest(MediaRequest),
}

/// Problems found during evaluation. None of them aborts the tick.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Diagnostic {
    #[error("port {coordinate} does not exist; skipped")]
    MalformedCoordinate { coordinate: PortCoordinate },
    #[error("connection {from} -> {to} is dangling; skipped")]
    DanglingConnection {
        from: PortCoordinate,
        to: PortCoordinate,
    },
    #[error("node {node_id} has unknown kind '{type_id}'")]
    UnknownNodeKind { node_id: NodeId, type_id: String },
    #[error("cycle without delay through {nodes:?}")]
    CycleWithoutDelay { nodes: Vec<NodeId> },
    #[error("node {node_id} reached the per-tick visit cap")]
    VisitCapReached { node_id: NodeId },
    #[error("media for node {node_id} could not be resolved")]
    MediaUnresolved { node_id: NodeId },
}

/// Summary of one `evaluate` call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvaluationResult {
    /// Outputs whose cached value changed during this call.
    pub updated_outputs: BTreeMap<PortCoordinate, PortValue>,
    pub side_effects: Vec<SideEffect>,
    pub diagnostics: Vec<Diagnostic>,
    /// Nodes in the order they were visited.
    pub visited: Vec<NodeId>,
    /// Nodes that asked to be visited again on the next tick.
    pub scheduled: Vec<NodeId>,
    /// Visited nodes whose kind may produce different outputs for identical
    /// inputs, in visit order.
    pub non_deterministic: Vec<NodeId>,
}

impl EvaluationResult {
    pub fn pulse_reversions(&self) -> impl Iterator<Item = &PulseReversion> {
        self.side_effects.iter().filter_map(|e| match e {
            SideEffect::PulseReversion(r) => Some(r),
            _ => None,
        })
    }

    pub fn media_requests(&self) -> impl Iterator<Item = &MediaRequest> {
        self.side_effects.iter().filter_map(|e| match e {
            SideEffect::MediaRequest(r) => Some(r),
            _ => None,
        })
    }

    /// True when every visited node is deterministic, so replaying the same
    /// change set yields the same outputs.
    pub fn is_reproducible(&self) -> bool {
        self.non_deterministic.is_empty()
    }

    pub fn is_settled(&self) -> bool {
        self.scheduled.is_empty()
    }
}
