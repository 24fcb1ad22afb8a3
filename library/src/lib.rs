//! Evaluation runtime for node-based prototyping graphs.
//!
//! A [`Graph`] holds typed nodes and connections. An [`EvalEngine`] recomputes
//! the nodes affected by a change, keeps each node's ephemeral state between
//! ticks, and reports outputs, side effects and diagnostics through an
//! [`EvaluationResult`].

pub mod animation;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod model;
pub mod plugin;
pub mod pulse;
pub mod state;

pub use config::{RuntimeConfig, SpringTolerance, load_config};
pub use error::RuntimeError;
pub use evaluation::{
    Diagnostic, EvalEngine, EvaluationResult, NodeEvalContext, NodeEvaluator, NodeOutput,
    SideEffect,
};
pub use model::schema::GraphDocument;
pub use model::{
    Connection, DataType, Graph, GraphNode, InputPort, NodeId, OutputPort, PortCoordinate,
    PortDirection, PortValue,
};
pub use plugin::{NodeCategory, NodeRegistry, NodeTypeDefinition, PortDefinition};
pub use pulse::PulseReversion;
pub use state::media::{MediaResolutionSender, spawn_media_resolution};
pub use state::{EphemeralNodeState, MediaRequest, MediaResolution};
