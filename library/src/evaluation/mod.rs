//! Push-based incremental evaluation of the data-flow graph.
//!
//! Each node kind has a corresponding `NodeEvaluator` that computes every
//! output of a node from its gathered inputs, its ephemeral state and the
//! graph time. The `EvalEngine` decides which nodes to visit and in what order.

pub mod context;
pub mod engine;
pub mod evaluator;
pub mod evaluators;
pub mod output;

pub use context::{NodeEvalContext, NodePorts};
pub use engine::EvalEngine;
pub use evaluator::NodeEvaluator;
pub use output::{Diagnostic, EvaluationResult, NodeOutput, SideEffect};
