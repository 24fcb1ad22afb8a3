//! Node evaluator trait — one implementation per node type category.

use super::context::NodeEvalContext;
use super::output::NodeOutput;

/// Trait for evaluating a category of nodes.
///
/// Each implementation handles one or more `type_id` prefixes (e.g. `"math."`,
/// `"animation.spring"`). The evaluation engine dispatches to the first
/// evaluator whose prefix matches the node's `type_id`.
///
/// Evaluation cannot fail: missing or malformed inputs have already been
/// replaced by zero values when the context is built.
pub trait NodeEvaluator: Send + Sync {
    /// The `type_id` prefixes this evaluator handles.
    fn handles(&self) -> &[&str];

    /// Computes every output of the node from its inputs, its ephemeral state
    /// and the current graph time.
    fn evaluate(&self, ctx: &mut NodeEvalContext<'_>) -> NodeOutput;
}

pub(crate) fn find_evaluator<'a>(
    evaluators: &'a [Box<dyn NodeEvaluator>],
    type_id: &str,
) -> Option<&'a dyn NodeEvaluator> {
    evaluators
        .iter()
        .find(|e| e.handles().iter().any(|prefix| type_id.starts_with(prefix)))
        .map(|e| e.as_ref())
}
