//! Evaluator for plain value nodes (core.*).

use crate::evaluation::context::NodeEvalContext;
use crate::evaluation::evaluator::NodeEvaluator;
use crate::evaluation::output::NodeOutput;

pub struct ValueEvaluator;

impl NodeEvaluator for ValueEvaluator {
    fn handles(&self) -> &[&str] {
        &["core."]
    }

    fn evaluate(&self, ctx: &mut NodeEvalContext<'_>) -> NodeOutput {
        let value = ctx.input(0);
        NodeOutput::single(ctx.to_output_type(0, &value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::evaluators::test_support::{Harness, one};
    use crate::model::value::{DataType, PortValue};

    #[test]
    fn test_passes_value_through() {
        let mut h = Harness::new("core.value", &[DataType::Number], &[DataType::Number]);
        let out = h.run(&ValueEvaluator, vec![one(PortValue::Number(5.0))], 0.0);
        assert_eq!(out.values, vec![PortValue::Number(5.0)]);
        assert!(!out.will_run_again);
    }
}
