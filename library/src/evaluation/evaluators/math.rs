//! Evaluator for arithmetic nodes (math.*).
//!
//! Operates componentwise on numbers, points and colors. Text is concatenated
//! by `math.add`; other types pass the first operand through.

use log::debug;

use super::fold_components;
use crate::evaluation::context::NodeEvalContext;
use crate::evaluation::evaluator::NodeEvaluator;
use crate::evaluation::output::NodeOutput;
use crate::model::value::{DataType, PortValue};

pub struct MathEvaluator;

impl NodeEvaluator for MathEvaluator {
    fn handles(&self) -> &[&str] {
        &["math."]
    }

    fn evaluate(&self, ctx: &mut NodeEvalContext<'_>) -> NodeOutput {
        let data_type = ctx.output_type(0);
        let a = ctx.input(0);
        let b = ctx.input(1);

        let type_id = ctx.type_id;
        let result = match type_id {
            "math.add" => {
                let mut operands: Vec<PortValue> = ctx.input_values(0).to_vec();
                operands.push(b);
                if data_type == DataType::String {
                    Some(PortValue::String(
                        operands.iter().map(|v| v.to_string()).collect(),
                    ))
                } else {
                    fold_components(&operands, data_type, |x, y| x + y)
                }
            }
            "math.subtract" => fold_components(&[a.clone(), b], data_type, |x, y| x - y),
            "math.multiply" => fold_components(&[a.clone(), b], data_type, |x, y| x * y),
            "math.divide" => fold_components(&[a.clone(), b], data_type, |x, y| {
                if y == 0.0 { 0.0 } else { x / y }
            }),
            other => {
                debug!("MathEvaluator: unhandled type {}", other);
                None
            }
        };

        let value = result.unwrap_or(a);
        NodeOutput::single(ctx.to_output_type(0, &value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::evaluators::test_support::{Harness, one};
    use crate::model::value::Point2;

    fn number_harness(type_id: &str) -> Harness {
        Harness::new(type_id, &[DataType::Number, DataType::Number], &[DataType::Number])
    }

    #[test]
    fn test_add_fan_in() {
        let mut h = number_harness("math.add");
        let out = h.run(
            &MathEvaluator,
            vec![
                vec![PortValue::Number(1.0), PortValue::Number(2.0), PortValue::Number(3.0)],
                one(PortValue::Number(4.0)),
            ],
            0.0,
        );
        assert_eq!(out.values, vec![PortValue::Number(10.0)]);
    }

    #[test]
    fn test_add_strings_concatenates() {
        let mut h = Harness::new(
            "math.add",
            &[DataType::String, DataType::String],
            &[DataType::String],
        );
        let out = h.run(
            &MathEvaluator,
            vec![one(PortValue::String("foo".into())), one(PortValue::String("bar".into()))],
            0.0,
        );
        assert_eq!(out.values, vec![PortValue::String("foobar".into())]);
    }

    #[test]
    fn test_multiply_positions() {
        let mut h = Harness::new(
            "math.multiply",
            &[DataType::Position, DataType::Position],
            &[DataType::Position],
        );
        let out = h.run(
            &MathEvaluator,
            vec![
                one(PortValue::Position(Point2 { x: 2.0, y: 3.0 })),
                one(PortValue::Position(Point2 { x: 4.0, y: 5.0 })),
            ],
            0.0,
        );
        assert_eq!(out.values, vec![PortValue::Position(Point2 { x: 8.0, y: 15.0 })]);
    }

    #[test]
    fn test_divide_by_zero_is_zero() {
        let mut h = number_harness("math.divide");
        let out = h.run(
            &MathEvaluator,
            vec![one(PortValue::Number(3.0)), one(PortValue::Number(0.0))],
            0.0,
        );
        assert_eq!(out.values, vec![PortValue::Number(0.0)]);
    }

    #[test]
    fn test_subtract() {
        let mut h = number_harness("math.subtract");
        let out = h.run(
            &MathEvaluator,
            vec![one(PortValue::Number(3.0)), one(PortValue::Number(5.0))],
            0.0,
        );
        assert_eq!(out.values, vec![PortValue::Number(-2.0)]);
    }
}
