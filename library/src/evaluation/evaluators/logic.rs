//! Evaluator for pulse-driven logic nodes (logic.*).

use log::debug;

use crate::evaluation::context::NodeEvalContext;
use crate::evaluation::evaluator::NodeEvaluator;
use crate::evaluation::output::NodeOutput;
use crate::model::value::PortValue;

pub struct LogicEvaluator;

impl NodeEvaluator for LogicEvaluator {
    fn handles(&self) -> &[&str] {
        &["logic."]
    }

    fn evaluate(&self, ctx: &mut NodeEvalContext<'_>) -> NodeOutput {
        let type_id = ctx.type_id;
        match type_id {
            "logic.pulse_on_change" => pulse_on_change(ctx),
            "logic.counter" => counter(ctx),
            "logic.sample_and_hold" => sample_and_hold(ctx),
            other => {
                debug!("LogicEvaluator: unhandled type {}", other);
                NodeOutput::new(ctx.previous_outputs())
            }
        }
    }
}

fn pulse_on_change(ctx: &mut NodeEvalContext<'_>) -> NodeOutput {
    let value = ctx.input(0);
    let changed = ctx
        .state
        .previous_value
        .as_ref()
        .is_some_and(|previous| *previous != value);
    ctx.state.previous_value = Some(value);

    if changed {
        NodeOutput::single(PortValue::Pulse(ctx.time))
    } else {
        NodeOutput::single(ctx.previous_output(0))
    }
}

fn counter(ctx: &mut NodeEvalContext<'_>) -> NodeOutput {
    let mut count = ctx
        .state
        .previous_value
        .as_ref()
        .map(|v| v.as_number(0.0))
        .unwrap_or(0.0);
    if ctx.pulsed(0) {
        count += 1.0;
    }
    if ctx.pulsed(1) {
        count -= 1.0;
    }
    if ctx.pulsed(2) {
        count = ctx.number(3);
    }
    let max = ctx.number(4);
    if max > 0.0 {
        count = count.rem_euclid(max);
    }
    ctx.state.previous_value = Some(PortValue::Number(count));
    NodeOutput::single(PortValue::Number(count))
}

fn sample_and_hold(ctx: &mut NodeEvalContext<'_>) -> NodeOutput {
    let mut held = ctx
        .state
        .previous_value
        .clone()
        .unwrap_or_else(|| PortValue::zero(ctx.output_type(0)));
    if ctx.pulsed(1) {
        held = ctx.input(0);
    }
    if ctx.pulsed(2) {
        held = PortValue::zero(ctx.output_type(0));
    }
    let held = ctx.to_output_type(0, &held);
    ctx.state.previous_value = Some(held.clone());
    NodeOutput::single(held)
}
