//! Evaluator for time nodes (time.*).

use log::debug;

use crate::evaluation::context::NodeEvalContext;
use crate::evaluation::evaluator::NodeEvaluator;
use crate::evaluation::output::NodeOutput;
use crate::model::value::PortValue;
use crate::state::QueuedValue;

pub struct TimeEvaluator;

impl NodeEvaluator for TimeEvaluator {
    fn handles(&self) -> &[&str] {
        &["time."]
    }

    fn evaluate(&self, ctx: &mut NodeEvalContext<'_>) -> NodeOutput {
        let type_id = ctx.type_id;
        match type_id {
            "time.stopwatch" => stopwatch(ctx),
            "time.delay_one" => delay_one(ctx),
            "time.delay" => delay(ctx),
            other => {
                debug!("TimeEvaluator: unhandled type {}", other);
                NodeOutput::new(ctx.previous_outputs())
            }
        }
    }
}

/// `previous_value` holds the time accumulated by earlier runs.
fn stopwatch(ctx: &mut NodeEvalContext<'_>) -> NodeOutput {
    let now = ctx.time;
    let (start, stop, reset) = (ctx.pulsed(0), ctx.pulsed(1), ctx.pulsed(2));
    let state = &mut *ctx.state;

    let mut accumulated = state
        .previous_value
        .as_ref()
        .map(|v| v.as_number(0.0))
        .unwrap_or(0.0);

    if reset {
        accumulated = 0.0;
        state.stopwatch_start_time = state.stopwatch_running.then_some(now);
    }
    if start && !state.stopwatch_running {
        state.stopwatch_running = true;
        state.stopwatch_start_time = Some(now);
    }
    if stop && state.stopwatch_running {
        accumulated += now - state.stopwatch_start_time.unwrap_or(now);
        state.stopwatch_running = false;
        state.stopwatch_start_time = None;
    }

    let running_for = match (state.stopwatch_running, state.stopwatch_start_time) {
        (true, Some(started)) => (now - started).max(0.0),
        _ => 0.0,
    };
    state.previous_value = Some(PortValue::Number(accumulated));

    NodeOutput::single(PortValue::Number(accumulated + running_for)).running(state.stopwatch_running)
}

/// Reads its input before upstream nodes are visited, so it emits last tick's value.
fn delay_one(ctx: &mut NodeEvalContext<'_>) -> NodeOutput {
    let value = ctx.input(0);
    NodeOutput::single(ctx.to_output_type(0, &value))
}

fn delay(ctx: &mut NodeEvalContext<'_>) -> NodeOutput {
    let now = ctx.time;
    let value = ctx.input(0);
    let delay = ctx.number(1).max(0.0);
    let mut output = ctx.previous_output(0);

    let state = &mut *ctx.state;
    if state.previous_value.as_ref() != Some(&value) {
        state.queue_mut().push_back(QueuedValue {
            value: value.clone(),
            release_at: now + delay,
        });
        state.previous_value = Some(value);
    }

    let queue = state.queue_mut();
    while queue.front().is_some_and(|q| q.release_at <= now) {
        if let Some(released) = queue.pop_front() {
            output = released.value;
        }
    }
    let pending = !queue.is_empty();

    NodeOutput::single(ctx.to_output_type(0, &output)).running(pending)
}
