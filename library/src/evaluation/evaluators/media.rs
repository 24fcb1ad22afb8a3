//! Evaluator for media nodes (media.*).
//!
//! Media is resolved by the host. These nodes only record requests in their
//! `MediaSlot` and output whatever has been resolved so far.

use log::debug;

use crate::evaluation::context::NodeEvalContext;
use crate::evaluation::evaluator::NodeEvaluator;
use crate::evaluation::output::NodeOutput;
use crate::model::value::PortValue;
use crate::state::MediaRangeState;

pub struct MediaEvaluator;

impl NodeEvaluator for MediaEvaluator {
    fn handles(&self) -> &[&str] {
        &["media."]
    }

    fn evaluate(&self, ctx: &mut NodeEvalContext<'_>) -> NodeOutput {
        let type_id = ctx.type_id;
        match type_id {
            "media.import" => import(ctx),
            "media.sample_range" => sample_range(ctx),
            other => {
                debug!("MediaEvaluator: unhandled type {}", other);
                NodeOutput::new(ctx.previous_outputs())
            }
        }
    }
}

fn resolved_media(ctx: &NodeEvalContext<'_>) -> PortValue {
    PortValue::AsyncMedia(ctx.state.media_slot.as_ref().and_then(|s| s.resolved.clone()))
}

fn import(ctx: &mut NodeEvalContext<'_>) -> NodeOutput {
    let descriptor = ctx.input(0).to_string();
    let descriptor = descriptor.trim();
    if descriptor.is_empty() {
        ctx.state.media_slot = None;
        return NodeOutput::single(PortValue::AsyncMedia(None));
    }

    let current = ctx
        .state
        .media_slot
        .as_ref()
        .is_some_and(|slot| slot.descriptor == descriptor);
    if !current {
        ctx.request_media(descriptor);
    }
    NodeOutput::single(resolved_media(ctx))
}

fn sample_range(ctx: &mut NodeEvalContext<'_>) -> NodeOutput {
    let now = ctx.time;
    let source = ctx.input(0).as_media().cloned();

    if ctx.pulsed(1) {
        ctx.state.media_range_state = Some(MediaRangeState {
            start: Some(now),
            media_id: None,
        });
        ctx.state.media_slot = None;
    }

    if ctx.pulsed(2) {
        let start = ctx.state.media_range_state.as_ref().and_then(|r| r.start);
        match (start, &source) {
            (Some(start), Some(source)) => {
                let descriptor = format!("range:{}:{:.3}-{:.3}", source.id, start, now);
                ctx.request_media(&descriptor);
            }
            _ => debug!("Sample range {} ended without a start or source", ctx.node_id),
        }
    }

    let output = resolved_media(ctx);
    if let (Some(range), Some(media)) = (ctx.state.media_range_state.as_mut(), output.as_media()) {
        range.media_id = Some(media.id);
    }
    NodeOutput::single(output)
}
