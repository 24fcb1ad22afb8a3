//! Evaluator for animation nodes (animation.*).
//!
//! Every animation reads its target on input 0 and keeps its progress in the
//! node's ephemeral `AnimationState`. The node asks to run again until the
//! animation settles.

use log::debug;

use crate::animation::{
    AnimationState, ClassicAnimationCurve, ClassicAnimationState, SmoothValueState,
    SpringAnimationState, SpringParams,
};
use crate::evaluation::context::NodeEvalContext;
use crate::evaluation::evaluator::NodeEvaluator;
use crate::evaluation::output::NodeOutput;
use crate::model::value::PortValue;

pub struct AnimationEvaluator;

impl NodeEvaluator for AnimationEvaluator {
    fn handles(&self) -> &[&str] {
        &["animation."]
    }

    fn evaluate(&self, ctx: &mut NodeEvalContext<'_>) -> NodeOutput {
        let target_value = ctx.input(0);
        let Some(target) = target_value.components() else {
            // Discrete types cannot be interpolated; jump to the target.
            ctx.state.animation = None;
            return NodeOutput::single(ctx.to_output_type(0, &target_value));
        };

        let type_id = ctx.type_id;
        let (components, settled) = match type_id {
            "animation.classic" => classic(ctx, &target),
            "animation.spring" => {
                let params = SpringParams {
                    mass: ctx.number(1),
                    stiffness: ctx.number(2),
                    damping: ctx.number(3),
                };
                spring(ctx, &target, params)
            }
            "animation.pop" => {
                let params = SpringParams::from_pop(ctx.number(1), ctx.number(2));
                spring(ctx, &target, params)
            }
            "animation.smooth" => smooth(ctx, &target),
            other => {
                debug!("AnimationEvaluator: unhandled type {}", other);
                return NodeOutput::new(ctx.previous_outputs());
            }
        };

        let value = PortValue::from_components(ctx.output_type(0), &components);
        NodeOutput::single(value).running(!settled)
    }
}

fn classic(ctx: &mut NodeEvalContext<'_>, target: &[f64]) -> (Vec<f64>, bool) {
    let duration = match ctx.number(1) {
        d if d.is_finite() && d >= 0.0 => d,
        _ => ctx.config.classic_default_duration,
    };
    let curve = match ctx.input(2) {
        PortValue::AnimationCurve(curve) => curve,
        _ => ClassicAnimationCurve::default(),
    };
    let current = match &ctx.state.animation {
        Some(AnimationState::Classic(state)) => state.clone(),
        _ => ClassicAnimationState::default(),
    };
    let step = current.advance(target, ctx.time, duration, curve);
    ctx.state.set_animation(AnimationState::Classic(step.state));
    (step.value, step.settled)
}

fn spring(ctx: &mut NodeEvalContext<'_>, target: &[f64], params: SpringParams) -> (Vec<f64>, bool) {
    let current = match &ctx.state.animation {
        Some(AnimationState::Spring(state)) => state.clone(),
        _ => SpringAnimationState::default(),
    };
    let step = current.advance(target, ctx.time, params, &ctx.config.spring);
    ctx.state.set_animation(AnimationState::Spring(step.state));
    (step.value, step.settled)
}

fn smooth(ctx: &mut NodeEvalContext<'_>, target: &[f64]) -> (Vec<f64>, bool) {
    let hysteresis = ctx.number(1);
    let mut current = match &ctx.state.animation {
        Some(AnimationState::SmoothValue(state)) => state.clone(),
        _ => SmoothValueState::default(),
    };
    if ctx.pulsed(2) {
        current = current.reset_to(target, ctx.time);
    }
    let step = current.advance(target, ctx.time, hysteresis, ctx.config.smooth_epsilon);
    ctx.state.set_animation(AnimationState::SmoothValue(step.state));
    (step.value, step.settled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::AnimationKind;
    use crate::evaluation::evaluators::test_support::{Harness, one};
    use crate::model::value::{DataType, Point2};

    fn classic_inputs(target: PortValue) -> Vec<Vec<PortValue>> {
        vec![
            one(target),
            one(PortValue::Number(1.0)),
            one(PortValue::AnimationCurve(ClassicAnimationCurve::Linear)),
        ]
    }

    #[test]
    fn test_classic_runs_until_duration() {
        let types = [DataType::Number, DataType::Number, DataType::AnimationCurve];
        let mut h = Harness::new("animation.classic", &types, &[DataType::Number]);

        let start = h.run(&AnimationEvaluator, classic_inputs(PortValue::Number(5.0)), 0.0);
        assert_eq!(start.values, vec![PortValue::Number(0.0)]);
        assert!(start.will_run_again);

        let done = h.run(&AnimationEvaluator, classic_inputs(PortValue::Number(5.0)), 1.0);
        assert_eq!(done.values, vec![PortValue::Number(5.0)]);
        assert!(!done.will_run_again);
    }

    #[test]
    fn test_classic_animates_positions() {
        let types = [DataType::Position, DataType::Number, DataType::AnimationCurve];
        let mut h = Harness::new("animation.classic", &types, &[DataType::Position]);
        let target = PortValue::Position(Point2 { x: 10.0, y: -10.0 });

        h.run(&AnimationEvaluator, classic_inputs(target.clone()), 0.0);
        let half = h.run(&AnimationEvaluator, classic_inputs(target), 0.5);
        assert_eq!(half.values, vec![PortValue::Position(Point2 { x: 5.0, y: -5.0 })]);
    }

    #[test]
    fn test_spring_keeps_spring_state() {
        let types = [DataType::Number; 4];
        let mut h = Harness::new("animation.spring", &types, &[DataType::Number]);
        let inputs = vec![
            one(PortValue::Number(1.0)),
            one(PortValue::Number(1.0)),
            one(PortValue::Number(130.5)),
            one(PortValue::Number(18.85)),
        ];
        let out = h.run(&AnimationEvaluator, inputs, 0.0);
        assert!(out.will_run_again);
        assert_eq!(
            h.state.animation.as_ref().map(AnimationState::kind),
            Some(AnimationKind::Spring)
        );
    }

    #[test]
    fn test_smooth_reset_jumps_to_target() {
        let types = [DataType::Number, DataType::Number, DataType::Pulse];
        let mut h = Harness::new("animation.smooth", &types, &[DataType::Number]);
        let out = h.run(
            &AnimationEvaluator,
            vec![
                one(PortValue::Number(8.0)),
                one(PortValue::Number(0.4)),
                one(PortValue::Pulse(1.0)),
            ],
            1.0,
        );
        assert_eq!(out.values, vec![PortValue::Number(8.0)]);
        assert!(!out.will_run_again);
    }

    #[test]
    fn test_discrete_target_passes_through() {
        let types = [DataType::Bool, DataType::Number, DataType::AnimationCurve];
        let mut h = Harness::new("animation.classic", &types, &[DataType::Bool]);
        let out = h.run(&AnimationEvaluator, classic_inputs(PortValue::Bool(true)), 0.0);
        assert_eq!(out.values, vec![PortValue::Bool(true)]);
        assert!(!out.will_run_again);
        assert!(h.state.animation.is_none());
    }
}
