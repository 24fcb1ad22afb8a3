use super::{node, number, port, pulse, typed};
use crate::animation::{AnimationKind, ClassicAnimationCurve, SmoothValueState, SpringParams};
use crate::model::value::{DataType, PortValue};
use crate::plugin::node_types::{NodeCategory, NodeTypeDefinition};

pub(super) fn animation_nodes() -> Vec<NodeTypeDefinition> {
    let nc = NodeCategory::Animation;
    let spring = SpringParams::default();
    vec![
        node("animation.classic", "Classic Animation", nc)
            .with_description("Eases toward the target over a fixed duration")
            .time_dependent()
            .resets_on_type_change(AnimationKind::Classic)
            .with_default_type(DataType::Number)
            .with_inputs(vec![
                typed("Value"),
                number("Duration", 1.0),
                port("Curve", DataType::AnimationCurve)
                    .with_default(PortValue::AnimationCurve(ClassicAnimationCurve::Linear)),
            ])
            .with_outputs(vec![typed("Value")]),
        node("animation.spring", "Spring Animation", nc)
            .time_dependent()
            .resets_on_type_change(AnimationKind::Spring)
            .with_default_type(DataType::Number)
            .with_inputs(vec![
                typed("Value"),
                number("Mass", spring.mass),
                number("Stiffness", spring.stiffness),
                number("Damping", spring.damping),
            ])
            .with_outputs(vec![typed("Value")]),
        node("animation.pop", "Pop Animation", nc)
            .with_description("Spring animation configured by bounciness and speed")
            .time_dependent()
            .resets_on_type_change(AnimationKind::Spring)
            .with_default_type(DataType::Number)
            .with_inputs(vec![
                typed("Value"),
                number("Bounciness", SpringParams::DEFAULT_BOUNCINESS),
                number("Speed", SpringParams::DEFAULT_SPEED),
            ])
            .with_outputs(vec![typed("Value")]),
        node("animation.smooth", "Smooth Value", nc)
            .time_dependent()
            .with_default_type(DataType::Number)
            .with_inputs(vec![
                typed("Value"),
                number("Hysteresis", SmoothValueState::DEFAULT_HYSTERESIS),
                pulse("Reset"),
            ])
            .with_outputs(vec![typed("Value")]),
    ]
}
