use graph_runtime::plugin::{NodeCategory, NodeTypeDefinition, PortDefinition};
use graph_runtime::{DataType, EvalEngine, NodeEvalContext, NodeEvaluator, NodeOutput, PortValue};
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const RANDOM_VALUE: &str = "random.value";

/// Adds the random value node type and its evaluator to `engine`.
pub fn register(engine: &mut EvalEngine) {
    engine.register_node_type(random_value_definition());
    engine.register(Box::new(RandomValueEvaluator));
}

pub fn random_value_definition() -> NodeTypeDefinition {
    NodeTypeDefinition::new(RANDOM_VALUE, "Random", NodeCategory::Custom)
        .with_description("Picks a new number between Min and Max on every Randomize pulse")
        .non_deterministic()
        .with_inputs(vec![
            PortDefinition::new("Randomize", DataType::Pulse),
            PortDefinition::new("Min", DataType::Number).with_default(PortValue::Number(0.0)),
            PortDefinition::new("Max", DataType::Number).with_default(PortValue::Number(1.0)),
        ])
        .with_outputs(vec![PortDefinition::new("Value", DataType::Number)])
}

pub struct RandomValueEvaluator;

impl NodeEvaluator for RandomValueEvaluator {
    fn handles(&self) -> &[&str] {
        &["random."]
    }

    fn evaluate(&self, ctx: &mut NodeEvalContext<'_>) -> NodeOutput {
        let randomize = ctx.pulsed(0);
        let (min, max) = (ctx.number(1), ctx.number(2));
        let previous = ctx.state.previous_value.as_ref().map(|v| v.as_number(min));

        let value = match previous {
            Some(value) if !randomize => value,
            _ => {
                // Seeded from the node and the pulse time so a replayed tick draws the same number.
                let time_bucket = (ctx.time * 1000.0).round() as u64;
                let seed = ctx.node_id.as_u64_pair().0 ^ time_bucket;
                let value = draw(&mut StdRng::seed_from_u64(seed), min, max);
                debug!("Random node {} drew {}", ctx.node_id, value);
                value
            }
        };

        ctx.state.previous_value = Some(PortValue::Number(value));
        NodeOutput::single(PortValue::Number(value))
    }
}

fn draw(rng: &mut impl Rng, min: f64, max: f64) -> f64 {
    let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
    if !(lo.is_finite() && hi.is_finite()) || lo == hi {
        return lo;
    }
    rng.gen_range(lo..hi)
}
