//! Total conversion between port types.
//!
//! Used when an edge connects ports with different declared types and when a
//! node's user-visible type changes. Every `(value, type)` pair maps to a value
//! of the requested type; unparseable inputs fall back to truthiness or zero.

use super::value::{
    Color, DataType, LayerDimension, Point2, Point3, Point4, PortValue,
};
use crate::pulse;

/// Time information needed to coerce pulses.
#[derive(Debug, Clone, Copy)]
pub struct CoercionContext {
    pub graph_time: f64,
    pub pulse_threshold: f64,
}

impl Default for CoercionContext {
    fn default() -> Self {
        Self {
            graph_time: 0.0,
            pulse_threshold: 1.0 / 60.0,
        }
    }
}

/// Coerces with graph time zero. Truthy values become the pulse zero.
pub fn coerce(value: &PortValue, to: DataType) -> PortValue {
    coerce_with(value, to, &CoercionContext::default())
}

pub fn coerce_with(value: &PortValue, to: DataType, ctx: &CoercionContext) -> PortValue {
    if value.data_type() == to {
        return value.clone();
    }
    match to {
        DataType::Number => PortValue::Number(to_number(value, ctx)),
        DataType::Bool => PortValue::Bool(is_truthy(value, ctx)),
        DataType::String => PortValue::String(value.to_string()),
        DataType::Position => PortValue::Position(to_position(value, ctx)),
        DataType::Point3D => PortValue::Point3D(to_point3(value, ctx)),
        DataType::Point4D => PortValue::Point4D(to_point4(value, ctx)),
        DataType::Color => PortValue::Color(to_color(value, ctx)),
        DataType::BlendMode => match value {
            PortValue::String(s) => PortValue::BlendMode(s.parse().unwrap_or_default()),
            _ => PortValue::zero(DataType::BlendMode),
        },
        DataType::LayerDimension => PortValue::LayerDimension(to_layer_dimension(value, ctx)),
        DataType::AnimationCurve => match value {
            PortValue::String(s) => PortValue::AnimationCurve(s.parse().unwrap_or_default()),
            _ => PortValue::zero(DataType::AnimationCurve),
        },
        DataType::Pulse => {
            if is_truthy(value, ctx) {
                PortValue::Pulse(ctx.graph_time)
            } else {
                PortValue::zero(DataType::Pulse)
            }
        }
        DataType::Media => PortValue::zero(DataType::Media),
    }
}

pub fn is_truthy(value: &PortValue, ctx: &CoercionContext) -> bool {
    match value {
        PortValue::Number(n) => *n > 0.0,
        PortValue::Bool(b) => *b,
        PortValue::String(s) => !s.is_empty(),
        PortValue::Position(p) => p.x != 0.0 || p.y != 0.0,
        PortValue::Point3D(p) => p.x != 0.0 || p.y != 0.0 || p.z != 0.0,
        PortValue::Point4D(p) => p.x != 0.0 || p.y != 0.0 || p.z != 0.0 || p.w != 0.0,
        PortValue::Color(c) => c.a > 0.0,
        PortValue::LayerDimension(d) => match d {
            LayerDimension::Number(n) | LayerDimension::Percent(n) => *n > 0.0,
            LayerDimension::Auto | LayerDimension::Fill => true,
        },
        PortValue::BlendMode(_) | PortValue::AnimationCurve(_) => false,
        PortValue::Pulse(at) => pulse::should_pulse(*at, ctx.graph_time, ctx.pulse_threshold),
        PortValue::AsyncMedia(media) => media.is_some(),
    }
}

fn truthy_number(value: &PortValue, ctx: &CoercionContext) -> f64 {
    if is_truthy(value, ctx) { 1.0 } else { 0.0 }
}

fn to_number(value: &PortValue, ctx: &CoercionContext) -> f64 {
    match value {
        PortValue::Number(n) => *n,
        PortValue::String(s) => match s.trim().parse::<f64>() {
            Ok(n) => n,
            Err(_) if s.is_empty() => 0.0,
            Err(_) => 1.0,
        },
        PortValue::Position(p) => p.x,
        PortValue::Point3D(p) => p.x,
        PortValue::Point4D(p) => p.x,
        PortValue::LayerDimension(LayerDimension::Number(n)) => *n,
        other => truthy_number(other, ctx),
    }
}

fn to_position(value: &PortValue, ctx: &CoercionContext) -> Point2 {
    match value {
        PortValue::Number(n) => Point2 { x: *n, y: *n },
        PortValue::Point3D(p) => Point2 { x: p.x, y: p.y },
        PortValue::Point4D(p) => Point2 { x: p.x, y: p.y },
        PortValue::String(s) => parse_components(s)
            .map(|c| Point2 { x: c[0], y: c[1] })
            .unwrap_or_else(|| splat2(truthy_number(value, ctx))),
        PortValue::LayerDimension(LayerDimension::Number(n)) => splat2(*n),
        other => splat2(truthy_number(other, ctx)),
    }
}

fn to_point3(value: &PortValue, ctx: &CoercionContext) -> Point3 {
    match value {
        PortValue::Number(n) => Point3 { x: *n, y: *n, z: *n },
        PortValue::Position(p) => Point3 { x: p.x, y: p.y, z: 0.0 },
        PortValue::Point4D(p) => Point3 { x: p.x, y: p.y, z: p.z },
        PortValue::String(s) => parse_components(s)
            .map(|c| Point3 { x: c[0], y: c[1], z: c[2] })
            .unwrap_or_else(|| {
                let n = truthy_number(value, ctx);
                Point3 { x: n, y: n, z: n }
            }),
        other => {
            let n = truthy_number(other, ctx);
            Point3 { x: n, y: n, z: n }
        }
    }
}

fn to_point4(value: &PortValue, ctx: &CoercionContext) -> Point4 {
    match value {
        PortValue::Number(n) => Point4 { x: *n, y: *n, z: *n, w: *n },
        PortValue::Position(p) => Point4 { x: p.x, y: p.y, z: 0.0, w: 0.0 },
        PortValue::Point3D(p) => Point4 { x: p.x, y: p.y, z: p.z, w: 0.0 },
        PortValue::Color(c) => Point4 { x: c.r, y: c.g, z: c.b, w: c.a },
        PortValue::String(s) => parse_components(s)
            .map(|c| Point4 { x: c[0], y: c[1], z: c[2], w: c[3] })
            .unwrap_or_else(|| {
                let n = truthy_number(value, ctx);
                Point4 { x: n, y: n, z: n, w: n }
            }),
        other => {
            let n = truthy_number(other, ctx);
            Point4 { x: n, y: n, z: n, w: n }
        }
    }
}

fn to_color(value: &PortValue, ctx: &CoercionContext) -> Color {
    match value {
        PortValue::Number(n) => Color::gray(*n),
        PortValue::Point4D(p) => Color { r: p.x, g: p.y, b: p.z, a: p.w },
        PortValue::String(s) => Color::from_hex(s).unwrap_or(Color::CLEAR),
        other => {
            if is_truthy(other, ctx) {
                Color::WHITE
            } else {
                Color::CLEAR
            }
        }
    }
}

fn to_layer_dimension(value: &PortValue, ctx: &CoercionContext) -> LayerDimension {
    match value {
        PortValue::Number(n) => LayerDimension::Number(*n),
        PortValue::String(s) => s
            .parse()
            .unwrap_or(LayerDimension::Number(truthy_number(value, ctx))),
        PortValue::Position(p) => LayerDimension::Number(p.x),
        other => LayerDimension::Number(truthy_number(other, ctx)),
    }
}

fn splat2(n: f64) -> Point2 {
    Point2 { x: n, y: n }
}

/// Parses "1, 2, 3" into up to four components, padding with zero.
fn parse_components(s: &str) -> Option<[f64; 4]> {
    let mut out = [0.0; 4];
    let mut count = 0;
    for part in s.split(',') {
        if count == 4 {
            return None;
        }
        out[count] = part.trim().parse::<f64>().ok()?;
        count += 1;
    }
    (count > 1).then_some(out)
}
