//! PortValue — the typed value carried by a port.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::animation::easing::ClassicAnimationCurve;

/// Absolute tolerance used when comparing floating-point components.
pub const VALUE_EPSILON: f64 = 1e-9;

pub(crate) fn approx_eq(a: f64, b: f64) -> bool {
    a == b || (a - b).abs() <= VALUE_EPSILON
}

fn approx_eq_slice(a: &[f64], b: &[f64]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| approx_eq(*x, *y))
}

/// Declared type of a port.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Number,
    Bool,
    String,
    Position,
    Point3D,
    Point4D,
    Color,
    BlendMode,
    LayerDimension,
    AnimationCurve,
    Pulse,
    Media,
}

impl DataType {
    pub const ALL: [DataType; 12] = [
        DataType::Number,
        DataType::Bool,
        DataType::String,
        DataType::Position,
        DataType::Point3D,
        DataType::Point4D,
        DataType::Color,
        DataType::BlendMode,
        DataType::LayerDimension,
        DataType::AnimationCurve,
        DataType::Pulse,
        DataType::Media,
    ];

    /// Number of animatable components, or `None` if the type cannot be animated.
    pub fn component_count(&self) -> Option<usize> {
        match self {
            DataType::Number | DataType::LayerDimension => Some(1),
            DataType::Position => Some(2),
            DataType::Point3D => Some(3),
            DataType::Point4D | DataType::Color => Some(4),
            _ => None,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default)]
pub struct Point4 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

/// RGBA color with components in `0.0..=1.0`.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Color {
    pub const CLEAR: Color = Color { r: 0.0, g: 0.0, b: 0.0, a: 0.0 };
    pub const WHITE: Color = Color { r: 1.0, g: 1.0, b: 1.0, a: 1.0 };

    pub fn gray(level: f64) -> Self {
        let level = level.clamp(0.0, 1.0);
        Self { r: level, g: level, b: level, a: 1.0 }
    }

    /// Parses `#RRGGBB` or `#RRGGBBAA`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        if hex.len() != 6 && hex.len() != 8 {
            return None;
        }
        let channel = |i: usize| -> Option<f64> {
            u8::from_str_radix(hex.get(i..i + 2)?, 16)
                .ok()
                .map(|v| v as f64 / 255.0)
        };
        Some(Self {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
            a: if hex.len() == 8 { channel(6)? } else { 1.0 },
        })
    }

    pub fn to_hex(&self) -> String {
        let byte = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!(
            "#{:02X}{:02X}{:02X}{:02X}",
            byte(self.r),
            byte(self.g),
            byte(self.b),
            byte(self.a)
        )
    }

    fn components(&self) -> [f64; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    #[default]
    Normal,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
    ColorDodge,
    ColorBurn,
    SoftLight,
    HardLight,
    Difference,
    Exclusion,
}

impl BlendMode {
    const ALL: [BlendMode; 12] = [
        BlendMode::Normal,
        BlendMode::Multiply,
        BlendMode::Screen,
        BlendMode::Overlay,
        BlendMode::Darken,
        BlendMode::Lighten,
        BlendMode::ColorDodge,
        BlendMode::ColorBurn,
        BlendMode::SoftLight,
        BlendMode::HardLight,
        BlendMode::Difference,
        BlendMode::Exclusion,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            BlendMode::Normal => "normal",
            BlendMode::Multiply => "multiply",
            BlendMode::Screen => "screen",
            BlendMode::Overlay => "overlay",
            BlendMode::Darken => "darken",
            BlendMode::Lighten => "lighten",
            BlendMode::ColorDodge => "color_dodge",
            BlendMode::ColorBurn => "color_burn",
            BlendMode::SoftLight => "soft_light",
            BlendMode::HardLight => "hard_light",
            BlendMode::Difference => "difference",
            BlendMode::Exclusion => "exclusion",
        }
    }
}

impl FromStr for BlendMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        Self::ALL.iter().copied().find(|m| m.name() == wanted).ok_or(())
    }
}

/// Size of a layer along one axis.
#[derive(Serialize, Deserialize, Clone, Copy, Debug)]
#[serde(rename_all = "snake_case")]
pub enum LayerDimension {
    Number(f64),
    Percent(f64),
    Auto,
    Fill,
}

impl Default for LayerDimension {
    fn default() -> Self {
        LayerDimension::Number(0.0)
    }
}

impl LayerDimension {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            LayerDimension::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl PartialEq for LayerDimension {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (LayerDimension::Number(a), LayerDimension::Number(b))
            | (LayerDimension::Percent(a), LayerDimension::Percent(b)) => approx_eq(*a, *b),
            (LayerDimension::Auto, LayerDimension::Auto)
            | (LayerDimension::Fill, LayerDimension::Fill) => true,
            _ => false,
        }
    }
}

impl FromStr for LayerDimension {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.to_ascii_lowercase().as_str() {
            "auto" => return Ok(LayerDimension::Auto),
            "fill" => return Ok(LayerDimension::Fill),
            _ => {}
        }
        if let Some(percent) = s.strip_suffix('%') {
            return percent
                .trim()
                .parse::<f64>()
                .map(LayerDimension::Percent)
                .map_err(|_| ());
        }
        s.parse::<f64>().map(LayerDimension::Number).map_err(|_| ())
    }
}

impl fmt::Display for LayerDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayerDimension::Number(n) => write!(f, "{}", n),
            LayerDimension::Percent(p) => write!(f, "{}%", p),
            LayerDimension::Auto => f.write_str("auto"),
            LayerDimension::Fill => f.write_str("fill"),
        }
    }
}

pub type MediaId = Uuid;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
    Audio,
    Model3D,
}

/// Opaque handle to media owned by the host application.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct MediaRef {
    pub id: MediaId,
    pub kind: MediaKind,
    /// Node that requested the media, if any.
    pub owner: Option<Uuid>,
}

/// A value flowing on a port.
///
/// Every variant has a zero (see [`PortValue::zero`]). Equality compares
/// floating-point components with [`VALUE_EPSILON`].
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum PortValue {
    Number(f64),
    Bool(bool),
    String(String),
    Position(Point2),
    Point3D(Point3),
    Point4D(Point4),
    Color(Color),
    BlendMode(BlendMode),
    LayerDimension(LayerDimension),
    AnimationCurve(ClassicAnimationCurve),
    /// Graph time at which the pulse was triggered. `0.0` is the pulse zero.
    Pulse(f64),
    AsyncMedia(Option<MediaRef>),
}

impl Default for PortValue {
    fn default() -> Self {
        PortValue::Number(0.0)
    }
}

impl PortValue {
    pub fn zero(data_type: DataType) -> Self {
        match data_type {
            DataType::Number => PortValue::Number(0.0),
            DataType::Bool => PortValue::Bool(false),
            DataType::String => PortValue::String(String::new()),
            DataType::Position => PortValue::Position(Point2::default()),
            DataType::Point3D => PortValue::Point3D(Point3::default()),
            DataType::Point4D => PortValue::Point4D(Point4::default()),
            DataType::Color => PortValue::Color(Color::CLEAR),
            DataType::BlendMode => PortValue::BlendMode(BlendMode::default()),
            DataType::LayerDimension => PortValue::LayerDimension(LayerDimension::default()),
            DataType::AnimationCurve => PortValue::AnimationCurve(ClassicAnimationCurve::default()),
            DataType::Pulse => PortValue::Pulse(0.0),
            DataType::Media => PortValue::AsyncMedia(None),
        }
    }

    pub fn data_type(&self) -> DataType {
        match self {
            PortValue::Number(_) => DataType::Number,
            PortValue::Bool(_) => DataType::Bool,
            PortValue::String(_) => DataType::String,
            PortValue::Position(_) => DataType::Position,
            PortValue::Point3D(_) => DataType::Point3D,
            PortValue::Point4D(_) => DataType::Point4D,
            PortValue::Color(_) => DataType::Color,
            PortValue::BlendMode(_) => DataType::BlendMode,
            PortValue::LayerDimension(_) => DataType::LayerDimension,
            PortValue::AnimationCurve(_) => DataType::AnimationCurve,
            PortValue::Pulse(_) => DataType::Pulse,
            PortValue::AsyncMedia(_) => DataType::Media,
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == PortValue::zero(self.data_type())
    }

    /// Extract as number, returning default if not a Number.
    pub fn as_number(&self, default: f64) -> f64 {
        match self {
            PortValue::Number(v) => *v,
            _ => default,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PortValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_media(&self) -> Option<&MediaRef> {
        match self {
            PortValue::AsyncMedia(media) => media.as_ref(),
            _ => None,
        }
    }

    /// Components that an animation can interpolate, or `None` for discrete values.
    pub fn components(&self) -> Option<Vec<f64>> {
        match self {
            PortValue::Number(v) => Some(vec![*v]),
            PortValue::Position(p) => Some(vec![p.x, p.y]),
            PortValue::Point3D(p) => Some(vec![p.x, p.y, p.z]),
            PortValue::Point4D(p) => Some(vec![p.x, p.y, p.z, p.w]),
            PortValue::Color(c) => Some(c.components().to_vec()),
            PortValue::LayerDimension(LayerDimension::Number(n)) => Some(vec![*n]),
            _ => None,
        }
    }

    /// Rebuilds a value of `data_type` from components; missing components are zero.
    pub fn from_components(data_type: DataType, c: &[f64]) -> Self {
        let at = |i: usize| c.get(i).copied().unwrap_or(0.0);
        match data_type {
            DataType::Number => PortValue::Number(at(0)),
            DataType::Position => PortValue::Position(Point2 { x: at(0), y: at(1) }),
            DataType::Point3D => PortValue::Point3D(Point3 { x: at(0), y: at(1), z: at(2) }),
            DataType::Point4D => PortValue::Point4D(Point4 {
                x: at(0),
                y: at(1),
                z: at(2),
                w: at(3),
            }),
            DataType::Color => PortValue::Color(Color {
                r: at(0),
                g: at(1),
                b: at(2),
                a: at(3),
            }),
            DataType::LayerDimension => PortValue::LayerDimension(LayerDimension::Number(at(0))),
            other => PortValue::zero(other),
        }
    }
}

impl PartialEq for PortValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PortValue::Number(a), PortValue::Number(b)) => approx_eq(*a, *b),
            (PortValue::Bool(a), PortValue::Bool(b)) => a == b,
            (PortValue::String(a), PortValue::String(b)) => a == b,
            (PortValue::Position(a), PortValue::Position(b)) => {
                approx_eq_slice(&[a.x, a.y], &[b.x, b.y])
            }
            (PortValue::Point3D(a), PortValue::Point3D(b)) => {
                approx_eq_slice(&[a.x, a.y, a.z], &[b.x, b.y, b.z])
            }
            (PortValue::Point4D(a), PortValue::Point4D(b)) => {
                approx_eq_slice(&[a.x, a.y, a.z, a.w], &[b.x, b.y, b.z, b.w])
            }
            (PortValue::Color(a), PortValue::Color(b)) => {
                approx_eq_slice(&a.components(), &b.components())
            }
            (PortValue::BlendMode(a), PortValue::BlendMode(b)) => a == b,
            (PortValue::LayerDimension(a), PortValue::LayerDimension(b)) => a == b,
            (PortValue::AnimationCurve(a), PortValue::AnimationCurve(b)) => a == b,
            (PortValue::Pulse(a), PortValue::Pulse(b)) => approx_eq(*a, *b),
            (PortValue::AsyncMedia(a), PortValue::AsyncMedia(b)) => a == b,
            _ => false,
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl fmt::Display for PortValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortValue::Number(n) => f.write_str(&format_number(*n)),
            PortValue::Bool(b) => write!(f, "{}", b),
            PortValue::String(s) => f.write_str(s),
            PortValue::Position(p) => {
                write!(f, "{}, {}", format_number(p.x), format_number(p.y))
            }
            PortValue::Point3D(p) => write!(
                f,
                "{}, {}, {}",
                format_number(p.x),
                format_number(p.y),
                format_number(p.z)
            ),
            PortValue::Point4D(p) => write!(
                f,
                "{}, {}, {}, {}",
                format_number(p.x),
                format_number(p.y),
                format_number(p.z),
                format_number(p.w)
            ),
            PortValue::Color(c) => f.write_str(&c.to_hex()),
            PortValue::BlendMode(m) => f.write_str(m.name()),
            PortValue::LayerDimension(d) => write!(f, "{}", d),
            PortValue::AnimationCurve(c) => write!(f, "{}", c),
            PortValue::Pulse(at) => f.write_str(&format_number(*at)),
            PortValue::AsyncMedia(Some(media)) => write!(f, "{}", media.id),
            PortValue::AsyncMedia(None) => Ok(()),
        }
    }
}
