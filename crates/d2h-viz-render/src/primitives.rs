use crate::color::Color;
use serde::{Deserialize, Serialize};

/// Fill + stroke style for rectangles and polygons.
#[derive(Debug, Clone)]
pub struct Style {
    pub fill: Option<Color>,
    /// Id of a `<pattern>` definition used as fill; takes precedence over `fill`.
    pub pattern: Option<String>,
    pub stroke: Option<Color>,
    pub stroke_width: f64,
    pub opacity: f64,
}

impl Default for Style {
    fn default() -> Self {
        Self { fill: None, pattern: None, stroke: None, stroke_width: 1.0, opacity: 1.0 }
    }
}

impl Style {
    pub fn filled(color: Color) -> Self {
        Self { fill: Some(color), ..Default::default() }
    }

    pub fn stroked(color: Color, width: f64) -> Self {
        Self { stroke: Some(color), stroke_width: width, ..Default::default() }
    }

    pub fn patterned(pattern_id: impl Into<String>) -> Self {
        Self { pattern: Some(pattern_id.into()), ..Default::default() }
    }
}

/// Line style.
#[derive(Debug, Clone)]
pub struct LineStyle {
    pub color: Color,
    pub width: f64,
    pub dash: Option<String>,
}

impl Default for LineStyle {
    fn default() -> Self {
        Self { color: Color::BLACK, width: 1.0, dash: None }
    }
}

impl LineStyle {
    pub fn solid(color: Color, width: f64) -> Self {
        Self { color, width, dash: None }
    }

    pub fn dashed(color: Color, width: f64) -> Self {
        Self { color, width, dash: Some("6 3".into()) }
    }
}

/// Text style.
#[derive(Debug, Clone)]
pub struct TextStyle {
    pub size: f64,
    pub color: Color,
    pub weight: FontWeight,
    pub style: FontStyle,
    pub anchor: TextAnchor,
    pub baseline: TextBaseline,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            size: 10.0,
            color: Color::BLACK,
            weight: FontWeight::Regular,
            style: FontStyle::Normal,
            anchor: TextAnchor::Start,
            baseline: TextBaseline::Alphabetic,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    Regular,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStyle {
    Normal,
    Italic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAnchor {
    Start,
    Middle,
    End,
}

impl TextAnchor {
    pub fn as_str(&self) -> &str {
        match self {
            TextAnchor::Start => "start",
            TextAnchor::Middle => "middle",
            TextAnchor::End => "end",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextBaseline {
    Alphabetic,
    Central,
    Hanging,
}

impl TextBaseline {
    pub fn as_str(&self) -> &str {
        match self {
            TextBaseline::Alphabetic => "auto",
            TextBaseline::Central => "central",
            TextBaseline::Hanging => "hanging",
        }
    }
}

/// Marker style for data points.
#[derive(Debug, Clone)]
pub struct MarkerStyle {
    pub shape: MarkerShape,
    pub size: f64,
    pub color: Color,
    pub fill: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerShape {
    Circle,
    Square,
    Triangle,
    Diamond,
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self { shape: MarkerShape::Circle, size: 3.0, color: Color::BLACK, fill: true }
    }
}

impl MarkerStyle {
    /// Marker for a ROOT `SetMarkerStyle` code (20 ●, 21 ■, 22 ▲, 33 ◆, 24 ○, 25 □, 26 △, 27 ◇).
    pub fn root(code: u16, color: Color, size: f64) -> Self {
        let (shape, fill) = match code {
            21 => (MarkerShape::Square, true),
            22 => (MarkerShape::Triangle, true),
            33 => (MarkerShape::Diamond, true),
            24 => (MarkerShape::Circle, false),
            25 => (MarkerShape::Square, false),
            26 => (MarkerShape::Triangle, false),
            27 => (MarkerShape::Diamond, false),
            _ => (MarkerShape::Circle, true),
        };
        Self { shape, size, color, fill }
    }
}

/// Geometry of a ROOT hatch fill style `3ijk`.
///
/// `i` is the line spacing, `j` the angle in `[0°, 90°]` in steps of 10° and
/// `k` the angle in `[90°, 180°]`; a digit of 5 leaves that direction out.
#[derive(Debug, Clone, PartialEq)]
pub struct Hatch {
    pub spacing: f64,
    pub angles: Vec<f64>,
}

impl Hatch {
    /// Decode a fill style; `None` for codes outside `3000..=3999`.
    pub fn from_root_style(code: u16) -> Option<Self> {
        if !(3000..=3999).contains(&code) {
            return None;
        }
        let i = (code / 100) % 10;
        let j = (code / 10) % 10;
        let k = code % 10;
        let mut angles = Vec::with_capacity(2);
        if j != 5 {
            angles.push(f64::from(j) * 10.0);
        }
        if k != 5 {
            angles.push(180.0 - f64::from(k) * 10.0);
        }
        Some(Self { spacing: 2.0 + 1.5 * f64::from(i.max(1)), angles })
    }
}
