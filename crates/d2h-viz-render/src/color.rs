use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#rrggbb` (the `#` is optional).
    pub fn try_hex(s: &str) -> Option<Self> {
        let s = s.strip_prefix('#').unwrap_or(s);
        if s.len() != 6 || !s.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&s[i..i + 2], 16).ok();
        Some(Self::rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Parse `#rrggbb`, black when malformed.
    pub fn hex(s: &str) -> Self {
        Self::try_hex(s).unwrap_or(Self::BLACK)
    }

    pub const fn with_alpha(mut self, a: f64) -> Self {
        self.a = a;
        self
    }

    pub fn to_svg_fill(&self) -> String {
        if (self.a - 1.0).abs() < 1e-6 {
            self.to_hex()
        } else {
            format!("rgba({},{},{},{:.3})", self.r, self.g, self.b, self.a)
        }
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_svg_fill())
    }
}

impl Serialize for Color {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Color::try_hex(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid colour '{s}', expected #rrggbb")))
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

// --- Palettes ---

/// Series colours of the fraction comparison: kBlack, kRed-3, kBlack,
/// kAzure-7, kGreen+2, kOrange-3, kMagenta+1, kBlue, kRed-3, kTeal+3, kGreen,
/// kAzure+8, kYellow+3, kOrange-5, kMagenta+2, kBlue-6, kCyan+1, kGreen-6.
pub const ROOT_COMPARE: &[&str] = &[
    "#000000", "#cc3333", "#000000", "#6699cc", "#009900", "#cc9933", "#cc00cc", "#0000ff",
    "#cc3333", "#339966", "#00ff00", "#3366cc", "#999900", "#996633", "#990099", "#3333cc",
    "#00cccc", "#66cc66",
];

/// Series colours of the graph overlay (the comparison list without the
/// repeated black).
pub const ROOT_GRAPH: &[&str] = &[
    "#000000", "#cc3333", "#6699cc", "#cc00cc", "#009900", "#cc9933", "#0000ff", "#339966",
    "#00ff00", "#3366cc", "#999900", "#996633", "#990099", "#3333cc", "#00cccc", "#66cc66",
];

/// Model band colours: kGray+1, kOrange-3, kCyan-2, kRed-9, kAzure-9.
pub const ROOT_MODELS: &[&str] = &["#999999", "#cc9933", "#33cccc", "#ff9999", "#99ccff"];

pub const TABLEAU10: &[&str] = &[
    "#4e79a7", "#f28e2b", "#e15759", "#76b7b2", "#59a14f", "#edc948", "#b07aa1", "#ff9da7",
    "#9c755f", "#bab0ab",
];

pub fn palette_colors(name: &str) -> Vec<Color> {
    let strs = match name {
        "root_graph" => ROOT_GRAPH,
        "root_models" => ROOT_MODELS,
        "tableau10" => TABLEAU10,
        _ => ROOT_COMPARE,
    };
    strs.iter().map(|s| Color::hex(s)).collect()
}

/// Colour `index` of a palette, cycling.
pub fn palette_color(palette: &[Color], index: usize) -> Color {
    if palette.is_empty() { Color::BLACK } else { palette[index % palette.len()] }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_parsing() {
        let c = Color::hex("#1D4ED8");
        assert_eq!(c.r, 0x1D);
        assert_eq!(c.g, 0x4E);
        assert_eq!(c.b, 0xD8);
        assert!((c.a - 1.0).abs() < 1e-9);
        assert!(Color::try_hex("#12").is_none());
        assert!(Color::try_hex("zz0000").is_none());
        assert_eq!(Color::hex("oops"), Color::BLACK);
    }

    #[test]
    fn svg_fill_alpha() {
        assert_eq!(Color::rgb(29, 78, 216).to_svg_fill(), "#1d4ed8");
        let c = Color::rgb(29, 78, 216).with_alpha(0.5);
        assert_eq!(c.to_svg_fill(), "rgba(29,78,216,0.500)");
    }

    #[test]
    fn palette_lookup() {
        assert_eq!(palette_colors("root_compare").len(), 18);
        assert_eq!(palette_colors("root_graph").len(), 16);
        assert_eq!(palette_colors("root_models").len(), 5);
        assert_eq!(palette_colors("unknown"), palette_colors("root_compare"));
        let models = palette_colors("root_models");
        assert_eq!(palette_color(&models, 7), models[2]);
        assert_eq!(palette_color(&[], 3), Color::BLACK);
    }

    #[test]
    fn serde_as_hex_string() {
        let json = serde_json::to_string(&Color::rgb(255, 0, 16)).unwrap();
        assert_eq!(json, "\"#ff0010\"");
        let back: Color = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Color::rgb(255, 0, 16));
        assert!(serde_json::from_str::<Color>("\"red\"").is_err());
    }
}
