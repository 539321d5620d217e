//! Text extents estimated from Helvetica-like glyph advances.
//!
//! Layout only needs widths to size margins and legends; the exact glyphs are
//! chosen later by the SVG consumer.

use crate::primitives::{FontWeight, TextStyle};

/// Ascent as a fraction of the font size.
const ASCENT: f64 = 0.72;
/// Descent as a fraction of the font size.
const DESCENT: f64 = 0.21;
/// Widening applied to bold text.
const BOLD_FACTOR: f64 = 1.06;

#[derive(Debug, Clone, Copy)]
pub struct TextMetrics {
    pub width: f64,
    pub height: f64,
    pub ascent: f64,
}

/// Advance of one glyph in em units.
fn advance(c: char) -> f64 {
    match c {
        'i' | 'j' | 'l' | '\'' | '|' | '.' | ',' | ':' | ';' | '!' => 0.24,
        'f' | 't' | 'r' | 'I' | ' ' | '(' | ')' | '[' | ']' | '/' | '-' => 0.31,
        'm' | 'w' | 'M' | 'W' => 0.86,
        'A'..='Z' => 0.68,
        '0'..='9' | 'a'..='z' | '#' | '$' | '_' => 0.56,
        '<' | '>' | '=' | '+' | '±' | '×' => 0.58,
        _ if c.is_ascii() => 0.5,
        // Greek and other symbols
        _ => 0.62,
    }
}

/// Measure `text` at `size` points.
pub fn measure_text(text: &str, size: f64, weight: FontWeight) -> TextMetrics {
    let ems: f64 = text.chars().map(advance).sum();
    let factor = if weight == FontWeight::Bold { BOLD_FACTOR } else { 1.0 };
    TextMetrics {
        width: ems * size * factor,
        height: (ASCENT + DESCENT) * size,
        ascent: ASCENT * size,
    }
}

/// Measure text with a TextStyle.
pub fn measure_styled(text: &str, style: &TextStyle) -> TextMetrics {
    measure_text(text, style.size, style.weight)
}
