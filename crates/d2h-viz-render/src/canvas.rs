use std::fmt::Write as FmtWrite;

use crate::color::Color;
use crate::primitives::*;
use crate::text::{TextMetrics, measure_styled};

/// Font stack written into every `<text>` element.
const FONT_FAMILY: &str = "Helvetica, Arial, 'Liberation Sans', sans-serif";

/// An SVG element stored for deferred rendering.
#[derive(Debug, Clone)]
enum SvgElement {
    Rect {
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        style: Style,
    },
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        style: LineStyle,
    },
    Polyline {
        points: Vec<(f64, f64)>,
        style: LineStyle,
    },
    Polygon {
        points: Vec<(f64, f64)>,
        style: Style,
    },
    Text {
        x: f64,
        y: f64,
        content: String,
        style: TextStyle,
        rotate: Option<f64>,
    },
    Path {
        d: String,
        style: Style,
    },
    Circle {
        cx: f64,
        cy: f64,
        r: f64,
        style: Style,
    },
    Group {
        clip_id: String,
        children: Vec<SvgElement>,
    },
}

/// A clip group still collecting children.
struct OpenClip {
    id: String,
    children: Vec<SvgElement>,
}

/// Immediate-mode SVG canvas. Coordinates in points (1pt = 1/72").
pub struct Canvas {
    pub width: f64,
    pub height: f64,
    elements: Vec<SvgElement>,
    defs: Vec<String>,
    clip_stack: Vec<OpenClip>,
    next_clip_id: usize,
    /// `(angle, spacing, colour)` of every hatch pattern already defined.
    patterns: Vec<(i64, i64, String)>,
}

impl Canvas {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            elements: Vec::new(),
            defs: Vec::new(),
            clip_stack: Vec::new(),
            next_clip_id: 0,
            patterns: Vec::new(),
        }
    }

    // --- Drawing primitives ---

    pub fn rect(&mut self, x: f64, y: f64, w: f64, h: f64, style: &Style) {
        self.push(SvgElement::Rect { x, y, w, h, style: style.clone() });
    }

    pub fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, style: &LineStyle) {
        self.push(SvgElement::Line { x1, y1, x2, y2, style: style.clone() });
    }

    pub fn polyline(&mut self, points: &[(f64, f64)], style: &LineStyle) {
        self.push(SvgElement::Polyline { points: points.to_vec(), style: style.clone() });
    }

    pub fn polygon(&mut self, points: &[(f64, f64)], style: &Style) {
        self.push(SvgElement::Polygon { points: points.to_vec(), style: style.clone() });
    }

    pub fn text(&mut self, x: f64, y: f64, content: &str, style: &TextStyle) {
        self.push(SvgElement::Text {
            x,
            y,
            content: content.to_string(),
            style: style.clone(),
            rotate: None,
        });
    }

    pub fn text_rotated(&mut self, x: f64, y: f64, content: &str, style: &TextStyle, angle: f64) {
        self.push(SvgElement::Text {
            x,
            y,
            content: content.to_string(),
            style: style.clone(),
            rotate: Some(angle),
        });
    }

    pub fn circle(&mut self, cx: f64, cy: f64, r: f64, style: &Style) {
        self.push(SvgElement::Circle { cx, cy, r, style: style.clone() });
    }

    /// Error bar: vertical line + optional horizontal caps.
    pub fn error_bar(&mut self, x: f64, y_lo: f64, y_hi: f64, cap_width: f64, style: &LineStyle) {
        self.line(x, y_lo, x, y_hi, style);
        if cap_width > 0.0 {
            let half = cap_width / 2.0;
            self.line(x - half, y_lo, x + half, y_lo, style);
            self.line(x - half, y_hi, x + half, y_hi, style);
        }
    }

    /// Horizontal error bar.
    pub fn error_bar_h(
        &mut self,
        x_lo: f64,
        x_hi: f64,
        y: f64,
        cap_height: f64,
        style: &LineStyle,
    ) {
        self.line(x_lo, y, x_hi, y, style);
        if cap_height > 0.0 {
            let half = cap_height / 2.0;
            self.line(x_lo, y - half, x_lo, y + half, style);
            self.line(x_hi, y - half, x_hi, y + half, style);
        }
    }

    /// Data marker.
    pub fn marker(&mut self, x: f64, y: f64, marker: &MarkerStyle) {
        let style = if marker.fill {
            Style {
                fill: Some(marker.color),
                stroke: Some(marker.color),
                stroke_width: 0.5,
                ..Default::default()
            }
        } else {
            Style::stroked(marker.color, 1.0)
        };
        let s = marker.size;
        match marker.shape {
            MarkerShape::Circle => self.circle(x, y, s, &style),
            MarkerShape::Square => self.rect(x - s, y - s, 2.0 * s, 2.0 * s, &style),
            MarkerShape::Triangle => {
                let h = s * 1.15;
                self.polygon(&[(x, y - h), (x + h, y + 0.8 * h), (x - h, y + 0.8 * h)], &style);
            }
            MarkerShape::Diamond => {
                let h = s * 1.3;
                self.polygon(&[(x, y - h), (x + 0.7 * h, y), (x, y + h), (x - 0.7 * h, y)], &style);
            }
        }
    }

    /// Rectangle filled with a ROOT hatch style (`3ijk`); solid fill otherwise.
    pub fn hatch_rect(&mut self, x: f64, y: f64, w: f64, h: f64, fill_style: u16, color: Color) {
        let points = [(x, y), (x + w, y), (x + w, y + h), (x, y + h)];
        self.hatch_polygon(&points, fill_style, color);
    }

    /// Polygon filled with a ROOT hatch style; one layer per hatch direction.
    pub fn hatch_polygon(&mut self, points: &[(f64, f64)], fill_style: u16, color: Color) {
        match Hatch::from_root_style(fill_style) {
            Some(hatch) => {
                for &angle in &hatch.angles {
                    let id = self.hatch_pattern(angle, hatch.spacing, color);
                    self.polygon(points, &Style::patterned(id));
                }
            }
            None => self.polygon(points, &Style::filled(color)),
        }
    }

    /// Id of a line pattern at `angle` degrees, defined on first use.
    fn hatch_pattern(&mut self, angle: f64, spacing: f64, color: Color) -> String {
        let key = (angle.round() as i64, (spacing * 100.0).round() as i64, color.to_svg_fill());
        if let Some(pos) = self.patterns.iter().position(|k| *k == key) {
            return format!("hatch{pos}");
        }
        let id = format!("hatch{}", self.patterns.len());
        self.defs.push(format!(
            r#"<pattern id="{id}" patternUnits="userSpaceOnUse" width="{sp:.2}" height="{sp:.2}" patternTransform="rotate({rot:.1})"><line x1="0" y1="{mid:.2}" x2="{sp:.2}" y2="{mid:.2}" stroke="{c}" stroke-width="0.7" /></pattern>"#,
            sp = spacing,
            mid = spacing / 2.0,
            rot = -angle,
            c = key.2,
        ));
        self.patterns.push(key);
        id
    }

    // --- Clip paths ---

    /// Start clipping everything drawn until the matching [`Canvas::pop_clip`].
    pub fn push_clip(&mut self, x: f64, y: f64, w: f64, h: f64) -> String {
        let id = format!("clip{}", self.next_clip_id);
        self.next_clip_id += 1;
        self.defs.push(format!(
            r#"<clipPath id="{id}"><rect x="{x:.2}" y="{y:.2}" width="{w:.2}" height="{h:.2}" /></clipPath>"#
        ));
        self.clip_stack.push(OpenClip { id: id.clone(), children: Vec::new() });
        id
    }

    pub fn pop_clip(&mut self) {
        if let Some(open) = self.clip_stack.pop() {
            self.push(SvgElement::Group { clip_id: open.id, children: open.children });
        }
    }

    // --- Text measurement ---

    pub fn measure_text(&self, content: &str, style: &TextStyle) -> TextMetrics {
        measure_styled(content, style)
    }

    // --- SVG output ---

    fn push(&mut self, elem: SvgElement) {
        match self.clip_stack.last_mut() {
            Some(open) => open.children.push(elem),
            None => self.elements.push(elem),
        }
    }

    /// Serialize; clip groups left open are closed first.
    pub fn finish_svg(mut self) -> String {
        while !self.clip_stack.is_empty() {
            self.pop_clip();
        }

        let mut out = String::with_capacity(32 * 1024);
        writeln!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = self.width,
            h = self.height,
        )
        .unwrap();

        if !self.defs.is_empty() {
            out.push_str("<defs>\n");
            for d in &self.defs {
                out.push_str(d);
                out.push('\n');
            }
            out.push_str("</defs>\n");
        }

        writeln!(out, r#"<rect width="{}" height="{}" fill="white" />"#, self.width, self.height)
            .unwrap();

        for elem in &self.elements {
            render_element(&mut out, elem);
        }

        out.push_str("</svg>\n");
        out
    }
}

fn write_points(out: &mut String, points: &[(f64, f64)]) {
    for (i, (x, y)) in points.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        write!(out, "{x:.2},{y:.2}").unwrap();
    }
}

fn render_element(out: &mut String, elem: &SvgElement) {
    match elem {
        SvgElement::Rect { x, y, w, h, style } => {
            write!(out, r#"<rect x="{x:.2}" y="{y:.2}" width="{w:.2}" height="{h:.2}""#).unwrap();
            write_style_attrs(out, style);
            out.push_str(" />\n");
        }
        SvgElement::Line { x1, y1, x2, y2, style } => {
            write!(out, r#"<line x1="{x1:.2}" y1="{y1:.2}" x2="{x2:.2}" y2="{y2:.2}""#).unwrap();
            write_line_attrs(out, style);
            out.push_str(" />\n");
        }
        SvgElement::Polyline { points, style } => {
            out.push_str(r#"<polyline points=""#);
            write_points(out, points);
            out.push_str(r#"" fill="none""#);
            write_line_attrs(out, style);
            out.push_str(" />\n");
        }
        SvgElement::Polygon { points, style } => {
            out.push_str(r#"<polygon points=""#);
            write_points(out, points);
            out.push('"');
            write_style_attrs(out, style);
            out.push_str(" />\n");
        }
        SvgElement::Text { x, y, content, style, rotate } => {
            write!(out, r#"<text x="{x:.2}" y="{y:.2}""#).unwrap();
            write!(out, r#" font-family="{FONT_FAMILY}" font-size="{:.1}""#, style.size).unwrap();
            write!(out, r#" fill="{}""#, style.color.to_svg_fill()).unwrap();
            write!(out, r#" text-anchor="{}""#, style.anchor.as_str()).unwrap();
            write!(out, r#" dominant-baseline="{}""#, style.baseline.as_str()).unwrap();
            if style.weight == FontWeight::Bold {
                out.push_str(r#" font-weight="bold""#);
            }
            if style.style == FontStyle::Italic {
                out.push_str(r#" font-style="italic""#);
            }
            if let Some(angle) = rotate {
                write!(out, r#" transform="rotate({angle:.1},{x:.2},{y:.2})""#).unwrap();
            }
            out.push('>');
            for ch in content.chars() {
                match ch {
                    '<' => out.push_str("&lt;"),
                    '>' => out.push_str("&gt;"),
                    '&' => out.push_str("&amp;"),
                    '"' => out.push_str("&quot;"),
                    _ => out.push(ch),
                }
            }
            out.push_str("</text>\n");
        }
        SvgElement::Path { d, style } => {
            write!(out, r#"<path d="{d}""#).unwrap();
            write_style_attrs(out, style);
            out.push_str(" />\n");
        }
        SvgElement::Circle { cx, cy, r, style } => {
            write!(out, r#"<circle cx="{cx:.2}" cy="{cy:.2}" r="{r:.2}""#).unwrap();
            write_style_attrs(out, style);
            out.push_str(" />\n");
        }
        SvgElement::Group { clip_id, children } => {
            writeln!(out, r#"<g clip-path="url(#{clip_id})">"#).unwrap();
            for child in children {
                render_element(out, child);
            }
            out.push_str("</g>\n");
        }
    }
}

fn write_style_attrs(out: &mut String, style: &Style) {
    match (&style.pattern, &style.fill) {
        (Some(id), _) => write!(out, r#" fill="url(#{id})""#).unwrap(),
        (None, Some(fill)) => write!(out, r#" fill="{}""#, fill.to_svg_fill()).unwrap(),
        (None, None) => out.push_str(r#" fill="none""#),
    }
    if let Some(stroke) = &style.stroke {
        write!(out, r#" stroke="{}""#, stroke.to_svg_fill()).unwrap();
        write!(out, r#" stroke-width="{:.2}""#, style.stroke_width).unwrap();
    }
    if (style.opacity - 1.0).abs() > 1e-4 {
        write!(out, r#" opacity="{:.3}""#, style.opacity).unwrap();
    }
}

fn write_line_attrs(out: &mut String, style: &LineStyle) {
    write!(out, r#" stroke="{}""#, style.color.to_svg_fill()).unwrap();
    write!(out, r#" stroke-width="{:.2}""#, style.width).unwrap();
    if let Some(dash) = &style.dash {
        write!(out, r#" stroke-dasharray="{dash}""#).unwrap();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_canvas() {
        let svg = Canvas::new(100.0, 50.0).finish_svg();
        assert!(svg.contains("width=\"100\""));
        assert!(svg.contains("height=\"50\""));
        assert!(svg.contains("</svg>"));
        assert!(!svg.contains("<defs>"));
    }

    #[test]
    fn rect_and_text() {
        let mut c = Canvas::new(200.0, 100.0);
        c.rect(10.0, 20.0, 50.0, 30.0, &Style::filled(Color::hex("#ff0000")));
        c.text(10.0, 20.0, "D<sup>0</sup> & D_s", &TextStyle::default());
        let svg = c.finish_svg();
        assert!(svg.contains(r##"fill="#ff0000""##));
        assert!(svg.contains("width=\"50.00\""));
        assert!(svg.contains("D&lt;sup&gt;0&lt;/sup&gt; &amp; D_s"));
        assert!(svg.contains("font-family=\"Helvetica"));
    }

    #[test]
    fn clip_groups_wrap_their_children() {
        let mut c = Canvas::new(100.0, 100.0);
        c.line(0.0, 0.0, 1.0, 1.0, &LineStyle::default());
        let id = c.push_clip(10.0, 10.0, 80.0, 80.0);
        c.circle(50.0, 50.0, 3.0, &Style::filled(Color::BLACK));
        c.pop_clip();
        let svg = c.finish_svg();
        let group = svg.find(&format!(r#"<g clip-path="url(#{id})">"#)).unwrap();
        let circle = svg.find("<circle").unwrap();
        let line = svg.find("<line").unwrap();
        assert!(line < group && group < circle);
        assert!(svg.contains(&format!(r#"<clipPath id="{id}">"#)));
    }

    #[test]
    fn hatch_patterns_are_shared() {
        let mut c = Canvas::new(100.0, 100.0);
        let red = Color::rgb(204, 0, 0);
        c.hatch_rect(0.0, 0.0, 10.0, 10.0, 3154, red);
        c.hatch_rect(20.0, 0.0, 10.0, 10.0, 3154, red);
        c.hatch_rect(40.0, 0.0, 10.0, 10.0, 3209, red);
        c.hatch_rect(60.0, 0.0, 10.0, 10.0, 1001, red);
        let svg = c.finish_svg();
        // 140°, 0° and 90°
        assert_eq!(svg.matches("<pattern ").count(), 3);
        assert_eq!(svg.matches(r##"fill="url(#hatch0)""##).count(), 2);
        assert!(svg.contains(r##"fill="#cc0000""##));
    }

    #[test]
    fn marker_shapes() {
        let mut c = Canvas::new(100.0, 100.0);
        c.marker(10.0, 10.0, &MarkerStyle::root(21, Color::BLACK, 3.0));
        c.marker(20.0, 10.0, &MarkerStyle::root(33, Color::BLACK, 3.0));
        c.marker(30.0, 10.0, &MarkerStyle::root(24, Color::BLACK, 3.0));
        let svg = c.finish_svg();
        assert!(svg.contains("<rect x=\"7.00\" y=\"7.00\" width=\"6.00\""));
        assert!(svg.contains("<polygon"));
        assert!(svg.contains(r#"<circle cx="30.00" cy="10.00" r="3.00" fill="none""#));
    }
}
