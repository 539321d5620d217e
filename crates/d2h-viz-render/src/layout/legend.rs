use crate::canvas::Canvas;
use crate::color::Color;
use crate::layout::margins::PlotArea;
use crate::primitives::*;

pub struct LegendEntry {
    pub label: String,
    pub color: Color,
    pub kind: LegendKind,
}

impl LegendEntry {
    pub fn new(label: impl Into<String>, color: Color, kind: LegendKind) -> Self {
        Self { label: label.into(), color, kind }
    }
}

pub enum LegendKind {
    /// Data point with error bar (ROOT option `p`).
    Marker(MarkerShape),
    /// Line, optionally dashed (`l`).
    Line(Option<String>),
    FilledRect,
    /// Rectangle in a ROOT hatch style (`f`).
    HatchedRect(u16),
    /// Outline only, for systematic boxes.
    OpenRect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegendCorner {
    TopLeft,
    TopRight,
    BottomRight,
}

/// Placement of a legend block inside the plot area.
#[derive(Debug, Clone, Copy)]
pub struct LegendLayout {
    pub corner: LegendCorner,
    pub columns: usize,
    /// Vertical shift away from the corner, to stack legends.
    pub offset: f64,
    pub frame: bool,
}

impl LegendLayout {
    pub fn top_right(columns: usize) -> Self {
        Self { corner: LegendCorner::TopRight, columns, offset: 0.0, frame: false }
    }

    pub fn with_offset(mut self, offset: f64) -> Self {
        self.offset = offset;
        self
    }
}

/// Draw a legend in the plot area, filling rows first.
///
/// Returns the height of the drawn block (0 when there is nothing to draw).
pub fn draw_legend(
    canvas: &mut Canvas,
    area: &PlotArea,
    entries: &[LegendEntry],
    font_size: f64,
    layout: LegendLayout,
) -> f64 {
    if entries.is_empty() {
        return 0.0;
    }

    let columns = layout.columns.clamp(1, entries.len());
    let rows = entries.len().div_ceil(columns);
    let row_height = font_size + 5.0;
    let swatch_w = 16.0;
    let swatch_h = font_size - 2.0;
    let gap = 6.0;
    let padding = 6.0;

    let text_style = TextStyle {
        size: font_size * 0.9,
        baseline: TextBaseline::Central,
        ..Default::default()
    };

    let max_w = entries
        .iter()
        .map(|e| canvas.measure_text(&e.label, &text_style).width)
        .fold(0.0_f64, f64::max);
    let column_w = swatch_w + gap + max_w + 2.0 * gap;

    let legend_w = padding + columns as f64 * column_w;
    let legend_h = 2.0 * padding + rows as f64 * row_height;

    let lx = match layout.corner {
        LegendCorner::TopLeft => area.left + 8.0,
        LegendCorner::TopRight | LegendCorner::BottomRight => area.right() - legend_w - 8.0,
    };
    let ly = match layout.corner {
        LegendCorner::BottomRight => area.bottom() - legend_h - 8.0 - layout.offset,
        _ => area.top + 8.0 + layout.offset,
    };

    if layout.frame {
        let bg_style = Style {
            fill: Some(Color::WHITE),
            stroke: Some(Color::BLACK),
            stroke_width: 0.5,
            ..Default::default()
        };
        canvas.rect(lx, ly, legend_w, legend_h, &bg_style);
    }

    for (i, entry) in entries.iter().enumerate() {
        let (row, col) = (i / columns, i % columns);
        let ey = ly + padding + row as f64 * row_height + row_height / 2.0;
        let sx = lx + padding + col as f64 * column_w;
        let (top, mid) = (ey - swatch_h / 2.0, sx + swatch_w / 2.0);

        match &entry.kind {
            LegendKind::Marker(shape) => {
                let bar = LineStyle::solid(entry.color, 1.0);
                canvas.line(mid, top, mid, top + swatch_h, &bar);
                let marker =
                    MarkerStyle { shape: *shape, size: 3.0, color: entry.color, fill: true };
                canvas.marker(mid, ey, &marker);
            }
            LegendKind::Line(dash) => {
                let ls = LineStyle { color: entry.color, width: 1.5, dash: dash.clone() };
                canvas.line(sx, ey, sx + swatch_w, ey, &ls);
            }
            LegendKind::FilledRect => {
                canvas.rect(sx, top, swatch_w, swatch_h, &Style::filled(entry.color));
            }
            LegendKind::HatchedRect(fill_style) => {
                canvas.hatch_rect(sx, top, swatch_w, swatch_h, *fill_style, entry.color);
                canvas.rect(sx, top, swatch_w, swatch_h, &Style::stroked(entry.color, 0.8));
            }
            LegendKind::OpenRect => {
                canvas.rect(sx, top, swatch_w, swatch_h, &Style::stroked(entry.color, 1.0));
            }
        }

        canvas.text(sx + swatch_w + gap, ey, &entry.label, &text_style);
    }
    legend_h
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area() -> PlotArea {
        PlotArea::manual(50.0, 20.0, 400.0, 300.0)
    }

    #[test]
    fn columns_reduce_height() {
        let entries: Vec<LegendEntry> = (0..6)
            .map(|i| LegendEntry::new(format!("s{i}"), Color::BLACK, LegendKind::Marker(MarkerShape::Circle)))
            .collect();
        let mut c = Canvas::new(500.0, 400.0);
        let one = draw_legend(&mut c, &area(), &entries, 12.0, LegendLayout::top_right(1));
        let two = draw_legend(&mut c, &area(), &entries, 12.0, LegendLayout::top_right(2));
        assert!(two < one);
        assert_eq!(draw_legend(&mut c, &area(), &[], 12.0, LegendLayout::top_right(2)), 0.0);
    }

    #[test]
    fn hatched_entries_define_patterns() {
        let entries = vec![
            LegendEntry::new("Prompt", Color::rgb(204, 0, 0), LegendKind::HatchedRect(3154)),
            LegendEntry::new("Total", Color::rgb(0, 153, 0), LegendKind::Line(None)),
        ];
        let mut c = Canvas::new(500.0, 400.0);
        draw_legend(&mut c, &area(), &entries, 12.0, LegendLayout::top_right(1));
        let svg = c.finish_svg();
        assert!(svg.contains("<pattern "));
        assert!(svg.contains(">Prompt</text>"));
    }
}
