pub mod comparison;
pub mod cutvar;
pub mod invmass;
pub mod trials;

mod axes_draw;

use crate::canvas::Canvas;
use crate::color::Color;
use crate::config::VizConfig;
use crate::layout::axes::Axis;
use crate::layout::margins::PlotArea;
use crate::primitives::*;

/// Plot area together with its axes.
pub(crate) struct Frame {
    pub area: PlotArea,
    pub x: Axis,
    pub y: Axis,
}

impl Frame {
    pub fn new(canvas: &Canvas, x: Axis, y: Axis, config: &VizConfig) -> Self {
        let area = PlotArea::auto(canvas, &y, &x, config);
        Self { area, x, y }
    }

    /// Frame inside one cell of a multi-panel canvas.
    pub fn in_cell(canvas: &Canvas, cell: PlotArea, x: Axis, y: Axis, config: &VizConfig) -> Self {
        let area = PlotArea::auto_in(cell, canvas, &y, &x, config);
        Self { area, x, y }
    }

    pub fn px(&self, v: f64) -> f64 {
        self.x.data_to_pixel(v, self.area.left, self.area.right())
    }

    pub fn py(&self, v: f64) -> f64 {
        self.y.data_to_pixel(v, self.area.bottom(), self.area.top)
    }

    pub fn clip(&self, canvas: &mut Canvas) {
        let a = &self.area;
        canvas.push_clip(a.left, a.top, a.width, a.height);
    }

    pub fn draw_axes(&self, canvas: &mut Canvas, config: &VizConfig) {
        axes_draw::draw_axes(canvas, &self.area, &self.x, &self.y, config);
    }

    /// Outline of a histogram drawn as steps, starting and ending at zero.
    pub fn step_points(&self, edges: &[f64], values: &[f64]) -> Vec<(f64, f64)> {
        let base = self.py(self.y.min.max(0.0));
        let mut points = Vec::with_capacity(2 * values.len() + 2);
        if let Some(&first) = edges.first() {
            points.push((self.px(first), base));
        }
        for (w, &v) in edges.windows(2).zip(values) {
            points.push((self.px(w[0]), self.py(v)));
            points.push((self.px(w[1]), self.py(v)));
        }
        if let Some(&last) = edges.get(values.len()) {
            points.push((self.px(last), base));
        }
        points
    }

    /// Point with asymmetric error bars. Non-finite points are not drawn.
    pub fn point(
        &self,
        canvas: &mut Canvas,
        x: f64,
        y: f64,
        ex: (f64, f64),
        ey: (f64, f64),
        marker: &MarkerStyle,
    ) {
        if !x.is_finite() || !y.is_finite() {
            return;
        }
        let bar = LineStyle::solid(marker.color, 1.0);
        let (cx, cy) = (self.px(x), self.py(y));
        if ey.0 > 0.0 || ey.1 > 0.0 {
            canvas.error_bar(cx, self.py(y - ey.0), self.py(y + ey.1), 0.0, &bar);
        }
        if ex.0 > 0.0 || ex.1 > 0.0 {
            canvas.error_bar_h(self.px(x - ex.0), self.px(x + ex.1), cy, 0.0, &bar);
        }
        canvas.marker(cx, cy, marker);
    }
}

/// Framed block of text lines in the top-right corner of the plot area.
pub(crate) fn draw_text_box(canvas: &mut Canvas, area: &PlotArea, lines: &[String], size: f64) {
    if lines.is_empty() {
        return;
    }
    let style = TextStyle { size, baseline: TextBaseline::Central, ..Default::default() };
    let width = lines.iter().map(|l| canvas.measure_text(l, &style).width).fold(0.0_f64, f64::max);
    let row = size * 1.4;
    let (w, h) = (width + 12.0, row * lines.len() as f64 + 8.0);
    let (x, y) = (area.right() - w - 8.0, area.top + 8.0);
    let frame = Style {
        fill: Some(Color::WHITE),
        stroke: Some(Color::rgb(150, 150, 150)),
        stroke_width: 0.6,
        ..Default::default()
    };
    canvas.rect(x, y, w, h, &frame);
    for (i, line) in lines.iter().enumerate() {
        canvas.text(x + 6.0, y + 4.0 + (i as f64 + 0.5) * row, line, &style);
    }
}
