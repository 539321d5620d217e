use crate::canvas::Canvas;
use crate::config::VizConfig;
use crate::layout::axes::Axis;
use crate::primitives::TextStyle;

/// Rectangular plot area within the canvas.
#[derive(Debug, Clone, Copy)]
pub struct PlotArea {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl PlotArea {
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Compute margins from the axis labels; the header sits inside the frame.
    pub fn auto(canvas: &Canvas, y_axis: &Axis, x_axis: &Axis, config: &VizConfig) -> Self {
        let outer = Self::manual(0.0, 0.0, canvas.width, canvas.height);
        Self::auto_in(outer, canvas, y_axis, x_axis, config)
    }

    /// Like [`PlotArea::auto`], inside one cell of a larger canvas.
    pub fn auto_in(
        outer: PlotArea,
        canvas: &Canvas,
        y_axis: &Axis,
        x_axis: &Axis,
        config: &VizConfig,
    ) -> Self {
        let tick_style = TextStyle { size: config.font.tick_size, ..Default::default() };

        let mut left = 15.0;
        left += y_tick_width(canvas, y_axis, config) + 8.0;
        if !y_axis.label.is_empty() {
            left += config.font.label_size + 8.0;
        }

        let mut bottom = 15.0 + tick_style.size + 6.0;
        if !x_axis.label.is_empty() {
            bottom += config.font.label_size + 8.0;
        }

        let top = 15.0;
        let right = 20.0;

        let width = outer.width - left - right;
        let height = outer.height - top - bottom;

        Self {
            left: outer.left + left,
            top: outer.top + top,
            width: width.max(50.0),
            height: height.max(50.0),
        }
    }

    pub fn manual(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self { left, top, width, height }
    }
}

/// Widest y tick label.
pub fn y_tick_width(canvas: &Canvas, y_axis: &Axis, config: &VizConfig) -> f64 {
    let tick_style = TextStyle { size: config.font.tick_size, ..Default::default() };
    y_axis
        .tick_labels
        .iter()
        .map(|l| canvas.measure_text(l, &tick_style).width)
        .fold(0.0_f64, f64::max)
}
