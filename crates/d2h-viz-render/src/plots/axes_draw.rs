use crate::canvas::Canvas;
use crate::color::Color;
use crate::config::VizConfig;
use crate::layout::axes::Axis;
use crate::layout::margins::{PlotArea, y_tick_width};
use crate::primitives::*;

/// Which way a tick points from its axis line.
#[derive(Clone, Copy)]
struct Ticks {
    inward: bool,
    major: f64,
    minor: f64,
}

impl Ticks {
    /// End of a tick leaving the frame edge at `pos`; `sign` is +1 when the
    /// inside of the frame lies at larger coordinates.
    fn end(&self, pos: f64, sign: f64, len: f64) -> f64 {
        if self.inward { pos + sign * len } else { pos - sign * len }
    }
}

/// Draw a ROOT-style box frame: major and minor ticks on all requested
/// sides, optional grid, tick labels, and axis titles flush with the far end
/// of each axis.
pub fn draw_axes(
    canvas: &mut Canvas,
    area: &PlotArea,
    x_axis: &Axis,
    y_axis: &Axis,
    config: &VizConfig,
) {
    let black = Color::BLACK;
    let frame_style = LineStyle::solid(black, 0.8);
    let major_style = LineStyle::solid(black, 0.6);
    let minor_style = LineStyle::solid(black, 0.4);
    let grid_style = LineStyle {
        color: config.grid.color.with_alpha(config.grid.alpha),
        width: 0.5,
        dash: Some("3 3".into()),
    };
    let ticks = Ticks {
        inward: config.axes.tick_direction == "in",
        major: config.axes.tick_length,
        minor: config.axes.minor_tick_length,
    };
    let (left, right, top, bottom) = (area.left, area.right(), area.top, area.bottom());

    canvas.rect(left, top, area.width, area.height, &Style::stroked(black, frame_style.width));

    let x_label_style = TextStyle {
        size: config.font.tick_size,
        anchor: TextAnchor::Middle,
        baseline: TextBaseline::Hanging,
        ..Default::default()
    };
    let x_label_y = if ticks.inward { bottom + 4.0 } else { bottom + ticks.major + 4.0 };

    for (i, &val) in x_axis.tick_positions.iter().enumerate() {
        let px = x_axis.data_to_pixel(val, left, right);
        if px < left - 0.5 || px > right + 0.5 {
            continue;
        }
        if config.grid.show {
            canvas.line(px, top, px, bottom, &grid_style);
        }
        canvas.line(px, bottom, px, ticks.end(bottom, -1.0, ticks.major), &major_style);
        if config.axes.show_top_ticks {
            canvas.line(px, top, px, ticks.end(top, 1.0, ticks.major), &major_style);
        }
        if let Some(label) = x_axis.tick_labels.get(i).filter(|l| !l.is_empty()) {
            canvas.text(px, x_label_y, label, &x_label_style);
        }
    }
    for &val in &x_axis.minor_ticks {
        let px = x_axis.data_to_pixel(val, left, right);
        if px < left - 0.5 || px > right + 0.5 {
            continue;
        }
        canvas.line(px, bottom, px, ticks.end(bottom, -1.0, ticks.minor), &minor_style);
        if config.axes.show_top_ticks {
            canvas.line(px, top, px, ticks.end(top, 1.0, ticks.minor), &minor_style);
        }
    }

    let y_label_style = TextStyle {
        size: config.font.tick_size,
        anchor: TextAnchor::End,
        baseline: TextBaseline::Central,
        ..Default::default()
    };
    let y_label_x = if ticks.inward { left - 4.0 } else { left - ticks.major - 4.0 };

    for (i, &val) in y_axis.tick_positions.iter().enumerate() {
        let py = y_axis.data_to_pixel(val, bottom, top);
        if py < top - 0.5 || py > bottom + 0.5 {
            continue;
        }
        if config.grid.show {
            canvas.line(left, py, right, py, &grid_style);
        }
        canvas.line(left, py, ticks.end(left, 1.0, ticks.major), py, &major_style);
        if config.axes.show_right_ticks {
            canvas.line(right, py, ticks.end(right, -1.0, ticks.major), py, &major_style);
        }
        if let Some(label) = y_axis.tick_labels.get(i).filter(|l| !l.is_empty()) {
            canvas.text(y_label_x, py, label, &y_label_style);
        }
    }
    for &val in &y_axis.minor_ticks {
        let py = y_axis.data_to_pixel(val, bottom, top);
        if py < top - 0.5 || py > bottom + 0.5 {
            continue;
        }
        canvas.line(left, py, ticks.end(left, 1.0, ticks.minor), py, &minor_style);
        if config.axes.show_right_ticks {
            canvas.line(right, py, ticks.end(right, -1.0, ticks.minor), py, &minor_style);
        }
    }

    let title_style = TextStyle {
        size: config.font.label_size,
        anchor: TextAnchor::End,
        ..Default::default()
    };
    if !x_axis.label.is_empty() {
        let y = x_label_y + config.font.tick_size + config.font.label_size + 4.0;
        canvas.text(right, y, &x_axis.label, &title_style);
    }
    if !y_axis.label.is_empty() {
        let x = y_label_x - y_tick_width(canvas, y_axis, config) - 8.0;
        canvas.text_rotated(x, top, &y_axis.label, &title_style, -90.0);
    }
}
