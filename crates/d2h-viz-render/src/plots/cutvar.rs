use d2h_viz::cutvar::CutVarArtifact;
use d2h_viz::plain_label;

use crate::canvas::Canvas;
use crate::config::VizConfig;
use crate::header::draw_experiment_header;
use crate::layout::axes::Axis;
use crate::layout::legend::{LegendEntry, LegendKind, LegendLayout, draw_legend};
use crate::plots::Frame;
use crate::primitives::*;

/// Render a raw-yield-vs-cut artifact on a square canvas.
pub fn render(art: &CutVarArtifact, config: &VizConfig) -> crate::Result<String> {
    let n = art.bin_edges.len().saturating_sub(1);
    for (name, len) in [
        ("data_y", art.data_y.len()),
        ("data_err", art.data_err.len()),
        ("prompt_y", art.prompt_y.len()),
        ("non_prompt_y", art.non_prompt_y.len()),
        ("total_y", art.total_y.len()),
    ] {
        if len != n {
            return Err(crate::RenderError::Layout(format!(
                "cut-variation plot: {name} has {len} values for {n} bins"
            )));
        }
    }

    let side = config.figure.square;
    let mut canvas = Canvas::new(side, side);

    let x_axis = Axis::with_custom_labels(&art.bin_edges, &art.bin_labels)
        .with_label(plain_label(&art.x_label));
    let y_axis =
        Axis::ranged(art.y_range[0], art.y_range[1], 6).with_label(plain_label(&art.y_label));
    let frame = Frame::new(&canvas, x_axis, y_axis, config);
    let colors = &config.colors;

    frame.clip(&mut canvas);

    let components = [
        (&art.prompt_y, colors.prompt, colors.prompt_hatch),
        (&art.non_prompt_y, colors.non_prompt, colors.non_prompt_hatch),
    ];
    for (values, color, hatch) in components {
        let outline = frame.step_points(&art.bin_edges, values);
        canvas.hatch_polygon(&outline, hatch, color);
        canvas.polyline(&outline, &LineStyle::solid(color, 1.0));
    }

    let total = frame.step_points(&art.bin_edges, &art.total_y);
    canvas.polyline(&total, &LineStyle::solid(colors.total, 2.0));

    let marker = MarkerStyle::root(20, colors.data, 3.5);
    for i in 0..n {
        let centre = 0.5 * (art.bin_edges[i] + art.bin_edges[i + 1]);
        let err = art.data_err[i];
        frame.point(&mut canvas, centre, art.data_y[i], (0.0, 0.0), (err, err), &marker);
    }

    canvas.pop_clip();
    frame.draw_axes(&mut canvas, config);

    let annotations: Vec<String> = art.annotations.iter().map(|a| plain_label(a)).collect();
    let system = art.experiment_text.as_deref().map(plain_label);
    draw_experiment_header(&mut canvas, &frame.area, config, system.as_deref(), &annotations);

    let entries = [
        LegendEntry::new("Data", colors.data, LegendKind::Marker(MarkerShape::Circle)),
        LegendEntry::new("Prompt", colors.prompt, LegendKind::HatchedRect(colors.prompt_hatch)),
        LegendEntry::new(
            "Non-prompt",
            colors.non_prompt,
            LegendKind::HatchedRect(colors.non_prompt_hatch),
        ),
        LegendEntry::new("Total", colors.total, LegendKind::Line(None)),
    ];
    draw_legend(&mut canvas, &frame.area, &entries, config.font.size, LegendLayout::top_right(1));

    Ok(canvas.finish_svg())
}
