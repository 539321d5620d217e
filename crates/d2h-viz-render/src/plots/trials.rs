use d2h_viz::plain_label;
use d2h_viz::trials::{Chi2Artifact, TrialDistributionArtifact, TrialsArtifact};

use crate::canvas::Canvas;
use crate::config::VizConfig;
use crate::layout::axes::Axis;
use crate::plots::{Frame, draw_text_box};
use crate::primitives::*;

/// Yield of every trial with the central value as a dashed line and band.
pub fn render_yields(art: &TrialsArtifact, config: &VizConfig) -> crate::Result<String> {
    let mut canvas = Canvas::new(config.figure.width, config.figure.height);
    let x_axis = Axis::ranged(art.x_range[0], art.x_range[1], 10).with_label(plain_label(&art.x_label));
    let y_axis =
        Axis::ranged(art.y_range[0], art.y_range[1], 6).with_label(plain_label(&art.y_label));
    let frame = Frame::new(&canvas, x_axis, y_axis, config);
    let colors = &config.colors;
    let (left, right) = (frame.area.left, frame.area.right());

    frame.clip(&mut canvas);

    let band_top = frame.py(art.central_yield + art.central_error);
    let band_bottom = frame.py(art.central_yield - art.central_error);
    canvas.rect(
        left,
        band_top,
        right - left,
        band_bottom - band_top,
        &Style { fill: Some(colors.central.with_alpha(0.3)), ..Default::default() },
    );
    let central_y = frame.py(art.central_yield);
    canvas.line(left, central_y, right, central_y, &LineStyle::dashed(colors.central, 1.2));

    let central_x = frame.px(art.central_index as f64);
    let (top, bottom) = (frame.area.top, frame.area.bottom());
    canvas.line(central_x, top, central_x, bottom, &LineStyle::dashed(colors.central_trial, 1.2));

    let marker = MarkerStyle::root(20, colors.trials, 2.5);
    for (i, (&y, &e)) in art.yields.iter().zip(&art.errors).enumerate() {
        frame.point(&mut canvas, i as f64, y, (0.0, 0.0), (e, e), &marker);
    }

    canvas.pop_clip();
    frame.draw_axes(&mut canvas, config);
    draw_text_box(&mut canvas, &frame.area, &[plain_label(&art.label)], config.font.size);

    Ok(canvas.finish_svg())
}

/// Histogram of yield ratios to the central trial, with summary statistics.
pub fn render_distribution(
    art: &TrialDistributionArtifact,
    config: &VizConfig,
) -> crate::Result<String> {
    if art.bin_edges.len() != art.counts.len() + 1 {
        return Err(crate::RenderError::Layout(format!(
            "trial distribution: {} edges for {} bins",
            art.bin_edges.len(),
            art.counts.len()
        )));
    }
    let mut canvas = Canvas::new(config.figure.width, config.figure.height);
    let (x_lo, x_hi) = match (art.bin_edges.first(), art.bin_edges.last()) {
        (Some(&lo), Some(&hi)) if hi > lo => (lo, hi),
        _ => (0.0, 2.0),
    };
    let max_count = art.counts.iter().copied().fold(0.0_f64, f64::max);
    let x_axis = Axis::ranged(x_lo, x_hi, 6).with_label("Yield / central yield");
    let y_axis = Axis::ranged(0.0, (1.2 * max_count).max(1.0), 6).with_label("Trials");
    let frame = Frame::new(&canvas, x_axis, y_axis, config);
    let color = config.colors.distribution;

    frame.clip(&mut canvas);
    let bar_style = Style {
        fill: Some(color.with_alpha(0.7)),
        stroke: Some(color),
        stroke_width: 0.6,
        ..Default::default()
    };
    let base = frame.py(0.0);
    for (w, &count) in art.bin_edges.windows(2).zip(&art.counts) {
        if count <= 0.0 {
            continue;
        }
        let (x0, x1, top) = (frame.px(w[0]), frame.px(w[1]), frame.py(count));
        canvas.rect(x0, top, x1 - x0, base - top, &bar_style);
    }
    canvas.pop_clip();

    frame.draw_axes(&mut canvas, config);
    draw_text_box(&mut canvas, &frame.area, &art.text, config.font.size);

    Ok(canvas.finish_svg())
}

/// χ²/ndf of every trial.
pub fn render_chi2(art: &Chi2Artifact, config: &VizConfig) -> crate::Result<String> {
    let mut canvas = Canvas::new(config.figure.width, config.figure.height);
    let x_axis = Axis::ranged(art.x_range[0], art.x_range[1], 10).with_label(plain_label(&art.x_label));
    let y_axis = Axis::ranged(art.y_range[0], art.y_range[1], 6).with_label("\u{03C7}\u{00B2}/ndf");
    let frame = Frame::new(&canvas, x_axis, y_axis, config);

    frame.clip(&mut canvas);
    let marker = MarkerStyle::root(20, config.colors.trials, 2.5);
    for (i, &chi2) in art.chi2.iter().enumerate() {
        frame.point(&mut canvas, i as f64, chi2, (0.0, 0.0), (0.0, 0.0), &marker);
    }
    canvas.pop_clip();

    frame.draw_axes(&mut canvas, config);
    draw_text_box(&mut canvas, &frame.area, &[plain_label(&art.label)], config.font.size);

    Ok(canvas.finish_svg())
}
