use d2h_viz::invmass::{FitCurve, InvMassArtifact, InvMassPanel};
use d2h_viz::plain_label;

use crate::canvas::Canvas;
use crate::config::VizConfig;
use crate::header::draw_experiment_header;
use crate::layout::axes::Axis;
use crate::layout::legend::{LegendEntry, LegendKind, LegendLayout, draw_legend};
use crate::layout::margins::PlotArea;
use crate::layout::multi_panel::GridLayout;
use crate::plots::Frame;
use crate::primitives::*;

/// Grid cells are this fraction of the square figure side.
const GRID_CELL_SCALE: f64 = 0.75;

/// Render invariant-mass panels: one square figure for a single pT bin, a
/// grid otherwise.
pub fn render(art: &InvMassArtifact, config: &VizConfig) -> crate::Result<String> {
    if art.panels.is_empty() {
        return Err(crate::RenderError::Layout("invariant-mass plot without panels".into()));
    }
    for panel in &art.panels {
        check_panel(panel)?;
    }

    let side = if art.panels.len() == 1 {
        config.figure.square
    } else {
        config.figure.square * GRID_CELL_SCALE
    };
    let grid = GridLayout::new(art.panels.len(), art.columns, side, side);
    let mut canvas = Canvas::new(grid.width, grid.height);
    let system = art.experiment_text.as_deref().map(plain_label);

    for (panel, cell) in art.panels.iter().zip(&grid.cells) {
        draw_panel(&mut canvas, *cell, panel, system.as_deref(), config);
    }
    Ok(canvas.finish_svg())
}

fn check_panel(panel: &InvMassPanel) -> crate::Result<()> {
    let n = panel.bin_edges.len().saturating_sub(1);
    if panel.content.len() != n || panel.errors.len() != n {
        return Err(crate::RenderError::Layout(format!(
            "mass panel {}-{}: {} values and {} errors for {} bins",
            panel.pt_min,
            panel.pt_max,
            panel.content.len(),
            panel.errors.len(),
            n
        )));
    }
    for curve in panel.total.iter().chain(&panel.background) {
        if curve.x.len() != curve.y.len() {
            return Err(crate::RenderError::Layout(format!(
                "fit curve '{}' has {} x and {} y values",
                curve.label,
                curve.x.len(),
                curve.y.len()
            )));
        }
    }
    Ok(())
}

fn curve_points(frame: &Frame, curve: &FitCurve) -> Vec<(f64, f64)> {
    curve
        .x
        .iter()
        .zip(&curve.y)
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .map(|(&x, &y)| (frame.px(x), frame.py(y)))
        .collect()
}

fn draw_panel(
    canvas: &mut Canvas,
    cell: PlotArea,
    panel: &InvMassPanel,
    system: Option<&str>,
    config: &VizConfig,
) {
    let x_axis = Axis::ranged(panel.x_range[0], panel.x_range[1], 5).with_label(plain_label(&panel.x_label));
    let y_axis =
        Axis::ranged(panel.y_range[0], panel.y_range[1], 6).with_label(plain_label(&panel.y_label));
    let frame = Frame::in_cell(canvas, cell, x_axis, y_axis, config);
    let colors = &config.colors;

    frame.clip(canvas);
    if let Some(bkg) = &panel.background {
        canvas.polyline(&curve_points(&frame, bkg), &LineStyle::dashed(colors.fit_background, 2.0));
    }
    if let Some(total) = &panel.total {
        canvas.polyline(&curve_points(&frame, total), &LineStyle::solid(colors.fit_total, 2.0));
    }
    let marker = MarkerStyle::root(20, colors.data, 3.0);
    for (i, w) in panel.bin_edges.windows(2).enumerate() {
        let (centre, half) = (0.5 * (w[0] + w[1]), 0.5 * (w[1] - w[0]));
        let err = panel.errors[i];
        frame.point(canvas, centre, panel.content[i], (half, half), (err, err), &marker);
    }
    canvas.pop_clip();
    frame.draw_axes(canvas, config);

    let lines: Vec<String> = panel.text.iter().map(|t| plain_label(t)).collect();
    draw_experiment_header(canvas, &frame.area, config, system, &lines);

    let mut entries = Vec::new();
    if let Some(total) = &panel.total {
        entries.push(LegendEntry::new(plain_label(&total.label), colors.fit_total, LegendKind::Line(None)));
    }
    if let Some(bkg) = &panel.background {
        entries.push(LegendEntry::new(
            plain_label(&bkg.label),
            colors.fit_background,
            LegendKind::Line(Some("6 3".into())),
        ));
    }
    draw_legend(canvas, &frame.area, &entries, config.font.size, LegendLayout::top_right(1));
}

#[cfg(test)]
mod tests {
    use super::*;
    use d2h_core::{BinnedSeries, ErrorGraph};
    use d2h_viz::invmass::{FitSummary, InvMassStyle};

    fn panel(pt: [f64; 2], with_fit: bool) -> InvMassPanel {
        let edges: Vec<f64> = (0..=10).map(|i| 2.20 + 0.01 * i as f64).collect();
        let content = vec![20.0, 22.0, 25.0, 40.0, 90.0, 85.0, 38.0, 24.0, 21.0, 19.0];
        let errors = content.iter().map(|c: &f64| c.sqrt()).collect();
        let mass = BinnedSeries::from_parts("hmass", edges, content, errors).unwrap();
        let curves = if with_fit {
            let x: Vec<f64> = (0..=20).map(|i| 2.20 + 0.005 * i as f64).collect();
            let total = ErrorGraph::symmetric("t", x.clone(), vec![30.0; 21], vec![0.0; 21], vec![0.0; 21]).unwrap();
            let bkg = ErrorGraph::symmetric("b", x, vec![20.0; 21], vec![0.0; 21], vec![0.0; 21]).unwrap();
            (
                Some(FitCurve::from_graph("Total fit function", &total)),
                Some(FitCurve::from_graph("Combinatorial background", &bkg)),
            )
        } else {
            (None, None)
        };
        let style = InvMassStyle {
            x_label: "#it{M}(pK#pi) (GeV/#it{c}^{2})".into(),
            mass_range: [2.2, 2.3],
            ..Default::default()
        };
        let summary = FitSummary { mean: Some((2.2865, 0.001)), sigma: Some(0.007), raw_yield: Some((250.0, 20.0)) };
        InvMassPanel::build(&mass, pt, summary, curves, style).unwrap()
    }

    #[test]
    fn single_panel_is_square_with_fit_legend() {
        let mut config = VizConfig::default();
        config.figure.square = 500.0;
        let art = InvMassArtifact::new(vec![panel([4.0, 5.0], true)], 3, None).unwrap();
        let svg = render(&art, &config).unwrap();
        assert!(svg.starts_with(r#"<svg xmlns="http://www.w3.org/2000/svg" width="500" height="500""#));
        assert!(svg.contains(">Total fit function</text>"));
        assert!(svg.contains(">Combinatorial background</text>"));
        assert!(svg.contains(">4 &lt; p_T &lt; 5 GeV/c</text>"));
        assert!(svg.contains("\u{03C3} = 7 MeV/c^2"));
    }

    #[test]
    fn grid_rows_follow_columns() {
        let mut config = VizConfig::default();
        config.figure.square = 400.0;
        let panels = vec![panel([1.0, 2.0], false), panel([2.0, 3.0], false), panel([3.0, 4.0], false)];
        let art = InvMassArtifact::new(panels, 2, None).unwrap();
        let svg = render(&art, &config).unwrap();
        assert!(svg.starts_with(r#"<svg xmlns="http://www.w3.org/2000/svg" width="600" height="600""#));
        assert!(svg.contains(">3 &lt; p_T &lt; 4 GeV/c</text>"));
        assert!(!svg.contains("Total fit function"));
    }

    #[test]
    fn mismatched_panel_arrays_are_rejected() {
        let mut p = panel([4.0, 5.0], true);
        p.errors.pop();
        let art = InvMassArtifact::new(vec![p], 1, None).unwrap();
        assert!(matches!(render(&art, &VizConfig::default()), Err(crate::RenderError::Layout(_))));

        let mut p = panel([4.0, 5.0], true);
        if let Some(total) = p.total.as_mut() {
            total.y.pop();
        }
        let art = InvMassArtifact::new(vec![p], 1, None).unwrap();
        assert!(matches!(render(&art, &VizConfig::default()), Err(crate::RenderError::Layout(_))));
    }
}
