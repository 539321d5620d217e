use d2h_viz::comparison::ComparisonArtifact;
use d2h_viz::plain_label;

use crate::canvas::Canvas;
use crate::color::{Color, palette_color, palette_colors};
use crate::config::VizConfig;
use crate::header::draw_experiment_header;
use crate::layout::axes::Axis;
use crate::layout::legend::{LegendEntry, LegendKind, LegendLayout, draw_legend};
use crate::plots::Frame;
use crate::primitives::*;

/// Horizontal data extent of every series and model.
fn x_extent(art: &ComparisonArtifact) -> [f64; 2] {
    if let Some(r) = art.x_range {
        return r;
    }
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for s in &art.series {
        for i in 0..s.x.len() {
            lo = lo.min(s.x[i] - s.ex_low.get(i).copied().unwrap_or(0.0));
            hi = hi.max(s.x[i] + s.ex_high.get(i).copied().unwrap_or(0.0));
        }
    }
    for m in &art.models {
        for &x in &m.x {
            lo = lo.min(x);
            hi = hi.max(x);
        }
    }
    if lo.is_finite() && hi > lo { [lo, hi] } else { [0.0, 1.0] }
}

/// Render a comparison (or ratio) artifact to an SVG string.
pub fn render(art: &ComparisonArtifact, config: &VizConfig) -> crate::Result<String> {
    let mut canvas = Canvas::new(config.figure.width, config.figure.height);

    let [x_lo, x_hi] = x_extent(art);
    let x_axis = Axis::ranged(x_lo, x_hi, 8).with_label(plain_label(&art.x_label));
    let y_axis =
        Axis::ranged(art.y_range[0], art.y_range[1], 6).with_label(plain_label(&art.y_label));
    let frame = Frame::new(&canvas, x_axis, y_axis, config);

    let palette = match &art.palette {
        Some(name) => palette_colors(name),
        None => config.palette_colors(),
    };
    let model_colors = config.model_colors();

    frame.clip(&mut canvas);

    for model in &art.models {
        let color = palette_color(&model_colors, model.index);
        let n = model.x.len().min(model.y.len()).min(model.y_err.len());
        let mut band: Vec<(f64, f64)> =
            (0..n).map(|i| (frame.px(model.x[i]), frame.py(model.y[i] + model.y_err[i]))).collect();
        band.extend(
            (0..n).rev().map(|i| (frame.px(model.x[i]), frame.py(model.y[i] - model.y_err[i]))),
        );
        canvas.hatch_polygon(&band, config.model_hatch(model.index), color);
        canvas.polygon(&band, &Style::stroked(color, 0.8));
    }

    let mut series_colors = Vec::with_capacity(art.series.len());
    for (i, s) in art.series.iter().enumerate() {
        let color = s
            .color
            .as_deref()
            .and_then(Color::try_hex)
            .unwrap_or_else(|| palette_color(&palette, s.color_index.unwrap_or(i)));
        series_colors.push(color);

        let box_style = Style::stroked(color, 1.0);
        for b in &s.syst {
            let (x0, x1) = (frame.px(b.x - b.half_width), frame.px(b.x + b.half_width));
            let (y0, y1) = (frame.py(b.y + b.half_height), frame.py(b.y - b.half_height));
            canvas.rect(x0, y0, x1 - x0, y1 - y0, &box_style);
        }

        let marker = MarkerStyle::root(20, color, 3.0);
        for p in 0..s.x.len().min(s.y.len()) {
            let ex = (s.ex_low.get(p).copied().unwrap_or(0.0), s.ex_high.get(p).copied().unwrap_or(0.0));
            let ey = (s.ey_low.get(p).copied().unwrap_or(0.0), s.ey_high.get(p).copied().unwrap_or(0.0));
            frame.point(&mut canvas, s.x[p], s.y[p], ex, ey, &marker);
        }
    }

    if let Some(y) = art.reference_line {
        let py = frame.py(y);
        let style = LineStyle::dashed(Color::rgb(100, 100, 100), 0.8);
        canvas.line(frame.area.left, py, frame.area.right(), py, &style);
    }

    canvas.pop_clip();
    frame.draw_axes(&mut canvas, config);

    let annotations: Vec<String> = art.annotations.iter().map(|a| plain_label(a)).collect();
    if art.experiment_text.is_some() || !annotations.is_empty() {
        let system = art.experiment_text.as_deref().map(plain_label);
        draw_experiment_header(&mut canvas, &frame.area, config, system.as_deref(), &annotations);
    }

    let series_entries: Vec<LegendEntry> = art
        .series
        .iter()
        .zip(&series_colors)
        .filter(|(s, _)| !s.label.is_empty())
        .map(|(s, &c)| {
            LegendEntry::new(plain_label(&s.label), c, LegendKind::Marker(MarkerShape::Circle))
        })
        .collect();
    let used = draw_legend(
        &mut canvas,
        &frame.area,
        &series_entries,
        config.font.size,
        LegendLayout::top_right(art.legend_columns),
    );

    let model_entries: Vec<LegendEntry> = art
        .models
        .iter()
        .map(|m| {
            LegendEntry::new(
                plain_label(&m.label),
                palette_color(&model_colors, m.index),
                LegendKind::HatchedRect(config.model_hatch(m.index)),
            )
        })
        .collect();
    draw_legend(
        &mut canvas,
        &frame.area,
        &model_entries,
        config.font.size,
        LegendLayout::top_right(art.model_legend_columns).with_offset(used + 4.0),
    );

    Ok(canvas.finish_svg())
}

#[cfg(test)]
mod tests {
    use super::*;
    use d2h_core::BinnedSeries;
    use d2h_core::syst::syst_boxes;
    use d2h_viz::comparison::{ComparisonBuilder, PointSeries, ratio_artifact};

    fn series(name: &str, content: &[f64]) -> BinnedSeries {
        let edges: Vec<f64> = (0..=content.len()).map(|i| 2.0 * i as f64).collect();
        let errors = content.iter().map(|c| 0.1 * c).collect();
        BinnedSeries::from_parts(name, edges, content.to_vec(), errors).unwrap()
    }

    #[test]
    fn renders_points_boxes_and_models() {
        let data = series("default", &[0.10, 0.12, 0.08]);
        let model = series("FONLL", &[0.09, 0.11, 0.10]);
        let boxes = syst_boxes(&data, &[vec![0.05], vec![0.05], vec![0.05]]).unwrap();
        let mut builder = ComparisonBuilder::new("#it{p}_{T} (GeV/#it{c})", "f_{non-prompt}")
            .experiment_text("pp, #sqrt{#it{s}} = 13.6 TeV");
        builder.push(PointSeries::from_series("Default", &data).with_syst(boxes));
        builder.push_model("FONLL", &model);
        builder.annotate("D^{0} #rightarrow K#pi");
        let art = builder.build().unwrap();

        let svg = render(&art, &VizConfig::default()).unwrap();
        assert!(svg.contains(">p_T (GeV/c)</text>"));
        assert!(svg.contains(">ALICE</text>"));
        assert!(svg.contains(">Default</text>"));
        assert!(svg.contains(">FONLL</text>"));
        assert!(svg.contains("<pattern "));
        assert!(svg.contains("clip-path=\"url(#clip0)\""));
        // three markers in the plot, one in the legend
        assert_eq!(svg.matches("<circle").count(), 4);
    }

    #[test]
    fn ratio_plot_has_reference_line() {
        let entries = vec![
            ("default".to_string(), series("d", &[1.0, 2.0])),
            ("tight".to_string(), series("t", &[1.1, 1.8])),
        ];
        let (art, _) = ratio_artifact("default", &entries, "p_T").unwrap();
        let svg = render(&art, &VizConfig::default()).unwrap();
        assert!(svg.contains("stroke-dasharray=\"6 3\""));
        assert!(svg.contains(">Ratio</text>"));
        assert!(svg.contains(">tight</text>"));
        assert!(!svg.contains(">ALICE</text>"));
    }
}
