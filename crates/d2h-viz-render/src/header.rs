use crate::canvas::Canvas;
use crate::color::Color;
use crate::config::VizConfig;
use crate::layout::margins::PlotArea;
use crate::primitives::*;

/// Draw the experiment header (**ALICE** Preliminary) in the top-left corner
/// of the frame, followed by the system line and any extra lines.
///
/// Returns the y coordinate below the last line drawn.
pub fn draw_experiment_header(
    canvas: &mut Canvas,
    area: &PlotArea,
    config: &VizConfig,
    system: Option<&str>,
    extra_lines: &[String],
) -> f64 {
    let size = config.font.label_size;
    let x = area.left + 12.0;
    let mut y = area.top + 8.0 + size;

    if !config.experiment.name.is_empty() {
        let bold_style = TextStyle {
            size: size * 1.1,
            color: Color::BLACK,
            weight: FontWeight::Bold,
            ..Default::default()
        };
        canvas.text(x, y, &config.experiment.name, &bold_style);
        let name_w = canvas.measure_text(&config.experiment.name, &bold_style).width;

        if !config.experiment.status.is_empty() {
            let status_style = TextStyle { size: size * 1.1, ..Default::default() };
            canvas.text(x + name_w + 5.0, y, &config.experiment.status, &status_style);
        }
        y += size * 1.5;
    }

    let line_style = TextStyle { size, ..Default::default() };
    let system = system.filter(|s| !s.is_empty()).or_else(|| {
        Some(config.experiment.system.as_str()).filter(|s| !s.is_empty())
    });
    for line in system.into_iter().chain(extra_lines.iter().map(String::as_str)) {
        canvas.text(x, y, line, &line_style);
        y += size * 1.4;
    }
    y
}
