use crate::color::Color;
use crate::config::*;

/// Built-in theme presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinTheme {
    /// ROOT-like figures with the "ALICE Preliminary" header.
    Alice,
    /// No header, outward ticks.
    Minimal,
    /// Larger fonts and thicker ticks for slides.
    Print,
}

impl BuiltinTheme {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "minimal" => Self::Minimal,
            "print" => Self::Print,
            _ => Self::Alice,
        }
    }

    pub fn base_config(self) -> VizConfig {
        match self {
            Self::Alice => alice(),
            Self::Minimal => minimal(),
            Self::Print => print(),
        }
    }
}

fn alice() -> VizConfig {
    VizConfig {
        theme: "alice".into(),
        figure: FigureConfig::default(),
        font: FontConfig::default(),
        axes: AxesConfig::default(),
        grid: GridConfig::default(),
        experiment: ExperimentConfig::default(),
        colors: ColorsConfig::default(),
        palette: "root_compare".into(),
        model_palette: "root_models".into(),
        model_hatches: vec![3245, 3250, 3244, 3254, 3209],
        output: OutputConfig::default(),
    }
}

fn minimal() -> VizConfig {
    VizConfig {
        theme: "minimal".into(),
        font: FontConfig { size: 10.0, label_size: 11.0, tick_size: 9.0 },
        axes: AxesConfig {
            tick_direction: "out".into(),
            show_top_ticks: false,
            show_right_ticks: false,
            tick_length: 4.0,
            minor_tick_length: 2.0,
        },
        grid: GridConfig { show: true, color: Color::hex("#cbd5e1"), alpha: 0.55 },
        experiment: ExperimentConfig {
            name: String::new(),
            status: String::new(),
            system: String::new(),
        },
        palette: "tableau10".into(),
        ..alice()
    }
}

fn print() -> VizConfig {
    VizConfig {
        theme: "print".into(),
        font: FontConfig { size: 15.0, label_size: 16.0, tick_size: 14.0 },
        axes: AxesConfig { tick_length: 9.0, minor_tick_length: 5.0, ..AxesConfig::default() },
        output: OutputConfig { formats: vec!["pdf".into()], dpi: 300 },
        ..alice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_falls_back_to_alice() {
        assert_eq!(BuiltinTheme::parse("PRINT"), BuiltinTheme::Print);
        assert_eq!(BuiltinTheme::parse("minimal"), BuiltinTheme::Minimal);
        assert_eq!(BuiltinTheme::parse("atlas"), BuiltinTheme::Alice);
    }

    #[test]
    fn themes_share_the_alice_palettes() {
        let print = BuiltinTheme::Print.base_config();
        assert_eq!(print.palette, "root_compare");
        assert_eq!(print.experiment.name, "ALICE");
        assert_eq!(print.output.formats, vec!["pdf"]);
        assert_eq!(BuiltinTheme::Minimal.base_config().model_hatches.len(), 5);
    }
}
