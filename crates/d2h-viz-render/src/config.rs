use serde::{Deserialize, Serialize};
use serde_yaml_ng::Value;

use crate::color::Color;
use crate::theme::BuiltinTheme;

/// Top-level visualization configuration (YAML or programmatic).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VizConfig {
    pub theme: String,
    pub figure: FigureConfig,
    pub font: FontConfig,
    pub axes: AxesConfig,
    pub grid: GridConfig,
    pub experiment: ExperimentConfig,
    pub colors: ColorsConfig,
    /// Series palette, used when an artifact does not name one.
    pub palette: String,
    /// Palette of model bands.
    pub model_palette: String,
    /// ROOT fill styles of model bands, cycled by model index.
    pub model_hatches: Vec<u16>,
    pub output: OutputConfig,
}

impl Default for VizConfig {
    fn default() -> Self {
        BuiltinTheme::Alice.base_config()
    }
}

impl VizConfig {
    pub fn palette_colors(&self) -> Vec<Color> {
        crate::color::palette_colors(&self.palette)
    }

    pub fn model_colors(&self) -> Vec<Color> {
        crate::color::palette_colors(&self.model_palette)
    }

    /// Fill style of model band `index`.
    pub fn model_hatch(&self, index: usize) -> u16 {
        if self.model_hatches.is_empty() {
            1001
        } else {
            self.model_hatches[index % self.model_hatches.len()]
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FigureConfig {
    pub width: f64,
    pub height: f64,
    /// Side of square figures (cut-variation plots).
    pub square: f64,
}

impl Default for FigureConfig {
    fn default() -> Self {
        Self {
            width: 648.0,  // 9" * 72
            height: 432.0, // 6" * 72
            square: 540.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    pub size: f64,
    pub label_size: f64,
    pub tick_size: f64,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self { size: 12.0, label_size: 13.0, tick_size: 11.0 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AxesConfig {
    pub tick_direction: String,
    pub show_top_ticks: bool,
    pub show_right_ticks: bool,
    pub tick_length: f64,
    pub minor_tick_length: f64,
}

impl Default for AxesConfig {
    fn default() -> Self {
        Self {
            tick_direction: "in".into(),
            show_top_ticks: true,
            show_right_ticks: true,
            tick_length: 7.0,
            minor_tick_length: 4.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub show: bool,
    pub color: Color,
    pub alpha: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self { show: false, color: Color::hex("#cccccc"), alpha: 0.6 }
    }
}

/// Header drawn in the top-left corner of the frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub name: String,
    pub status: String,
    /// Collision system line, used when the artifact does not carry one.
    pub system: String,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            name: "ALICE".into(),
            status: "Preliminary".into(),
            system: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorsConfig {
    pub data: Color,
    pub prompt: Color,
    pub non_prompt: Color,
    pub total: Color,
    pub reference: Color,
    pub trials: Color,
    pub central: Color,
    pub central_trial: Color,
    pub distribution: Color,
    /// Total fit function of a mass spectrum.
    pub fit_total: Color,
    /// Background component of a mass fit.
    pub fit_background: Color,
    /// ROOT fill style of the prompt component.
    pub prompt_hatch: u16,
    /// ROOT fill style of the non-prompt component.
    pub non_prompt_hatch: u16,
}

impl Default for ColorsConfig {
    fn default() -> Self {
        Self {
            data: Color::BLACK,
            prompt: Color::hex("#cc0000"),     // kRed+1
            non_prompt: Color::hex("#1f3f8f"), // kAzure+4
            total: Color::hex("#009900"),      // kGreen+2
            reference: Color::hex("#ff9900"),  // kOrange
            trials: Color::hex("#1f77b4"),
            central: Color::hex("#ff7f0e"),
            central_trial: Color::hex("#bf00bf"),
            distribution: Color::hex("#1f77b4"),
            fit_total: Color::hex("#0000ff"),      // kBlue
            fit_background: Color::hex("#ff0000"), // kRed
            prompt_hatch: 3154,
            non_prompt_hatch: 3145,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Formats written for every plot (`png`, `pdf`, `svg`).
    pub formats: Vec<String>,
    pub dpi: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { formats: vec!["png".into(), "pdf".into()], dpi: 150 }
    }
}

/// Resolve a VizConfig from an optional YAML string.
///
/// The user document is merged key by key over the base config of the theme
/// it names (`alice` when absent), so a style file only lists what it changes.
pub fn resolve_config(user_yaml: Option<&str>) -> crate::Result<VizConfig> {
    let overlay = match user_yaml {
        None => return Ok(VizConfig::default()),
        Some(yaml) if yaml.trim().is_empty() => return Ok(VizConfig::default()),
        Some(yaml) => serde_yaml_ng::from_str::<Value>(yaml).map_err(config_error)?,
    };
    let theme = overlay.get("theme").and_then(Value::as_str).unwrap_or("alice");
    let mut base = serde_yaml_ng::to_value(BuiltinTheme::parse(theme).base_config())
        .map_err(config_error)?;
    merge_values(&mut base, overlay);
    serde_yaml_ng::from_value(base).map_err(config_error)
}

fn config_error(e: serde_yaml_ng::Error) -> crate::RenderError {
    crate::RenderError::Config(e.to_string())
}

fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (_, Value::Null) => {}
        (Value::Mapping(base), Value::Mapping(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(slot) => merge_values(slot, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}
