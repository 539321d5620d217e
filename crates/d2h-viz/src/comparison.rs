//! Overlay plots: measured series with stat error bars and systematic boxes,
//! model bands, and the ratio-to-default companion plot.

use d2h_core::{BinnedSeries, Error, ErrorGraph, Result, SystBox};
use serde::{Deserialize, Serialize};

use crate::ArtifactMeta;

/// Schema tag of [`ComparisonArtifact`].
pub const COMPARISON_SCHEMA: &str = "d2h_comparison_v1";

/// Entries above which the legend switches to two columns.
const SINGLE_COLUMN_MAX: usize = 4;

/// How the y-axis range is derived from the plotted data.
///
/// The data extent `[lo, hi]` spans every `value ∓ error` and systematic box;
/// its seed depends on the policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum RangePolicy {
    /// `[max(lo - margin, floor), hi + margin]`, extent seeded with `(0, 0)`.
    Absolute {
        /// Additive margin.
        margin: f64,
        /// Lowest allowed lower limit.
        floor: f64,
    },
    /// `[lo - margin·lo, hi + margin·hi]`, extent seeded with `(1, 0)`.
    Relative {
        /// Multiplicative margin.
        margin: f64,
    },
    /// Fixed limits.
    Fixed {
        /// Lower limit.
        lo: f64,
        /// Upper limit.
        hi: f64,
    },
}

impl RangePolicy {
    /// Fractions comparison: 0.05 margin, never below zero.
    pub const FRACTIONS: Self = Self::Absolute { margin: 0.05, floor: 0.0 };
    /// Graph overlay: 10% margin on both ends.
    pub const GRAPHS: Self = Self::Relative { margin: 0.1 };

    fn seed(&self) -> (f64, f64) {
        match self {
            Self::Relative { .. } => (1.0, 0.0),
            _ => (0.0, 0.0),
        }
    }

    /// Axis limits for a data extent.
    pub fn resolve(&self, (lo, hi): (f64, f64)) -> [f64; 2] {
        match *self {
            Self::Absolute { margin, floor } => [(lo - margin).max(floor), hi + margin],
            Self::Relative { margin } => [lo - margin * lo, hi + margin * hi],
            Self::Fixed { lo, hi } => [lo, hi],
        }
    }
}

/// One measured series drawn as points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointSeries {
    /// Legend label.
    pub label: String,
    /// Palette slot; defaults to the insertion position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_index: Option<usize>,
    /// Explicit colour (`#rrggbb`), overrides the palette.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Abscissae.
    pub x: Vec<f64>,
    /// Ordinates.
    #[serde(with = "d2h_core::float_vec")]
    pub y: Vec<f64>,
    /// Left x errors.
    pub ex_low: Vec<f64>,
    /// Right x errors.
    pub ex_high: Vec<f64>,
    /// Lower y errors.
    #[serde(with = "d2h_core::float_vec")]
    pub ey_low: Vec<f64>,
    /// Upper y errors.
    #[serde(with = "d2h_core::float_vec")]
    pub ey_high: Vec<f64>,
    /// Systematic boxes (open rectangles).
    #[serde(default)]
    pub syst: Vec<SystBox>,
}

impl PointSeries {
    /// Points at bin centres with half-bin x errors.
    pub fn from_series(label: impl Into<String>, series: &BinnedSeries) -> Self {
        Self::from_graph(label, &ErrorGraph::from_series(series))
    }

    /// Points of a graph.
    pub fn from_graph(label: impl Into<String>, graph: &ErrorGraph) -> Self {
        Self {
            label: label.into(),
            color_index: None,
            color: None,
            x: graph.x.clone(),
            y: graph.y.clone(),
            ex_low: graph.ex_low.clone(),
            ex_high: graph.ex_high.clone(),
            ey_low: graph.ey_low.clone(),
            ey_high: graph.ey_high.clone(),
            syst: Vec::new(),
        }
    }

    /// Attach systematic boxes.
    pub fn with_syst(mut self, boxes: Vec<SystBox>) -> Self {
        self.syst = boxes;
        self
    }

    /// Use a fixed colour instead of the palette.
    pub fn with_color(mut self, hex: impl Into<String>) -> Self {
        self.color = Some(hex.into());
        self
    }

    /// Use palette slot `index`.
    pub fn with_color_index(mut self, index: usize) -> Self {
        self.color_index = Some(index);
        self
    }

    fn extent(&self, (mut lo, mut hi): (f64, f64)) -> (f64, f64) {
        for i in 0..self.y.len() {
            lo = lo.min(self.y[i] - self.ey_low[i]);
            hi = hi.max(self.y[i] + self.ey_high[i]);
        }
        for b in &self.syst {
            lo = lo.min(b.y - b.half_height);
            hi = hi.max(b.y + b.half_height);
        }
        (lo, hi)
    }
}

/// A theory prediction drawn as a hatched band through the bin centres.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelBand {
    /// Legend label.
    pub label: String,
    /// Model slot, selects colour and hatch style.
    pub index: usize,
    /// Bin centres.
    pub x: Vec<f64>,
    /// Central values.
    pub y: Vec<f64>,
    /// Half-width of the band.
    pub y_err: Vec<f64>,
}

impl ModelBand {
    fn extent(&self, (mut lo, mut hi): (f64, f64)) -> (f64, f64) {
        for (y, e) in self.y.iter().zip(&self.y_err) {
            lo = lo.min(y - e);
            hi = hi.max(y + e);
        }
        (lo, hi)
    }
}

/// Overlay of measured series and model bands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonArtifact {
    /// Always [`COMPARISON_SCHEMA`].
    pub schema_version: String,
    /// Provenance.
    pub meta: ArtifactMeta,
    /// X-axis title.
    pub x_label: String,
    /// Y-axis title.
    pub y_label: String,
    /// Visible x-range; the data range when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_range: Option<[f64; 2]>,
    /// Visible y-range.
    pub y_range: [f64; 2],
    /// Palette name; the style default when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub palette: Option<String>,
    /// Measured series, drawn in order.
    pub series: Vec<PointSeries>,
    /// Model bands, drawn below the series.
    #[serde(default)]
    pub models: Vec<ModelBand>,
    /// Columns of the series legend.
    pub legend_columns: usize,
    /// Columns of the model legend.
    pub model_legend_columns: usize,
    /// System line under the experiment name; no header when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experiment_text: Option<String>,
    /// Extra text lines.
    #[serde(default)]
    pub annotations: Vec<String>,
    /// Dashed horizontal line (e.g. at 1 for ratios).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_line: Option<f64>,
}

fn legend_columns(entries: usize) -> usize {
    if entries > SINGLE_COLUMN_MAX { 2 } else { 1 }
}

/// Incremental construction of a [`ComparisonArtifact`].
#[derive(Debug, Clone)]
pub struct ComparisonBuilder {
    x_label: String,
    y_label: String,
    range: RangePolicy,
    x_range: Option<[f64; 2]>,
    palette: Option<String>,
    experiment_text: Option<String>,
    annotations: Vec<String>,
    reference_line: Option<f64>,
    series: Vec<PointSeries>,
    models: Vec<ModelBand>,
}

impl ComparisonBuilder {
    /// Empty plot using [`RangePolicy::FRACTIONS`].
    pub fn new(x_label: impl Into<String>, y_label: impl Into<String>) -> Self {
        Self {
            x_label: x_label.into(),
            y_label: y_label.into(),
            range: RangePolicy::FRACTIONS,
            x_range: None,
            palette: None,
            experiment_text: None,
            annotations: Vec::new(),
            reference_line: None,
            series: Vec::new(),
            models: Vec::new(),
        }
    }

    /// Set the y-range policy.
    pub fn range(mut self, policy: RangePolicy) -> Self {
        self.range = policy;
        self
    }

    /// Restrict the visible x-range.
    pub fn x_range(mut self, lo: f64, hi: f64) -> Self {
        self.x_range = Some([lo, hi]);
        self
    }

    /// Select a named palette.
    pub fn palette(mut self, name: impl Into<String>) -> Self {
        self.palette = Some(name.into());
        self
    }

    /// Draw the experiment header with `system` as its second line.
    pub fn experiment_text(mut self, system: impl Into<String>) -> Self {
        self.experiment_text = Some(system.into());
        self
    }

    /// Draw a dashed line at `y`.
    pub fn reference_line(mut self, y: f64) -> Self {
        self.reference_line = Some(y);
        self
    }

    /// Add a free text line.
    pub fn annotate(&mut self, line: impl Into<String>) -> &mut Self {
        self.annotations.push(line.into());
        self
    }

    /// Add a measured series.
    pub fn push(&mut self, series: PointSeries) -> &mut Self {
        self.series.push(series);
        self
    }

    /// Add a model prediction; bin errors give the band width.
    pub fn push_model(&mut self, label: impl Into<String>, model: &BinnedSeries) -> &mut Self {
        let n = model.n_bins();
        self.models.push(ModelBand {
            label: label.into(),
            index: self.models.len(),
            x: (0..n).map(|i| model.bin_center(i)).collect(),
            y: model.content.clone(),
            y_err: model.errors.clone(),
        });
        self
    }

    /// Data extent under the current policy's seed.
    pub fn extent(&self) -> (f64, f64) {
        let seed = self.range.seed();
        let with_models = self.models.iter().fold(seed, |acc, m| m.extent(acc));
        self.series.iter().fold(with_models, |acc, s| s.extent(acc))
    }

    /// Resolve the ranges and produce the artifact.
    pub fn build(self) -> Result<ComparisonArtifact> {
        for s in &self.series {
            let n = s.x.len();
            if [s.y.len(), s.ex_low.len(), s.ex_high.len(), s.ey_low.len(), s.ey_high.len()]
                .iter()
                .any(|&l| l != n)
            {
                return Err(Error::Validation(format!(
                    "series '{}' has inconsistent point arrays",
                    s.label
                )));
            }
        }
        let y_range = self.range.resolve(self.extent());
        if !(y_range[1] > y_range[0]) {
            return Err(Error::Validation(format!(
                "empty y-range [{}, {}] for '{}'",
                y_range[0], y_range[1], self.y_label
            )));
        }
        Ok(ComparisonArtifact {
            schema_version: COMPARISON_SCHEMA.to_string(),
            meta: ArtifactMeta::now()?,
            legend_columns: legend_columns(self.series.len()),
            model_legend_columns: legend_columns(self.models.len()),
            x_label: self.x_label,
            y_label: self.y_label,
            x_range: self.x_range,
            y_range,
            palette: self.palette,
            series: self.series,
            models: self.models,
            experiment_text: self.experiment_text,
            annotations: self.annotations,
            reference_line: self.reference_line,
        })
    }
}

/// Ratios of every series to the one labelled `central_label`.
///
/// Only series with the central series' bin count take part; each ratio is
/// named `h_ratio_{label}` and keeps the palette slot of its input. The
/// y-range is `[0, max(2, largest ratio)]`.
pub fn ratio_artifact(
    central_label: &str,
    entries: &[(String, BinnedSeries)],
    x_label: &str,
) -> Result<(ComparisonArtifact, Vec<BinnedSeries>)> {
    let central = entries
        .iter()
        .find(|(label, _)| label == central_label)
        .map(|(_, s)| s)
        .ok_or_else(|| {
            Error::Validation(format!("default series '{}' is not among the inputs", central_label))
        })?;

    let mut ratios = Vec::new();
    let mut points = Vec::new();
    let mut max_y = 2.0_f64;
    for (index, (label, series)) in entries.iter().enumerate() {
        if label == central_label {
            continue;
        }
        if !series.same_binning(central) {
            tracing::warn!(series = %label, default = %central_label, "binning differs from the default, no ratio");
            continue;
        }
        let mut ratio = series.divide(central)?.renamed(format!("h_ratio_{}", label));
        ratio.y_label = Some("Ratio".to_string());
        max_y = max_y.max(ratio.maximum());
        points.push(PointSeries::from_series(label.clone(), &ratio).with_color_index(index));
        ratios.push(ratio);
    }

    let mut builder = ComparisonBuilder::new(x_label, "Ratio")
        .range(RangePolicy::Fixed { lo: 0.0, hi: max_y })
        .reference_line(1.0);
    for p in points {
        builder.push(p);
    }
    let mut artifact = builder.build()?;
    artifact.legend_columns = legend_columns(entries.len());
    Ok((artifact, ratios))
}
