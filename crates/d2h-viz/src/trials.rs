use d2h_core::trials::{PtBinTrials, TrialStats, histogram_counts, narrowed_range};
use d2h_core::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::ArtifactMeta;

/// Schema tag of [`TrialsArtifact`].
pub const TRIALS_SCHEMA: &str = "d2h_trials_v1";
/// Schema tag of [`TrialDistributionArtifact`].
pub const TRIAL_DISTRIBUTION_SCHEMA: &str = "d2h_trial_distribution_v1";
/// Schema tag of [`Chi2Artifact`].
pub const CHI2_SCHEMA: &str = "d2h_trial_chi2_v1";

/// Bins of the ratio histogram.
const RATIO_BINS: usize = 10;
/// Vertical padding as a fraction of the data span.
const Y_MARGIN: f64 = 0.2;
/// Horizontal padding as a fraction of the data span.
const X_MARGIN: f64 = 0.01;

/// Yield of every accepted trial, with the central trial highlighted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialsArtifact {
    /// Always [`TRIALS_SCHEMA`].
    pub schema_version: String,
    /// Provenance.
    pub meta: ArtifactMeta,
    /// Text box content (pT range).
    pub label: String,
    /// X-axis title.
    pub x_label: String,
    /// Y-axis title.
    pub y_label: String,
    /// Trial names, in plotting order.
    pub trial_names: Vec<String>,
    /// Raw yields.
    pub yields: Vec<f64>,
    /// Raw-yield errors.
    pub errors: Vec<f64>,
    /// Index of the central trial.
    pub central_index: usize,
    /// Yield of the central trial (dashed line).
    pub central_yield: f64,
    /// Error of the central trial (band half-height).
    pub central_error: f64,
    /// Visible x-range.
    pub x_range: [f64; 2],
    /// Visible y-range.
    pub y_range: [f64; 2],
}

/// Histogram of `yield / central yield` over the non-central trials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialDistributionArtifact {
    /// Always [`TRIAL_DISTRIBUTION_SCHEMA`].
    pub schema_version: String,
    /// Provenance.
    pub meta: ArtifactMeta,
    /// Histogram edges.
    pub bin_edges: Vec<f64>,
    /// Entries per bin.
    pub counts: Vec<f64>,
    /// Statistics of the yields.
    pub stats: TrialStats,
    /// Text box lines: pT range, mean, std dev, RMSE, number of trials.
    pub text: Vec<String>,
}

/// χ²/ndf of every accepted trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chi2Artifact {
    /// Always [`CHI2_SCHEMA`].
    pub schema_version: String,
    /// Provenance.
    pub meta: ArtifactMeta,
    /// Text box content (pT range).
    pub label: String,
    /// X-axis title.
    pub x_label: String,
    /// χ²/ndf values.
    pub chi2: Vec<f64>,
    /// Visible x-range.
    pub x_range: [f64; 2],
    /// Visible y-range.
    pub y_range: [f64; 2],
}

/// Text box label of a pT bin.
pub fn pt_label(trials: &PtBinTrials) -> String {
    format!("{} < p_T/(GeV/c) < {}", trials.pt_min, trials.pt_max)
}

/// X limits over trial indices `0..n` with a small margin.
fn index_range(n: usize) -> [f64; 2] {
    let last = n.saturating_sub(1) as f64;
    let pad = if last > 0.0 { X_MARGIN * last } else { 0.5 };
    [-pad, last + pad]
}

/// Padded y limits of `values ± errors`, narrowed around the mean when
/// outliers dominate.
fn value_range(label: &str, values: &[f64], errors: &[f64]) -> [f64; 2] {
    let (lo, hi) = values
        .iter()
        .zip(errors)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), (v, e)| (lo.min(v - e), hi.max(v + e)));
    if !lo.is_finite() || !hi.is_finite() {
        return [0.0, 1.0];
    }
    let span = if hi > lo { hi - lo } else { hi.abs().max(1.0) };
    let padded = (lo - Y_MARGIN * span, hi + Y_MARGIN * span);
    match narrowed_range(values, padded) {
        Some((nlo, nhi)) => {
            tracing::info!(pt = label, lo = nlo, hi = nhi, "narrowing down the axis");
            [nlo, nhi]
        }
        None => [padded.0, padded.1],
    }
}

fn check_central(trials: &PtBinTrials, central: usize) -> Result<()> {
    if central >= trials.len() {
        return Err(Error::Validation(format!(
            "central trial index {} out of range ({} trials in pT {})",
            central,
            trials.len(),
            trials.label()
        )));
    }
    Ok(())
}

impl TrialsArtifact {
    /// Yields-vs-trial plot of one pT bin.
    pub fn from_trials(
        trials: &PtBinTrials,
        central: usize,
        x_label: impl Into<String>,
        y_label: impl Into<String>,
    ) -> Result<Self> {
        check_central(trials, central)?;
        Ok(Self {
            schema_version: TRIALS_SCHEMA.to_string(),
            meta: ArtifactMeta::now()?,
            label: pt_label(trials),
            x_label: x_label.into(),
            y_label: y_label.into(),
            trial_names: trials.names.clone(),
            yields: trials.yields.clone(),
            errors: trials.errors.clone(),
            central_index: central,
            central_yield: trials.yields[central],
            central_error: trials.errors[central],
            x_range: index_range(trials.len()),
            y_range: value_range(&trials.label(), &trials.yields, &trials.errors),
        })
    }
}

impl TrialDistributionArtifact {
    /// Ratio histogram and summary statistics of one pT bin.
    pub fn from_trials(trials: &PtBinTrials, central: usize) -> Result<Self> {
        check_central(trials, central)?;
        let stats = TrialStats::compute(&trials.yields, central)?;
        let (bin_edges, counts) = histogram_counts(&stats.ratios, RATIO_BINS);
        let text = vec![
            pt_label(trials),
            format!("mean:    {:.0}", stats.mean),
            format!("std dev: {:.2}", stats.std_dev),
            format!("RMSE:    {:.2}", stats.rmse),
            format!("#trials: {}", stats.n_trials),
        ];
        Ok(Self {
            schema_version: TRIAL_DISTRIBUTION_SCHEMA.to_string(),
            meta: ArtifactMeta::now()?,
            bin_edges,
            counts,
            stats,
            text,
        })
    }
}

impl Chi2Artifact {
    /// χ²/ndf scatter of one pT bin.
    pub fn from_trials(trials: &PtBinTrials, x_label: impl Into<String>) -> Result<Self> {
        let zeros = vec![0.0; trials.chi2.len()];
        Ok(Self {
            schema_version: CHI2_SCHEMA.to_string(),
            meta: ArtifactMeta::now()?,
            label: pt_label(trials),
            x_label: x_label.into(),
            chi2: trials.chi2.clone(),
            x_range: index_range(trials.len()),
            y_range: value_range(&trials.label(), &trials.chi2, &zeros),
        })
    }
}
