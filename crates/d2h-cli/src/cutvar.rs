//! Raw yield versus BDT cut from the cut-variation fit.

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use d2h_viz::cutvar::{CutVarArtifact, CutVarInputs, CutVarStyle};
use d2h_viz_render::config::VizConfig;
use serde::Deserialize;

use crate::config::read_config;
use crate::io;
use crate::plot::Plotter;

fn default_labelled() -> Vec<usize> {
    vec![0, 4, 8, 12, 16]
}

fn default_x_axis() -> String {
    "Minimum BDT score for non-prompt#Lambda_{c}^{#plus}".to_string()
}

fn default_y_axis() -> String {
    "Raw yield".to_string()
}

fn default_y_range() -> Option<[f64; 2]> {
    Some([0.1, 35000.0])
}

fn default_system() -> Option<String> {
    Some("#Lambda_{c}^{#plus} and charge conj., pp, #sqrt{#it{s}} = 13.6 TeV".to_string())
}

fn default_output() -> String {
    "CutVarFitLcFD".to_string()
}

/// One pT bin and its cut values.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CutVarBin {
    pub pt_min: u32,
    pub pt_max: u32,
    pub cuts: Vec<f64>,
}

impl CutVarBin {
    fn suffix(&self) -> String {
        format!("pt{}_{}", self.pt_min, self.pt_max)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CutVarConfig {
    pub file: PathBuf,
    pub pt_bins: Vec<CutVarBin>,
    /// Cut indices that get an axis label.
    #[serde(default = "default_labelled")]
    pub labelled: Vec<usize>,
    #[serde(default = "default_x_axis")]
    pub x_axis: String,
    #[serde(default = "default_y_axis")]
    pub y_axis: String,
    /// `null` derives the range from the data.
    #[serde(default = "default_y_range")]
    pub y_range: Option<[f64; 2]>,
    #[serde(default = "default_system")]
    pub system: Option<String>,
    pub outdir: PathBuf,
    #[serde(default = "default_output")]
    pub output: String,
}

/// Labelled indices that exist for `n_cuts` cuts.
fn shown_indices(labelled: &[usize], n_cuts: usize, pt: &str) -> Vec<usize> {
    let (shown, dropped): (Vec<usize>, Vec<usize>) = labelled.iter().partition(|&&i| i < n_cuts);
    if !dropped.is_empty() {
        tracing::warn!(pt, ?dropped, n_cuts, "labelled cut indices out of range");
    }
    shown
}

pub(crate) fn cmd_cutvar(config: &Path, style: VizConfig) -> Result<()> {
    let cfg: CutVarConfig = read_config(config)?;
    if cfg.pt_bins.is_empty() {
        bail!("{}: no pT bins configured", config.display());
    }
    let source = io::open_source(&cfg.file)?;
    let mut bundle = io::new_bundle("cutvar", &[config, cfg.file.as_path()])?;
    let plotter = Plotter::new(style, &cfg.outdir);

    for bin in &cfg.pt_bins {
        let suffix = bin.suffix();
        let data = io::histogram(source.as_ref(), &cfg.file, &format!("hRawYieldVsCut_{}", suffix))?;
        let prompt = io::histogram(source.as_ref(), &cfg.file, &format!("hRawYieldPromptVsCut_{}", suffix))?;
        let non_prompt =
            io::histogram(source.as_ref(), &cfg.file, &format!("hRawYieldNonPromptVsCut_{}", suffix))?;
        let total = io::histogram(source.as_ref(), &cfg.file, &format!("hRawYieldSumVsCut_{}", suffix))?;

        let shown = shown_indices(&cfg.labelled, bin.cuts.len(), &suffix);
        let artifact = CutVarArtifact::build(
            CutVarInputs { data: &data, prompt: &prompt, non_prompt: &non_prompt, total: &total },
            &bin.cuts,
            &shown,
            [f64::from(bin.pt_min), f64::from(bin.pt_max)],
            CutVarStyle {
                x_label: cfg.x_axis.clone(),
                y_label: cfg.y_axis.clone(),
                y_range: cfg.y_range,
                system: cfg.system.clone(),
            },
        )?;
        tracing::info!(pt = %suffix, cuts = bin.cuts.len(), labelled = shown.len(), "cut variation plot");
        plotter.plot(
            &mut bundle,
            "cutvar",
            &artifact,
            &format!("{}_{}-{}", cfg.output, bin.pt_min, bin.pt_max),
        )?;
        for h in [data, prompt, non_prompt, total] {
            bundle.push_histogram(h);
        }
    }
    io::write_bundle(&bundle, &cfg.outdir.join(format!("{}.json", cfg.output)))
}
