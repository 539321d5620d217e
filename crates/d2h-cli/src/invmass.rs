//! Invariant-mass spectra with their fits, one panel per pT bin.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use d2h_core::rebin::merge_adjacent;
use d2h_core::{BinnedSeries, HistogramSource};
use d2h_viz::invmass::{FitCurve, FitSummary, InvMassArtifact, InvMassPanel, InvMassStyle};
use d2h_viz_render::config::VizConfig;
use serde::Deserialize;

use crate::config::read_config;
use crate::io;
use crate::plot::Plotter;

const TOTAL_LABEL: &str = "Total fit function";
const BACKGROUND_LABEL: &str = "Combinatorial background";

/// Decay channel shown on the panels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum Particle {
    #[serde(alias = "dzero")]
    D0,
    Dplus,
    #[default]
    LambdacToPkpi,
    LambdacToPk0s,
}

impl Particle {
    fn x_label(self) -> &'static str {
        match self {
            Particle::D0 => "#it{M}(K#pi) (GeV/#it{c}^{2})",
            Particle::Dplus => "#it{M}(#piK#pi) (GeV/#it{c}^{2})",
            Particle::LambdacToPkpi => "#it{M}(pK#pi) (GeV/#it{c}^{2})",
            Particle::LambdacToPk0s => "#it{M}(pK^{0}_{S}) (GeV/#it{c}^{2})",
        }
    }

    fn decay(self) -> &'static str {
        match self {
            Particle::D0 => "D^{0} #rightarrow K^{#minus}#pi^{#plus} and charge conj.",
            Particle::Dplus => "D^{#plus} #rightarrow #pi^{#plus}K^{#minus}#pi^{#plus} and charge conj.",
            Particle::LambdacToPkpi => {
                "#Lambda_{c}^{#plus} #rightarrow pK^{#minus}#pi^{#plus} and charge conj."
            }
            Particle::LambdacToPk0s => "#Lambda_{c}^{#plus} #rightarrow pK^{0}_{S} and charge conj.",
        }
    }

    /// Output name tag.
    fn tag(self) -> &'static str {
        match self {
            Particle::D0 => "Dzero",
            Particle::Dplus => "Dplus",
            Particle::LambdacToPkpi => "LambdacToPKPi",
            Particle::LambdacToPk0s => "LambdacToPKzeroShort",
        }
    }
}

/// pT bins of the mass fitter configuration.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct FitBins {
    #[serde(rename = "PtMin")]
    pub pt_min: Vec<f64>,
    #[serde(rename = "PtMax")]
    pub pt_max: Vec<f64>,
    #[serde(rename = "MassMin")]
    pub mass_min: Vec<f64>,
    #[serde(rename = "MassMax")]
    pub mass_max: Vec<f64>,
    /// Adjacent mass bins merged per pT bin; empty keeps the input binning.
    #[serde(rename = "Rebin", default)]
    pub rebin: Vec<usize>,
    /// Multiplicity class suffix of the mass histogram names.
    #[serde(rename = "Mult", default)]
    pub mult: Vec<String>,
    /// Multiplicity class text drawn on the panels.
    #[serde(rename = "MultLatex", default)]
    pub mult_latex: Vec<String>,
}

impl FitBins {
    fn len(&self) -> usize {
        self.pt_min.len()
    }

    pub(crate) fn validate(&self) -> Result<()> {
        let n = self.len();
        if n == 0 {
            bail!("no pT bins configured");
        }
        for (key, len, optional) in [
            ("PtMax", self.pt_max.len(), false),
            ("MassMin", self.mass_min.len(), false),
            ("MassMax", self.mass_max.len(), false),
            ("Rebin", self.rebin.len(), true),
            ("Mult", self.mult.len(), true),
            ("MultLatex", self.mult_latex.len(), true),
        ] {
            if len != n && !(optional && len == 0) {
                bail!("{} has {} entries for {} pT bins", key, len, n);
            }
        }
        if let Some((lo, hi)) = self.pt_min.iter().zip(&self.pt_max).find(|(lo, hi)| lo >= hi) {
            bail!("pT bin [{}, {}] is empty", lo, hi);
        }
        Ok(())
    }

    fn rebin(&self, i: usize) -> usize {
        self.rebin.get(i).copied().unwrap_or(1)
    }

    fn mult(&self, i: usize) -> &str {
        self.mult.get(i).map(String::as_str).unwrap_or("")
    }

    fn mult_latex(&self, i: usize) -> &str {
        self.mult_latex.get(i).map(String::as_str).unwrap_or("")
    }
}

fn default_means() -> String {
    "hist_means_lc".to_string()
}

fn default_sigmas() -> String {
    "hist_sigmas_lc".to_string()
}

fn default_yields() -> String {
    "hist_rawyields_lc".to_string()
}

fn default_mass_hist() -> String {
    "hmass{pt_min}{pt_max}".to_string()
}

fn default_total_curve() -> String {
    "total_func_lc_pt{pt_min}_{pt_max}".to_string()
}

fn default_background_curve() -> String {
    "bkg_0_lc_pt{pt_min}_{pt_max}".to_string()
}

fn default_system() -> Option<String> {
    Some("pp, #sqrt{#it{s}} = 13.6 TeV, #it{L}_{int} = 5 pb^{#minus1}".to_string())
}

fn default_true() -> bool {
    true
}

fn default_columns() -> usize {
    3
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct InvMassConfig {
    /// Fit output; `{pt_min}` and `{pt_max}` select a file per pT bin.
    pub file: String,
    #[serde(default)]
    pub particle: Particle,
    #[serde(alias = "pp13.6TeVFD")]
    pub bins: FitBins,
    #[serde(default = "default_means")]
    pub means: String,
    #[serde(default = "default_sigmas")]
    pub sigmas: String,
    #[serde(default = "default_yields")]
    pub yields: String,
    /// Mass histogram name; `_{Mult}` is appended for multiplicity classes.
    #[serde(default = "default_mass_hist")]
    pub mass_hist: String,
    #[serde(default = "default_total_curve")]
    pub total_curve: String,
    #[serde(default = "default_background_curve")]
    pub background_curve: String,
    #[serde(default = "default_system")]
    pub system: Option<String>,
    /// Overrides the decay text of `particle`.
    #[serde(default)]
    pub decay: Option<String>,
    #[serde(default = "default_true")]
    pub show_fit_parameters: bool,
    #[serde(default = "default_columns")]
    pub grid_columns: usize,
    pub outdir: PathBuf,
}

/// Substitute the rounded pT edges into `template`.
fn fill(template: &str, pt_min: f64, pt_max: f64) -> String {
    template
        .replace("{pt_min}", &format!("{:.0}", pt_min))
        .replace("{pt_max}", &format!("{:.0}", pt_max))
}

/// Bin `i` of a per-pT fit-result histogram.
fn bin_value(h: &BinnedSeries, i: usize) -> Result<(f64, f64)> {
    if i >= h.n_bins() {
        bail!("'{}' has {} bins, pT bin {} is missing", h.name, h.n_bins(), i + 1);
    }
    Ok((h.value(i), h.error(i)))
}

fn read_curve(source: &dyn HistogramSource, name: &str, label: &str) -> Option<FitCurve> {
    match source.curve(name) {
        Ok(g) => Some(FitCurve::from_graph(label, &g)),
        Err(e) => {
            tracing::warn!(curve = name, error = %e, "fit curve not drawn");
            None
        }
    }
}

struct FitResults {
    means: BinnedSeries,
    sigmas: BinnedSeries,
    yields: BinnedSeries,
}

impl FitResults {
    fn read(source: &dyn HistogramSource, path: &Path, cfg: &InvMassConfig) -> Result<Self> {
        Ok(Self {
            means: io::histogram(source, path, &cfg.means)?,
            sigmas: io::histogram(source, path, &cfg.sigmas)?,
            yields: io::histogram(source, path, &cfg.yields)?,
        })
    }

    fn summary(&self, i: usize) -> Result<FitSummary> {
        let mean = bin_value(&self.means, i)?;
        let (sigma, _) = bin_value(&self.sigmas, i)?;
        let raw_yield = bin_value(&self.yields, i)?;
        tracing::info!(bin = i + 1, ?mean, sigma, ?raw_yield, "fit parameters");
        Ok(FitSummary { mean: Some(mean), sigma: Some(sigma), raw_yield: Some(raw_yield) })
    }
}

pub(crate) fn cmd_invmass_fit(config: &Path, style: VizConfig) -> Result<()> {
    let cfg: InvMassConfig = read_config(config)?;
    cfg.bins.validate().with_context(|| format!("{}", config.display()))?;
    let bins = &cfg.bins;

    let files: Vec<PathBuf> =
        (0..bins.len()).map(|i| PathBuf::from(fill(&cfg.file, bins.pt_min[i], bins.pt_max[i]))).collect();
    let mut inputs: Vec<&Path> = vec![config];
    for f in &files {
        if !inputs.contains(&f.as_path()) {
            inputs.push(f);
        }
    }
    let mut bundle = io::new_bundle("invmass-fit", &inputs)?;
    let plotter = Plotter::new(style, &cfg.outdir);
    let name = cfg.particle.tag();
    let decay = cfg.decay.clone().unwrap_or_else(|| cfg.particle.decay().to_string());

    let mut panels = Vec::with_capacity(bins.len());
    for (i, file) in files.iter().enumerate() {
        let (pt_min, pt_max) = (bins.pt_min[i], bins.pt_max[i]);
        let source = io::open_source(file)?;

        let mult = bins.mult(i);
        let mut hist_name = fill(&cfg.mass_hist, pt_min, pt_max);
        if !mult.is_empty() {
            hist_name = format!("{}_{}", hist_name, mult);
        }
        let raw = io::histogram(source.as_ref(), file, &hist_name)?;
        let mass = merge_adjacent(&raw, bins.rebin(i)).with_context(|| format!("rebin '{}'", hist_name))?;

        let summary = if cfg.show_fit_parameters {
            FitResults::read(source.as_ref(), file, &cfg)?.summary(i)?
        } else {
            FitSummary::default()
        };
        let total = read_curve(source.as_ref(), &fill(&cfg.total_curve, pt_min, pt_max), TOTAL_LABEL);
        let background =
            read_curve(source.as_ref(), &fill(&cfg.background_curve, pt_min, pt_max), BACKGROUND_LABEL);

        let panel = InvMassPanel::build(
            &mass,
            [pt_min, pt_max],
            summary,
            (total, background),
            InvMassStyle {
                x_label: cfg.particle.x_label().to_string(),
                mass_range: [bins.mass_min[i], bins.mass_max[i]],
                mult_text: bins.mult_latex(i).to_string(),
                decay_text: decay.clone(),
            },
        )?;
        let single = InvMassArtifact::new(vec![panel.clone()], 1, cfg.system.clone())?;
        let mult_tag = if mult.is_empty() { String::new() } else { format!("{}_", mult) };
        plotter.plot(
            &mut bundle,
            "invmass",
            &single,
            &format!("InvMassFit{}_{}Pt_{:.0}_{:.0}", name, mult_tag, pt_min, pt_max),
        )?;
        panels.push(panel);
        bundle.push_histogram(mass);
    }

    if panels.len() > 1 {
        let grid = InvMassArtifact::new(panels, cfg.grid_columns, cfg.system.clone())?;
        plotter.plot(&mut bundle, "invmass", &grid, &format!("InvMassFit{}_AllPt", name))?;
    }
    io::write_bundle(&bundle, &cfg.outdir.join(format!("InvMassFit{}.json", name)))
}
