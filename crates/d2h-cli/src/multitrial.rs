//! Multitrial yield systematics: one fit output per trial directory.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use d2h_core::trials::{PtBinTrials, TrialSelection, default_trial_classes, generate_trials};
use d2h_core::{BinnedSeries, HistBundle};
use d2h_viz::{Chi2Artifact, TrialDistributionArtifact, TrialsArtifact};
use d2h_viz_render::config::VizConfig;
use serde::Deserialize;
use walkdir::WalkDir;

use crate::config::read_config;
use crate::io;
use crate::plot::Plotter;

fn default_x_axis() -> String {
    "Trial #".to_string()
}

fn default_y_axis() -> String {
    "Raw yield".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct MultitrialConfig {
    /// Directory searched (recursively) for trial outputs.
    pub input_dir: PathBuf,
    /// File name of one trial's fit output.
    pub file_name: String,
    /// Raw yields per pT bin.
    pub histoname: String,
    /// Selection variable (χ²/ndf) per pT bin.
    pub sel_histoname: String,
    /// Removed from the directory name to give the trial name.
    #[serde(default)]
    pub dir_pattern: String,
    pub pt_bins_min: Vec<f64>,
    pub pt_bins_max: Vec<f64>,
    #[serde(default)]
    pub selection: TrialSelection,
    pub central_trial: String,
    #[serde(default = "default_x_axis")]
    pub x_axis: String,
    #[serde(default = "default_y_axis")]
    pub y_axis: String,
    pub outdir: PathBuf,
    pub outfile: String,
}

/// A discovered trial output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TrialFile {
    pub dir_name: String,
    pub name: String,
    pub path: PathBuf,
}

/// Every `file_name` under `root` whose directory contains `dir_pattern`,
/// ordered by directory name.
pub(crate) fn discover_trials(root: &Path, file_name: &str, dir_pattern: &str) -> Result<Vec<TrialFile>> {
    if !root.is_dir() {
        bail!("trial directory {} does not exist", root.display());
    }
    let mut found = Vec::new();
    for entry in WalkDir::new(root).min_depth(2).sort_by_file_name() {
        let entry = entry.with_context(|| format!("walk {}", root.display()))?;
        if !entry.file_type().is_file() || entry.file_name() != file_name {
            continue;
        }
        let Some(dir_name) = entry
            .path()
            .parent()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
        else {
            continue;
        };
        if !dir_pattern.is_empty() && !dir_name.contains(dir_pattern) {
            tracing::debug!(dir = dir_name, "directory does not match the trial pattern");
            continue;
        }
        let name = if dir_pattern.is_empty() { dir_name.to_string() } else { dir_name.replace(dir_pattern, "") };
        found.push(TrialFile { dir_name: dir_name.to_string(), name, path: entry.path().to_path_buf() });
    }
    found.sort_by(|a, b| a.dir_name.cmp(&b.dir_name));
    Ok(found)
}

/// Accepted trials of every pT bin, in file order.
pub(crate) fn collect_trials(cfg: &MultitrialConfig, files: &[TrialFile]) -> Result<Vec<PtBinTrials>> {
    let mut bins: Vec<PtBinTrials> = cfg
        .pt_bins_min
        .iter()
        .zip(&cfg.pt_bins_max)
        .map(|(&lo, &hi)| PtBinTrials::new(lo, hi))
        .collect();

    for file in files {
        tracing::info!(path = %file.path.display(), trial = %file.name, "reading");
        let source = io::open_source(&file.path)?;
        let hist = io::histogram(source.as_ref(), &file.path, &cfg.histoname)?;
        let sel = io::histogram(source.as_ref(), &file.path, &cfg.sel_histoname)?;
        for (ind, bin) in bins.iter_mut().enumerate() {
            if ind >= hist.n_bins() || ind >= sel.n_bins() {
                tracing::warn!(trial = %file.name, pt = %bin.label(), "trial output has no such pT bin");
                continue;
            }
            let (raw_yield, chi2) = (hist.value(ind), sel.value(ind));
            if cfg.selection.accepts(raw_yield, chi2) {
                bin.push(file.name.clone(), raw_yield, hist.error(ind), chi2);
            } else {
                tracing::info!(chi2, raw_yield, trial = %file.name, pt = %bin.label(), "rejected");
            }
        }
    }
    Ok(bins)
}

/// Per-trial values of one pT bin as a histogram over trial indices.
fn trial_histogram(name: String, values: &[f64], errors: &[f64]) -> Result<BinnedSeries> {
    let edges = (0..=values.len()).map(|i| i as f64 - 0.5).collect();
    Ok(BinnedSeries::from_parts(name, edges, values.to_vec(), errors.to_vec())?)
}

fn write_trial_list(path: &Path, trials: &PtBinTrials) -> Result<()> {
    let mut out = std::fs::File::create(path).with_context(|| format!("create {}", path.display()))?;
    for name in &trials.names {
        writeln!(out, "{}", name)?;
    }
    Ok(())
}

fn plot_bin(
    plotter: &Plotter,
    bundle: &mut HistBundle,
    cfg: &MultitrialConfig,
    trials: &PtBinTrials,
    central: usize,
) -> Result<()> {
    let label = trials.label();
    let yields = TrialsArtifact::from_trials(trials, central, &cfg.x_axis, &cfg.y_axis)?;
    plotter.plot(bundle, "trials", &yields, &format!("{}_yields_trials_{}", cfg.outfile, label))?;
    let distr = TrialDistributionArtifact::from_trials(trials, central)?;
    tracing::info!(
        pt = %label,
        mean = distr.stats.mean,
        std_dev = distr.stats.std_dev,
        rmse = distr.stats.rmse,
        trials = distr.stats.n_trials,
        "trial statistics"
    );
    plotter.plot(bundle, "trial_distribution", &distr, &format!("{}_distr_{}", cfg.outfile, label))?;
    let chis = Chi2Artifact::from_trials(trials, &cfg.x_axis)?;
    plotter.plot(bundle, "chi2", &chis, &format!("{}_chis_{}", cfg.outfile, label))?;
    Ok(())
}

pub(crate) fn cmd_multitrial(config: &Path, style: VizConfig) -> Result<()> {
    let cfg: MultitrialConfig = read_config(config)?;
    if cfg.pt_bins_min.len() != cfg.pt_bins_max.len() {
        bail!(
            "{}: {} pt_bins_min but {} pt_bins_max",
            config.display(),
            cfg.pt_bins_min.len(),
            cfg.pt_bins_max.len()
        );
    }
    let files = discover_trials(&cfg.input_dir, &cfg.file_name, &cfg.dir_pattern)?;
    if files.is_empty() {
        bail!("no '{}' found under {}", cfg.file_name, cfg.input_dir.display());
    }
    tracing::info!(trials = files.len(), "trial files found");
    let bins = collect_trials(&cfg, &files)?;

    std::fs::create_dir_all(&cfg.outdir)
        .with_context(|| format!("create output directory {}", cfg.outdir.display()))?;
    let mut inputs: Vec<&Path> = vec![config];
    inputs.extend(files.iter().map(|f| f.path.as_path()));
    let mut bundle = io::new_bundle("multitrial", &inputs)?;
    let plotter = Plotter::new(style, &cfg.outdir);

    for trials in &bins {
        let label = trials.label();
        match trials.central_index(&cfg.central_trial) {
            Some(central) => {
                if let Err(e) = plot_bin(&plotter, &mut bundle, &cfg, trials, central) {
                    tracing::warn!(pt = %label, error = %format!("{e:#}"), "no plots for this pT bin");
                }
            }
            None => tracing::warn!(
                pt = %label,
                central = %cfg.central_trial,
                "central trial not accepted, no plots for this pT bin"
            ),
        }
        let list = cfg.outdir.join(format!("{}_trials_{}.txt", cfg.outfile, label));
        write_trial_list(&list, trials)?;
        tracing::info!(pt = %label, accepted = trials.len(), path = %list.display(), "trial list written");

        if !trials.is_empty() {
            bundle.push_histogram(trial_histogram(format!("hYieldsTrials_{}", label), &trials.yields, &trials.errors)?);
            let zeros = vec![0.0; trials.len()];
            bundle.push_histogram(trial_histogram(format!("hChi2Trials_{}", label), &trials.chi2, &zeros)?);
        }
    }
    io::write_bundle(&bundle, &cfg.outdir.join(format!("{}.json", cfg.outfile)))
}

/// Print compound trial names, one per line.
pub(crate) fn cmd_generate_trials(classes: Option<&Path>) -> Result<()> {
    let classes: Vec<Vec<String>> = match classes {
        Some(path) => read_config(path)?,
        None => default_trial_classes(),
    };
    let names = generate_trials(&classes);
    tracing::info!(classes = classes.len(), combinations = names.len() - 1, "generated trials");
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for name in names.iter().filter(|n| !n.is_empty()) {
        writeln!(out, "{}", name)?;
    }
    Ok(())
}
