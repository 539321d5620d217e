//! Jobs that assemble one output from several per-pT-bin inputs.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::ValueEnum;
use d2h_core::merge::{select_bins, select_points, zero_bins, zero_trailing};
use d2h_core::{BinnedSeries, HistogramSource, ObjectKind};
use d2h_viz::comparison::{ComparisonBuilder, PointSeries, RangePolicy};
use serde::Deserialize;

use crate::io;
use crate::plot::Plotter;

/// Histogram produced by the cut-variation fraction job.
pub(crate) const FRACTION_HIST: &str = "hCorrFracNonPrompt";
/// Bins blanked after the merged ones.
const BLANKED_BINS: usize = 2;

/// Which input provides binning and metadata of a merged object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum Template {
    /// First input file (efficiency merging).
    First,
    /// Last input file.
    Last,
}

fn open_all(files: &[PathBuf]) -> Result<Vec<Box<dyn HistogramSource>>> {
    files.iter().map(|f| io::open_source(f)).collect()
}

pub(crate) fn cmd_merge_fractions(
    out_image: &Path,
    old: &Path,
    files: &[PathBuf],
    histname: &str,
    output: Option<&Path>,
    plotter: &Plotter,
) -> Result<()> {
    let bundle_path = output.map(Path::to_path_buf).unwrap_or_else(|| out_image.with_extension("json"));
    io::check_output(&bundle_path)?;
    if files.is_empty() {
        bail!("no input files to merge");
    }

    let mut hists = Vec::with_capacity(files.len());
    for file in files {
        let source = io::open_source(file)?;
        hists.push(io::histogram(source.as_ref(), file, histname)?);
    }
    let refs: Vec<&BinnedSeries> = hists.iter().collect();
    let mut merged = select_bins(&hists[0], &refs)?;
    for i in 0..files.len() {
        tracing::info!(bin = i + 1, content = merged.value(i), "merged bin content");
    }
    zero_bins(&mut merged, files.len()..files.len() + BLANKED_BINS);

    let old_source = io::open_source(old)?;
    let mut reference = io::histogram(old_source.as_ref(), old, histname)?
        .renamed(format!("{}_reference", histname));
    zero_trailing(&mut reference, BLANKED_BINS);

    let colors = &plotter.config().colors;
    let x_label = merged.x_label.clone().unwrap_or_else(|| "#it{p}_{T} (GeV/#it{c})".to_string());
    let y_label = merged.y_label.clone().unwrap_or_else(|| "#it{f}_{non-prompt}".to_string());
    let mut builder = ComparisonBuilder::new(x_label, y_label).range(RangePolicy::Fixed { lo: 0.0, hi: 0.25 });
    builder.push(PointSeries::from_series("Merged", &merged).with_color(colors.data.to_hex()));
    builder.push(PointSeries::from_series("Reference", &reference).with_color(colors.reference.to_hex()));
    let artifact = builder.build()?;

    let mut inputs: Vec<&Path> = files.iter().map(PathBuf::as_path).collect();
    inputs.push(old);
    let mut bundle = io::new_bundle("merge-fractions", &inputs)?;
    plotter.plot_at(&mut bundle, "comparison", &artifact, out_image)?;
    bundle.push_histogram(merged);
    bundle.push_histogram(reference);
    io::write_bundle(&bundle, &bundle_path)
}

/// Names of every histogram and graph of `source`.
fn mergeable_names(source: &dyn HistogramSource) -> Result<Vec<String>> {
    Ok(source
        .entries()?
        .into_iter()
        .filter(|e| matches!(e.kind, ObjectKind::Histogram | ObjectKind::Graph))
        .map(|e| e.name)
        .collect())
}

fn kind_of(source: &dyn HistogramSource, name: &str) -> Result<ObjectKind> {
    Ok(source
        .entries()?
        .into_iter()
        .find(|e| e.name == name)
        .map(|e| e.kind)
        .unwrap_or(ObjectKind::Other))
}

pub(crate) fn cmd_merge_histos(
    infiles: &[PathBuf],
    outfile: &Path,
    histnames: &[String],
    template: Template,
) -> Result<()> {
    io::check_output(outfile)?;
    let sources = open_all(infiles)?;
    let Some(first) = sources.first() else {
        bail!("no input files to merge");
    };
    tracing::info!(files = ?infiles, "merging");

    let names = if histnames.is_empty() { mergeable_names(first.as_ref())? } else { histnames.to_vec() };
    tracing::info!(histograms = ?names, "objects to merge");

    let template_index = match template {
        Template::First => 0,
        Template::Last => sources.len() - 1,
    };

    let mut bundle = io::new_bundle("merge-histos", &infiles.iter().map(PathBuf::as_path).collect::<Vec<_>>())?;
    for name in &names {
        match kind_of(first.as_ref(), name)? {
            ObjectKind::Histogram => {
                let hists = sources
                    .iter()
                    .zip(infiles)
                    .map(|(s, f)| io::histogram(s.as_ref(), f, name))
                    .collect::<Result<Vec<_>>>()?;
                let refs: Vec<&BinnedSeries> = hists.iter().collect();
                let merged = select_bins(&hists[template_index], &refs)
                    .with_context(|| format!("merge histogram '{}'", name))?;
                for i in 0..refs.len() {
                    tracing::info!(
                        hist = %name,
                        bin = i + 1,
                        low = merged.low_edge(i),
                        up = merged.up_edge(i),
                        content = merged.value(i),
                        "merged bin"
                    );
                }
                bundle.push_histogram(merged);
            }
            ObjectKind::Graph => {
                let graphs = sources
                    .iter()
                    .zip(infiles)
                    .map(|(s, f)| io::graph(s.as_ref(), f, name))
                    .collect::<Result<Vec<_>>>()?;
                let refs: Vec<_> = graphs.iter().collect();
                let merged = select_points(&graphs[template_index], &refs)
                    .with_context(|| format!("merge graph '{}'", name))?;
                bundle.push_graph(merged);
            }
            ObjectKind::Other => {
                bail!("'{}' is not a histogram or graph in {}", name, infiles[0].display())
            }
        }
    }
    io::write_bundle(&bundle, outfile)
}

pub(crate) fn cmd_merge_histomass(infiles: &[PathBuf], outfile: &Path, patterns: &[String]) -> Result<()> {
    io::check_output(outfile)?;
    let sources = open_all(infiles)?;
    let mut bundle = io::new_bundle("merge-histomass", &infiles.iter().map(PathBuf::as_path).collect::<Vec<_>>())?;
    for pattern in patterns {
        for (ind, (source, file)) in sources.iter().zip(infiles).enumerate() {
            let names = source.histogram_names_matching(pattern)?;
            let Some(selected) = names.get(ind) else {
                bail!(
                    "{} has {} histograms matching '{}', cannot take number {}",
                    file.display(),
                    names.len(),
                    pattern,
                    ind + 1
                );
            };
            tracing::info!(file = %file.display(), histograms = ?names, selected = %selected, "selected");
            if bundle.histogram(selected).is_some() {
                tracing::warn!(hist = %selected, "histogram selected twice, keeping the later one");
            }
            bundle.push_histogram(io::histogram(source.as_ref(), file, selected)?);
        }
    }
    io::write_bundle(&bundle, outfile)
}

/// pT binning of the mass fitter.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct FitterConfig {
    #[serde(rename = "PtMin")]
    pub pt_min: Vec<f64>,
    #[serde(rename = "PtMax")]
    pub pt_max: Vec<f64>,
}

impl FitterConfig {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.pt_min.len() != self.pt_max.len() {
            bail!(
                "fitter config has {} PtMin but {} PtMax values",
                self.pt_min.len(),
                self.pt_max.len()
            );
        }
        if let Some((lo, hi)) = self.pt_min.iter().zip(&self.pt_max).find(|(lo, hi)| lo >= hi) {
            bail!("fitter config pT bin [{}, {}] is empty", lo, hi);
        }
        Ok(())
    }
}

pub(crate) fn cmd_gather_input(
    file: &Path,
    pattern: &str,
    out: &Path,
    fitter_config: Option<&Path>,
) -> Result<()> {
    io::check_output(out)?;
    let mut inputs = vec![file];
    if let Some(cfg_path) = fitter_config {
        let cfg: FitterConfig = crate::config::read_config(cfg_path)?;
        cfg.validate().with_context(|| format!("fitter config {}", cfg_path.display()))?;
        tracing::info!(pt_min = ?cfg.pt_min, pt_max = ?cfg.pt_max, "fitter pT bins");
        inputs.push(cfg_path);
    }

    let source = io::open_source(file)?;
    let mut bundle = io::new_bundle("gather-input", &inputs)?;
    let mut copied = 0usize;
    for entry in source.entries()? {
        if !entry.name.contains(pattern) {
            continue;
        }
        match entry.kind {
            ObjectKind::Histogram => bundle.push_histogram(io::histogram(source.as_ref(), file, &entry.name)?),
            ObjectKind::Graph => bundle.push_graph(io::graph(source.as_ref(), file, &entry.name)?),
            ObjectKind::Other => {
                tracing::debug!(name = %entry.name, "skipping non-histogram object");
                continue;
            }
        }
        copied += 1;
    }
    if copied == 0 {
        tracing::warn!(pattern, file = %file.display(), "no object matches the pattern");
    }
    tracing::info!(copied, "gathered objects");
    io::write_bundle(&bundle, out)
}
