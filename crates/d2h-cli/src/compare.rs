//! Overlay plots: corrected fractions with systematics and models, and
//! graph comparisons.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use d2h_core::merge::select_bins;
use d2h_core::syst::{rms_relative_systematics, syst_boxes};
use d2h_core::{BinnedSeries, ErrorGraph};
use d2h_viz::comparison::{ComparisonBuilder, PointSeries, RangePolicy, ratio_artifact};
use d2h_viz_render::config::VizConfig;
use serde::Deserialize;

use crate::config::{ordered_map, read_config};
use crate::io;
use crate::plot::Plotter;

fn default_x_axis() -> String {
    "#it{p}_{T} (GeV/#it{c})".to_string()
}

fn default_y_axis() -> String {
    "#it{f}_{non-prompt}".to_string()
}

/// Where a job writes its plots and bundle.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct OutputConfig {
    pub outdir: PathBuf,
    pub file: String,
}

impl OutputConfig {
    fn bundle_path(&self) -> PathBuf {
        self.outdir.join(format!("{}.json", self.file))
    }
}

/// One measured series. Several files are merged bin by bin.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SeriesEntry {
    pub file: Vec<String>,
    /// Relative contributions per bin.
    #[serde(default)]
    pub systematics: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ModelEntry {
    pub file: String,
    pub histoname: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CompareConfig {
    #[serde(default)]
    pub inputdir: Option<PathBuf>,
    pub histoname: String,
    #[serde(deserialize_with = "ordered_map")]
    pub hists: Vec<(String, SeriesEntry)>,
    #[serde(default, deserialize_with = "ordered_map")]
    pub models: Vec<(String, ModelEntry)>,
    /// Label of the series the ratios are taken to.
    #[serde(default)]
    pub default: Option<String>,
    #[serde(default = "default_x_axis")]
    pub x_axis: String,
    #[serde(default = "default_y_axis")]
    pub y_axis: String,
    #[serde(default)]
    pub alice_text: Option<String>,
    pub output: OutputConfig,
}

/// Histogram `name` merged over `files`: bin `i` comes from file `i`.
fn load_merged(
    dir: Option<&Path>,
    files: &[String],
    name: &str,
    label: &str,
    inputs: &mut Vec<PathBuf>,
) -> Result<BinnedSeries> {
    let mut hists = Vec::with_capacity(files.len());
    for file in files {
        let path = io::resolve(dir, file);
        let source = io::open_source(&path)?;
        hists.push(io::histogram(source.as_ref(), &path, name)?);
        inputs.push(path);
    }
    match hists.len() {
        0 => bail!("no file given for '{}'", label),
        1 => Ok(hists.remove(0)),
        _ => {
            tracing::info!(label, files = hists.len(), "merging histograms");
            let refs: Vec<&BinnedSeries> = hists.iter().collect();
            Ok(select_bins(&hists[0], &refs)?)
        }
    }
}

pub(crate) fn cmd_compare_fractions(config: &Path, style: VizConfig) -> Result<()> {
    let cfg: CompareConfig = read_config(config)?;
    if cfg.hists.is_empty() {
        bail!("{}: no series under 'hists'", config.display());
    }
    let dir = cfg.inputdir.as_deref();
    let mut inputs = vec![config.to_path_buf()];
    let mut histograms = Vec::new();
    let mut syst_graphs = Vec::new();

    let mut builder = ComparisonBuilder::new(&cfg.x_axis, &cfg.y_axis);
    if let Some(text) = &cfg.alice_text {
        builder = builder.experiment_text(text);
    }

    for (label, m) in &cfg.models {
        let path = io::resolve(dir, &m.file);
        let source = io::open_source(&path)?;
        let model = io::histogram(source.as_ref(), &path, &m.histoname)?
            .renamed(format!("h_model_{}", label));
        builder.push_model(label, &model);
        histograms.push(model);
        inputs.push(path);
    }

    let mut entries = Vec::with_capacity(cfg.hists.len());
    for (index, (label, entry)) in cfg.hists.iter().enumerate() {
        let hist = load_merged(dir, &entry.file, &cfg.histoname, label, &mut inputs)?
            .renamed(format!("{}_{}", cfg.histoname, label))
            .with_labels(Some(cfg.x_axis.clone()), Some(cfg.y_axis.clone()));

        let mut points = PointSeries::from_series(label, &hist).with_color_index(index);
        if !entry.systematics.is_empty() {
            tracing::debug!(label = %label, "adding systematic boxes");
            let boxes = syst_boxes(&hist, &entry.systematics)
                .with_context(|| format!("systematics of '{}'", label))?;
            syst_graphs.push(ErrorGraph::from_boxes(format!("g_syst_{}", label), &boxes));
            points = points.with_syst(boxes);
        }
        builder.push(points);
        entries.push((label.clone(), hist));
    }
    tracing::info!(extent = ?builder.extent(), "data extent");
    let artifact = builder.build()?;

    let input_refs: Vec<&Path> = inputs.iter().map(PathBuf::as_path).collect();
    let mut bundle = io::new_bundle("compare-fractions", &input_refs)?;
    let plotter = Plotter::new(style, &cfg.output.outdir);
    plotter.plot(&mut bundle, "comparison", &artifact, &cfg.output.file)?;

    if let Some(default) = &cfg.default {
        let (ratio, ratios) = ratio_artifact(default, &entries, &cfg.x_axis)?;
        plotter.plot(&mut bundle, "ratio", &ratio, &format!("{}_ratio", cfg.output.file))?;
        for r in ratios {
            bundle.push_histogram(r);
        }

        let central = entries.iter().find(|(l, _)| l == default).map(|(_, h)| h);
        let variants: Vec<&BinnedSeries> =
            entries.iter().filter(|(l, _)| l != default).map(|(_, h)| h).collect();
        match central.and_then(|c| rms_relative_systematics(c, &variants)) {
            Some(errors) => {
                let text: Vec<String> = errors.iter().map(|e| format!("{:.0}", e)).collect();
                tracing::info!(percent = %text.join(" "), "systematic errors");
            }
            None => tracing::info!("no variant shares the default binning, no systematic estimate"),
        }
    } else {
        tracing::debug!("no default series, skipping the ratio plot");
    }

    for (_, hist) in entries {
        bundle.push_histogram(hist);
    }
    for h in histograms {
        bundle.push_histogram(h);
    }
    for g in syst_graphs {
        bundle.push_graph(g);
    }
    io::write_bundle(&bundle, &cfg.output.bundle_path())
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct GraphEntry {
    pub file: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct PlotGraphConfig {
    #[serde(default)]
    pub inputdir: Option<PathBuf>,
    pub histoname: String,
    #[serde(deserialize_with = "ordered_map")]
    pub hists: Vec<(String, GraphEntry)>,
    /// Legend box in pad coordinates; the renderer places the legend itself.
    #[serde(default)]
    pub legend: Option<[f64; 4]>,
    #[serde(default = "default_x_axis")]
    pub x_axis: String,
    pub y_axis: String,
    pub output: OutputConfig,
}

/// Visible pT range of graph overlays.
const GRAPH_X_RANGE: (f64, f64) = (0.0, 25.0);

pub(crate) fn cmd_plot_graph(config: &Path, style: VizConfig) -> Result<()> {
    let cfg: PlotGraphConfig = read_config(config)?;
    if let Some(legend) = cfg.legend {
        tracing::debug!(?legend, "legend position ignored, placed automatically");
    }
    let dir = cfg.inputdir.as_deref();

    let mut builder = ComparisonBuilder::new(&cfg.x_axis, &cfg.y_axis)
        .range(RangePolicy::GRAPHS)
        .x_range(GRAPH_X_RANGE.0, GRAPH_X_RANGE.1);
    let mut inputs = vec![config.to_path_buf()];
    let mut graphs = Vec::with_capacity(cfg.hists.len());
    for (index, (label, entry)) in cfg.hists.iter().enumerate() {
        let Some(file) = entry.file.first() else {
            bail!("no file given for '{}'", label);
        };
        let path = io::resolve(dir, file);
        let source = io::open_source(&path)?;
        let mut graph = io::graph(source.as_ref(), &path, &cfg.histoname)?;
        graph.name = format!("{}_{}", cfg.histoname, label);
        for i in 0..graph.len() {
            tracing::debug!(
                label = %label,
                point = i,
                x = graph.x[i],
                y = graph.y[i],
                ey_low = graph.ey_low[i],
                ey_high = graph.ey_high[i],
                "point"
            );
        }
        builder.push(PointSeries::from_graph(label, &graph).with_color_index(index));
        graphs.push(graph);
        inputs.push(path);
    }
    if graphs.is_empty() {
        bail!("{}: no series under 'hists'", config.display());
    }
    let (lo, hi) = builder.extent();
    tracing::info!(miny = lo, maxy = hi, "graph extent");
    let artifact = builder.build()?;

    let input_refs: Vec<&Path> = inputs.iter().map(PathBuf::as_path).collect();
    let mut bundle = io::new_bundle("plot-graph", &input_refs)?;
    Plotter::new(style, &cfg.output.outdir).plot(&mut bundle, "comparison", &artifact, &cfg.output.file)?;
    for g in graphs {
        bundle.push_graph(g);
    }
    io::write_bundle(&bundle, &cfg.output.bundle_path())
}
