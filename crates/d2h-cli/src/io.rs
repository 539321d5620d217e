//! Reading job inputs and writing job outputs.
//!
//! Inputs are ROOT files (read through `d2h-root`) or bundles written by an
//! earlier job; both are exposed as [`HistogramSource`]. Every job writes a
//! single JSON bundle.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use d2h_core::{BinnedSeries, Error, ErrorGraph, HistBundle, HistogramSource, ObjectKind, SourceEntry};
use d2h_root::{RootError, RootFile, is_function_class, is_graph_class, is_histogram_class};

/// A ROOT file seen as a histogram source (top-level keys only).
pub(crate) struct RootSource {
    file: RootFile,
}

impl RootSource {
    pub(crate) fn open(path: &Path) -> Result<Self> {
        let file = RootFile::open(path).with_context(|| format!("open ROOT file {}", path.display()))?;
        Ok(Self { file })
    }

    fn input_error(&self, err: RootError) -> Error {
        Error::Input(format!("{}: {}", self.file.path().display(), err))
    }
}

/// Convert a ROOT histogram; errors come from `sumw2` when stored.
pub(crate) fn series_from_root(h: d2h_root::Histogram) -> d2h_core::Result<BinnedSeries> {
    let errors = h.bin_errors();
    let x_label = (!h.x_title.is_empty()).then(|| h.x_title.clone());
    Ok(BinnedSeries::from_parts(h.name, h.bin_edges, h.bin_content, errors)?
        .with_title(h.title)
        .with_labels(x_label, None))
}

pub(crate) fn graph_from_root(g: d2h_root::Graph) -> d2h_core::Result<ErrorGraph> {
    let graph = ErrorGraph {
        name: g.name,
        title: g.title,
        x: g.x,
        y: g.y,
        ex_low: g.ex_low,
        ex_high: g.ex_high,
        ey_low: g.ey_low,
        ey_high: g.ey_high,
    };
    graph.validate()?;
    Ok(graph)
}

impl HistogramSource for RootSource {
    fn entries(&self) -> d2h_core::Result<Vec<SourceEntry>> {
        let keys = self.file.list_keys().map_err(|e| self.input_error(e))?;
        Ok(keys
            .into_iter()
            .map(|k| {
                let kind = if is_histogram_class(&k.class_name) {
                    ObjectKind::Histogram
                } else if is_graph_class(&k.class_name) {
                    ObjectKind::Graph
                } else {
                    ObjectKind::Other
                };
                SourceEntry { name: k.name, kind }
            })
            .collect())
    }

    fn histogram(&self, name: &str) -> d2h_core::Result<BinnedSeries> {
        let h = self.file.get_histogram(name).map_err(|e| self.input_error(e))?;
        series_from_root(h)
    }

    fn graph(&self, name: &str) -> d2h_core::Result<ErrorGraph> {
        let class = self.file.class_of(name).map_err(|e| self.input_error(e))?;
        if is_histogram_class(&class) {
            return Ok(ErrorGraph::from_series(&self.histogram(name)?));
        }
        let g = self.file.get_graph(name).map_err(|e| self.input_error(e))?;
        graph_from_root(g)
    }

    fn curve(&self, name: &str) -> d2h_core::Result<ErrorGraph> {
        let class = self.file.class_of(name).map_err(|e| self.input_error(e))?;
        if !is_function_class(&class) {
            return self.graph(name);
        }
        let f = self.file.get_function(name).map_err(|e| self.input_error(e))?;
        curve_from_root(f)
    }
}

/// Samples of a fitted function as a graph without errors.
pub(crate) fn curve_from_root(f: d2h_root::SampledFunction) -> d2h_core::Result<ErrorGraph> {
    let zeros = vec![0.0; f.x.len()];
    ErrorGraph::symmetric(f.name, f.x, f.y, zeros.clone(), zeros)
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension().and_then(|e| e.to_str()).is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

/// Open a `.json` bundle or a ROOT file.
pub(crate) fn open_source(path: &Path) -> Result<Box<dyn HistogramSource>> {
    tracing::debug!(path = %path.display(), "opening input");
    if has_extension(path, "json") {
        let bundle =
            HistBundle::read(path).with_context(|| format!("read bundle {}", path.display()))?;
        Ok(Box::new(bundle))
    } else {
        Ok(Box::new(RootSource::open(path)?))
    }
}

/// Histogram `name` from `source`, with the file in the error chain.
pub(crate) fn histogram(
    source: &dyn HistogramSource,
    path: &Path,
    name: &str,
) -> Result<BinnedSeries> {
    source
        .histogram(name)
        .with_context(|| format!("histogram '{}' in {}", name, path.display()))
}

/// Graph `name` from `source`; histograms are converted to bin-centre graphs.
pub(crate) fn graph(source: &dyn HistogramSource, path: &Path, name: &str) -> Result<ErrorGraph> {
    source.graph(name).with_context(|| format!("graph '{}' in {}", name, path.display()))
}

/// Reject output paths this tool cannot produce.
pub(crate) fn check_output(path: &Path) -> Result<()> {
    if has_extension(path, "root") {
        bail!(
            "cannot write ROOT files ({}); use a .json output bundle",
            path.display()
        );
    }
    Ok(())
}

/// New bundle for `command` with the hashes of every input.
pub(crate) fn new_bundle(command: &str, inputs: &[&Path]) -> Result<HistBundle> {
    let mut bundle = HistBundle::new(command)?;
    for path in inputs {
        bundle.add_input(path).with_context(|| format!("hash input {}", path.display()))?;
    }
    Ok(bundle)
}

pub(crate) fn write_bundle(bundle: &HistBundle, out: &Path) -> Result<()> {
    bundle.write(out).with_context(|| format!("write bundle {}", out.display()))?;
    tracing::info!(
        path = %out.display(),
        histograms = bundle.histograms.len(),
        graphs = bundle.graphs.len(),
        plots = bundle.plots.len(),
        "bundle written"
    );
    Ok(())
}

/// `dir/name` when `name` is relative.
pub(crate) fn resolve(dir: Option<&Path>, name: &str) -> PathBuf {
    match dir {
        Some(d) => d.join(name),
        None => PathBuf::from(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_outputs_are_rejected() {
        assert!(check_output(Path::new("out/fractions.root")).is_err());
        assert!(check_output(Path::new("out/fractions.ROOT")).is_err());
        assert!(check_output(Path::new("out/fractions.json")).is_ok());
    }

    #[test]
    fn bundles_are_opened_as_sources() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.json");
        let mut b = HistBundle::new("test").unwrap();
        b.push_histogram(
            BinnedSeries::from_parts("hEff", vec![0.0, 1.0, 2.0], vec![0.5, 0.6], vec![0.1, 0.1])
                .unwrap(),
        );
        b.write(&path).unwrap();

        let source = open_source(&path).unwrap();
        let h = histogram(source.as_ref(), &path, "hEff").unwrap();
        assert_eq!(h.content, vec![0.5, 0.6]);

        let err = histogram(source.as_ref(), &path, "hMissing").unwrap_err();
        assert!(format!("{err:#}").contains("hMissing"));
    }

    #[test]
    fn root_histograms_convert_with_stored_weights() {
        let h = d2h_root::Histogram {
            name: "hFrac".into(),
            title: "fraction".into(),
            n_bins: 2,
            bin_edges: vec![1.0, 2.0, 4.0],
            bin_content: vec![0.1, 0.2],
            sumw2: Some(vec![0.0004, 0.0009]),
            entries: 2.0,
            x_title: "#it{p}_{T}".into(),
        };
        let s = series_from_root(h).unwrap();
        assert_eq!(s.title, "fraction");
        assert_eq!(s.x_label.as_deref(), Some("#it{p}_{T}"));
        assert!((s.errors[1] - 0.03).abs() < 1e-12);
    }

    #[test]
    fn root_function_samples_become_curves() {
        let f = d2h_root::SampledFunction {
            name: "bkg_0_lc_pt4_5".into(),
            title: String::new(),
            x_min: 2.1,
            x_max: 2.5,
            x: vec![2.2, 2.3, 2.4],
            y: vec![5.0, 4.0, 3.0],
        };
        let g = curve_from_root(f).unwrap();
        assert_eq!(g.name, "bkg_0_lc_pt4_5");
        assert_eq!(g.y, vec![5.0, 4.0, 3.0]);
        assert_eq!(g.ey_high, vec![0.0; 3]);
    }

    #[test]
    fn resolve_joins_relative_names() {
        assert_eq!(resolve(Some(Path::new("in")), "a.root"), PathBuf::from("in/a.root"));
        assert_eq!(resolve(None, "a.root"), PathBuf::from("a.root"));
    }
}
