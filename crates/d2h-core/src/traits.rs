//! Input abstraction shared by every macro.
//!
//! Jobs read their inputs through [`HistogramSource`] so that ROOT files and
//! previously written bundles are interchangeable.

use crate::bundle::{ErrorGraph, HistBundle};
use crate::series::BinnedSeries;
use crate::{Error, Result};

/// Kind of object stored under a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    /// A 1D histogram.
    Histogram,
    /// A point graph.
    Graph,
    /// Anything else (directories, canvases, trees).
    Other,
}

/// A named object listed by a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    /// Object name (path for nested objects).
    pub name: String,
    /// Object kind.
    pub kind: ObjectKind,
}

/// A file of named histograms and graphs.
pub trait HistogramSource {
    /// All objects, in storage order.
    fn entries(&self) -> Result<Vec<SourceEntry>>;

    /// Histogram by name.
    fn histogram(&self, name: &str) -> Result<BinnedSeries>;

    /// Graph by name.
    fn graph(&self, name: &str) -> Result<ErrorGraph>;

    /// A drawable curve: the stored samples of a fitted function, or the
    /// points of a graph.
    fn curve(&self, name: &str) -> Result<ErrorGraph> {
        self.graph(name)
    }

    /// Names of all histograms whose name contains `pattern`.
    fn histogram_names_matching(&self, pattern: &str) -> Result<Vec<String>> {
        Ok(self
            .entries()?
            .into_iter()
            .filter(|e| e.kind == ObjectKind::Histogram && e.name.contains(pattern))
            .map(|e| e.name)
            .collect())
    }
}

impl HistogramSource for HistBundle {
    fn entries(&self) -> Result<Vec<SourceEntry>> {
        let hists = self
            .histograms
            .iter()
            .map(|h| SourceEntry { name: h.name.clone(), kind: ObjectKind::Histogram });
        let graphs =
            self.graphs.iter().map(|g| SourceEntry { name: g.name.clone(), kind: ObjectKind::Graph });
        Ok(hists.chain(graphs).collect())
    }

    fn histogram(&self, name: &str) -> Result<BinnedSeries> {
        HistBundle::histogram(self, name)
            .cloned()
            .ok_or_else(|| Error::Validation(format!("no histogram '{}' in bundle", name)))
    }

    fn graph(&self, name: &str) -> Result<ErrorGraph> {
        if let Some(g) = HistBundle::graph(self, name) {
            return Ok(g.clone());
        }
        HistBundle::histogram(self, name)
            .map(ErrorGraph::from_series)
            .ok_or_else(|| Error::Validation(format!("no graph '{}' in bundle", name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundle() -> HistBundle {
        let mut b = HistBundle::new("test").unwrap();
        for name in ["hRawYields", "hRawYieldsSigma", "hEff"] {
            b.push_histogram(BinnedSeries::new(name, vec![0.0, 1.0, 2.0]).unwrap());
        }
        let g = ErrorGraph::symmetric("gSyst", vec![0.5], vec![1.0], vec![0.1], vec![0.2]).unwrap();
        b.push_graph(g);
        b
    }

    #[test]
    fn bundle_lists_and_matches() {
        let b = bundle();
        let entries = b.entries().unwrap();
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[3].kind, ObjectKind::Graph);
        assert_eq!(
            b.histogram_names_matching("RawYields").unwrap(),
            vec!["hRawYields".to_string(), "hRawYieldsSigma".to_string()]
        );
    }

    #[test]
    fn histograms_double_as_graphs() {
        let b = bundle();
        let g = HistogramSource::graph(&b, "hEff").unwrap();
        assert_eq!(g.x, vec![0.5, 1.5]);
        assert!(HistogramSource::histogram(&b, "gSyst").is_err());
    }

    #[test]
    fn bundle_curves_are_graphs() {
        let b = bundle();
        assert_eq!(b.curve("gSyst").unwrap().y, vec![1.0]);
        assert!(b.curve("total_func").is_err());
    }
}
