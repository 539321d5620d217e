//! The derived-object file every job writes once at the end of a run.
//!
//! A bundle is a JSON document holding the derived histograms, point graphs
//! (systematic boxes, graphs copied from inputs) and references to the plot
//! files produced alongside it. Bundles are also accepted as inputs, so one
//! job's output can feed the next.

use std::fmt::Write as _;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::series::BinnedSeries;
use crate::syst::SystBox;
use crate::{Error, Result};

/// Schema tag written into every bundle.
pub const BUNDLE_SCHEMA: &str = "d2h_bundle_v1";

/// A graph of points with asymmetric errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorGraph {
    /// Graph name.
    pub name: String,
    /// Free-form title.
    #[serde(default)]
    pub title: String,
    /// Abscissae.
    #[serde(with = "crate::float_vec")]
    pub x: Vec<f64>,
    /// Ordinates.
    #[serde(with = "crate::float_vec")]
    pub y: Vec<f64>,
    /// Left x errors.
    #[serde(with = "crate::float_vec")]
    pub ex_low: Vec<f64>,
    /// Right x errors.
    #[serde(with = "crate::float_vec")]
    pub ex_high: Vec<f64>,
    /// Lower y errors.
    #[serde(with = "crate::float_vec")]
    pub ey_low: Vec<f64>,
    /// Upper y errors.
    #[serde(with = "crate::float_vec")]
    pub ey_high: Vec<f64>,
}

impl ErrorGraph {
    /// Graph with symmetric errors.
    pub fn symmetric(
        name: impl Into<String>,
        x: Vec<f64>,
        y: Vec<f64>,
        ex: Vec<f64>,
        ey: Vec<f64>,
    ) -> Result<Self> {
        let g = Self {
            name: name.into(),
            title: String::new(),
            ex_low: ex.clone(),
            ex_high: ex,
            ey_low: ey.clone(),
            ey_high: ey,
            x,
            y,
        };
        g.validate()?;
        Ok(g)
    }

    /// Graph of systematic boxes (box half-width as x error, half-height as y error).
    pub fn from_boxes(name: impl Into<String>, boxes: &[SystBox]) -> Self {
        let ex: Vec<f64> = boxes.iter().map(|b| b.half_width).collect();
        let ey: Vec<f64> = boxes.iter().map(|b| b.half_height).collect();
        Self {
            name: name.into(),
            title: String::new(),
            x: boxes.iter().map(|b| b.x).collect(),
            y: boxes.iter().map(|b| b.y).collect(),
            ex_low: ex.clone(),
            ex_high: ex,
            ey_low: ey.clone(),
            ey_high: ey,
        }
    }

    /// Graph of bin centres with half-bin-width x errors.
    pub fn from_series(series: &BinnedSeries) -> Self {
        let n = series.n_bins();
        let ex: Vec<f64> = (0..n).map(|i| series.bin_width(i) / 2.0).collect();
        Self {
            name: series.name.clone(),
            title: series.title.clone(),
            x: (0..n).map(|i| series.bin_center(i)).collect(),
            y: series.content.clone(),
            ex_low: ex.clone(),
            ex_high: ex,
            ey_low: series.errors.clone(),
            ey_high: series.errors.clone(),
        }
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// Whether the graph has no points.
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Check that all coordinate vectors have the same length.
    pub fn validate(&self) -> Result<()> {
        let n = self.x.len();
        let lens = [
            self.y.len(),
            self.ex_low.len(),
            self.ex_high.len(),
            self.ey_low.len(),
            self.ey_high.len(),
        ];
        if lens.iter().any(|&l| l != n) {
            return Err(Error::Validation(format!(
                "graph '{}' has inconsistent point arrays ({} x values)",
                self.name, n
            )));
        }
        Ok(())
    }
}

/// One hashed input file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleInput {
    /// Path as given on the command line.
    pub path: String,
    /// SHA-256 of the file contents.
    pub sha256: String,
}

/// Provenance of a bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleMeta {
    /// Producing tool.
    pub tool: String,
    /// Tool version.
    pub tool_version: String,
    /// Creation time.
    pub created_unix_ms: u128,
    /// Subcommand that produced the bundle.
    pub command: String,
    /// Hashed inputs.
    #[serde(default)]
    pub inputs: Vec<BundleInput>,
}

/// Plot files written by the job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotRef {
    /// Plot kind (e.g. `comparison`, `ratio`).
    pub kind: String,
    /// Written files.
    pub files: Vec<String>,
}

/// Output file of a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistBundle {
    /// Always [`BUNDLE_SCHEMA`].
    pub schema_version: String,
    /// Provenance.
    pub meta: BundleMeta,
    /// Derived histograms.
    #[serde(default)]
    pub histograms: Vec<BinnedSeries>,
    /// Derived graphs.
    #[serde(default)]
    pub graphs: Vec<ErrorGraph>,
    /// Plot files.
    #[serde(default)]
    pub plots: Vec<PlotRef>,
}

impl HistBundle {
    /// Empty bundle stamped with the current time.
    pub fn new(command: impl Into<String>) -> Result<Self> {
        Ok(Self {
            schema_version: BUNDLE_SCHEMA.to_string(),
            meta: BundleMeta {
                tool: "d2h".to_string(),
                tool_version: crate::VERSION.to_string(),
                created_unix_ms: now_unix_ms()?,
                command: command.into(),
                inputs: Vec::new(),
            },
            histograms: Vec::new(),
            graphs: Vec::new(),
            plots: Vec::new(),
        })
    }

    /// Record an input file and its hash.
    pub fn add_input(&mut self, path: &Path) -> Result<()> {
        let bytes = std::fs::read(path)?;
        self.meta
            .inputs
            .push(BundleInput { path: path.display().to_string(), sha256: sha256_hex(&bytes) });
        Ok(())
    }

    /// Append a histogram, replacing any previous one with the same name.
    pub fn push_histogram(&mut self, series: BinnedSeries) {
        self.histograms.retain(|h| h.name != series.name);
        self.histograms.push(series);
    }

    /// Append a graph, replacing any previous one with the same name.
    pub fn push_graph(&mut self, graph: ErrorGraph) {
        self.graphs.retain(|g| g.name != graph.name);
        self.graphs.push(graph);
    }

    /// Record written plot files.
    pub fn push_plot(&mut self, kind: impl Into<String>, files: Vec<String>) {
        self.plots.push(PlotRef { kind: kind.into(), files });
    }

    /// Histogram by name.
    pub fn histogram(&self, name: &str) -> Option<&BinnedSeries> {
        self.histograms.iter().find(|h| h.name == name)
    }

    /// Graph by name.
    pub fn graph(&self, name: &str) -> Option<&ErrorGraph> {
        self.graphs.iter().find(|g| g.name == name)
    }

    /// Names of all histograms then all graphs, in insertion order.
    pub fn names(&self) -> Vec<String> {
        self.histograms
            .iter()
            .map(|h| h.name.clone())
            .chain(self.graphs.iter().map(|g| g.name.clone()))
            .collect()
    }

    /// Write as pretty JSON.
    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Read and validate a bundle.
    pub fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Parse and validate a bundle from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        let bundle: HistBundle = serde_json::from_str(text)?;
        if bundle.schema_version != BUNDLE_SCHEMA {
            return Err(Error::Validation(format!(
                "unsupported bundle schema '{}' (expected {})",
                bundle.schema_version, BUNDLE_SCHEMA
            )));
        }
        for h in &bundle.histograms {
            h.validate()?;
        }
        for g in &bundle.graphs {
            g.validate()?;
        }
        Ok(bundle)
    }
}

/// Milliseconds since the Unix epoch.
pub fn now_unix_ms() -> Result<u128> {
    let d = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| Error::Computation(format!("system time error: {}", e)))?;
    Ok(d.as_millis())
}

/// Lower-case hex SHA-256 of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut s = String::with_capacity(64);
    for b in digest {
        let _ = write!(s, "{:02x}", b);
    }
    s
}
