//! Public object types returned by `RootFile`.

/// A 1D histogram (TH1D, TH1F or TH1I).
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    /// Histogram name.
    pub name: String,
    /// Histogram title.
    pub title: String,
    /// Number of bins (excluding under/overflow).
    pub n_bins: usize,
    /// Bin edges (length = n_bins + 1).
    pub bin_edges: Vec<f64>,
    /// Bin contents (length = n_bins).
    pub bin_content: Vec<f64>,
    /// Sum of squared weights per bin, if stored.
    pub sumw2: Option<Vec<f64>>,
    /// Number of entries as stored in the histogram.
    pub entries: f64,
    /// X-axis title.
    pub x_title: String,
}

impl Histogram {
    /// Statistical error per bin.
    ///
    /// `sqrt(sumw2)` when weights were stored, `sqrt(|content|)` otherwise.
    pub fn bin_errors(&self) -> Vec<f64> {
        match &self.sumw2 {
            Some(sw2) if sw2.len() == self.n_bins => sw2.iter().map(|w| w.sqrt()).collect(),
            _ => self.bin_content.iter().map(|c| c.abs().sqrt()).collect(),
        }
    }
}

/// A graph of points (TGraph, TGraphErrors or TGraphAsymmErrors).
///
/// Missing error arrays are filled with zeros; symmetric errors are stored in
/// both the low and high vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct Graph {
    /// Graph name.
    pub name: String,
    /// Graph title.
    pub title: String,
    /// Abscissae.
    pub x: Vec<f64>,
    /// Ordinates.
    pub y: Vec<f64>,
    /// Left x errors.
    pub ex_low: Vec<f64>,
    /// Right x errors.
    pub ex_high: Vec<f64>,
    /// Lower y errors.
    pub ey_low: Vec<f64>,
    /// Upper y errors.
    pub ey_high: Vec<f64>,
}

/// Points of a TF1 as sampled by ROOT when the function was written.
///
/// The samples are equally spaced; `x_min`/`x_max` are the function's own
/// range, which may be wider than the sampled one.
#[derive(Debug, Clone, PartialEq)]
pub struct SampledFunction {
    /// Function name.
    pub name: String,
    /// Function title.
    pub title: String,
    /// Lower edge of the function range.
    pub x_min: f64,
    /// Upper edge of the function range.
    pub x_max: f64,
    /// Sample abscissae.
    pub x: Vec<f64>,
    /// Function values at `x`.
    pub y: Vec<f64>,
}
