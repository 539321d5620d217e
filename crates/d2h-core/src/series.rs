//! Binned numeric series.
//!
//! A [`BinnedSeries`] is an ordered partition of the abscissa (usually pT) into
//! bins, each carrying a value and a statistical error. Every macro reads its
//! inputs as series, transforms them in memory and writes series back out.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Where an abscissa value falls relative to a binning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinLookup {
    /// Below the first edge.
    Underflow,
    /// Inside bin `i` (0-based, half-open `[lo, hi)`).
    Bin(usize),
    /// At or above the last edge.
    Overflow,
}

/// A 1D binned series with per-bin statistical errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinnedSeries {
    /// Series name (histogram key).
    pub name: String,
    /// Free-form title.
    #[serde(default)]
    pub title: String,
    /// Bin edges (length = n_bins + 1, strictly increasing).
    pub bin_edges: Vec<f64>,
    /// Bin values (length = n_bins).
    #[serde(with = "crate::float_vec")]
    pub content: Vec<f64>,
    /// Statistical errors (length = n_bins).
    #[serde(with = "crate::float_vec")]
    pub errors: Vec<f64>,
    /// X-axis title, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_label: Option<String>,
    /// Y-axis title, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_label: Option<String>,
}

impl BinnedSeries {
    /// Create a zero-filled series over `bin_edges`.
    pub fn new(name: impl Into<String>, bin_edges: Vec<f64>) -> Result<Self> {
        let n = bin_edges.len().saturating_sub(1);
        Self::from_parts(name, bin_edges, vec![0.0; n], vec![0.0; n])
    }

    /// Assemble a series from raw vectors, validating the binning.
    pub fn from_parts(
        name: impl Into<String>,
        bin_edges: Vec<f64>,
        content: Vec<f64>,
        errors: Vec<f64>,
    ) -> Result<Self> {
        let s = Self {
            name: name.into(),
            title: String::new(),
            bin_edges,
            content,
            errors,
            x_label: None,
            y_label: None,
        };
        s.validate()?;
        Ok(s)
    }

    /// Check edge monotonicity and vector lengths.
    pub fn validate(&self) -> Result<()> {
        if self.bin_edges.len() < 2 {
            return Err(Error::Validation(format!(
                "series '{}' needs at least 2 bin edges, got {}",
                self.name,
                self.bin_edges.len()
            )));
        }
        if let Some(bad) = self.bin_edges.iter().find(|e| !e.is_finite()) {
            return Err(Error::Validation(format!(
                "series '{}' has a non-finite bin edge: {}",
                self.name, bad
            )));
        }
        if let Some(w) = self.bin_edges.windows(2).find(|w| w[1] <= w[0]) {
            return Err(Error::Validation(format!(
                "series '{}' bin edges not strictly increasing at {} -> {}",
                self.name, w[0], w[1]
            )));
        }
        let n = self.n_bins();
        if self.content.len() != n || self.errors.len() != n {
            return Err(Error::Validation(format!(
                "series '{}': {} bins but {} values and {} errors",
                self.name,
                n,
                self.content.len(),
                self.errors.len()
            )));
        }
        Ok(())
    }

    /// Builder-style title setter.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Builder-style axis titles.
    pub fn with_labels(mut self, x: Option<String>, y: Option<String>) -> Self {
        self.x_label = x;
        self.y_label = y;
        self
    }

    /// Number of bins.
    #[inline]
    pub fn n_bins(&self) -> usize {
        self.bin_edges.len().saturating_sub(1)
    }

    /// Lower edge of bin `i`.
    #[inline]
    pub fn low_edge(&self, i: usize) -> f64 {
        self.bin_edges[i]
    }

    /// Upper edge of bin `i`.
    #[inline]
    pub fn up_edge(&self, i: usize) -> f64 {
        self.bin_edges[i + 1]
    }

    /// Width of bin `i`.
    #[inline]
    pub fn bin_width(&self, i: usize) -> f64 {
        self.bin_edges[i + 1] - self.bin_edges[i]
    }

    /// Centre of bin `i`.
    #[inline]
    pub fn bin_center(&self, i: usize) -> f64 {
        0.5 * (self.bin_edges[i] + self.bin_edges[i + 1])
    }

    /// Lower edge of the first bin.
    pub fn x_min(&self) -> f64 {
        self.bin_edges[0]
    }

    /// Upper edge of the last bin.
    pub fn x_max(&self) -> f64 {
        self.bin_edges[self.bin_edges.len() - 1]
    }

    /// Locate `x` in the binning using half-open bins.
    pub fn find_bin(&self, x: f64) -> BinLookup {
        if x.is_nan() || x >= self.x_max() {
            return BinLookup::Overflow;
        }
        if x < self.x_min() {
            return BinLookup::Underflow;
        }
        let above = self.bin_edges.partition_point(|&e| e <= x);
        BinLookup::Bin(above - 1)
    }

    /// Value of bin `i`.
    #[inline]
    pub fn value(&self, i: usize) -> f64 {
        self.content[i]
    }

    /// Statistical error of bin `i`.
    #[inline]
    pub fn error(&self, i: usize) -> f64 {
        self.errors[i]
    }

    /// Overwrite value and error of bin `i`.
    pub fn set_bin(&mut self, i: usize, value: f64, error: f64) {
        self.content[i] = value;
        self.errors[i] = error;
    }

    /// Multiply values and errors by `factor`.
    pub fn scale(&mut self, factor: f64) {
        for v in &mut self.content {
            *v *= factor;
        }
        for e in &mut self.errors {
            *e *= factor.abs();
        }
    }

    /// Whether `other` has identical bin edges.
    pub fn same_binning(&self, other: &BinnedSeries) -> bool {
        self.bin_edges.len() == other.bin_edges.len()
            && self.bin_edges.iter().zip(&other.bin_edges).all(|(a, b)| edges_match(*a, *b))
    }

    /// Bin-by-bin ratio `self / denominator` with uncorrelated error propagation.
    ///
    /// Both series must share their bin edges. Bins with a zero denominator
    /// are set to `0 ± 0`.
    pub fn divide(&self, denominator: &BinnedSeries) -> Result<BinnedSeries> {
        if !self.same_binning(denominator) {
            return Err(Error::Validation(format!(
                "cannot divide '{}' ({} bins, edges {:?}) by '{}' ({} bins, edges {:?})",
                self.name,
                self.n_bins(),
                self.bin_edges,
                denominator.name,
                denominator.n_bins(),
                denominator.bin_edges
            )));
        }
        let mut out = self.clone();
        for i in 0..self.n_bins() {
            let (c1, e1) = (self.content[i], self.errors[i]);
            let (c2, e2) = (denominator.content[i], denominator.errors[i]);
            if c2 == 0.0 {
                out.set_bin(i, 0.0, 0.0);
                continue;
            }
            let c2sq = c2 * c2;
            let err2 = (e1 * e1 * c2sq + e2 * e2 * c1 * c1) / (c2sq * c2sq);
            out.set_bin(i, c1 / c2, err2.sqrt());
        }
        Ok(out)
    }

    /// Divide each bin's value and error by its width.
    pub fn normalise_by_width(&mut self) {
        for i in 0..self.n_bins() {
            let w = self.bin_width(i);
            self.content[i] /= w;
            self.errors[i] /= w;
        }
    }

    /// Clone under a new name.
    pub fn renamed(&self, name: impl Into<String>) -> BinnedSeries {
        let mut out = self.clone();
        out.name = name.into();
        out
    }

    /// Largest bin value.
    pub fn maximum(&self) -> f64 {
        self.content.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Lowest and highest `value ∓ error` over all bins, seeded with `0.0`.
    ///
    /// When per-bin systematic half-heights are given, they widen the extent
    /// the same way.
    pub fn y_extent(&self, syst: Option<&[f64]>) -> (f64, f64) {
        let mut lo = 0.0_f64;
        let mut hi = 0.0_f64;
        for i in 0..self.n_bins() {
            let (v, e) = (self.content[i], self.errors[i]);
            let mut bin_lo = v - e;
            let mut bin_hi = v + e;
            if let Some(s) = syst.and_then(|s| s.get(i)) {
                bin_lo = bin_lo.min(v - s);
                bin_hi = bin_hi.max(v + s);
            }
            lo = lo.min(bin_lo);
            hi = hi.max(bin_hi);
        }
        (lo, hi)
    }
}

/// Edge equality up to a relative tolerance of 1e-9.
pub(crate) fn edges_match(a: f64, b: f64) -> bool {
    let scale = a.abs().max(b.abs()).max(1.0);
    (a - b).abs() <= 1e-9 * scale
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn series(edges: &[f64], content: &[f64], errors: &[f64]) -> BinnedSeries {
        BinnedSeries::from_parts("h", edges.to_vec(), content.to_vec(), errors.to_vec()).unwrap()
    }

    #[test]
    fn rejects_bad_binning() {
        assert!(BinnedSeries::new("h", vec![0.0]).is_err());
        assert!(BinnedSeries::new("h", vec![0.0, 2.0, 1.0]).is_err());
        assert!(BinnedSeries::new("h", vec![0.0, f64::INFINITY]).is_err());
        assert!(BinnedSeries::from_parts("h", vec![0.0, 1.0], vec![1.0, 2.0], vec![0.0]).is_err());
    }

    #[test]
    fn geometry() {
        let h = series(&[0.0, 1.0, 3.0, 6.0], &[1.0, 2.0, 3.0], &[0.1, 0.2, 0.3]);
        assert_eq!(h.n_bins(), 3);
        assert_eq!(h.bin_width(1), 2.0);
        assert_eq!(h.bin_center(2), 4.5);
        assert_eq!(h.x_min(), 0.0);
        assert_eq!(h.x_max(), 6.0);
    }

    #[test]
    fn find_bin_is_half_open() {
        let h = series(&[0.0, 1.0, 3.0, 6.0], &[0.0; 3], &[0.0; 3]);
        assert_eq!(h.find_bin(-0.5), BinLookup::Underflow);
        assert_eq!(h.find_bin(0.0), BinLookup::Bin(0));
        assert_eq!(h.find_bin(1.0), BinLookup::Bin(1));
        assert_eq!(h.find_bin(2.99), BinLookup::Bin(1));
        assert_eq!(h.find_bin(5.99), BinLookup::Bin(2));
        assert_eq!(h.find_bin(6.0), BinLookup::Overflow);
        assert_eq!(h.find_bin(f64::NAN), BinLookup::Overflow);
    }

    #[test]
    fn scale_multiplies_value_and_error() {
        let mut h = series(&[0.0, 1.0, 2.0], &[2.0, 4.0], &[0.5, 1.0]);
        h.scale(-0.5);
        assert_eq!(h.content, vec![-1.0, -2.0]);
        assert_eq!(h.errors, vec![0.25, 0.5]);
    }

    #[test]
    fn divide_propagates_errors_and_guards_zero() {
        let num = series(&[0.0, 1.0, 2.0], &[2.0, 3.0], &[0.2, 0.3]);
        let den = series(&[0.0, 1.0, 2.0], &[4.0, 0.0], &[0.4, 0.1]);
        let r = num.divide(&den).unwrap();
        assert_relative_eq!(r.value(0), 0.5);
        // sqrt((0.2/4)^2 + (2*0.4/16)^2)
        assert_relative_eq!(r.error(0), 0.005_f64.sqrt(), epsilon = 1e-12);
        assert_eq!(r.value(1), 0.0);
        assert_eq!(r.error(1), 0.0);

        let other = series(&[0.0, 2.0], &[1.0], &[0.0]);
        assert!(num.divide(&other).is_err());
    }

    #[test]
    fn divide_rejects_shifted_edges_with_equal_count() {
        let num = series(&[0.0, 1.0, 2.0], &[2.0, 3.0], &[0.2, 0.3]);
        let shifted = series(&[0.0, 1.5, 2.0], &[4.0, 6.0], &[0.4, 0.6]);
        let err = num.divide(&shifted).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(err.to_string().contains("1.5"));
    }

    #[test]
    fn normalise_by_width_gives_density() {
        let mut h = series(&[0.0, 1.0, 3.0], &[4.0, 4.0], &[2.0, 2.0]);
        h.normalise_by_width();
        assert_eq!(h.content, vec![4.0, 2.0]);
        assert_eq!(h.errors, vec![2.0, 1.0]);
    }

    #[test]
    fn y_extent_includes_errors_and_zero() {
        let h = series(&[0.0, 1.0, 2.0], &[0.3, 0.5], &[0.1, 0.05]);
        let (lo, hi) = h.y_extent(None);
        assert_eq!(lo, 0.0);
        assert_relative_eq!(hi, 0.55);
        let (_, hi) = h.y_extent(Some(&[0.2, 0.0]));
        assert_relative_eq!(hi, 0.55);
        let (_, hi) = h.y_extent(Some(&[0.4, 0.0]));
        assert_relative_eq!(hi, 0.7);
    }

    #[test]
    fn same_binning_tolerates_rounding() {
        let a = series(&[0.0, 0.1 + 0.2, 1.0], &[0.0; 2], &[0.0; 2]);
        let b = series(&[0.0, 0.3, 1.0], &[0.0; 2], &[0.0; 2]);
        assert!(a.same_binning(&b));
    }
}
