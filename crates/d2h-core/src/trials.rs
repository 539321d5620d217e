//! Multitrial yield systematics.
//!
//! A "trial" is one invariant-mass fit variation (fit range, background shape,
//! fixed width, ...). Each trial produces one raw-yield histogram; the spread of
//! the accepted trials around the central one is the yield-extraction systematic.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Compound trial names built from classes of fit variations.
///
/// Starts from the empty combination and, for every class, appends
/// `"{comb}-{trial}"` for each existing combination and each trial of the
/// class. Combinations therefore accumulate: the result contains the empty
/// root, every single variation, and every cross-class compound.
pub fn generate_trials<S: AsRef<str>>(classes: &[Vec<S>]) -> Vec<String> {
    let mut combinations = vec![String::new()];
    for class in classes {
        let mut class_comb = Vec::with_capacity(combinations.len() * class.len());
        for comb in &combinations {
            for trial in class {
                class_comb.push(format!("{}-{}", comb, trial.as_ref()));
            }
        }
        combinations.extend(class_comb);
    }
    combinations
}

/// Trial classes used by the D-meson multitrial when none are configured.
pub fn default_trial_classes() -> Vec<Vec<String>> {
    let raw: [&[&str]; 6] = [
        &["min_narrow", "min_narrow2", "min_wide", "min_wide2"],
        &["max_narrow", "max_narrow2", "max_wide", "max_wide2"],
        &["fixed_sigma"],
        &["fixed_mean"],
        &["double_gauss"],
        &["poly3"],
    ];
    raw.iter().map(|c| c.iter().map(|s| s.to_string()).collect()).collect()
}

/// Acceptance criteria for one trial in one pT bin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrialSelection {
    /// Reject trials whose χ²/ndf is below this value.
    pub chi2_min: Option<f64>,
    /// Reject trials whose χ²/ndf is above this value.
    pub chi2_max: Option<f64>,
    /// Reject trials whose yield is not strictly above this value.
    pub min_yield: f64,
}

impl Default for TrialSelection {
    fn default() -> Self {
        Self { chi2_min: None, chi2_max: None, min_yield: 1.0 }
    }
}

impl TrialSelection {
    /// Whether a fit with `raw_yield` and `chi2` passes.
    pub fn accepts(&self, raw_yield: f64, chi2: f64) -> bool {
        if let Some(lo) = self.chi2_min
            && (chi2.is_nan() || chi2 < lo)
        {
            return false;
        }
        if let Some(hi) = self.chi2_max
            && (chi2.is_nan() || chi2 > hi)
        {
            return false;
        }
        raw_yield > self.min_yield
    }
}

/// Accepted trials of one pT bin, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PtBinTrials {
    /// Lower pT edge.
    pub pt_min: f64,
    /// Upper pT edge.
    pub pt_max: f64,
    /// Trial names.
    pub names: Vec<String>,
    /// Raw yields.
    pub yields: Vec<f64>,
    /// Raw-yield errors.
    pub errors: Vec<f64>,
    /// χ²/ndf of each fit.
    pub chi2: Vec<f64>,
}

impl PtBinTrials {
    /// Empty collection for the `[pt_min, pt_max)` bin.
    pub fn new(pt_min: f64, pt_max: f64) -> Self {
        Self { pt_min, pt_max, ..Default::default() }
    }

    /// Record one accepted trial.
    pub fn push(&mut self, name: impl Into<String>, raw_yield: f64, error: f64, chi2: f64) {
        self.names.push(name.into());
        self.yields.push(raw_yield);
        self.errors.push(error);
        self.chi2.push(chi2);
    }

    /// Number of accepted trials.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether no trial was accepted.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Index of the trial called `name`.
    pub fn central_index(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// File-name friendly label built from the shortest decimal form of each
    /// edge: `2.0, 4.0` gives `"2_4"` and `2.5, 4.0` gives `"2.5_4"`.
    /// A configuration edge written as `2` or as `2.0` yields the same label.
    pub fn label(&self) -> String {
        format!("{}_{}", self.pt_min, self.pt_max)
    }
}

/// Summary statistics of the trial yields around the central trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialStats {
    /// Mean of all yields.
    pub mean: f64,
    /// Population standard deviation of all yields.
    pub std_dev: f64,
    /// RMS of `(y - y_c)/y_c` over the non-central trials.
    pub rmse: f64,
    /// `y / y_c` for every non-central trial.
    pub ratios: Vec<f64>,
    /// Number of trials, central included.
    pub n_trials: usize,
}

impl TrialStats {
    /// Compute the statistics of `yields` relative to `yields[central]`.
    pub fn compute(yields: &[f64], central: usize) -> Result<Self> {
        let central_yield = *yields.get(central).ok_or_else(|| {
            Error::Validation(format!(
                "central trial index {} out of range ({} trials)",
                central,
                yields.len()
            ))
        })?;
        if central_yield == 0.0 {
            return Err(Error::Computation("central trial has zero yield".into()));
        }
        let (mean, std_dev) = mean_std(yields);
        let others = yields.iter().enumerate().filter(|(i, _)| *i != central).map(|(_, y)| *y);
        let ratios: Vec<f64> = others.clone().map(|y| y / central_yield).collect();
        let rmse = if ratios.is_empty() {
            0.0
        } else {
            let sum2: f64 = others
                .map(|y| {
                    let d = (y - central_yield) / central_yield;
                    d * d
                })
                .sum();
            (sum2 / ratios.len() as f64).sqrt()
        };
        Ok(Self { mean, std_dev, rmse, ratios, n_trials: yields.len() })
    }
}

/// Mean and population standard deviation.
pub fn mean_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    (mean, var.sqrt())
}

/// Narrow a y-range dominated by outliers.
///
/// When the span of `current` exceeds 30 standard deviations of `values`, the
/// range `mean ± 10σ` is returned instead.
pub fn narrowed_range(values: &[f64], current: (f64, f64)) -> Option<(f64, f64)> {
    let (mean, std) = mean_std(values);
    if std > 0.0 && current.1 - current.0 > 30.0 * std {
        Some((mean - 10.0 * std, mean + 10.0 * std))
    } else {
        None
    }
}

/// Equal-width histogram of `values` over `[min, max]` with `n_bins` bins.
///
/// The last bin is closed on the right. A degenerate range is widened by
/// ±0.5 around the single value. Returns `(edges, counts)`.
pub fn histogram_counts(values: &[f64], n_bins: usize) -> (Vec<f64>, Vec<f64>) {
    let n_bins = n_bins.max(1);
    let (mut lo, mut hi) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if !lo.is_finite() || !hi.is_finite() {
        lo = 0.0;
        hi = 1.0;
    } else if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }
    let width = (hi - lo) / n_bins as f64;
    let edges: Vec<f64> = (0..=n_bins).map(|i| lo + i as f64 * width).collect();
    let mut counts = vec![0.0; n_bins];
    for &v in values {
        let idx = (((v - lo) / width) as usize).min(n_bins - 1);
        counts[idx] += 1.0;
    }
    (edges, counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn trials_accumulate_across_classes() {
        let classes = vec![vec!["a1", "a2"], vec!["b"]];
        let t = generate_trials(&classes);
        assert_eq!(t, vec!["", "-a1", "-a2", "-b", "-a1-b", "-a2-b"]);
    }

    #[test]
    fn default_classes_give_400_combinations() {
        let t = generate_trials(&default_trial_classes());
        assert_eq!(t.len(), 400);
        assert!(t.contains(&"-min_wide-max_narrow2-fixed_mean-poly3".to_string()));
    }

    #[test]
    fn selection_applies_chi2_window_and_yield_floor() {
        let sel = TrialSelection { chi2_min: Some(0.5), chi2_max: Some(2.0), min_yield: 1.0 };
        assert!(sel.accepts(100.0, 1.0));
        assert!(!sel.accepts(100.0, 0.2));
        assert!(!sel.accepts(100.0, 2.5));
        assert!(!sel.accepts(1.0, 1.0));
        assert!(!sel.accepts(100.0, f64::NAN));
        assert!(TrialSelection::default().accepts(1.5, 1e6));
    }

    #[test]
    fn labels_use_shortest_edge_form() {
        assert_eq!(PtBinTrials::new(1.0, 2.0).label(), "1_2");
        assert_eq!(PtBinTrials::new(2.5, 4.0).label(), "2.5_4");
        assert_eq!(PtBinTrials::new(0.75, 12.0).label(), "0.75_12");
    }

    #[test]
    fn stats_exclude_central_from_ratios() {
        let yields = [100.0, 110.0, 90.0];
        let s = TrialStats::compute(&yields, 0).unwrap();
        assert_relative_eq!(s.mean, 100.0);
        assert_relative_eq!(s.std_dev, (200.0_f64 / 3.0).sqrt(), epsilon = 1e-12);
        assert_eq!(s.ratios.len(), 2);
        assert_relative_eq!(s.ratios[0], 1.1, epsilon = 1e-12);
        assert_relative_eq!(s.rmse, 0.1, epsilon = 1e-12);
        assert_eq!(s.n_trials, 3);
    }

    #[test]
    fn stats_reject_zero_central() {
        assert!(TrialStats::compute(&[0.0, 1.0], 0).is_err());
        assert!(TrialStats::compute(&[1.0], 3).is_err());
    }

    #[test]
    fn narrowing_only_for_outlier_dominated_ranges() {
        let values = [10.0, 10.1, 9.9, 10.0];
        assert!(narrowed_range(&values, (9.8, 10.2)).is_none());
        let (lo, hi) = narrowed_range(&values, (0.0, 1000.0)).unwrap();
        assert!(lo > 9.0 && hi < 11.0);
    }

    #[test]
    fn histogram_counts_every_value() {
        let (edges, counts) = histogram_counts(&[0.0, 0.2, 1.0, 1.0], 2);
        assert_eq!(edges.len(), 3);
        assert_eq!(counts.iter().sum::<f64>(), 4.0);
        assert_eq!(counts[1], 2.0);
        let (edges, counts) = histogram_counts(&[2.0], 10);
        assert_relative_eq!(edges[0], 1.5);
        assert_eq!(counts.iter().sum::<f64>(), 1.0);
    }
}
