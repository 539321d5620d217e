//! Systematic uncertainties: quadrature combination, relative deviations and
//! the per-bin boxes drawn around measured points.

use serde::{Deserialize, Serialize};

use crate::series::BinnedSeries;
use crate::{Error, Result};

/// Absolute uncertainty from independent relative contributions:
/// `value · sqrt(Σ eᵢ²)`. An empty list gives `0`.
pub fn combine_in_quadrature(relative: &[f64], value: f64) -> f64 {
    if relative.is_empty() {
        return 0.0;
    }
    relative.iter().map(|e| e * e).sum::<f64>().sqrt() * value
}

/// Combined relative uncertainty in percent: `100 · sqrt(Σ eᵢ²)`.
pub fn combined_percent(relative: &[f64]) -> f64 {
    100.0 * relative.iter().map(|e| e * e).sum::<f64>().sqrt()
}

/// `(variant - central) / central`, or `+∞` when the central value is zero.
pub fn relative_deviation(variant: f64, central: f64) -> f64 {
    if central == 0.0 {
        return f64::INFINITY;
    }
    (variant - central) / central
}

/// Per-bin RMS of the relative deviations of `variants` from `central`, in percent.
///
/// Variants with a different number of bins are ignored. Returns `None` when no
/// variant is usable.
pub fn rms_relative_systematics(
    central: &BinnedSeries,
    variants: &[&BinnedSeries],
) -> Option<Vec<f64>> {
    let usable: Vec<&BinnedSeries> =
        variants.iter().copied().filter(|v| v.n_bins() == central.n_bins()).collect();
    if usable.is_empty() {
        return None;
    }
    let count = usable.len() as f64;
    let out = (0..central.n_bins())
        .map(|i| {
            let sum2: f64 = usable
                .iter()
                .map(|v| {
                    let d = relative_deviation(v.value(i), central.value(i));
                    d * d
                })
                .sum();
            100.0 * (sum2 / count).sqrt()
        })
        .collect();
    Some(out)
}

/// A rectangle around one measured point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SystBox {
    /// Index of the source bin.
    pub bin: usize,
    /// Box centre (bin centre).
    pub x: f64,
    /// Measured value.
    pub y: f64,
    /// Horizontal half-width.
    pub half_width: f64,
    /// Vertical half-height (absolute systematic uncertainty).
    pub half_height: f64,
}

/// Build systematic boxes for `series`, one per bin with non-zero content.
///
/// `relative[i]` lists the independent relative contributions of bin `i`.
/// Boxes are half a bin wide.
pub fn syst_boxes(series: &BinnedSeries, relative: &[Vec<f64>]) -> Result<Vec<SystBox>> {
    if relative.len() < series.n_bins() {
        return Err(Error::Validation(format!(
            "'{}' has {} bins but systematics are given for {}",
            series.name,
            series.n_bins(),
            relative.len()
        )));
    }
    let mut boxes = Vec::with_capacity(series.n_bins());
    for (i, rel) in relative.iter().enumerate().take(series.n_bins()) {
        let y = series.value(i);
        let half_height = combine_in_quadrature(rel, y);
        tracing::info!(
            series = %series.name,
            bin = i + 1,
            combined_percent = format!("{:.0}", combined_percent(rel)),
            syst = half_height,
            "systematic uncertainty"
        );
        if y == 0.0 {
            continue;
        }
        boxes.push(SystBox {
            bin: i,
            x: series.bin_center(i),
            y,
            half_width: series.bin_width(i) / 4.0,
            half_height,
        });
    }
    Ok(boxes)
}

/// Absolute per-bin half-heights of `boxes`, laid out over `n_bins` (missing bins are 0).
pub fn half_heights(boxes: &[SystBox], n_bins: usize) -> Vec<f64> {
    let mut out = vec![0.0; n_bins];
    for b in boxes {
        if let Some(slot) = out.get_mut(b.bin) {
            *slot = b.half_height;
        }
    }
    out
}
