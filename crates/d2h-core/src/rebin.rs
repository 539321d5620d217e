//! Binning changes: padding with empty bins, truncation at high pT and
//! regrouping of adjacent bins.

use crate::series::{BinLookup, BinnedSeries};
use crate::{Error, Result};

/// Extend the binning with empty bins below and above the existing range.
///
/// New edges are `leading ++ edges ++ trailing`. Source bin `i` ends up at
/// index `i + leading.len()`, the added bins hold `0 ± 0`.
pub fn pad_with_empty_bins(
    series: &BinnedSeries,
    leading: &[f64],
    trailing: &[f64],
) -> Result<BinnedSeries> {
    if let Some(&last) = leading.last()
        && last >= series.x_min()
    {
        return Err(Error::Validation(format!(
            "leading edge {} is not below the first edge {} of '{}'",
            last,
            series.x_min(),
            series.name
        )));
    }
    if let Some(&first) = trailing.first()
        && first <= series.x_max()
    {
        return Err(Error::Validation(format!(
            "trailing edge {} is not above the last edge {} of '{}'",
            first,
            series.x_max(),
            series.name
        )));
    }

    let mut edges = Vec::with_capacity(leading.len() + series.bin_edges.len() + trailing.len());
    edges.extend_from_slice(leading);
    edges.extend_from_slice(&series.bin_edges);
    edges.extend_from_slice(trailing);

    let offset = leading.len();
    let mut out = BinnedSeries::new(series.name.clone(), edges)?;
    out.title = series.title.clone();
    out.x_label = series.x_label.clone();
    out.y_label = series.y_label.clone();
    for i in 0..series.n_bins() {
        out.set_bin(i + offset, series.value(i), series.error(i));
    }
    Ok(out)
}

/// Drop every bin at or above the bin that contains `max_x`.
///
/// The result ends at the low edge of the bin containing `max_x`. A `max_x`
/// past the last edge keeps all bins.
pub fn truncate_at(series: &BinnedSeries, max_x: f64) -> Result<BinnedSeries> {
    let keep = match series.find_bin(max_x) {
        BinLookup::Underflow => 0,
        BinLookup::Bin(i) => i,
        BinLookup::Overflow => series.n_bins(),
    };
    if keep == 0 {
        return Err(Error::Validation(format!(
            "truncating '{}' at {} leaves no bins (first edge {})",
            series.name,
            max_x,
            series.x_min()
        )));
    }
    let mut out = BinnedSeries::from_parts(
        series.name.clone(),
        series.bin_edges[..=keep].to_vec(),
        series.content[..keep].to_vec(),
        series.errors[..keep].to_vec(),
    )?;
    out.title = series.title.clone();
    out.x_label = series.x_label.clone();
    out.y_label = series.y_label.clone();
    Ok(out)
}

/// Merge every `factor` adjacent bins into one, like `TH1::Rebin(factor)`.
///
/// Values add, errors add in quadrature. When the bin count is not a multiple
/// of `factor` the leftover bins at the top of the range are dropped.
pub fn merge_adjacent(series: &BinnedSeries, factor: usize) -> Result<BinnedSeries> {
    if factor == 0 {
        return Err(Error::Validation(format!("cannot regroup '{}' by 0 bins", series.name)));
    }
    let n_out = series.n_bins() / factor;
    if n_out == 0 {
        return Err(Error::Validation(format!(
            "cannot regroup {} bins of '{}' by {}",
            series.n_bins(),
            series.name,
            factor
        )));
    }
    let dropped = series.n_bins() - n_out * factor;
    if dropped > 0 {
        tracing::warn!(
            hist = %series.name,
            bins = series.n_bins(),
            factor,
            dropped,
            "bin count is not a multiple of the regrouping factor"
        );
    }

    let edges: Vec<f64> = (0..=n_out).map(|i| series.bin_edges[i * factor]).collect();
    let mut content = Vec::with_capacity(n_out);
    let mut errors = Vec::with_capacity(n_out);
    for chunk in 0..n_out {
        let bins = chunk * factor..(chunk + 1) * factor;
        content.push(series.content[bins.clone()].iter().sum());
        errors.push(series.errors[bins].iter().map(|e| e * e).sum::<f64>().sqrt());
    }
    let mut out = BinnedSeries::from_parts(series.name.clone(), edges, content, errors)?;
    out.title = series.title.clone();
    out.x_label = series.x_label.clone();
    out.y_label = series.y_label.clone();
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample() -> BinnedSeries {
        BinnedSeries::from_parts(
            "h",
            vec![1.0, 2.0, 4.0, 8.0, 16.0],
            vec![5.0, 4.0, 3.0, 2.0],
            vec![0.5, 0.4, 0.3, 0.2],
        )
        .unwrap()
    }

    #[test]
    fn padded_content_recoverable_by_offset() {
        let h = sample();
        let p = pad_with_empty_bins(&h, &[0.0], &[24.0, 25.0]).unwrap();
        assert_eq!(p.bin_edges, vec![0.0, 1.0, 2.0, 4.0, 8.0, 16.0, 24.0, 25.0]);
        assert_eq!(p.n_bins(), h.n_bins() + 3);
        for i in 0..h.n_bins() {
            assert_eq!(p.value(i + 1), h.value(i));
            assert_eq!(p.error(i + 1), h.error(i));
        }
        assert_eq!((p.value(0), p.error(0)), (0.0, 0.0));
        assert_eq!((p.value(5), p.value(6)), (0.0, 0.0));
    }

    #[test]
    fn padding_without_extra_edges_is_identity() {
        let h = sample();
        assert_eq!(pad_with_empty_bins(&h, &[], &[]).unwrap(), h);
    }

    #[test]
    fn padding_rejects_overlapping_edges() {
        let h = sample();
        assert!(pad_with_empty_bins(&h, &[1.0], &[]).is_err());
        assert!(pad_with_empty_bins(&h, &[], &[16.0]).is_err());
        assert!(pad_with_empty_bins(&h, &[0.5, 0.2], &[]).is_err());
    }

    #[test]
    fn truncate_drops_bin_containing_max() {
        let h = sample();
        let t = truncate_at(&h, 8.0).unwrap();
        assert_eq!(t.bin_edges, vec![1.0, 2.0, 4.0, 8.0]);
        assert_eq!(t.content, vec![5.0, 4.0, 3.0]);

        let t = truncate_at(&h, 9.5).unwrap();
        assert_eq!(t.bin_edges, vec![1.0, 2.0, 4.0, 8.0]);
    }

    #[test]
    fn truncate_past_range_keeps_everything() {
        let h = sample();
        assert_eq!(truncate_at(&h, 100.0).unwrap(), h);
    }

    #[test]
    fn truncate_below_first_bin_fails() {
        let h = sample();
        assert!(truncate_at(&h, 1.5).is_err());
        assert!(truncate_at(&h, 0.0).is_err());
    }

    #[test]
    fn merge_adjacent_sums_values_and_errors_in_quadrature() {
        let h = BinnedSeries::from_parts(
            "hmass45",
            vec![2.0, 2.1, 2.2, 2.3, 2.4, 2.5],
            vec![1.0, 2.0, 3.0, 4.0, 5.0],
            vec![3.0, 4.0, 1.0, 1.0, 9.0],
        )
        .unwrap();
        let r = merge_adjacent(&h, 2).unwrap();
        assert_eq!(r.bin_edges, vec![2.0, 2.2, 2.4]);
        assert_eq!(r.content, vec![3.0, 7.0]);
        assert_eq!(r.errors[0], 5.0);
        assert_relative_eq!(r.errors[1], 2.0_f64.sqrt(), epsilon = 1e-12);

        assert_eq!(merge_adjacent(&h, 1).unwrap(), h);
        assert!(merge_adjacent(&h, 0).is_err());
        assert!(merge_adjacent(&h, 6).is_err());
    }
}
