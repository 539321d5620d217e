//! Bin remapping: width-weighted merging and per-bin selection across inputs.
//!
//! Every "copy bin i from file i" and "merge bins 7+8 into one" step of the
//! macros goes through this module.

use std::ops::Range;

use crate::bundle::ErrorGraph;
use crate::series::{BinnedSeries, edges_match};
use crate::{Error, Result};

/// One bin taking part in a weighted average.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedBin {
    /// Bin value.
    pub value: f64,
    /// Statistical error of the value.
    pub error: f64,
    /// Bin width used as weight.
    pub width: f64,
}

/// Width-weighted average of `bins`.
///
/// Value is `Σ(vᵢ·wᵢ)/Σwᵢ`, error is `sqrt(Σ(wᵢ·eᵢ/Σw)²)`.
pub fn weighted_average(bins: &[WeightedBin]) -> Result<(f64, f64)> {
    if bins.is_empty() {
        return Err(Error::Validation("weighted average of zero bins".into()));
    }
    let total_width: f64 = bins.iter().map(|b| b.width).sum();
    if total_width == 0.0 || !total_width.is_finite() {
        return Err(Error::Validation(format!(
            "weighted average needs a positive total width, got {}",
            total_width
        )));
    }
    let value = bins.iter().map(|b| b.value * b.width).sum::<f64>() / total_width;
    let err2: f64 = bins
        .iter()
        .map(|b| {
            let e = b.width * b.error / total_width;
            e * e
        })
        .sum();
    Ok((value, err2.sqrt()))
}

/// Remap `series` onto `target_edges`.
///
/// Every target bin must be covered exactly by one or more consecutive source
/// bins. Single covering bins are copied, groups are merged with
/// [`weighted_average`].
pub fn rebin_weighted(series: &BinnedSeries, target_edges: &[f64]) -> Result<BinnedSeries> {
    let mut out = BinnedSeries::new(series.name.clone(), target_edges.to_vec())?;
    out.title = series.title.clone();
    out.x_label = series.x_label.clone();
    out.y_label = series.y_label.clone();

    let src = &series.bin_edges;
    let mut cursor = position_of_edge(src, target_edges[0]).ok_or_else(|| {
        Error::Validation(format!(
            "target edge {} of '{}' is not an edge of the source binning",
            target_edges[0], series.name
        ))
    })?;

    for t in 0..out.n_bins() {
        let hi = out.up_edge(t);
        let first = cursor;
        while cursor < series.n_bins() && !edges_match(src[cursor + 1], hi) && src[cursor + 1] < hi
        {
            cursor += 1;
        }
        if cursor >= series.n_bins() || !edges_match(src[cursor + 1], hi) {
            return Err(Error::Validation(format!(
                "target edge {} of '{}' is not an edge of the source binning",
                hi, series.name
            )));
        }
        let group: Vec<WeightedBin> = (first..=cursor)
            .map(|i| WeightedBin {
                value: series.value(i),
                error: series.error(i),
                width: series.bin_width(i),
            })
            .collect();
        let (value, error) = if group.len() == 1 {
            (group[0].value, group[0].error)
        } else {
            tracing::debug!(
                series = %series.name,
                from = first,
                to = cursor,
                lo = out.low_edge(t),
                hi,
                "merging source bins"
            );
            weighted_average(&group)?
        };
        out.set_bin(t, value, error);
        cursor += 1;
    }
    Ok(out)
}

/// Clone `template` and overwrite bin `i` with bin `i` of `inputs[i]`.
///
/// This is the "one input file per pT bin" merge: the i-th input was produced
/// with the i-th bin as its reference, so only that bin is taken from it.
pub fn select_bins(template: &BinnedSeries, inputs: &[&BinnedSeries]) -> Result<BinnedSeries> {
    if inputs.len() > template.n_bins() {
        return Err(Error::Validation(format!(
            "{} inputs but template '{}' has only {} bins",
            inputs.len(),
            template.name,
            template.n_bins()
        )));
    }
    let mut out = template.clone();
    for (i, input) in inputs.iter().enumerate() {
        if input.n_bins() <= i {
            return Err(Error::Validation(format!(
                "input {} ('{}') has {} bins, cannot take bin {}",
                i,
                input.name,
                input.n_bins(),
                i
            )));
        }
        tracing::debug!(bin = i, source = %input.name, value = input.value(i), "taking bin");
        out.set_bin(i, input.value(i), input.error(i));
    }
    Ok(out)
}

/// Set value and error of every bin in `range` (clamped to the series) to zero.
pub fn zero_bins(series: &mut BinnedSeries, range: Range<usize>) {
    let end = range.end.min(series.n_bins());
    for i in range.start.min(end)..end {
        series.set_bin(i, 0.0, 0.0);
    }
}

/// Zero the last `n` bins.
pub fn zero_trailing(series: &mut BinnedSeries, n: usize) {
    let total = series.n_bins();
    zero_bins(series, total.saturating_sub(n)..total);
}

/// Graph counterpart of [`select_bins`]: point `i` comes from `inputs[i]`.
pub fn select_points(template: &ErrorGraph, inputs: &[&ErrorGraph]) -> Result<ErrorGraph> {
    if inputs.len() > template.len() {
        return Err(Error::Validation(format!(
            "{} inputs but template graph '{}' has only {} points",
            inputs.len(),
            template.name,
            template.len()
        )));
    }
    let mut out = template.clone();
    for (i, input) in inputs.iter().enumerate() {
        if input.len() <= i {
            return Err(Error::Validation(format!(
                "input graph {} ('{}') has {} points, cannot take point {}",
                i,
                input.name,
                input.len(),
                i
            )));
        }
        tracing::debug!(point = i, source = %input.name, y = input.y[i], "taking point");
        out.y[i] = input.y[i];
        out.ey_low[i] = input.ey_low[i];
        out.ey_high[i] = input.ey_high[i];
    }
    Ok(out)
}

fn position_of_edge(edges: &[f64], x: f64) -> Option<usize> {
    edges.iter().position(|&e| edges_match(e, x))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn wb(value: f64, error: f64, width: f64) -> WeightedBin {
        WeightedBin { value, error, width }
    }

    #[test]
    fn pair_average_matches_closed_form() {
        let (a, b) = (wb(3.0, 0.3, 1.0), wb(6.0, 0.4, 2.0));
        let (v, e) = weighted_average(&[a, b]).unwrap();
        assert_relative_eq!(v, (3.0 * 1.0 + 6.0 * 2.0) / 3.0);
        let expected = ((1.0 * 0.3 / 3.0_f64).powi(2) + (2.0 * 0.4 / 3.0_f64).powi(2)).sqrt();
        assert_relative_eq!(e, expected, epsilon = 1e-15);
    }

    #[test]
    fn average_is_commutative() {
        let (a, b) = (wb(0.12, 0.01, 2.0), wb(0.31, 0.05, 4.0));
        let ab = weighted_average(&[a, b]).unwrap();
        let ba = weighted_average(&[b, a]).unwrap();
        assert_relative_eq!(ab.0, ba.0, epsilon = 1e-15);
        assert_relative_eq!(ab.1, ba.1, epsilon = 1e-15);
    }

    #[test]
    fn average_rejects_degenerate_input() {
        assert!(weighted_average(&[]).is_err());
        assert!(weighted_average(&[wb(1.0, 0.1, 0.0)]).is_err());
    }

    #[test]
    fn rebin_merges_aligned_groups() {
        // 0..6 in unit bins, then 6-7, 7-8, 8-10, 10-12, 12-24
        let edges = vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 10.0, 12.0, 24.0];
        let content: Vec<f64> = (0..11).map(|i| i as f64 + 1.0).collect();
        let errors = vec![0.1; 11];
        let h = BinnedSeries::from_parts("h", edges, content, errors).unwrap();

        let target = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 8.0, 12.0, 24.0];
        let r = rebin_weighted(&h, &target).unwrap();
        assert_eq!(r.n_bins(), 9);
        for i in 0..6 {
            assert_eq!(r.value(i), h.value(i));
            assert_eq!(r.error(i), h.error(i));
        }
        // 6-8: bins of width 1 with values 7 and 8
        assert_relative_eq!(r.value(6), 7.5);
        assert_relative_eq!(r.error(6), (2.0 * 0.05_f64.powi(2)).sqrt(), epsilon = 1e-15);
        // 8-12: bins of width 2 with values 9 and 10
        assert_relative_eq!(r.value(7), 9.5);
        assert_eq!(r.value(8), 11.0);
    }

    #[test]
    fn rebin_rejects_misaligned_edges() {
        let h = BinnedSeries::new("h", vec![0.0, 1.0, 2.0, 4.0]).unwrap();
        assert!(rebin_weighted(&h, &[0.0, 1.5, 4.0]).is_err());
        assert!(rebin_weighted(&h, &[0.5, 2.0]).is_err());
        assert!(rebin_weighted(&h, &[0.0, 2.0, 5.0]).is_err());
        assert!(rebin_weighted(&h, &[1.0, 4.0]).is_ok());
    }

    #[test]
    fn select_takes_diagonal() {
        let edges = vec![0.0, 1.0, 2.0, 3.0];
        let inputs: Vec<BinnedSeries> = (0..3)
            .map(|k| {
                let c = (0..3).map(|i| (10 * k + i) as f64).collect();
                BinnedSeries::from_parts(format!("h{k}"), edges.clone(), c, vec![0.5; 3]).unwrap()
            })
            .collect();
        let refs: Vec<&BinnedSeries> = inputs.iter().collect();
        let merged = select_bins(&inputs[2], &refs[..2]).unwrap();
        assert_eq!(merged.content, vec![0.0, 11.0, 22.0]);
        assert_eq!(merged.name, "h2");
    }

    #[test]
    fn select_rejects_short_inputs() {
        let long = BinnedSeries::new("a", vec![0.0, 1.0, 2.0]).unwrap();
        let short = BinnedSeries::new("b", vec![0.0, 1.0]).unwrap();
        assert!(select_bins(&long, &[&long, &short]).is_err());
        assert!(select_bins(&short, &[&short, &short]).is_err());
    }

    #[test]
    fn zeroing_is_clamped() {
        let mut h =
            BinnedSeries::from_parts("h", vec![0.0, 1.0, 2.0, 3.0], vec![1.0; 3], vec![1.0; 3])
                .unwrap();
        zero_bins(&mut h, 2..10);
        assert_eq!(h.content, vec![1.0, 1.0, 0.0]);
        zero_trailing(&mut h, 5);
        assert_eq!(h.content, vec![0.0; 3]);
    }

    #[test]
    fn select_points_takes_diagonal() {
        let graph = |name: &str, y: f64| {
            ErrorGraph::symmetric(name, vec![1.0, 2.0], vec![y, y], vec![0.5, 0.5], vec![0.1, 0.2])
                .unwrap()
        };
        let (a, b) = (graph("a", 10.0), graph("b", 20.0));
        let merged = select_points(&b, &[&a, &b]).unwrap();
        assert_eq!(merged.name, "b");
        assert_eq!(merged.y, vec![10.0, 20.0]);
        assert_eq!(merged.ey_high, vec![0.1, 0.2]);
        assert!(select_points(&a, &[&a, &b, &b]).is_err());
    }
}
