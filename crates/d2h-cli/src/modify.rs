//! Single-histogram adjustments: padding, truncation, rebinning and scaling.

use std::path::Path;

use anyhow::{Result, bail};
use d2h_core::BinnedSeries;
use d2h_core::merge::rebin_weighted;
use d2h_core::rebin::{pad_with_empty_bins, truncate_at};

use crate::io;

/// Run-2 output binning of the rebin job.
pub(crate) const RUN2_EDGES: [f64; 10] = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 8.0, 12.0, 24.0];
/// Branching ratio divided out by the rebin job.
pub(crate) const DEFAULT_BR: f64 = 0.0623;
/// Selected events of the LHC23 pass4 thin sample.
pub(crate) const DEFAULT_EV_SEL: f64 = 258_442_910_841.0;
/// Normalisation events of the LHC23 pass4 thin sample.
pub(crate) const DEFAULT_NORM: f64 = 3.0077675e11;

fn log_bins(stage: &str, s: &BinnedSeries) {
    for i in 0..s.n_bins() {
        tracing::debug!(
            stage,
            bin = i,
            low = s.low_edge(i),
            up = s.up_edge(i),
            content = s.value(i),
            error = s.error(i),
            "bin"
        );
    }
}

pub(crate) fn cmd_add_pt_bins(
    file: &Path,
    hist: &str,
    out: &Path,
    leading: &[f64],
    trailing: &[f64],
    scale: f64,
) -> Result<()> {
    io::check_output(out)?;
    let source = io::open_source(file)?;
    let input = io::histogram(source.as_ref(), file, hist)?;

    let mut padded = pad_with_empty_bins(&input, leading, trailing)?;
    padded.scale(scale);
    tracing::info!(
        hist,
        leading = leading.len(),
        trailing = trailing.len(),
        scale,
        bins = padded.n_bins(),
        "padded histogram"
    );
    log_bins("padded", &padded);

    let mut bundle = io::new_bundle("add-pt-bins", &[file])?;
    bundle.push_histogram(padded);
    io::write_bundle(&bundle, out)
}

pub(crate) fn cmd_remove_high_pt(file: &Path, pattern: &str, out: &Path, max_val: f64) -> Result<()> {
    io::check_output(out)?;
    let source = io::open_source(file)?;
    let names = source.histogram_names_matching(pattern)?;
    tracing::info!(pattern, histograms = ?names, "selected histograms");
    if names.is_empty() {
        bail!("no histogram in {} matches '{}'", file.display(), pattern);
    }

    let mut bundle = io::new_bundle("remove-high-pt", &[file])?;
    for name in &names {
        let hist = io::histogram(source.as_ref(), file, name)?;
        let truncated = truncate_at(&hist, max_val)?;
        tracing::info!(hist = %name, from = hist.n_bins(), to = truncated.n_bins(), "truncated");
        log_bins("truncated", &truncated);
        bundle.push_histogram(truncated);
    }
    io::write_bundle(&bundle, out)
}

pub(crate) fn cmd_rebin(
    file: &Path,
    hist: &str,
    out_hist: &str,
    out: &Path,
    edges: &[f64],
    factor: f64,
) -> Result<()> {
    io::check_output(out)?;
    let source = io::open_source(file)?;
    let mut input = io::histogram(source.as_ref(), file, hist)?;
    log_bins("input", &input);

    input.scale(factor);
    let rebinned = rebin_weighted(&input, edges)?.renamed(out_hist);
    tracing::info!(hist, out_hist, factor, bins = rebinned.n_bins(), "rebinned");
    log_bins("rebinned", &rebinned);

    let mut bundle = io::new_bundle("rebin", &[file])?;
    bundle.push_histogram(rebinned);
    io::write_bundle(&bundle, out)
}

/// Scale factor of the scale job: explicit, or selected over normalisation events.
pub(crate) fn normalisation_factor(factor: Option<f64>, ev_sel: f64, norm: f64) -> Result<f64> {
    if let Some(f) = factor {
        return Ok(f);
    }
    if norm == 0.0 {
        bail!("normalisation event count is zero");
    }
    Ok(ev_sel / norm)
}

pub(crate) fn cmd_scale(file: &Path, hist: &str, out_hist: &str, out: &Path, factor: f64) -> Result<()> {
    io::check_output(out)?;
    let source = io::open_source(file)?;
    let mut scaled = io::histogram(source.as_ref(), file, hist)?.renamed(out_hist);
    scaled.scale(factor);
    tracing::info!(hist, out_hist, factor, "scaled");

    let mut bundle = io::new_bundle("scale", &[file])?;
    bundle.push_histogram(scaled);
    io::write_bundle(&bundle, out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn normalisation_factor_prefers_explicit_value() {
        assert_relative_eq!(normalisation_factor(Some(2.0), 1.0, 4.0).unwrap(), 2.0);
        assert_relative_eq!(normalisation_factor(None, 1.0, 4.0).unwrap(), 0.25);
        assert!(normalisation_factor(None, 1.0, 0.0).is_err());
    }

    #[test]
    fn default_sample_factor() {
        let f = normalisation_factor(None, DEFAULT_EV_SEL, DEFAULT_NORM).unwrap();
        assert_relative_eq!(f, 0.859_252, epsilon = 1e-6);
    }
}
