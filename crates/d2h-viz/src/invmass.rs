use d2h_core::{BinnedSeries, Error, ErrorGraph, Result};
use serde::{Deserialize, Serialize};

use crate::ArtifactMeta;

/// Schema tag of [`InvMassArtifact`].
pub const INVMASS_SCHEMA: &str = "d2h_invmass_v1";

const GEV_TO_MEV: f64 = 1000.0;

/// A fitted function sampled along the mass axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitCurve {
    /// Legend text.
    pub label: String,
    /// Masses.
    pub x: Vec<f64>,
    /// Function values.
    #[serde(with = "d2h_core::float_vec")]
    pub y: Vec<f64>,
}

impl FitCurve {
    /// Curve through the points of `graph`.
    pub fn from_graph(label: impl Into<String>, graph: &ErrorGraph) -> Self {
        Self { label: label.into(), x: graph.x.clone(), y: graph.y.clone() }
    }
}

/// Fit results printed on a panel. Mass values are in GeV/c².
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FitSummary {
    /// Peak position and its error.
    pub mean: Option<(f64, f64)>,
    /// Peak width.
    pub sigma: Option<f64>,
    /// Raw yield and its error.
    pub raw_yield: Option<(f64, f64)>,
}

/// Axis title, range and text of a mass panel.
#[derive(Debug, Clone, Default)]
pub struct InvMassStyle {
    /// X-axis title.
    pub x_label: String,
    /// Visible mass range.
    pub mass_range: [f64; 2],
    /// Multiplicity class text; not drawn when empty.
    pub mult_text: String,
    /// Decay channel text.
    pub decay_text: String,
}

/// One pT bin: the mass spectrum with its fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvMassPanel {
    /// Lower pT edge.
    pub pt_min: f64,
    /// Upper pT edge.
    pub pt_max: f64,
    /// X-axis title.
    pub x_label: String,
    /// Y-axis title (counts per bin width).
    pub y_label: String,
    /// Mass bin edges.
    pub bin_edges: Vec<f64>,
    /// Counts per bin.
    #[serde(with = "d2h_core::float_vec")]
    pub content: Vec<f64>,
    /// Count errors.
    #[serde(with = "d2h_core::float_vec")]
    pub errors: Vec<f64>,
    /// Total fit function.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<FitCurve>,
    /// Background component of the fit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<FitCurve>,
    /// Visible mass range.
    pub x_range: [f64; 2],
    /// Visible count range.
    pub y_range: [f64; 2],
    /// Text lines under the experiment header.
    pub text: Vec<String>,
}

/// Invariant-mass spectra of one or more pT bins, drawn on a grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvMassArtifact {
    /// Always [`INVMASS_SCHEMA`].
    pub schema_version: String,
    /// Provenance.
    pub meta: ArtifactMeta,
    /// System line under the experiment name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experiment_text: Option<String>,
    /// Panels per grid row.
    pub columns: usize,
    /// Panels in reading order.
    pub panels: Vec<InvMassPanel>,
}

/// `"4 < #it{p}_{T} < 5 GeV/#it{c}"`, edges rounded to integers.
pub fn pt_text(pt_min: f64, pt_max: f64) -> String {
    format!("{:.0} < #it{{p}}_{{T}} < {:.0} GeV/#it{{c}}", pt_min, pt_max)
}

/// Count range of a mass spectrum: 1.2 × (maximum + its error) on top and
/// 0.8 × (minimum − its error) at the bottom.
pub fn count_range(mass: &BinnedSeries) -> [f64; 2] {
    let n = mass.n_bins();
    let finite = (0..n).filter(|&i| mass.value(i).is_finite());
    let max_bin = finite.clone().max_by(|&a, &b| mass.value(a).total_cmp(&mass.value(b)));
    let min_bin = finite.min_by(|&a, &b| mass.value(a).total_cmp(&mass.value(b)));
    let (Some(hi), Some(lo)) = (max_bin, min_bin) else {
        return [0.0, 1.0];
    };
    let top = 1.2 * (mass.value(hi) + mass.error(hi));
    let bottom = 0.8 * (mass.value(lo) - mass.error(lo));
    if top > bottom { [bottom, top] } else { [bottom - 1.0, bottom + 1.0] }
}

impl InvMassPanel {
    /// Panel of one pT bin.
    ///
    /// The y-axis title quotes the width of the first mass bin in MeV/c².
    pub fn build(
        mass: &BinnedSeries,
        pt: [f64; 2],
        summary: FitSummary,
        curves: (Option<FitCurve>, Option<FitCurve>),
        style: InvMassStyle,
    ) -> Result<Self> {
        let [m_lo, m_hi] = style.mass_range;
        if !(m_lo.is_finite() && m_hi.is_finite() && m_hi > m_lo) {
            return Err(Error::Validation(format!(
                "mass range [{}, {}] of '{}' is empty",
                m_lo, m_hi, mass.name
            )));
        }

        let mut text = vec![pt_text(pt[0], pt[1])];
        if !style.mult_text.is_empty() {
            text.push(style.mult_text);
        }
        if let Some((mean, err)) = summary.mean {
            text.push(format!(
                "#it{{#mu}} = ({:.0} #pm {:.0}) MeV/#it{{c}}^{{2}}",
                mean * GEV_TO_MEV,
                err * GEV_TO_MEV
            ));
        }
        if let Some(sigma) = summary.sigma {
            text.push(format!("#it{{#sigma}} = {:.0} MeV/#it{{c}}^{{2}}", sigma * GEV_TO_MEV));
        }
        if let Some((s, err)) = summary.raw_yield {
            text.push(format!("#it{{S}} = {:.0} #pm {:.0}", s, err));
        }
        if !style.decay_text.is_empty() {
            text.push(style.decay_text);
        }

        let (total, background) = curves;
        Ok(Self {
            pt_min: pt[0],
            pt_max: pt[1],
            x_label: style.x_label,
            y_label: format!(
                "Counts per {:.0} MeV/#it{{c}}^{{2}}",
                mass.bin_width(0) * GEV_TO_MEV
            ),
            bin_edges: mass.bin_edges.clone(),
            content: mass.content.clone(),
            errors: mass.errors.clone(),
            total,
            background,
            x_range: style.mass_range,
            y_range: count_range(mass),
            text,
        })
    }
}

impl InvMassArtifact {
    /// Grid of `panels`, `columns` per row.
    pub fn new(panels: Vec<InvMassPanel>, columns: usize, experiment_text: Option<String>) -> Result<Self> {
        if panels.is_empty() {
            return Err(Error::Validation("invariant-mass plot without panels".into()));
        }
        Ok(Self {
            schema_version: INVMASS_SCHEMA.to_string(),
            meta: ArtifactMeta::now()?,
            experiment_text,
            columns: columns.clamp(1, panels.len()),
            panels,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn mass() -> BinnedSeries {
        let edges: Vec<f64> = (0..=5).map(|i| 2.20 + 0.02 * i as f64).collect();
        BinnedSeries::from_parts(
            "hmass45",
            edges,
            vec![40.0, 55.0, 120.0, 60.0, 38.0],
            vec![6.0, 7.0, 11.0, 8.0, 6.0],
        )
        .unwrap()
    }

    fn style() -> InvMassStyle {
        InvMassStyle {
            x_label: "#it{M}(pK#pi) (GeV/#it{c}^{2})".into(),
            mass_range: [2.2, 2.3],
            mult_text: String::new(),
            decay_text: "#Lambda_{c}^{#plus} #rightarrow pK^{#minus}#pi^{#plus} and charge conj.".into(),
        }
    }

    #[test]
    fn count_range_pads_extremes_with_their_errors() {
        let r = count_range(&mass());
        assert_relative_eq!(r[1], 1.2 * 131.0, epsilon = 1e-9);
        assert_relative_eq!(r[0], 0.8 * 32.0, epsilon = 1e-9);
    }

    #[test]
    fn panel_text_converts_to_mev() {
        let summary = FitSummary {
            mean: Some((2.2868, 0.0011)),
            sigma: Some(0.0072),
            raw_yield: Some((1234.4, 56.6)),
        };
        let p = InvMassPanel::build(&mass(), [4.0, 5.0], summary, (None, None), style()).unwrap();
        assert_eq!(p.y_label, "Counts per 20 MeV/#it{c}^{2}");
        assert_eq!(
            p.text,
            vec![
                "4 < #it{p}_{T} < 5 GeV/#it{c}".to_string(),
                "#it{#mu} = (2287 #pm 1) MeV/#it{c}^{2}".to_string(),
                "#it{#sigma} = 7 MeV/#it{c}^{2}".to_string(),
                "#it{S} = 1234 #pm 57".to_string(),
                "#Lambda_{c}^{#plus} #rightarrow pK^{#minus}#pi^{#plus} and charge conj.".to_string(),
            ]
        );
        assert_eq!(p.x_range, [2.2, 2.3]);
    }

    #[test]
    fn multiplicity_line_follows_pt() {
        let mut st = style();
        st.mult_text = "FT0M 0-1%".into();
        let p = InvMassPanel::build(&mass(), [1.0, 2.0], FitSummary::default(), (None, None), st).unwrap();
        assert_eq!(p.text[1], "FT0M 0-1%");
        assert_eq!(p.text.len(), 3);
    }

    #[test]
    fn empty_mass_range_and_grid_are_rejected() {
        let mut st = style();
        st.mass_range = [2.3, 2.2];
        assert!(InvMassPanel::build(&mass(), [1.0, 2.0], FitSummary::default(), (None, None), st).is_err());
        assert!(InvMassArtifact::new(Vec::new(), 3, None).is_err());
    }

    #[test]
    fn columns_are_clamped_to_panel_count() {
        let p = InvMassPanel::build(&mass(), [1.0, 2.0], FitSummary::default(), (None, None), style()).unwrap();
        let art = InvMassArtifact::new(vec![p.clone(), p], 4, None).unwrap();
        assert_eq!(art.columns, 2);
        assert_eq!(art.schema_version, INVMASS_SCHEMA);
    }
}
