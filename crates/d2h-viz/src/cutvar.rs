use d2h_core::{BinnedSeries, Error, Result};
use serde::{Deserialize, Serialize};

use crate::ArtifactMeta;

/// Schema tag of [`CutVarArtifact`].
pub const CUTVAR_SCHEMA: &str = "d2h_cutvar_v1";

/// The four raw-yield-vs-cut histograms of one pT bin.
#[derive(Debug, Clone, Copy)]
pub struct CutVarInputs<'a> {
    /// Measured raw yields.
    pub data: &'a BinnedSeries,
    /// Fitted prompt component.
    pub prompt: &'a BinnedSeries,
    /// Fitted non-prompt component.
    pub non_prompt: &'a BinnedSeries,
    /// Sum of the components.
    pub total: &'a BinnedSeries,
}

/// Axis titles and overrides of a cut-variation plot.
#[derive(Debug, Clone, Default)]
pub struct CutVarStyle {
    /// X-axis title.
    pub x_label: String,
    /// Y-axis title.
    pub y_label: String,
    /// Fixed y-range; `[0, 1.2·max]` when absent.
    pub y_range: Option<[f64; 2]>,
    /// System line under the experiment name.
    pub system: Option<String>,
}

/// Raw yield versus selection cut with the prompt/non-prompt decomposition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CutVarArtifact {
    /// Always [`CUTVAR_SCHEMA`].
    pub schema_version: String,
    /// Provenance.
    pub meta: ArtifactMeta,
    /// Lower pT edge.
    pub pt_min: f64,
    /// Upper pT edge.
    pub pt_max: f64,
    /// X-axis title.
    pub x_label: String,
    /// Y-axis title.
    pub y_label: String,
    /// Bin edges shared by all components.
    pub bin_edges: Vec<f64>,
    /// Per-bin axis labels; empty strings are not drawn.
    pub bin_labels: Vec<String>,
    /// Measured yields.
    #[serde(with = "d2h_core::float_vec")]
    pub data_y: Vec<f64>,
    /// Errors of the measured yields.
    #[serde(with = "d2h_core::float_vec")]
    pub data_err: Vec<f64>,
    /// Prompt component.
    #[serde(with = "d2h_core::float_vec")]
    pub prompt_y: Vec<f64>,
    /// Non-prompt component.
    #[serde(with = "d2h_core::float_vec")]
    pub non_prompt_y: Vec<f64>,
    /// Sum of the components.
    #[serde(with = "d2h_core::float_vec")]
    pub total_y: Vec<f64>,
    /// Visible y-range.
    pub y_range: [f64; 2],
    /// System line under the experiment name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experiment_text: Option<String>,
    /// Extra text lines (the pT range).
    #[serde(default)]
    pub annotations: Vec<String>,
}

impl CutVarArtifact {
    /// Assemble the plot of one pT bin.
    ///
    /// `cuts[i]` is the cut value of bin `i`; only the bins listed in `shown`
    /// get a tick label.
    pub fn build(
        inputs: CutVarInputs<'_>,
        cuts: &[f64],
        shown: &[usize],
        pt: [f64; 2],
        style: CutVarStyle,
    ) -> Result<Self> {
        let data = inputs.data;
        for component in [inputs.prompt, inputs.non_prompt, inputs.total] {
            if !component.same_binning(data) {
                return Err(Error::Validation(format!(
                    "'{}' and '{}' have different binnings",
                    component.name, data.name
                )));
            }
        }
        if cuts.len() != data.n_bins() {
            return Err(Error::Validation(format!(
                "{} cut values for {} bins of '{}'",
                cuts.len(),
                data.n_bins(),
                data.name
            )));
        }
        if let Some(&bad) = shown.iter().find(|&&i| i >= cuts.len()) {
            return Err(Error::Validation(format!(
                "labelled cut index {} out of range ({} cuts)",
                bad,
                cuts.len()
            )));
        }

        let bin_labels = cuts
            .iter()
            .enumerate()
            .map(|(i, c)| if shown.contains(&i) { format!("{:.2}", c) } else { String::new() })
            .collect();

        let y_range = match style.y_range {
            Some(r) => r,
            None => {
                let hi = (0..data.n_bins())
                    .map(|i| data.value(i) + data.error(i))
                    .chain([inputs.prompt, inputs.non_prompt, inputs.total].iter().map(|s| s.maximum()))
                    .fold(0.0_f64, f64::max);
                [0.0, if hi > 0.0 { 1.2 * hi } else { 1.0 }]
            }
        };

        Ok(Self {
            schema_version: CUTVAR_SCHEMA.to_string(),
            meta: ArtifactMeta::now()?,
            pt_min: pt[0],
            pt_max: pt[1],
            x_label: style.x_label,
            y_label: style.y_label,
            bin_edges: data.bin_edges.clone(),
            bin_labels,
            data_y: data.content.clone(),
            data_err: data.errors.clone(),
            prompt_y: inputs.prompt.content.clone(),
            non_prompt_y: inputs.non_prompt.content.clone(),
            total_y: inputs.total.content.clone(),
            y_range,
            experiment_text: style.system,
            annotations: vec![format!("{} < p_T < {} GeV/c", pt[0], pt[1])],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hist(name: &str, content: &[f64]) -> BinnedSeries {
        let edges: Vec<f64> = (0..=content.len()).map(|i| i as f64).collect();
        let errors = content.iter().map(|c| c.sqrt()).collect();
        BinnedSeries::from_parts(name, edges, content.to_vec(), errors).unwrap()
    }

    #[test]
    fn labels_only_selected_cuts() {
        let data = hist("hRawYieldVsCut_pt4_5", &[100.0, 80.0, 50.0]);
        let prompt = hist("hRawYieldPromptVsCut_pt4_5", &[70.0, 50.0, 25.0]);
        let np = hist("hRawYieldNonPromptVsCut_pt4_5", &[25.0, 28.0, 24.0]);
        let total = hist("hRawYieldSumVsCut_pt4_5", &[95.0, 78.0, 49.0]);
        let inputs = CutVarInputs { data: &data, prompt: &prompt, non_prompt: &np, total: &total };
        let art = CutVarArtifact::build(
            inputs,
            &[0.17, 0.19, 0.21],
            &[0, 2],
            [4.0, 5.0],
            CutVarStyle { y_label: "Raw yield".into(), ..Default::default() },
        )
        .unwrap();
        assert_eq!(art.bin_labels, vec!["0.17", "", "0.21"]);
        assert_eq!(art.y_range, [0.0, 1.2 * 110.0]);
        assert_eq!(art.annotations, vec!["4 < p_T < 5 GeV/c"]);
        assert_eq!(art.total_y, vec![95.0, 78.0, 49.0]);
    }

    #[test]
    fn rejects_mismatched_inputs() {
        let data = hist("d", &[1.0, 2.0]);
        let short = hist("p", &[1.0]);
        let inputs = CutVarInputs { data: &data, prompt: &short, non_prompt: &data, total: &data };
        let r = CutVarArtifact::build(inputs, &[0.1, 0.2], &[], [1.0, 2.0], CutVarStyle::default());
        assert!(r.is_err());

        let inputs = CutVarInputs { data: &data, prompt: &data, non_prompt: &data, total: &data };
        assert!(
            CutVarArtifact::build(inputs, &[0.1], &[], [1.0, 2.0], CutVarStyle::default()).is_err()
        );
        assert!(
            CutVarArtifact::build(inputs, &[0.1, 0.2], &[5], [1.0, 2.0], CutVarStyle::default())
                .is_err()
        );
    }
}
