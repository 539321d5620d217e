//! # d2h-viz
//!
//! Plot artifacts for the D2H macros.
//!
//! Artifacts are plain serde structs (arrays instead of nested objects) built
//! from [`d2h_core::BinnedSeries`] values. They carry every number a plot
//! needs, so the renderer never recomputes ranges or ratios.

#![warn(missing_docs)]
#![warn(clippy::all)]

use serde::{Deserialize, Serialize};

/// Overlay of measured series, model bands and ratio plots.
pub mod comparison;

/// Raw yield versus selection cut.
pub mod cutvar;

/// Invariant-mass spectra with their fits.
pub mod invmass;

/// Multitrial yield systematics.
pub mod trials;

pub use comparison::{ComparisonArtifact, ComparisonBuilder, RangePolicy, ratio_artifact};
pub use cutvar::CutVarArtifact;
pub use invmass::InvMassArtifact;
pub use trials::{Chi2Artifact, TrialDistributionArtifact, TrialsArtifact};

/// Provenance stamped into every artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMeta {
    /// Producing tool.
    pub tool: String,
    /// Tool version.
    pub tool_version: String,
    /// Creation time.
    pub created_unix_ms: u128,
}

impl ArtifactMeta {
    /// Metadata stamped with the current time.
    pub fn now() -> d2h_core::Result<Self> {
        Ok(Self {
            tool: "d2h".to_string(),
            tool_version: d2h_core::VERSION.to_string(),
            created_unix_ms: d2h_core::bundle::now_unix_ms()?,
        })
    }
}

/// Strip ROOT TLatex markup (`#it{p}_{T}` → `p_T`, `#scale[1.2]{x}` → `x`).
///
/// Sub- and superscript markers are kept as `_` and `^`.
///
/// Greek letters and a few symbols written as `#name` are mapped to Unicode;
/// unknown `#name` sequences are kept verbatim.
pub fn plain_label(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '#' => {
                let mut word = String::new();
                while let Some(&n) = chars.peek() {
                    if n.is_ascii_alphabetic() {
                        word.push(n);
                        chars.next();
                    } else {
                        break;
                    }
                }
                if chars.peek() == Some(&'[') {
                    for n in chars.by_ref() {
                        if n == ']' {
                            break;
                        }
                    }
                }
                if let Some(sym) = latex_symbol(&word) {
                    out.push_str(sym);
                } else if !FORMATTING.contains(&word.as_str()) {
                    out.push('#');
                    out.push_str(&word);
                }
            }
            '{' | '}' => {}
            _ => out.push(c),
        }
    }
    out
}

/// TLatex commands that only change the look of their argument.
const FORMATTING: &[&str] = &["it", "bf", "scale", "font", "color", "mathrm", "splitline"];

fn latex_symbol(word: &str) -> Option<&'static str> {
    Some(match word {
        "alpha" => "\u{03B1}",
        "beta" => "\u{03B2}",
        "gamma" => "\u{03B3}",
        "Lambda" => "\u{039B}",
        "chi" => "\u{03C7}",
        "mu" => "\u{03BC}",
        "pi" => "\u{03C0}",
        "sigma" => "\u{03C3}",
        "sqrt" => "\u{221A}",
        "pm" => "\u{00B1}",
        "plus" => "+",
        "minus" => "\u{2212}",
        "rightarrow" => "\u{2192}",
        "times" => "\u{00D7}",
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_tlatex_markup() {
        assert_eq!(plain_label("#it{p}_{T} (GeV/#it{c})"), "p_T (GeV/c)");
        assert_eq!(plain_label("#scale[1.35]{ALICE Preliminary}"), "ALICE Preliminary");
        assert_eq!(plain_label("#Lambda_{c}^{#plus}"), "\u{039B}_c^+");
        assert_eq!(plain_label("pp #sqrt{#it{s}} = 13.6 TeV"), "pp \u{221A}s = 13.6 TeV");
        assert_eq!(plain_label("Raw yield"), "Raw yield");
        assert_eq!(plain_label("Trial #"), "Trial #");
        assert_eq!(plain_label("#trials: 3"), "#trials: 3");
    }
}
