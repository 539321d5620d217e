//! # d2h-viz-render
//!
//! Renders `d2h-viz` artifacts (JSON) to SVG, and from SVG to PNG (resvg) or
//! PDF (svg2pdf). The look is controlled by [`config::VizConfig`].

pub mod canvas;
pub mod color;
pub mod config;
pub mod header;
pub mod layout;
pub mod output;
pub mod plots;
pub mod primitives;
pub mod text;
pub mod theme;

use std::path::{Path, PathBuf};

use config::VizConfig;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("unknown artifact kind: {0}")]
    UnknownKind(String),
    #[error("deserialization error: {0}")]
    Deserialize(#[from] serde_json::Error),
    #[error("config error: {0}")]
    Config(String),
    #[error("layout error: {0}")]
    Layout(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[cfg(feature = "png")]
    #[error("PNG encoding error: {0}")]
    Png(String),
    #[cfg(feature = "pdf")]
    #[error("PDF conversion error: {0}")]
    Pdf(String),
}

pub type Result<T> = std::result::Result<T, RenderError>;

/// Render an artifact JSON to SVG string.
pub fn render_svg(artifact_json: &str, kind: &str, config: &VizConfig) -> Result<String> {
    let svg = match kind {
        "comparison" | "ratio" => {
            let art: d2h_viz::ComparisonArtifact = serde_json::from_str(artifact_json)?;
            plots::comparison::render(&art, config)?
        }
        "cutvar" => {
            let art: d2h_viz::CutVarArtifact = serde_json::from_str(artifact_json)?;
            plots::cutvar::render(&art, config)?
        }
        "invmass" => {
            let art: d2h_viz::InvMassArtifact = serde_json::from_str(artifact_json)?;
            plots::invmass::render(&art, config)?
        }
        "trials" => {
            let art: d2h_viz::TrialsArtifact = serde_json::from_str(artifact_json)?;
            plots::trials::render_yields(&art, config)?
        }
        "trial_distribution" => {
            let art: d2h_viz::TrialDistributionArtifact = serde_json::from_str(artifact_json)?;
            plots::trials::render_distribution(&art, config)?
        }
        "chi2" => {
            let art: d2h_viz::Chi2Artifact = serde_json::from_str(artifact_json)?;
            plots::trials::render_chi2(&art, config)?
        }
        other => return Err(RenderError::UnknownKind(other.to_string())),
    };
    Ok(svg)
}

/// Render an artifact JSON to bytes in the specified format.
pub fn render_to_bytes(
    artifact_json: &str,
    kind: &str,
    format: &str,
    config: &VizConfig,
) -> Result<Vec<u8>> {
    let svg = render_svg(artifact_json, kind, config)?;
    svg_to_format(svg, format, config)
}

#[cfg_attr(not(feature = "png"), allow(unused_variables))]
fn svg_to_format(svg: String, format: &str, config: &VizConfig) -> Result<Vec<u8>> {
    match format {
        "svg" => Ok(svg.into_bytes()),
        #[cfg(feature = "png")]
        "png" => output::png::svg_to_png(&svg, config.output.dpi),
        #[cfg(feature = "pdf")]
        "pdf" => output::pdf::svg_to_pdf(&svg),
        other => Err(RenderError::UnknownKind(format!("format: {other}"))),
    }
}

/// Render an artifact JSON to a file (format inferred from extension).
pub fn render_to_file(
    artifact_json: &str,
    kind: &str,
    path: &Path,
    config: &VizConfig,
) -> Result<()> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("svg");
    let bytes = render_to_bytes(artifact_json, kind, ext, config)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Render once and write `{stem}.{format}` for every format in
/// `config.output.formats`. Returns the written paths.
pub fn render_formats(
    artifact_json: &str,
    kind: &str,
    stem: &Path,
    config: &VizConfig,
) -> Result<Vec<PathBuf>> {
    let svg = render_svg(artifact_json, kind, config)?;
    let mut written = Vec::with_capacity(config.output.formats.len());
    for format in &config.output.formats {
        let bytes = svg_to_format(svg.clone(), format, config)?;
        let mut name = stem.as_os_str().to_owned();
        name.push(".");
        name.push(format);
        let path = PathBuf::from(name);
        std::fs::write(&path, bytes)?;
        written.push(path);
    }
    Ok(written)
}
