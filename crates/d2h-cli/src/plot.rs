//! Rendering artifacts next to the output bundle.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use d2h_core::HistBundle;
use d2h_viz_render::config::VizConfig;
use serde::Serialize;

const IMAGE_EXTENSIONS: [&str; 3] = ["svg", "png", "pdf"];

/// Writes plots and records them in the bundle.
pub(crate) struct Plotter {
    config: VizConfig,
    out_dir: PathBuf,
}

impl Plotter {
    pub(crate) fn new(config: VizConfig, out_dir: impl Into<PathBuf>) -> Self {
        Self { config, out_dir: out_dir.into() }
    }

    pub(crate) fn config(&self) -> &VizConfig {
        &self.config
    }

    /// Render `artifact` as `{out_dir}/{stem}.{format}` for every configured format.
    pub(crate) fn plot<A: Serialize>(
        &self,
        bundle: &mut HistBundle,
        kind: &str,
        artifact: &A,
        stem: &str,
    ) -> Result<Vec<PathBuf>> {
        self.plot_at(bundle, kind, artifact, &self.out_dir.join(stem))
    }

    /// Render to `path`. An image extension selects that single format;
    /// anything else is treated as a stem for the configured formats.
    pub(crate) fn plot_at<A: Serialize>(
        &self,
        bundle: &mut HistBundle,
        kind: &str,
        artifact: &A,
        path: &Path,
    ) -> Result<Vec<PathBuf>> {
        let dir = parent_dir(path);
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("create output directory {}", dir.display()))?;
        let json = serde_json::to_string(artifact)?;

        let single = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()));
        let rendered = if single {
            d2h_viz_render::render_to_file(&json, kind, path, &self.config)
                .map(|()| vec![path.to_path_buf()])
        } else {
            d2h_viz_render::render_formats(&json, kind, path, &self.config)
        };
        let files =
            rendered.with_context(|| format!("render {} plot {}", kind, path.display()))?;

        for f in &files {
            tracing::info!(kind, path = %f.display(), "plot written");
        }
        bundle.push_plot(kind, files.iter().map(|f| f.display().to_string()).collect());
        Ok(files)
    }
}

/// Parent directory of `path`, or `.`.
pub(crate) fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use d2h_core::BinnedSeries;
    use d2h_viz::comparison::{ComparisonBuilder, PointSeries};

    fn artifact() -> d2h_viz::ComparisonArtifact {
        let s = BinnedSeries::from_parts("h", vec![0.0, 1.0, 2.0], vec![0.1, 0.2], vec![0.01, 0.02])
            .unwrap();
        let mut builder = ComparisonBuilder::new("p_T", "f");
        builder.push(PointSeries::from_series("h", &s));
        builder.build().unwrap()
    }

    #[test]
    fn image_extension_selects_single_format() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = VizConfig::default();
        config.output.formats = vec!["svg".into()];
        let plotter = Plotter::new(config, dir.path());
        let mut bundle = HistBundle::new("test").unwrap();

        let single = dir.path().join("sub/merged.svg");
        let files = plotter.plot_at(&mut bundle, "comparison", &artifact(), &single).unwrap();
        assert_eq!(files, vec![single.clone()]);
        assert!(single.exists());

        let files = plotter.plot(&mut bundle, "comparison", &artifact(), "fractions").unwrap();
        assert_eq!(files, vec![dir.path().join("fractions.svg")]);
        assert_eq!(bundle.plots.len(), 2);
    }

    #[test]
    fn parent_dir_defaults_to_cwd() {
        assert_eq!(parent_dir(Path::new("plot.png")), PathBuf::from("."));
        assert_eq!(parent_dir(Path::new("out/plot.png")), PathBuf::from("out"));
    }
}
