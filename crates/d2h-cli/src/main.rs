//! d2h: D2H analysis macros as batch jobs

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod compare;
mod config;
mod cutvar;
mod invmass;
mod io;
mod merge;
mod modify;
mod multitrial;
mod plot;

use merge::Template;

#[derive(Parser)]
#[command(name = "d2h")]
#[command(about = "d2h - D-meson and Lambda_c analysis macros")]
#[command(version)]
struct Cli {
    /// Log verbosity level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: tracing::Level,

    /// Plot style (YAML), layered over its theme
    #[arg(long, global = true)]
    style: Option<PathBuf>,

    /// Plot formats, overriding the style (e.g. `svg,png`)
    #[arg(long, global = true, value_delimiter = ',')]
    formats: Vec<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pad a histogram with empty bins and scale it
    AddPtBins {
        /// Input file (ROOT or bundle)
        file: PathBuf,
        /// Histogram name
        hist: String,
        /// Output bundle
        out: PathBuf,
        /// Lower edges of empty bins added in front
        #[arg(long, value_delimiter = ',', default_value = "0")]
        leading: Vec<f64>,
        /// Upper edges of empty bins added at the end
        #[arg(long, value_delimiter = ',')]
        trailing: Vec<f64>,
        /// Scale factor applied after padding
        #[arg(long, default_value = "1e-7")]
        scale: f64,
    },

    /// Drop the bins above MAXVAL from every matching histogram
    RemoveHighPt {
        /// Input file (ROOT or bundle)
        file: PathBuf,
        /// Substring of the histogram names
        pattern: String,
        /// Output bundle
        out: PathBuf,
        /// Highest kept upper edge
        max_val: f64,
    },

    /// Divide out the branching ratio and rebin with width-weighted averages
    Rebin {
        /// Input file (ROOT or bundle)
        file: PathBuf,
        /// Input histogram
        hist: String,
        /// Output histogram name
        out_hist: String,
        /// Output bundle
        out: PathBuf,
        /// Target bin edges
        #[arg(long, value_delimiter = ',', default_values_t = modify::RUN2_EDGES.to_vec())]
        edges: Vec<f64>,
        /// Scale factor applied before rebinning
        #[arg(long, conflicts_with = "branching_ratio")]
        scale: Option<f64>,
        /// Branching ratio; the histogram is scaled by its inverse
        #[arg(long, default_value_t = modify::DEFAULT_BR)]
        branching_ratio: f64,
    },

    /// Copy a histogram under a new name, normalised to the analysed events
    Scale {
        /// Input file (ROOT or bundle)
        file: PathBuf,
        /// Input histogram
        hist: String,
        /// Output histogram name
        out_hist: String,
        /// Output bundle
        out: PathBuf,
        /// Explicit scale factor
        #[arg(long, conflicts_with_all = ["ev_sel", "norm"])]
        factor: Option<f64>,
        /// Selected events
        #[arg(long, default_value_t = modify::DEFAULT_EV_SEL)]
        ev_sel: f64,
        /// Normalisation events
        #[arg(long, default_value_t = modify::DEFAULT_NORM)]
        norm: f64,
    },

    /// Merge per-pT-bin non-prompt fractions and compare with a reference
    MergeFractions {
        /// Output plot (`.png`, `.pdf`, `.svg`, or a stem for the style formats)
        out_image: PathBuf,
        /// Reference file
        old: PathBuf,
        /// Inputs; bin i is taken from file i
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Histogram name
        #[arg(long, default_value = merge::FRACTION_HIST)]
        histname: String,
        /// Output bundle. Defaults to OUT_IMAGE with a `.json` extension.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Merge histograms bin by bin: bin i from input file i
    MergeHistos {
        /// Input files
        #[arg(short, long, num_args = 1.., required = true)]
        infiles: Vec<PathBuf>,
        /// Output bundle
        #[arg(short, long)]
        outfile: PathBuf,
        /// Objects to merge. Defaults to every histogram and graph of the first file.
        #[arg(short = 'n', long = "histname")]
        histnames: Vec<String>,
        /// Input providing binning and metadata
        #[arg(long, value_enum, default_value = "last")]
        template: Template,
    },

    /// Collect invariant-mass histograms: from file i the i-th matching one
    MergeHistomass {
        /// Input files
        #[arg(short, long, num_args = 1.., required = true)]
        infiles: Vec<PathBuf>,
        /// Output bundle
        #[arg(short, long)]
        outfile: PathBuf,
        /// Substrings of the histogram names
        #[arg(short = 'n', long = "histname", num_args = 1.., required = true)]
        patterns: Vec<String>,
    },

    /// Copy the histograms matching PATTERN into a fitter input bundle
    GatherInput {
        /// Input file (ROOT or bundle)
        file: PathBuf,
        /// Substring of the object names
        pattern: String,
        /// Output bundle
        out: PathBuf,
        /// Mass fitter config (JSON/YAML with PtMin/PtMax), validated and logged
        #[arg(long)]
        fitter_config: Option<PathBuf>,
    },

    /// Compare non-prompt fractions with systematics, models and ratios
    CompareFractions {
        /// Job config (JSON or YAML)
        config: PathBuf,
    },

    /// Overlay graphs from several files
    PlotGraph {
        /// Job config (JSON or YAML)
        config: PathBuf,
    },

    /// Multitrial yield-extraction systematics
    Multitrial {
        /// Job config (JSON or YAML)
        config: PathBuf,
    },

    /// Raw yield versus BDT cut with the prompt/non-prompt decomposition
    Cutvar {
        /// Job config (JSON or YAML)
        config: PathBuf,
    },

    /// Invariant-mass spectra with fit curves and parameters, per pT bin and on a grid
    InvmassFit {
        /// Job config (JSON or YAML) with the mass fitter pT bins
        config: PathBuf,
    },

    /// Print compound multitrial names
    GenerateTrials {
        /// Trial classes (JSON/YAML list of lists). Defaults to the D-meson fit variations.
        #[arg(long)]
        classes: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let style = || config::load_style(cli.style.as_deref(), &cli.formats);

    match cli.command {
        Commands::AddPtBins { file, hist, out, leading, trailing, scale } => {
            modify::cmd_add_pt_bins(&file, &hist, &out, &leading, &trailing, scale)
        }
        Commands::RemoveHighPt { file, pattern, out, max_val } => {
            modify::cmd_remove_high_pt(&file, &pattern, &out, max_val)
        }
        Commands::Rebin { file, hist, out_hist, out, edges, scale, branching_ratio } => {
            let factor = rebin_factor(scale, branching_ratio)?;
            modify::cmd_rebin(&file, &hist, &out_hist, &out, &edges, factor)
        }
        Commands::Scale { file, hist, out_hist, out, factor, ev_sel, norm } => {
            let factor = modify::normalisation_factor(factor, ev_sel, norm)?;
            modify::cmd_scale(&file, &hist, &out_hist, &out, factor)
        }
        Commands::MergeFractions { out_image, old, files, histname, output } => {
            let plotter = plot::Plotter::new(style()?, plot::parent_dir(&out_image));
            merge::cmd_merge_fractions(&out_image, &old, &files, &histname, output.as_deref(), &plotter)
        }
        Commands::MergeHistos { infiles, outfile, histnames, template } => {
            merge::cmd_merge_histos(&infiles, &outfile, &histnames, template)
        }
        Commands::MergeHistomass { infiles, outfile, patterns } => {
            merge::cmd_merge_histomass(&infiles, &outfile, &patterns)
        }
        Commands::GatherInput { file, pattern, out, fitter_config } => {
            merge::cmd_gather_input(&file, &pattern, &out, fitter_config.as_deref())
        }
        Commands::CompareFractions { config } => compare::cmd_compare_fractions(&config, style()?),
        Commands::PlotGraph { config } => compare::cmd_plot_graph(&config, style()?),
        Commands::Multitrial { config } => multitrial::cmd_multitrial(&config, style()?),
        Commands::Cutvar { config } => cutvar::cmd_cutvar(&config, style()?),
        Commands::InvmassFit { config } => invmass::cmd_invmass_fit(&config, style()?),
        Commands::GenerateTrials { classes } => multitrial::cmd_generate_trials(classes.as_deref()),
    }
}

/// Pre-rebin scale: explicit, or the inverse branching ratio.
fn rebin_factor(scale: Option<f64>, branching_ratio: f64) -> Result<f64> {
    if let Some(s) = scale {
        return Ok(s);
    }
    if branching_ratio <= 0.0 {
        bail!("branching ratio must be positive, got {}", branching_ratio);
    }
    Ok(1.0 / branching_ratio)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn rebin_factor_defaults_to_inverse_branching_ratio() {
        assert_relative_eq!(rebin_factor(None, 0.0623).unwrap(), 1.0 / 0.0623);
        assert_relative_eq!(rebin_factor(Some(2.0), 0.0623).unwrap(), 2.0);
        assert!(rebin_factor(None, 0.0).is_err());
    }

    #[test]
    fn rebin_edges_default_to_run2_binning() {
        let cli = Cli::try_parse_from(["d2h", "rebin", "in.root", "h", "hOut", "out.json"]).unwrap();
        match cli.command {
            Commands::Rebin { edges, scale, .. } => {
                assert_eq!(edges, modify::RUN2_EDGES.to_vec());
                assert!(scale.is_none());
            }
            _ => panic!("expected rebin"),
        }
        assert!(
            Cli::try_parse_from([
                "d2h", "rebin", "in.root", "h", "hOut", "out.json", "--scale", "2", "--branching-ratio", "0.1"
            ])
            .is_err()
        );
    }
}
