//! # d2h-core
//!
//! Data model and shared numeric transforms for the D2H analysis macros.
//!
//! Every macro reads [`BinnedSeries`] values, remaps or rescales them with the
//! functions in [`merge`], [`rebin`] and [`syst`], and writes a [`HistBundle`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bundle;
pub mod error;
pub mod float_vec;
pub mod merge;
pub mod rebin;
pub mod series;
pub mod syst;
pub mod traits;
pub mod trials;

pub use bundle::{ErrorGraph, HistBundle};
pub use error::{Error, Result};
pub use series::{BinLookup, BinnedSeries};
pub use syst::SystBox;
pub use traits::{HistogramSource, ObjectKind, SourceEntry};

/// Crate version, stamped into bundles and plot artifacts.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
