//! # d2h-root
//!
//! Native, read-only ROOT file reader for the D2H macros.
//!
//! Reads TH1D/TH1F/TH1I histograms, TGraph/TGraphErrors/TGraphAsymmErrors
//! graphs and the stored samples of TF1 functions from `.root` files,
//! including objects in sub-directories, without a ROOT installation. Supports zlib, LZ4, ZSTD and XZ compression.
//!
//! ## Example
//!
//! ```no_run
//! use d2h_root::RootFile;
//!
//! let f = RootFile::open("fractions.root").unwrap();
//! for key in f.list_keys().unwrap() {
//!     println!("{} ({})", key.name, key.class_name);
//! }
//! let h = f.get_histogram("hCorrFracNonPrompt").unwrap();
//! println!("bins: {}, edges: {:?}", h.n_bins, h.bin_edges);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod datasource;
pub mod decompress;
pub mod directory;
pub mod error;
pub mod file;
pub mod histogram;
pub mod key;
pub mod objects;
pub mod rbuffer;

pub use error::{Result, RootError};
pub use file::RootFile;
pub use histogram::{Graph, Histogram, SampledFunction};
pub use key::KeyInfo;
pub use objects::{is_function_class, is_graph_class, is_histogram_class};
