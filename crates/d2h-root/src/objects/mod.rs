//! ROOT object deserialization dispatch.

mod tf1;
mod tgraph;
mod th1;

use crate::error::{Result, RootError};
use crate::histogram::{Graph, Histogram, SampledFunction};

use tgraph::GraphErrors;
use th1::Th1Storage;

/// Whether `class_name` is a 1D histogram class this crate can read.
pub fn is_histogram_class(class_name: &str) -> bool {
    matches!(class_name, "TH1D" | "TH1F" | "TH1I")
}

/// Whether `class_name` is a graph class this crate can read.
pub fn is_graph_class(class_name: &str) -> bool {
    matches!(class_name, "TGraph" | "TGraphErrors" | "TGraphAsymmErrors")
}

/// Whether `class_name` is a function class whose samples this crate can read.
pub fn is_function_class(class_name: &str) -> bool {
    class_name == "TF1"
}

/// Read a histogram from a decompressed payload, given its class name.
pub fn read_histogram(payload: &[u8], class_name: &str) -> Result<Histogram> {
    let storage = match class_name {
        "TH1D" => Th1Storage::Double,
        "TH1F" => Th1Storage::Float,
        "TH1I" => Th1Storage::Int,
        _ => return Err(RootError::UnsupportedClass(class_name.to_string())),
    };
    th1::read_th1(payload, storage)
}

/// Read a graph from a decompressed payload, given its class name.
pub fn read_graph(payload: &[u8], class_name: &str) -> Result<Graph> {
    let errors = match class_name {
        "TGraph" => GraphErrors::None,
        "TGraphErrors" => GraphErrors::Symmetric,
        "TGraphAsymmErrors" => GraphErrors::Asymmetric,
        _ => return Err(RootError::UnsupportedClass(class_name.to_string())),
    };
    tgraph::read_graph(payload, errors)
}

/// Read the sampled points of a function from a decompressed payload.
pub fn read_function(payload: &[u8], class_name: &str) -> Result<SampledFunction> {
    if !is_function_class(class_name) {
        return Err(RootError::UnsupportedClass(class_name.to_string()));
    }
    tf1::read_tf1(payload)
}
