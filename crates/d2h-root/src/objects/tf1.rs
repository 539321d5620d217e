//! TF1 deserialization (sampled points only).
//!
//! ROOT 6 writes a TF1 through its class buffer. Functions built from compiled
//! code (member functions, functors, lambdas) are sampled into `fSave` before
//! writing, so the curve can be redrawn without evaluating anything:
//!
//! ```text
//! TF1 (versioned, v >= 10)
//!   ├─ TNamed, TAttLine, TAttFill, TAttMarker
//!   ├─ fXmin, fXmax (f64)
//!   ├─ fNpar, fNdim, fNpx, fType, fNpfits, fNDF (i32)
//!   ├─ fChisquare, fMinimum, fMaximum (f64)
//!   ├─ fParErrors, fParMin, fParMax    std::vector<double>
//!   ├─ fSave                           std::vector<double>
//!   └─ fParent, fNormalized, fFormula, fParams ...   skipped
//!
//! fSave = [y_0, ..., y_npx, x_first, x_last]
//! ```
//! Formula functions keep `fSave` empty; they are reported as unsupported.

use crate::error::{Result, RootError};
use crate::histogram::SampledFunction;
use crate::rbuffer::RBuffer;

/// First class version with the std::vector members.
const MIN_VERSION: u16 = 10;

/// Read the `fSave` samples of a TF1 from decompressed object bytes.
pub fn read_tf1(data: &[u8]) -> Result<SampledFunction> {
    let mut r = RBuffer::new(data);

    let (version, end) = r.read_version()?;
    if version < MIN_VERSION {
        return Err(RootError::Deserialization(format!(
            "TF1 class version {} predates sampled storage (need >= {})",
            version, MIN_VERSION
        )));
    }
    let (name, title) = r.read_tnamed()?;
    r.skip_object()?; // TAttLine
    r.skip_object()?; // TAttFill
    r.skip_object()?; // TAttMarker

    let x_min = r.read_f64()?;
    let x_max = r.read_f64()?;
    r.skip(6 * 4)?; // fNpar, fNdim, fNpx, fType, fNpfits, fNDF
    r.skip(3 * 8)?; // fChisquare, fMinimum, fMaximum
    for _ in 0..3 {
        r.read_stl_vec_f64()?; // fParErrors, fParMin, fParMax
    }
    let save = r.read_stl_vec_f64()?;
    r.seek_forward(end)?;

    if save.len() < 4 {
        return Err(RootError::UnsupportedClass(format!(
            "TF1 '{}' has no sampled points (formula functions are not supported)",
            name
        )));
    }
    let n = save.len() - 2;
    let (first, last) = (save[n], save[n + 1]);
    if !(first.is_finite() && last.is_finite() && last > first) {
        return Err(RootError::Deserialization(format!(
            "TF1 '{}' sample range [{}, {}] is invalid",
            name, first, last
        )));
    }
    let step = (last - first) / (n - 1) as f64;
    let x = (0..n).map(|i| first + step * i as f64).collect();

    Ok(SampledFunction { name, title, x_min, x_max, x, y: save[..n].to_vec() })
}
