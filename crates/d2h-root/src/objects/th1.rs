//! TH1D / TH1F / TH1I deserialization.
//!
//! Streamer layout (members that are read; the rest are skipped through byte counts):
//! ```text
//! TH1x
//!   ├─ TH1 (versioned)
//!   │    ├─ TNamed (name, title)
//!   │    ├─ TAttLine, TAttFill, TAttMarker   skipped
//!   │    ├─ fNcells (i32)
//!   │    ├─ fXaxis (TAxis: TNamed, TAttAxis, fNbins, fXmin, fXmax, fXbins)
//!   │    ├─ fYaxis, fZaxis                   skipped
//!   │    ├─ fBarOffset, fBarWidth (i16), fEntries .. fTsumwx2 (f64)
//!   │    ├─ fMaximum, fMinimum (v>=2), fNormFactor (v>=3)
//!   │    ├─ fContour (TArrayD)
//!   │    ├─ fSumw2 (TArrayD)
//!   │    └─ fOption, fFunctions, fBuffer...  skipped
//!   └─ TArrayD / TArrayF / TArrayI  bin contents incl. under/overflow
//! ```

use crate::error::{Result, RootError};
use crate::histogram::Histogram;
use crate::rbuffer::RBuffer;

/// Storage type of the bin-content array.
#[derive(Debug, Clone, Copy)]
pub enum Th1Storage {
    /// TH1D
    Double,
    /// TH1F
    Float,
    /// TH1I
    Int,
}

/// Read a TH1 subclass from decompressed object bytes.
pub fn read_th1(data: &[u8], storage: Th1Storage) -> Result<Histogram> {
    let mut r = RBuffer::new(data);

    let (version, _end) = r.read_version()?;
    if version < 1 {
        return Err(RootError::Deserialization(format!(
            "unsupported {:?} histogram version {}",
            storage, version
        )));
    }

    let base = read_th1_base(&mut r)?;

    let n = r.read_u32()? as usize;
    if n != base.n_cells {
        return Err(RootError::Deserialization(format!(
            "bin array size {} != fNcells {} in '{}'",
            n, base.n_cells, base.name
        )));
    }
    let raw = match storage {
        Th1Storage::Double => r.read_array_f64(n)?,
        Th1Storage::Float => r.read_array_f32(n)?,
        Th1Storage::Int => r.read_array_i32(n)?,
    };

    build_histogram(base, &raw)
}

struct AxisInfo {
    title: String,
    n_bins: usize,
    x_min: f64,
    x_max: f64,
    /// Variable-width edges; empty for uniform binning.
    edges: Vec<f64>,
}

struct Th1Base {
    name: String,
    title: String,
    n_cells: usize,
    axis: AxisInfo,
    entries: f64,
    sumw2: Option<Vec<f64>>,
}

fn read_th1_base(r: &mut RBuffer) -> Result<Th1Base> {
    let (version, end) = r.read_version()?;

    let (name, title) = r.read_tnamed()?;
    r.skip_object()?; // TAttLine
    r.skip_object()?; // TAttFill
    r.skip_object()?; // TAttMarker

    let n_cells = r.read_i32()?;
    if n_cells < 2 {
        return Err(RootError::Deserialization(format!("'{}' has fNcells = {}", name, n_cells)));
    }

    let axis = read_taxis(r)?;
    r.skip_object()?; // fYaxis
    r.skip_object()?; // fZaxis

    let _bar_offset = r.read_i16()?;
    let _bar_width = r.read_i16()?;
    let entries = r.read_f64()?;
    r.skip(4 * 8)?; // fTsumw, fTsumw2, fTsumwx, fTsumwx2
    if version >= 2 {
        r.skip(2 * 8)?; // fMaximum, fMinimum
    }
    if version >= 3 {
        r.skip(8)?; // fNormFactor
    }

    let _contour = r.read_tarray_f64()?;
    let sumw2 = r.read_tarray_f64()?;

    // fOption, fFunctions, fBuffer and the error options are not needed.
    if end.is_none() {
        return Err(RootError::Deserialization(format!(
            "TH1 v{} of '{}' written without byte count",
            version, name
        )));
    }
    r.seek_forward(end)?;

    Ok(Th1Base {
        name,
        title,
        n_cells: n_cells as usize,
        axis,
        entries,
        sumw2: (!sumw2.is_empty()).then_some(sumw2),
    })
}

fn read_taxis(r: &mut RBuffer) -> Result<AxisInfo> {
    let (_ver, end) = r.read_version()?;
    let (_name, title) = r.read_tnamed()?;
    r.skip_object()?; // TAttAxis

    let n_bins = r.read_i32()?;
    if n_bins < 1 {
        return Err(RootError::Deserialization(format!("axis with {} bins", n_bins)));
    }
    let x_min = r.read_f64()?;
    let x_max = r.read_f64()?;
    let edges = r.read_tarray_f64()?;

    // fFirst, fLast, fBits2, fTimeDisplay, fTimeFormat, fLabels, fModLabs
    r.seek_forward(end)?;

    Ok(AxisInfo { title, n_bins: n_bins as usize, x_min, x_max, edges })
}

fn build_histogram(base: Th1Base, raw: &[f64]) -> Result<Histogram> {
    let n_bins = base.axis.n_bins;
    if raw.len() < n_bins + 2 {
        return Err(RootError::Deserialization(format!(
            "'{}': {} cells cannot hold {} bins plus flows",
            base.name,
            raw.len(),
            n_bins
        )));
    }

    // [underflow, bin1, ..., binN, overflow]
    let bin_content = raw[1..=n_bins].to_vec();
    let sumw2 = match base.sumw2 {
        Some(sw2) if sw2.len() == raw.len() => Some(sw2[1..=n_bins].to_vec()),
        Some(sw2) => {
            return Err(RootError::Deserialization(format!(
                "'{}': fSumw2 has {} entries but the histogram has {} cells",
                base.name,
                sw2.len(),
                raw.len()
            )));
        }
        None => None,
    };

    let bin_edges = if base.axis.edges.len() == n_bins + 1 {
        base.axis.edges
    } else {
        let width = (base.axis.x_max - base.axis.x_min) / n_bins as f64;
        (0..=n_bins).map(|i| base.axis.x_min + i as f64 * width).collect()
    };

    Ok(Histogram {
        name: base.name,
        title: base.title,
        n_bins,
        bin_edges,
        bin_content,
        sumw2,
        entries: base.entries,
        x_title: base.axis.title,
    })
}
