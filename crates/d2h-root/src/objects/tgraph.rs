//! TGraph / TGraphErrors / TGraphAsymmErrors deserialization.
//!
//! ```text
//! TGraphAsymmErrors / TGraphErrors
//!   ├─ TGraph (versioned)
//!   │    ├─ TNamed, TAttLine, TAttFill, TAttMarker
//!   │    ├─ fNpoints (i32)
//!   │    ├─ fX, fY        flag byte + fNpoints doubles
//!   │    └─ fFunctions, fHistogram, fMinimum, fMaximum   skipped
//!   └─ fEX, fEY  |  fEXlow, fEXhigh, fEYlow, fEYhigh
//! ```

use crate::error::{Result, RootError};
use crate::histogram::Graph;
use crate::rbuffer::RBuffer;

/// Error layout following the TGraph base.
#[derive(Debug, Clone, Copy)]
pub enum GraphErrors {
    /// Plain TGraph.
    None,
    /// TGraphErrors: symmetric errors.
    Symmetric,
    /// TGraphAsymmErrors.
    Asymmetric,
}

/// Read a graph from decompressed object bytes.
pub fn read_graph(data: &[u8], errors: GraphErrors) -> Result<Graph> {
    let mut r = RBuffer::new(data);

    match errors {
        GraphErrors::None => read_tgraph(&mut r),
        GraphErrors::Symmetric | GraphErrors::Asymmetric => {
            let (_ver, end) = r.read_version()?;
            let mut g = read_tgraph(&mut r)?;
            let n = g.x.len();
            if let GraphErrors::Symmetric = errors {
                let ex = r.read_counted_f64(n)?;
                let ey = r.read_counted_f64(n)?;
                g.ex_low = ex.clone();
                g.ex_high = ex;
                g.ey_low = ey.clone();
                g.ey_high = ey;
            } else {
                g.ex_low = r.read_counted_f64(n)?;
                g.ex_high = r.read_counted_f64(n)?;
                g.ey_low = r.read_counted_f64(n)?;
                g.ey_high = r.read_counted_f64(n)?;
            }
            r.seek_forward(end)?;
            Ok(g)
        }
    }
}

fn read_tgraph(r: &mut RBuffer) -> Result<Graph> {
    let (_ver, end) = r.read_version()?;
    let (name, title) = r.read_tnamed()?;
    r.skip_object()?; // TAttLine
    r.skip_object()?; // TAttFill
    r.skip_object()?; // TAttMarker

    let n_points = r.read_i32()?;
    if n_points < 0 {
        return Err(RootError::Deserialization(format!(
            "graph '{}' has {} points",
            name, n_points
        )));
    }
    let n = n_points as usize;
    let x = r.read_counted_f64(n)?;
    let y = r.read_counted_f64(n)?;

    if end.is_none() {
        return Err(RootError::Deserialization(format!(
            "TGraph '{}' written without byte count",
            name
        )));
    }
    r.seek_forward(end)?;

    Ok(Graph {
        name,
        title,
        x,
        y,
        ex_low: vec![0.0; n],
        ex_high: vec![0.0; n],
        ey_low: vec![0.0; n],
        ey_high: vec![0.0; n],
    })
}
