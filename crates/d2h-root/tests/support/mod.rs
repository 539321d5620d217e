//! Minimal ROOT file writer used by the reader tests.
//!
//! Produces small-file layouts (32-bit seeks) with the same streamer shapes
//! ROOT 6 writes for TH1 and TGraph classes. Members the reader skips are
//! filled with plausible filler so the byte-count jumps are exercised.

#![allow(dead_code)]

use std::io::Write;

const BYTE_COUNT_MASK: u32 = 0x4000_0000;
const BEGIN: usize = 100;
const NAME_RECORD_LEN: usize = 40;
const DIR_STREAMER_LEN: usize = 30;
const KEY_FIXED_LEN: usize = 26;

fn put_u8(b: &mut Vec<u8>, v: u8) {
    b.push(v);
}
fn put_u16(b: &mut Vec<u8>, v: u16) {
    b.extend_from_slice(&v.to_be_bytes());
}
fn put_i16(b: &mut Vec<u8>, v: i16) {
    b.extend_from_slice(&v.to_be_bytes());
}
fn put_u32(b: &mut Vec<u8>, v: u32) {
    b.extend_from_slice(&v.to_be_bytes());
}
fn put_i32(b: &mut Vec<u8>, v: i32) {
    b.extend_from_slice(&v.to_be_bytes());
}
fn put_f64(b: &mut Vec<u8>, v: f64) {
    b.extend_from_slice(&v.to_be_bytes());
}

fn put_string(b: &mut Vec<u8>, s: &str) {
    if s.len() < 255 {
        put_u8(b, s.len() as u8);
    } else {
        put_u8(b, 255);
        put_u32(b, s.len() as u32);
    }
    b.extend_from_slice(s.as_bytes());
}

/// Versioned object with a byte count covering the version and `body`.
fn versioned(b: &mut Vec<u8>, version: u16, body: impl FnOnce(&mut Vec<u8>)) {
    let mut inner = Vec::new();
    body(&mut inner);
    put_u32(b, (inner.len() as u32 + 2) | BYTE_COUNT_MASK);
    put_u16(b, version);
    b.extend_from_slice(&inner);
}

fn tnamed(b: &mut Vec<u8>, name: &str, title: &str) {
    versioned(b, 1, |b| {
        put_u16(b, 1);
        put_u32(b, 0);
        put_u32(b, 0x0300_0000);
        put_string(b, name);
        put_string(b, title);
    });
}

fn attribute(b: &mut Vec<u8>, version: u16) {
    versioned(b, version, |b| {
        put_i16(b, 1);
        put_i16(b, 1);
        put_i16(b, 1001);
    });
}

fn taxis(b: &mut Vec<u8>, title: &str, n_bins: usize, x_min: f64, x_max: f64, edges: &[f64]) {
    versioned(b, 10, |b| {
        tnamed(b, "xaxis", title);
        attribute(b, 4);
        put_i32(b, n_bins as i32);
        put_f64(b, x_min);
        put_f64(b, x_max);
        put_u32(b, edges.len() as u32);
        for &e in edges {
            put_f64(b, e);
        }
        put_i32(b, 0); // fFirst
        put_i32(b, 0); // fLast
        put_u16(b, 0); // fBits2
        put_u8(b, 0); // fTimeDisplay
        put_string(b, ""); // fTimeFormat
        put_u32(b, 0); // fLabels
        put_u32(b, 0); // fModLabs
    });
}

/// Storage type of a written histogram.
#[derive(Debug, Clone, Copy)]
pub enum Storage {
    Double,
    Float,
}

/// A 1D histogram to serialise.
#[derive(Debug, Clone)]
pub struct Hist1 {
    pub name: String,
    pub title: String,
    pub x_title: String,
    pub edges: Vec<f64>,
    /// Write no edge array; the reader must rebuild equal-width edges.
    pub uniform: bool,
    pub content: Vec<f64>,
    pub sumw2: Option<Vec<f64>>,
    pub entries: f64,
}

impl Hist1 {
    pub fn new(name: &str, edges: &[f64], content: &[f64]) -> Self {
        Self {
            name: name.to_string(),
            title: format!("{} title", name),
            x_title: "#it{p}_{T} (GeV/#it{c})".to_string(),
            edges: edges.to_vec(),
            uniform: false,
            content: content.to_vec(),
            sumw2: None,
            entries: content.iter().sum(),
        }
    }

    pub fn uniform(mut self) -> Self {
        self.uniform = true;
        self
    }

    pub fn with_sumw2(mut self, sumw2: &[f64]) -> Self {
        self.sumw2 = Some(sumw2.to_vec());
        self
    }
}

/// TH1D / TH1F object bytes.
pub fn th1_payload(h: &Hist1, storage: Storage) -> Vec<u8> {
    let n = h.content.len();
    let cells: Vec<f64> =
        std::iter::once(7.0).chain(h.content.iter().copied()).chain(std::iter::once(9.0)).collect();
    let mut out = Vec::new();
    versioned(&mut out, 3, |b| {
        versioned(b, 8, |b| {
            tnamed(b, &h.name, &h.title);
            attribute(b, 2);
            attribute(b, 2);
            attribute(b, 2);
            put_i32(b, (n + 2) as i32);
            let axis_edges: &[f64] = if h.uniform { &[] } else { &h.edges };
            taxis(b, &h.x_title, n, h.edges[0], h.edges[n], axis_edges);
            taxis(b, "", 1, 0.0, 1.0, &[]);
            taxis(b, "", 1, 0.0, 1.0, &[]);
            put_i16(b, 0); // fBarOffset
            put_i16(b, 1000); // fBarWidth
            put_f64(b, h.entries);
            for _ in 0..4 {
                put_f64(b, 0.0);
            }
            put_f64(b, -1111.0); // fMaximum
            put_f64(b, -1111.0); // fMinimum
            put_f64(b, 0.0); // fNormFactor
            put_u32(b, 0); // fContour
            match &h.sumw2 {
                Some(w) => {
                    put_u32(b, (w.len() + 2) as u32);
                    put_f64(b, 49.0);
                    for &v in w {
                        put_f64(b, v);
                    }
                    put_f64(b, 81.0);
                }
                None => put_u32(b, 0),
            }
            put_string(b, ""); // fOption
            versioned(b, 5, |b| {
                // fFunctions: empty TList
                tnamed(b, "", "");
                put_string(b, "");
                put_i32(b, 0);
            });
            put_i32(b, 0); // fBufferSize
        });
        put_u32(b, (n + 2) as u32);
        for &c in &cells {
            match storage {
                Storage::Double => put_f64(b, c),
                Storage::Float => b.extend_from_slice(&(c as f32).to_be_bytes()),
            }
        }
    });
    out
}

/// A graph to serialise.
#[derive(Debug, Clone)]
pub struct Graph1 {
    pub name: String,
    pub title: String,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub ex_low: Vec<f64>,
    pub ex_high: Vec<f64>,
    pub ey_low: Vec<f64>,
    pub ey_high: Vec<f64>,
}

/// Graph class to write.
#[derive(Debug, Clone, Copy)]
pub enum GraphKind {
    Plain,
    Errors,
    Asymm,
}

fn counted(b: &mut Vec<u8>, values: &[f64]) {
    put_u8(b, 1);
    for &v in values {
        put_f64(b, v);
    }
}

fn tgraph_body(b: &mut Vec<u8>, g: &Graph1) {
    versioned(b, 4, |b| {
        tnamed(b, &g.name, &g.title);
        attribute(b, 2);
        attribute(b, 2);
        attribute(b, 2);
        put_i32(b, g.x.len() as i32);
        counted(b, &g.x);
        counted(b, &g.y);
        versioned(b, 5, |b| {
            tnamed(b, "", "");
            put_string(b, "");
            put_i32(b, 0);
        });
        put_u32(b, 0); // fHistogram
        put_f64(b, -1111.0);
        put_f64(b, -1111.0);
    });
}

/// TGraph / TGraphErrors / TGraphAsymmErrors object bytes.
pub fn graph_payload(g: &Graph1, kind: GraphKind) -> Vec<u8> {
    let mut out = Vec::new();
    match kind {
        GraphKind::Plain => tgraph_body(&mut out, g),
        GraphKind::Errors => versioned(&mut out, 3, |b| {
            tgraph_body(b, g);
            counted(b, &g.ex_low);
            counted(b, &g.ey_low);
        }),
        GraphKind::Asymm => versioned(&mut out, 3, |b| {
            tgraph_body(b, g);
            counted(b, &g.ex_low);
            counted(b, &g.ex_high);
            counted(b, &g.ey_low);
            counted(b, &g.ey_high);
        }),
    }
    out
}

fn stl_vec(b: &mut Vec<u8>, values: &[f64]) {
    versioned(b, 6, |b| {
        put_u32(b, values.len() as u32);
        for &v in values {
            put_f64(b, v);
        }
    });
}

/// TF1 object bytes with `y` sampled at equal steps over `[first, last]`.
/// An empty `y` writes an empty `fSave`, as ROOT does for formula functions.
pub fn tf1_payload(name: &str, range: (f64, f64), y: &[f64], first: f64, last: f64) -> Vec<u8> {
    let mut out = Vec::new();
    versioned(&mut out, 12, |b| {
        tnamed(b, name, "fit");
        attribute(b, 2);
        attribute(b, 2);
        versioned(b, 2, |b| {
            put_i16(b, 1);
            put_i16(b, 20);
            b.extend_from_slice(&1.0f32.to_be_bytes());
        });
        put_f64(b, range.0);
        put_f64(b, range.1);
        put_i32(b, 3); // fNpar
        put_i32(b, 1); // fNdim
        put_i32(b, y.len().saturating_sub(1) as i32); // fNpx
        put_i32(b, if y.is_empty() { 0 } else { 2 }); // fType
        put_i32(b, 40); // fNpfits
        put_i32(b, 37); // fNDF
        put_f64(b, 41.2); // fChisquare
        put_f64(b, -1111.0);
        put_f64(b, -1111.0);
        stl_vec(b, &[0.5, 0.01, 0.002]);
        stl_vec(b, &[0.0; 3]);
        stl_vec(b, &[0.0; 3]);
        let mut save = y.to_vec();
        if !y.is_empty() {
            save.push(first);
            save.push(last);
        }
        stl_vec(b, &save);
        put_u32(b, 0); // fParent
        put_u8(b, 0); // fNormalized
        put_f64(b, 0.0); // fNormIntegral
        put_u32(b, 0); // fFormula
        put_u32(b, 0); // fParams
    });
    out
}

/// A directory entry.
pub enum Item {
    Object { class: String, name: String, cycle: u16, payload: Vec<u8> },
    Dir { name: String, items: Vec<Item> },
}

pub fn object(class: &str, name: &str, payload: Vec<u8>) -> Item {
    Item::Object { class: class.to_string(), name: name.to_string(), cycle: 1, payload }
}

pub fn object_cycle(class: &str, name: &str, cycle: u16, payload: Vec<u8>) -> Item {
    Item::Object { class: class.to_string(), name: name.to_string(), cycle, payload }
}

pub fn dir(name: &str, items: Vec<Item>) -> Item {
    Item::Dir { name: name.to_string(), items }
}

/// Serialise a whole file. With `compress`, object payloads are stored as
/// zlib blocks whenever that makes them smaller.
pub fn build_file(items: &[Item], compress: bool) -> Vec<u8> {
    let mut f = vec![0u8; BEGIN + NAME_RECORD_LEN + DIR_STREAMER_LEN];
    let (seek_keys, nbytes_keys) = write_directory(&mut f, items, compress);

    let mut h = Vec::new();
    h.extend_from_slice(b"root");
    put_u32(&mut h, 62_400);
    put_u32(&mut h, BEGIN as u32);
    put_u32(&mut h, f.len() as u32); // fEND
    put_u32(&mut h, 0); // fSeekFree
    put_u32(&mut h, 0); // fNbytesFree
    put_u32(&mut h, 0); // nfree
    put_u32(&mut h, NAME_RECORD_LEN as u32);
    put_u8(&mut h, 4); // fUnits
    put_u32(&mut h, if compress { 101 } else { 0 });
    put_u32(&mut h, 0); // fSeekInfo
    put_u32(&mut h, 0); // fNbytesInfo
    h.extend_from_slice(&[0u8; 18]);
    f[..h.len()].copy_from_slice(&h);

    let top = dir_streamer(seek_keys, nbytes_keys);
    let at = BEGIN + NAME_RECORD_LEN;
    f[at..at + top.len()].copy_from_slice(&top);
    f
}

fn dir_streamer(seek_keys: u32, nbytes_keys: u32) -> Vec<u8> {
    let mut d = Vec::with_capacity(DIR_STREAMER_LEN);
    put_u16(&mut d, 5);
    put_u32(&mut d, 0); // fDatimeC
    put_u32(&mut d, 0); // fDatimeM
    put_u32(&mut d, nbytes_keys);
    put_u32(&mut d, 0); // fNbytesName
    put_u32(&mut d, 0); // fSeekDir
    put_u32(&mut d, 0); // fSeekParent
    put_u32(&mut d, seek_keys);
    d
}

fn write_directory(f: &mut Vec<u8>, items: &[Item], compress: bool) -> (u32, u32) {
    let mut headers = Vec::new();
    for item in items {
        let header = match item {
            Item::Object { class, name, cycle, payload } => {
                write_record(f, class, name, *cycle, payload, compress)
            }
            Item::Dir { name, items } => {
                let (seek_keys, nbytes_keys) = write_directory(f, items, compress);
                let payload = dir_streamer(seek_keys, nbytes_keys);
                write_record(f, "TDirectoryFile", name, 1, &payload, false)
            }
        };
        headers.push(header);
    }

    let seek_keys = f.len();
    let mut body = Vec::new();
    put_u32(&mut body, headers.len() as u32);
    for h in &headers {
        body.extend_from_slice(h);
    }
    let list = key_header("TDirectory", "", 1, body.len(), body.len(), seek_keys);
    f.extend_from_slice(&list);
    f.extend_from_slice(&body);
    (seek_keys as u32, (f.len() - seek_keys) as u32)
}

fn write_record(
    f: &mut Vec<u8>,
    class: &str,
    name: &str,
    cycle: u16,
    payload: &[u8],
    compress: bool,
) -> Vec<u8> {
    let block = compress.then(|| zlib_block(payload)).filter(|b| b.len() < payload.len());
    let data = block.as_deref().unwrap_or(payload);
    let seek = f.len();
    let header = key_header(class, name, cycle, payload.len(), data.len(), seek);
    f.extend_from_slice(&header);
    f.extend_from_slice(data);
    header
}

fn key_header(
    class: &str,
    name: &str,
    cycle: u16,
    obj_len: usize,
    data_len: usize,
    seek_key: usize,
) -> Vec<u8> {
    let mut strings = Vec::new();
    put_string(&mut strings, class);
    put_string(&mut strings, name);
    put_string(&mut strings, name);
    let key_len = KEY_FIXED_LEN + strings.len();

    let mut k = Vec::with_capacity(key_len);
    put_u32(&mut k, (key_len + data_len) as u32);
    put_u16(&mut k, 4);
    put_u32(&mut k, obj_len as u32);
    put_u32(&mut k, 0); // fDatime
    put_u16(&mut k, key_len as u16);
    put_u16(&mut k, cycle);
    put_u32(&mut k, seek_key as u32);
    put_u32(&mut k, BEGIN as u32); // fSeekPdir
    k.extend_from_slice(&strings);
    k
}

fn zlib_block(payload: &[u8]) -> Vec<u8> {
    let mut enc = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    enc.write_all(payload).unwrap();
    let compressed = enc.finish().unwrap();

    let mut b = Vec::with_capacity(9 + compressed.len());
    b.extend_from_slice(b"ZL");
    b.push(8);
    b.extend_from_slice(&(compressed.len() as u32).to_le_bytes()[..3]);
    b.extend_from_slice(&(payload.len() as u32).to_le_bytes()[..3]);
    b.extend_from_slice(&compressed);
    b
}
