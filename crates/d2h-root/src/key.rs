//! TKey records: the headers that locate every object in a ROOT file.

use crate::error::Result;
use crate::rbuffer::RBuffer;

/// A parsed TKey header.
#[derive(Debug, Clone)]
pub struct Key {
    /// Bytes on disk: key header plus (possibly compressed) object.
    pub n_bytes: u32,
    /// Key class version; above 1000 the seek pointers are 64-bit.
    pub version: u16,
    /// Uncompressed object length.
    pub obj_len: u32,
    /// Length of the key header.
    pub key_len: u16,
    /// Cycle number within the directory.
    pub cycle: u16,
    /// Absolute position of the key.
    pub seek_key: u64,
    /// Class name of the stored object.
    pub class_name: String,
    /// Object name.
    pub name: String,
    /// Object title.
    pub title: String,
}

/// Public summary of a key, as returned by the listing functions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyInfo {
    /// Object name.
    pub name: String,
    /// Class name (e.g. "TH1D", "TGraphAsymmErrors", "TDirectoryFile").
    pub class_name: String,
    /// Cycle number.
    pub cycle: u16,
}

impl From<&Key> for KeyInfo {
    fn from(key: &Key) -> Self {
        Self { name: key.name.clone(), class_name: key.class_name.clone(), cycle: key.cycle }
    }
}

impl Key {
    /// Read a TKey at the cursor. `is_large` is the file-level 64-bit flag.
    pub fn read(r: &mut RBuffer, is_large: bool) -> Result<Self> {
        let n_bytes = r.read_u32()?;
        let version = r.read_u16()?;
        let obj_len = r.read_u32()?;
        let _datime = r.read_u32()?;
        let key_len = r.read_u16()?;
        let cycle = r.read_u16()?;

        let wide = version > 1000 || is_large;
        let seek_key = r.read_seek(wide)?;
        let _seek_pdir = r.read_seek(wide)?;

        let class_name = r.read_string()?;
        let name = r.read_string()?;
        let title = r.read_string()?;

        Ok(Key { n_bytes, version, obj_len, key_len, cycle, seek_key, class_name, name, title })
    }

    /// Whether the key points at a sub-directory.
    pub fn is_directory(&self) -> bool {
        matches!(self.class_name.as_str(), "TDirectoryFile" | "TDirectory")
    }

    /// Whether the stored object is compressed.
    pub fn is_compressed(&self) -> bool {
        self.obj_len as usize != (self.n_bytes as usize).saturating_sub(self.key_len as usize)
    }
}
