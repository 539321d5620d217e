//! TDirectory key lists.

use crate::error::Result;
use crate::key::Key;
use crate::rbuffer::RBuffer;

/// Location of a directory's key list, decoded from a TDirectory streamer.
#[derive(Debug, Clone, Copy)]
pub struct DirectoryHeader {
    /// Bytes occupied by the key list.
    pub nbytes_keys: u32,
    /// Absolute position of the key list (0 for an empty directory).
    pub seek_keys: u64,
}

impl DirectoryHeader {
    /// Decode a TDirectory streamer at the cursor.
    pub fn read(r: &mut RBuffer) -> Result<Self> {
        let version = r.read_u16()?;
        let _datime_c = r.read_u32()?;
        let _datime_m = r.read_u32()?;
        let nbytes_keys = r.read_u32()?;
        let _nbytes_name = r.read_u32()?;

        let wide = version > 1000;
        let _seek_dir = r.read_seek(wide)?;
        let _seek_parent = r.read_seek(wide)?;
        let seek_keys = r.read_seek(wide)?;
        Ok(Self { nbytes_keys, seek_keys })
    }
}

/// The ordered keys of one directory.
#[derive(Debug, Clone, Default)]
pub struct Directory {
    keys: Vec<Key>,
}

impl Directory {
    /// Read the key list described by `header` from the file bytes.
    ///
    /// The list is stored as its own TKey, followed by a u32 key count and the
    /// key headers.
    pub fn read(file_data: &[u8], header: DirectoryHeader, is_large: bool) -> Result<Self> {
        if header.seek_keys == 0 {
            return Ok(Self::default());
        }
        let mut r = RBuffer::at(file_data, header.seek_keys as usize);
        let _list_key = Key::read(&mut r, is_large)?;
        let nkeys = r.read_u32()? as usize;
        let mut keys = Vec::with_capacity(nkeys.min(r.remaining()));
        for _ in 0..nkeys {
            keys.push(Key::read(&mut r, is_large)?);
        }
        tracing::trace!(seek_keys = header.seek_keys, nkeys, "read key list");
        Ok(Self { keys })
    }

    /// All keys in storage order (every cycle).
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    /// Keys with only the highest cycle of each name, in first-seen order.
    pub fn latest_keys(&self) -> Vec<&Key> {
        let mut out: Vec<&Key> = Vec::new();
        for key in &self.keys {
            match out.iter_mut().find(|k| k.name == key.name) {
                Some(slot) if slot.cycle < key.cycle => *slot = key,
                Some(_) => {}
                None => out.push(key),
            }
        }
        out
    }

    /// Key called `name` with the highest cycle.
    pub fn find_key(&self, name: &str) -> Option<&Key> {
        self.keys.iter().filter(|k| k.name == name).max_by_key(|k| k.cycle)
    }
}
