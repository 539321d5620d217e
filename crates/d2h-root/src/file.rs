//! TFile header parsing and the top-level ROOT file interface.

use std::fs;
use std::path::{Path, PathBuf};

use crate::datasource::DataSource;
use crate::decompress::decompress;
use crate::directory::{Directory, DirectoryHeader};
use crate::error::{Result, RootError};
use crate::histogram::{Graph, Histogram, SampledFunction};
use crate::key::{Key, KeyInfo};
use crate::objects;
use crate::rbuffer::RBuffer;

const ROOT_MAGIC: &[u8; 4] = b"root";
/// Smallest byte count that can hold the fixed file header.
const MIN_FILE_LEN: usize = 64;

/// Fields of the file header needed for navigation.
#[derive(Debug, Clone, Copy)]
struct FileHeader {
    /// Whether seek pointers are 64-bit (fVersion >= 1000000).
    is_large: bool,
    /// Key list of the top directory.
    top: DirectoryHeader,
}

/// A ROOT file opened for reading histograms and graphs.
pub struct RootFile {
    data: DataSource,
    header: FileHeader,
    path: PathBuf,
}

impl RootFile {
    /// Open and parse a ROOT file from disk using memory mapping.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = fs::File::open(&path)?;
        // SAFETY: the mapping is read-only; the macros never modify their inputs
        // while a job is running.
        let mmap = unsafe { memmap2::Mmap::map(&file)? };
        Self::from_datasource(DataSource::Mmap(mmap), path)
    }

    /// Parse a ROOT file held in memory.
    pub fn from_bytes(data: Vec<u8>, path: PathBuf) -> Result<Self> {
        Self::from_datasource(DataSource::Owned(data), path)
    }

    fn from_datasource(data: DataSource, path: PathBuf) -> Result<Self> {
        if data.len() < MIN_FILE_LEN || &data[0..4] != ROOT_MAGIC {
            return Err(RootError::BadMagic);
        }
        let header = Self::parse_header(&data)?;
        tracing::debug!(
            path = %path.display(),
            is_large = header.is_large,
            seek_keys = header.top.seek_keys,
            "opened ROOT file"
        );
        Ok(Self { data, header, path })
    }

    /// Parse the file header and locate the top directory.
    ///
    /// ```text
    /// offset  size  field (small file; sizes double for large files where marked)
    ///    0      4   magic "root"
    ///    4      4   fVersion
    ///    8      4   fBEGIN
    ///   12    4|8   fEND
    ///   ..    4|8   fSeekFree
    ///   ..      4   fNbytesFree, nfree, fNbytesName
    ///   ..      1   fUnits
    ///   ..      4   fCompress
    ///   ..    4|8   fSeekInfo
    ///   ..      4   fNbytesInfo
    ///   ..     18   fUUID
    /// ```
    /// The top TDirectory streamer sits at `fBEGIN + fNbytesName`.
    fn parse_header(data: &[u8]) -> Result<FileHeader> {
        let mut r = RBuffer::at(data, 4);
        let version = r.read_u32()?;
        let is_large = version >= 1_000_000;
        let begin = r.read_u32()? as usize;
        let _end = r.read_seek(is_large)?;
        let _seek_free = r.read_seek(is_large)?;
        let _nbytes_free = r.read_u32()?;
        let _nfree = r.read_u32()?;
        let nbytes_name = r.read_u32()? as usize;

        let dir_offset = begin + nbytes_name;
        if dir_offset >= data.len() {
            return Err(RootError::Deserialization(format!(
                "top directory offset {} past end of file ({} bytes)",
                dir_offset,
                data.len()
            )));
        }
        let top = DirectoryHeader::read(&mut RBuffer::at(data, dir_offset))?;
        Ok(FileHeader { is_large, top })
    }

    /// Path the file was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Keys of the top-level directory (latest cycle of each name).
    pub fn list_keys(&self) -> Result<Vec<KeyInfo>> {
        self.list_keys_in("")
    }

    /// Keys of the directory at `dir_path` (e.g. `"fits/pt2_4"`).
    pub fn list_keys_in(&self, dir_path: &str) -> Result<Vec<KeyInfo>> {
        let dir = self.resolve_directory(dir_path)?;
        Ok(dir.latest_keys().into_iter().map(KeyInfo::from).collect())
    }

    /// Class name of the object at `path`.
    pub fn class_of(&self, path: &str) -> Result<String> {
        let (dir, name) = self.resolve_parent(path)?;
        let key = dir.find_key(name).ok_or_else(|| RootError::KeyNotFound(path.to_string()))?;
        Ok(key.class_name.clone())
    }

    /// Read a 1D histogram by path (e.g. `"subdir/hist_name"`).
    pub fn get_histogram(&self, path: &str) -> Result<Histogram> {
        let (dir, name) = self.resolve_parent(path)?;
        let key = dir.find_key(name).ok_or_else(|| RootError::KeyNotFound(path.to_string()))?;
        let payload = self.read_key_payload(key)?;
        objects::read_histogram(&payload, &key.class_name)
    }

    /// Read a graph by path.
    pub fn get_graph(&self, path: &str) -> Result<Graph> {
        let (dir, name) = self.resolve_parent(path)?;
        let key = dir.find_key(name).ok_or_else(|| RootError::KeyNotFound(path.to_string()))?;
        let payload = self.read_key_payload(key)?;
        objects::read_graph(&payload, &key.class_name)
    }

    /// Read the stored samples of a function (TF1) by path.
    pub fn get_function(&self, path: &str) -> Result<SampledFunction> {
        let (dir, name) = self.resolve_parent(path)?;
        let key = dir.find_key(name).ok_or_else(|| RootError::KeyNotFound(path.to_string()))?;
        let payload = self.read_key_payload(key)?;
        objects::read_function(&payload, &key.class_name)
    }

    /// Split `path` into its directory and leaf name and read the directory.
    fn resolve_parent<'p>(&self, path: &'p str) -> Result<(Directory, &'p str)> {
        let trimmed = path.trim_matches('/');
        if trimmed.is_empty() {
            return Err(RootError::KeyNotFound(path.to_string()));
        }
        match trimmed.rsplit_once('/') {
            Some((dir, name)) => Ok((self.resolve_directory(dir)?, name)),
            None => Ok((self.read_top_directory()?, trimmed)),
        }
    }

    fn resolve_directory(&self, dir_path: &str) -> Result<Directory> {
        let mut current = self.read_top_directory()?;
        for part in dir_path.split('/').filter(|s| !s.is_empty()) {
            let key = current.find_key(part).ok_or_else(|| {
                RootError::KeyNotFound(format!("{} (in path {})", part, dir_path))
            })?;
            if !key.is_directory() {
                return Err(RootError::Deserialization(format!(
                    "'{}' is not a directory (class: {})",
                    part, key.class_name
                )));
            }
            current = self.read_subdirectory(key)?;
        }
        Ok(current)
    }

    fn read_top_directory(&self) -> Result<Directory> {
        Directory::read(&self.data, self.header.top, self.header.is_large)
    }

    fn read_subdirectory(&self, key: &Key) -> Result<Directory> {
        let payload = self.read_key_payload(key)?;
        let header = DirectoryHeader::read(&mut RBuffer::new(&payload))?;
        Directory::read(&self.data, header, self.header.is_large)
    }

    /// Read and, when needed, decompress the object behind `key`.
    fn read_key_payload(&self, key: &Key) -> Result<Vec<u8>> {
        let start = key.seek_key as usize;
        let end = start + key.n_bytes as usize;
        let Some(record) = self.data.get(start..end) else {
            return Err(RootError::BufferUnderflow {
                offset: start,
                need: key.n_bytes as usize,
                have: self.data.len().saturating_sub(start),
            });
        };
        let object = record.get(key.key_len as usize..).ok_or_else(|| {
            RootError::Deserialization(format!(
                "key '{}' header length {} exceeds record size {}",
                key.name, key.key_len, key.n_bytes
            ))
        })?;
        if key.is_compressed() {
            decompress(object, key.obj_len as usize)
        } else {
            Ok(object.to_vec())
        }
    }
}
