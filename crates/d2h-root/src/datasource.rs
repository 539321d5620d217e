//! Memory-mapped or owned data backing for ROOT file reads.

use std::ops::Deref;

/// Backing storage for a ROOT file.
///
/// `Mmap` is used for files opened from disk; `Owned` for `from_bytes()` and tests.
pub enum DataSource {
    /// File bytes owned in a `Vec<u8>`.
    Owned(Vec<u8>),
    /// Memory-mapped file.
    Mmap(memmap2::Mmap),
}

impl Deref for DataSource {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &[u8] {
        match self {
            DataSource::Owned(v) => v,
            DataSource::Mmap(m) => m,
        }
    }
}
