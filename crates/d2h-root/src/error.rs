//! Error types for ROOT file reading.

use thiserror::Error;

/// Errors raised while reading a ROOT file.
#[derive(Error, Debug)]
pub enum RootError {
    /// I/O error opening or mapping the file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file does not start with the `root` magic or is truncated.
    #[error("not a ROOT file (bad magic or too short)")]
    BadMagic,

    /// Tried to read past the end of a buffer.
    #[error("buffer underflow at offset {offset}: need {need} bytes, have {have}")]
    BufferUnderflow {
        /// Read position.
        offset: usize,
        /// Bytes requested.
        need: usize,
        /// Bytes available.
        have: usize,
    },

    /// A compressed block could not be decoded.
    #[error("decompression error: {0}")]
    Decompression(String),

    /// Malformed streamer data.
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// No key with the requested name.
    #[error("key not found: {0}")]
    KeyNotFound(String),

    /// The object exists but its class cannot be read.
    #[error("unsupported class: {0}")]
    UnsupportedClass(String),
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, RootError>;
