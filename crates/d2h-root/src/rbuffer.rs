//! Big-endian cursor over ROOT streamer bytes.

use crate::error::{Result, RootError};

/// `kByteCountMask`: set on the leading u32 of a versioned object.
const BYTE_COUNT_MASK: u32 = 0x4000_0000;
/// `TObject::kIsReferenced`: a 2-byte process id follows the bits.
const IS_REFERENCED: u32 = 1 << 4;

/// Cursor over a byte slice using ROOT's big-endian conventions.
pub struct RBuffer<'a> {
    data: &'a [u8],
    pos: usize,
}

macro_rules! read_be {
    ($($(#[$doc:meta])* $fn_name:ident => $ty:ty;)*) => {
        $(
            $(#[$doc])*
            pub fn $fn_name(&mut self) -> Result<$ty> {
                Ok(<$ty>::from_be_bytes(self.read_array()?))
            }
        )*
    };
}

impl<'a> RBuffer<'a> {
    /// Reader positioned at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Reader positioned at `pos`.
    pub fn at(data: &'a [u8], pos: usize) -> Self {
        Self { data, pos }
    }

    /// Current read position.
    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Bytes left after the cursor.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Move forward to `end` if it lies ahead of the cursor.
    ///
    /// Used to jump over the members of a versioned object that are not read.
    pub fn seek_forward(&mut self, end: Option<usize>) -> Result<()> {
        if let Some(end) = end
            && end > self.pos
        {
            if end > self.data.len() {
                return Err(self.underflow(end - self.pos));
            }
            self.pos = end;
        }
        Ok(())
    }

    /// Skip `n` bytes.
    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.ensure(n)?;
        self.pos += n;
        Ok(())
    }

    /// Borrow the next `n` bytes.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        self.ensure(n)?;
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let b = self.read_bytes(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(b);
        Ok(out)
    }

    read_be! {
        /// Read one byte.
        read_u8 => u8;
        /// Read a big-endian u16.
        read_u16 => u16;
        /// Read a big-endian i16.
        read_i16 => i16;
        /// Read a big-endian u32.
        read_u32 => u32;
        /// Read a big-endian i32.
        read_i32 => i32;
        /// Read a big-endian u64.
        read_u64 => u64;
        /// Read a big-endian f32.
        read_f32 => f32;
        /// Read a big-endian f64.
        read_f64 => f64;
    }

    /// Read a seek pointer: u64 when `wide`, u32 otherwise.
    pub fn read_seek(&mut self, wide: bool) -> Result<u64> {
        if wide { self.read_u64() } else { Ok(self.read_u32()? as u64) }
    }

    /// Read a `TString`: one length byte, or 255 followed by a u32 length.
    pub fn read_string(&mut self) -> Result<String> {
        let first = self.read_u8()?;
        let len = if first == 255 { self.read_u32()? as usize } else { first as usize };
        let bytes = self.read_bytes(len)?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    /// Read a streamer version header.
    ///
    /// Returns the class version and, when a byte count is present, the
    /// absolute position where the object ends. The byte count covers
    /// everything after the leading u32, the version included.
    pub fn read_version(&mut self) -> Result<(u16, Option<usize>)> {
        let start = self.pos;
        let raw = self.read_u32()?;
        if raw & BYTE_COUNT_MASK != 0 {
            let byte_count = (raw & !BYTE_COUNT_MASK) as usize;
            let version = self.read_u16()?;
            Ok((version, Some(start + 4 + byte_count)))
        } else {
            // Old-style header: the first two bytes are the version.
            self.pos = start + 2;
            Ok(((raw >> 16) as u16, None))
        }
    }

    /// Skip a versioned object using its byte count.
    ///
    /// Objects written without a byte count consist of the bare version.
    pub fn skip_object(&mut self) -> Result<()> {
        let (_ver, end) = self.read_version()?;
        self.seek_forward(end)
    }

    /// Read a `TObject`: version, fUniqueID, fBits (and the pid when referenced).
    pub fn read_tobject(&mut self) -> Result<(u32, u32)> {
        let _ver = self.read_u16()?;
        let unique_id = self.read_u32()?;
        let bits = self.read_u32()?;
        if bits & IS_REFERENCED != 0 {
            self.skip(2)?;
        }
        Ok((unique_id, bits))
    }

    /// Read a `TNamed`: TObject, fName, fTitle.
    pub fn read_tnamed(&mut self) -> Result<(String, String)> {
        let (_ver, end) = self.read_version()?;
        self.read_tobject()?;
        let name = self.read_string()?;
        let title = self.read_string()?;
        self.seek_forward(end)?;
        Ok((name, title))
    }

    /// Read `n` big-endian f64 values.
    pub fn read_array_f64(&mut self, n: usize) -> Result<Vec<f64>> {
        self.ensure(n.saturating_mul(8))?;
        (0..n).map(|_| self.read_f64()).collect()
    }

    /// Read `n` big-endian f32 values widened to f64.
    pub fn read_array_f32(&mut self, n: usize) -> Result<Vec<f64>> {
        self.ensure(n.saturating_mul(4))?;
        (0..n).map(|_| self.read_f32().map(f64::from)).collect()
    }

    /// Read `n` big-endian i32 values widened to f64.
    pub fn read_array_i32(&mut self, n: usize) -> Result<Vec<f64>> {
        self.ensure(n.saturating_mul(4))?;
        (0..n).map(|_| self.read_i32().map(f64::from)).collect()
    }

    /// Read a `TArrayD`: u32 length then the values.
    pub fn read_tarray_f64(&mut self) -> Result<Vec<f64>> {
        let n = self.read_u32()? as usize;
        self.read_array_f64(n)
    }

    /// Read a counted `Double_t*` member of length `n`.
    ///
    /// A leading flag byte of 0 means the pointer was null; zeros are returned.
    pub fn read_counted_f64(&mut self, n: usize) -> Result<Vec<f64>> {
        if self.read_u8()? == 0 {
            return Ok(vec![0.0; n]);
        }
        self.read_array_f64(n)
    }

    /// Read a `std::vector<double>` data member: version header, u32 length,
    /// then the values.
    pub fn read_stl_vec_f64(&mut self) -> Result<Vec<f64>> {
        let (_ver, end) = self.read_version()?;
        let n = self.read_u32()? as usize;
        let values = self.read_array_f64(n)?;
        self.seek_forward(end)?;
        Ok(values)
    }

    fn underflow(&self, need: usize) -> RootError {
        RootError::BufferUnderflow { offset: self.pos, need, have: self.remaining() }
    }

    fn ensure(&self, n: usize) -> Result<()> {
        if self.pos.checked_add(n).is_none_or(|end| end > self.data.len()) {
            return Err(self.underflow(n));
        }
        Ok(())
    }
}
