//! ROOT compression blocks (ZL = zlib, L4 = LZ4, ZS = ZSTD, XZ = LZMA).
//!
//! A compressed object is a sequence of blocks, each with a 9-byte header:
//! ```text
//! bytes 0-1:  algorithm tag ("ZL", "XZ", "L4", "ZS")
//! byte  2:    method (ignored)
//! bytes 3-5:  compressed size   (3-byte little-endian)
//! bytes 6-8:  uncompressed size (3-byte little-endian)
//! ```

use std::io::Read;

use crate::error::{Result, RootError};

const BLOCK_HEADER_LEN: usize = 9;

/// Decompress a ROOT object into exactly `expected_len` bytes.
pub fn decompress(src: &[u8], expected_len: usize) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(expected_len);
    let mut offset = 0;

    while out.len() < expected_len {
        let Some(header) = src.get(offset..offset + BLOCK_HEADER_LEN) else {
            return Err(RootError::Decompression(format!(
                "truncated block header at offset {} ({} of {} bytes decoded)",
                offset,
                out.len(),
                expected_len
            )));
        };
        let tag = &header[0..2];
        let c_size = read_le24(&header[3..6]);
        let u_size = read_le24(&header[6..9]);
        offset += BLOCK_HEADER_LEN;

        let Some(compressed) = src.get(offset..offset + c_size) else {
            return Err(RootError::Decompression(format!(
                "compressed block claims {} bytes but only {} remain",
                c_size,
                src.len().saturating_sub(offset)
            )));
        };

        let block = match tag {
            b"ZL" => decompress_zlib(compressed, u_size)?,
            b"L4" => decompress_lz4(compressed, u_size)?,
            b"ZS" => decompress_zstd(compressed, u_size)?,
            b"XZ" => decompress_xz(compressed, u_size)?,
            _ => {
                return Err(RootError::Decompression(format!(
                    "unsupported compression algorithm {:?}",
                    String::from_utf8_lossy(tag)
                )));
            }
        };
        if block.len() != u_size {
            return Err(RootError::Decompression(format!(
                "block expanded to {} bytes, header says {}",
                block.len(),
                u_size
            )));
        }

        out.extend_from_slice(&block);
        offset += c_size;
    }

    if out.len() != expected_len {
        return Err(RootError::Decompression(format!(
            "total decompressed length {} != expected {}",
            out.len(),
            expected_len
        )));
    }
    Ok(out)
}

fn decompress_zlib(data: &[u8], expected: usize) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(expected);
    flate2::read::ZlibDecoder::new(data)
        .read_to_end(&mut out)
        .map_err(|e| RootError::Decompression(format!("zlib: {}", e)))?;
    Ok(out)
}

fn decompress_lz4(data: &[u8], expected: usize) -> Result<Vec<u8>> {
    // An 8-byte xxhash64 checksum precedes the LZ4 payload; it is not verified.
    let payload = data
        .get(8..)
        .ok_or_else(|| RootError::Decompression("LZ4 block shorter than its checksum".into()))?;
    lz4_flex::decompress(payload, expected)
        .map_err(|e| RootError::Decompression(format!("lz4: {}", e)))
}

fn decompress_zstd(data: &[u8], expected: usize) -> Result<Vec<u8>> {
    let mut out = vec![0u8; expected];
    let written = ruzstd::decoding::FrameDecoder::new()
        .decode_all(data, &mut out)
        .map_err(|e| RootError::Decompression(format!("zstd: {}", e)))?;
    out.truncate(written);
    Ok(out)
}

fn decompress_xz(data: &[u8], expected: usize) -> Result<Vec<u8>> {
    let mut input = std::io::BufReader::new(data);
    let mut out = Vec::with_capacity(expected);
    lzma_rs::xz_decompress(&mut input, &mut out)
        .map_err(|e| RootError::Decompression(format!("xz: {}", e)))?;
    Ok(out)
}

fn read_le24(b: &[u8]) -> usize {
    b[0] as usize | ((b[1] as usize) << 8) | ((b[2] as usize) << 16)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &[u8] = b"hCorrFracNonPrompt hCorrFracNonPrompt hCorrFracNonPrompt 0000000000";

    fn block(tag: &[u8; 2], method: u8, compressed: &[u8], u_len: usize) -> Vec<u8> {
        let mut b = Vec::with_capacity(BLOCK_HEADER_LEN + compressed.len());
        b.extend_from_slice(tag);
        b.push(method);
        b.extend_from_slice(&(compressed.len() as u32).to_le_bytes()[..3]);
        b.extend_from_slice(&(u_len as u32).to_le_bytes()[..3]);
        b.extend_from_slice(compressed);
        b
    }

    fn zlib(data: &[u8]) -> Vec<u8> {
        use std::io::Write;
        let mut enc = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        enc.write_all(data).unwrap();
        enc.finish().unwrap()
    }

    #[test]
    fn le24() {
        assert_eq!(read_le24(&[0x10, 0x00, 0x00]), 16);
        assert_eq!(read_le24(&[0x00, 0x01, 0x00]), 256);
        assert_eq!(read_le24(&[0xff, 0xff, 0xff]), 0xFF_FFFF);
    }

    #[test]
    fn zlib_block() {
        let b = block(b"ZL", 8, &zlib(PAYLOAD), PAYLOAD.len());
        assert_eq!(decompress(&b, PAYLOAD.len()).unwrap(), PAYLOAD);
    }

    #[test]
    fn multiple_blocks_are_concatenated() {
        let (a, c) = PAYLOAD.split_at(20);
        let mut src = block(b"ZL", 8, &zlib(a), a.len());
        src.extend(block(b"ZL", 8, &zlib(c), c.len()));
        assert_eq!(decompress(&src, PAYLOAD.len()).unwrap(), PAYLOAD);
    }

    #[test]
    fn lz4_block_skips_checksum() {
        let mut compressed = vec![0u8; 8];
        compressed.extend(lz4_flex::compress(PAYLOAD));
        let b = block(b"L4", 1, &compressed, PAYLOAD.len());
        assert_eq!(decompress(&b, PAYLOAD.len()).unwrap(), PAYLOAD);
    }

    #[test]
    fn zstd_block() {
        let compressed =
            ruzstd::encoding::compress_to_vec(PAYLOAD, ruzstd::encoding::CompressionLevel::Fastest);
        let b = block(b"ZS", 5, &compressed, PAYLOAD.len());
        assert_eq!(decompress(&b, PAYLOAD.len()).unwrap(), PAYLOAD);
    }

    #[test]
    fn xz_block() {
        let mut compressed = Vec::new();
        lzma_rs::xz_compress(&mut std::io::BufReader::new(PAYLOAD), &mut compressed).unwrap();
        let b = block(b"XZ", 5, &compressed, PAYLOAD.len());
        assert_eq!(decompress(&b, PAYLOAD.len()).unwrap(), PAYLOAD);
    }

    #[test]
    fn rejects_unknown_tag_and_truncation() {
        let b = block(b"QQ", 0, b"abc", 3);
        assert!(matches!(decompress(&b, 3), Err(RootError::Decompression(_))));

        let b = block(b"ZL", 8, &zlib(PAYLOAD), PAYLOAD.len());
        assert!(decompress(&b[..b.len() - 4], PAYLOAD.len()).is_err());
        assert!(decompress(&b, PAYLOAD.len() + 1).is_err());
    }
}
