//! Binary data decoding for mzML
//!
//! mzML stores numerical arrays (m/z, intensity) as Base64-encoded binary data,
//! optionally compressed with zlib. This module handles the decoding pipeline:
//!
//! 1. Base64 decode the text
//! 2. Decompress if needed (zlib)
//! 3. Interpret bytes as float32 or float64 (little-endian)

use std::io::Read;

use base64::prelude::*;
use byteorder::{ByteOrder, LittleEndian};
use flate2::read::ZlibDecoder;

/// Compression types used in mzML binary data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionType {
    /// No compression (raw binary)
    #[default]
    None,
    /// zlib compression (most common)
    Zlib,
    /// Any MS-Numpress variant
    Numpress,
}

/// Binary encoding precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BinaryEncoding {
    /// 32-bit floating point (CV: MS:1000521)
    Float32,
    /// 64-bit floating point (CV: MS:1000523)
    #[default]
    Float64,
}

impl BinaryEncoding {
    /// Get the byte size per value
    pub fn byte_size(&self) -> usize {
        match self {
            BinaryEncoding::Float32 => 4,
            BinaryEncoding::Float64 => 8,
        }
    }
}

/// Errors that can occur during binary decoding
#[derive(Debug, thiserror::Error)]
pub enum BinaryDecodeError {
    /// Payload is not valid Base64
    #[error("Base64 decode error: {0}")]
    Base64Error(#[from] base64::DecodeError),

    /// zlib stream is corrupt
    #[error("Decompression error: {0}")]
    DecompressionError(#[from] std::io::Error),

    /// Decoded value count does not match the declared array length
    #[error("Invalid data length: expected {expected}, got {actual}")]
    InvalidLength {
        /// Expected number of values (or bytes)
        expected: usize,
        /// Actual number of values (or bytes)
        actual: usize,
    },

    /// Inflated data is larger than the array can hold
    #[error("Decompressed data exceeds {limit} bytes")]
    DecompressedTooLarge {
        /// Byte limit derived from the declared array length
        limit: usize,
    },

    /// Compression scheme not supported by this decoder
    #[error("Unsupported compression: {0:?}")]
    UnsupportedCompression(CompressionType),
}

/// Decoder for mzML binary data arrays
pub struct BinaryDecoder;

impl BinaryDecoder {
    /// Decode a Base64-encoded binary array from mzML
    ///
    /// `expected_length` is the spectrum's `defaultArrayLength`; when given,
    /// the decoded value count must match it. An empty payload decodes to an
    /// empty array.
    pub fn decode(
        base64_data: &str,
        encoding: BinaryEncoding,
        compression: CompressionType,
        expected_length: Option<usize>,
    ) -> Result<Vec<f64>, BinaryDecodeError> {
        let payload = base64_data.trim();
        if payload.is_empty() {
            return Ok(Vec::new());
        }

        let raw = BASE64_STANDARD.decode(payload)?;
        let bytes = match compression {
            CompressionType::None => raw,
            CompressionType::Zlib => {
                let limit = expected_length.map_or(MAX_UNSIZED_ARRAY_BYTES, |n| {
                    n.saturating_mul(encoding.byte_size())
                });
                inflate(&raw, limit)?
            }
            CompressionType::Numpress => {
                return Err(BinaryDecodeError::UnsupportedCompression(compression));
            }
        };

        let values = to_floats(&bytes, encoding)?;
        match expected_length {
            Some(expected) if expected != values.len() => Err(BinaryDecodeError::InvalidLength {
                expected,
                actual: values.len(),
            }),
            _ => Ok(values),
        }
    }
}

/// Upper bound on the inflated size of an array without a declared length
pub const MAX_UNSIZED_ARRAY_BYTES: usize = 256 * 1024 * 1024;

/// Inflate a zlib stream; output past `limit` bytes is an error
fn inflate(compressed: &[u8], limit: usize) -> Result<Vec<u8>, BinaryDecodeError> {
    let capacity = limit.min(compressed.len().saturating_mul(4));
    let mut out = Vec::with_capacity(capacity);
    ZlibDecoder::new(compressed)
        .take((limit as u64).saturating_add(1))
        .read_to_end(&mut out)?;
    if out.len() > limit {
        return Err(BinaryDecodeError::DecompressedTooLarge { limit });
    }
    Ok(out)
}

/// Little-endian floats widened to f64; a trailing partial value is an error
fn to_floats(bytes: &[u8], encoding: BinaryEncoding) -> Result<Vec<f64>, BinaryDecodeError> {
    let width = encoding.byte_size();
    let chunks = bytes.chunks_exact(width);
    if !chunks.remainder().is_empty() {
        return Err(BinaryDecodeError::InvalidLength {
            expected: bytes.len() - chunks.remainder().len(),
            actual: bytes.len(),
        });
    }

    Ok(match encoding {
        BinaryEncoding::Float32 => chunks.map(|c| LittleEndian::read_f32(c) as f64).collect(),
        BinaryEncoding::Float64 => chunks.map(LittleEndian::read_f64).collect(),
    })
}
