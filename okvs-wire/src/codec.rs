//! Serialization of a block matrix: `rows (u64 BE) ∥ cols (u64 BE) ∥ data`.
//!
//! Only the header is endian-normalized; elements are written in their
//! in-memory layout. The same bytes are used on the wire and at rest.

use std::fs;
use std::path::Path;

use okvs_core::{Block, Matrix};

/// Length of the serialized header.
pub const HEADER_LEN: usize = 16;

/// Errors that can occur while encoding or decoding the matrix layout.
#[derive(Debug, thiserror::Error)]
#[allow(missing_docs)]
pub enum CodecError {
    #[error("truncated header: got {0} bytes, need {HEADER_LEN}")]
    TruncatedHeader(usize),
    #[error("truncated input: declared {expected} bytes, got {actual}")]
    TruncatedInput { expected: usize, actual: usize },
    #[error("trailing bytes: declared {expected} bytes, got {actual}")]
    TrailingBytes { expected: usize, actual: usize },
    #[error("declared shape {rows}x{cols} overflows the address space")]
    LengthOverflow { rows: u64, cols: u64 },
    #[error("i/o failure")]
    Io(#[from] std::io::Error),
}

/// Payload length in bytes for a declared shape.
pub(crate) fn payload_len(rows: u64, cols: u64) -> Result<usize, CodecError> {
    rows.checked_mul(cols)
        .and_then(|elems| elems.checked_mul(Block::LEN as u64))
        .and_then(|bytes| usize::try_from(bytes).ok())
        .ok_or(CodecError::LengthOverflow { rows, cols })
}

/// Serializes a matrix into the header + payload layout.
///
/// A 0-size matrix serializes to the bare 16-byte header.
pub fn serialize(matrix: &Matrix<Block>) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_LEN + matrix.data().len() * Block::LEN);
    out.extend_from_slice(&(matrix.rows() as u64).to_be_bytes());
    out.extend_from_slice(&(matrix.cols() as u64).to_be_bytes());
    out.extend_from_slice(bytemuck::cast_slice(matrix.data()));
    out
}

/// Deserializes a matrix from the header + payload layout.
///
/// The input must carry exactly the declared number of payload bytes;
/// shortfall and excess are both framing errors.
pub fn deserialize(bytes: &[u8]) -> Result<Matrix<Block>, CodecError> {
    if bytes.len() < HEADER_LEN {
        return Err(CodecError::TruncatedHeader(bytes.len()));
    }
    let mut word = [0u8; 8];
    word.copy_from_slice(&bytes[..8]);
    let rows = u64::from_be_bytes(word);
    word.copy_from_slice(&bytes[8..16]);
    let cols = u64::from_be_bytes(word);
    let payload = payload_len(rows, cols)?;

    let expected = HEADER_LEN + payload;
    if bytes.len() < expected {
        return Err(CodecError::TruncatedInput {
            expected,
            actual: bytes.len(),
        });
    }
    if bytes.len() > expected {
        return Err(CodecError::TrailingBytes {
            expected,
            actual: bytes.len(),
        });
    }

    let mut matrix = Matrix::<Block>::new(rows as usize, cols as usize);
    bytemuck::cast_slice_mut::<Block, u8>(matrix.data_mut())
        .copy_from_slice(&bytes[HEADER_LEN..expected]);
    Ok(matrix)
}

/// Persists a matrix to a file in the identical layout.
pub fn write_to_file(matrix: &Matrix<Block>, path: impl AsRef<Path>) -> Result<(), CodecError> {
    fs::write(path, serialize(matrix))?;
    Ok(())
}

/// Loads a matrix persisted by [`write_to_file`].
pub fn read_from_file(path: impl AsRef<Path>) -> Result<Matrix<Block>, CodecError> {
    deserialize(&fs::read(path)?)
}
