//! Fully-buffered frame transfer over a byte-stream connection.
//!
//! A send writes the complete header and payload or fails; a receive
//! accumulates exactly the declared length or fails. There is no partial-
//! frame retry and no resumption: the orchestrator treats any transport
//! failure as terminal.

use std::io::{Read, Write};

use okvs_core::{Block, Matrix};

use crate::codec::{payload_len, CodecError, HEADER_LEN};

/// Errors that can occur while moving frames over a connection.
#[derive(Debug, thiserror::Error)]
#[allow(missing_docs)]
pub enum TransportError {
    #[error("connection write failed")]
    Write(#[source] std::io::Error),
    #[error("connection read failed")]
    Read(#[source] std::io::Error),
    #[error("connection closed before the declared frame length was received")]
    PrematureClose,
    #[error(transparent)]
    Codec(#[from] CodecError),
}

fn write_all(writer: &mut impl Write, bytes: &[u8]) -> Result<(), TransportError> {
    writer.write_all(bytes).map_err(TransportError::Write)
}

fn read_exact(reader: &mut impl Read, buf: &mut [u8]) -> Result<(), TransportError> {
    reader.read_exact(buf).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            TransportError::PrematureClose
        } else {
            TransportError::Read(e)
        }
    })
}

/// Sends the party-identity hello that precedes a share frame.
pub fn send_hello(writer: &mut impl Write, party_id: u64) -> Result<(), TransportError> {
    write_all(writer, &party_id.to_be_bytes())
}

/// Receives the party-identity hello.
pub fn recv_hello(reader: &mut impl Read) -> Result<u64, TransportError> {
    let mut buf = [0u8; 8];
    read_exact(reader, &mut buf)?;
    Ok(u64::from_be_bytes(buf))
}

/// Sends one matrix frame: header, then the raw payload.
pub fn send_frame(writer: &mut impl Write, matrix: &Matrix<Block>) -> Result<(), TransportError> {
    let mut header = [0u8; HEADER_LEN];
    header[..8].copy_from_slice(&(matrix.rows() as u64).to_be_bytes());
    header[8..].copy_from_slice(&(matrix.cols() as u64).to_be_bytes());
    write_all(writer, &header)?;

    let payload: &[u8] = bytemuck::cast_slice(matrix.data());
    if !payload.is_empty() {
        write_all(writer, payload)?;
    }
    tracing::debug!(
        rows = matrix.rows(),
        cols = matrix.cols(),
        bytes = HEADER_LEN + payload.len(),
        "sent frame"
    );
    Ok(())
}

/// Receives one matrix frame, reading exactly the declared length.
pub fn recv_frame(reader: &mut impl Read) -> Result<Matrix<Block>, TransportError> {
    let mut header = [0u8; HEADER_LEN];
    read_exact(reader, &mut header)?;
    let mut word = [0u8; 8];
    word.copy_from_slice(&header[..8]);
    let rows = u64::from_be_bytes(word);
    word.copy_from_slice(&header[8..]);
    let cols = u64::from_be_bytes(word);
    let payload = payload_len(rows, cols)?;

    let mut matrix = Matrix::<Block>::new(rows as usize, cols as usize);
    if payload > 0 {
        read_exact(reader, bytemuck::cast_slice_mut(matrix.data_mut()))?;
    }
    tracing::debug!(
        rows,
        cols,
        bytes = HEADER_LEN + payload,
        "received frame"
    );
    Ok(matrix)
}
