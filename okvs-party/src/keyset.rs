//! The common key sequence, one unsigned integer per line.
//!
//! Every party must consume a byte-identical key file: the sequence order
//! is the implicit row index of every matrix in the protocol.

use std::path::Path;

use okvs_core::Block;

/// Errors that can occur while loading the key file.
#[derive(Debug, thiserror::Error)]
#[allow(missing_docs)]
pub enum KeySetError {
    #[error("failed to read key file")]
    Io(#[from] std::io::Error),
    #[error("invalid key on line {line}")]
    Parse {
        line: usize,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("key file contains no keys")]
    Empty,
}

/// Loads the ordered key sequence, skipping blank lines.
pub fn load_keys(path: impl AsRef<Path>) -> Result<Vec<Block>, KeySetError> {
    let text = std::fs::read_to_string(path)?;
    let mut keys = Vec::new();
    for (i, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let value: u64 = line
            .parse()
            .map_err(|source| KeySetError::Parse { line: i + 1, source })?;
        keys.push(Block::from_u64(value));
    }
    if keys.is_empty() {
        return Err(KeySetError::Empty);
    }
    Ok(keys)
}
