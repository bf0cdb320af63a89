/// Errors that can occur while encoding or decoding an OKVS structure.
#[derive(Debug, thiserror::Error)]
#[allow(missing_docs)]
pub enum PaxosError {
    #[error("structure size {size} exceeds the {bits}-bit index domain")]
    IndexOverflow { size: usize, bits: u32 },
    #[error("key count mismatch: expected {expected}, got {actual}")]
    KeyCountMismatch { expected: usize, actual: usize },
    #[error("structure shape mismatch: expected {expected} rows, got {actual}")]
    StructureMismatch { expected: usize, actual: usize },
    #[error("duplicate key at index {0}")]
    DuplicateKey(usize),
    #[error("gap of {gap} rows exceeds the dense capacity {capacity}")]
    DenseOverflow { gap: usize, capacity: usize },
    #[error("the dense system for the gap rows is singular")]
    Unsolvable,
}
