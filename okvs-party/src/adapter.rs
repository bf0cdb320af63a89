//! Width dispatch over the four encoder instantiations.
//!
//! The adapter owns no encoding logic: it validates the configured index
//! width, constructs the matching [`Paxos`] instantiation, forwards the
//! call, and reports elapsed time and structure size as diagnostics. An
//! encoder failure never propagates past this boundary unwrapped.

use std::time::Instant;

use okvs_core::{Block, Matrix};
use okvs_paxos::{Paxos, PaxosError, PaxosIdx, PaxosParam};

/// Requested index width is not one of the four supported values.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unsupported index width: {0} bits (supported: 8, 16, 32, 64)")]
pub struct UnsupportedWidthError(pub u32);

/// Index width of the row-addressing scheme, selected once at
/// configuration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexWidth {
    /// 8-bit row indices.
    U8,
    /// 16-bit row indices.
    U16,
    /// 32-bit row indices.
    U32,
    /// 64-bit row indices.
    U64,
}

impl IndexWidth {
    /// The width in bits.
    pub fn bits(self) -> u32 {
        match self {
            Self::U8 => 8,
            Self::U16 => 16,
            Self::U32 => 32,
            Self::U64 => 64,
        }
    }
}

impl TryFrom<u32> for IndexWidth {
    type Error = UnsupportedWidthError;

    fn try_from(bits: u32) -> Result<Self, Self::Error> {
        match bits {
            8 => Ok(Self::U8),
            16 => Ok(Self::U16),
            32 => Ok(Self::U32),
            64 => Ok(Self::U64),
            other => Err(UnsupportedWidthError(other)),
        }
    }
}

/// Errors surfaced by the adapter.
#[derive(Debug, thiserror::Error)]
#[allow(missing_docs)]
pub enum AdapterError {
    #[error("okvs encode failed")]
    Encoding(#[source] PaxosError),
    #[error("okvs decode failed")]
    Decoding(#[source] PaxosError),
}

/// Dispatches encode/decode calls to the configured encoder instantiation.
#[derive(Debug, Clone)]
pub struct OkvsAdapter {
    num_keys: usize,
    width: IndexWidth,
    params: PaxosParam,
    seed: Block,
}

impl OkvsAdapter {
    /// Creates an adapter for a fixed key count, width, parameter set and
    /// seed.
    pub fn new(num_keys: usize, width: IndexWidth, params: PaxosParam, seed: Block) -> Self {
        Self {
            num_keys,
            width,
            params,
            seed,
        }
    }

    /// Row count of the structures this adapter produces.
    pub fn structure_rows(&self) -> usize {
        self.params.size()
    }

    /// Encodes `values` into an OKVS structure.
    pub fn encode(
        &self,
        keys: &[Block],
        values: &Matrix<Block>,
    ) -> Result<Matrix<Block>, AdapterError> {
        let start = Instant::now();
        let result = match self.width {
            IndexWidth::U8 => self.encode_with::<u8>(keys, values),
            IndexWidth::U16 => self.encode_with::<u16>(keys, values),
            IndexWidth::U32 => self.encode_with::<u32>(keys, values),
            IndexWidth::U64 => self.encode_with::<u64>(keys, values),
        };
        match result {
            Ok(structure) => {
                tracing::info!(
                    elapsed_ms = start.elapsed().as_secs_f64() * 1e3,
                    size_mb = structure_mb(&structure),
                    rows = structure.rows(),
                    "okvs encode complete"
                );
                Ok(structure)
            }
            Err(e) => {
                tracing::error!(error = %e, "okvs encode failed");
                Err(AdapterError::Encoding(e))
            }
        }
    }

    /// Decodes the per-key values out of an OKVS structure.
    pub fn decode(
        &self,
        keys: &[Block],
        structure: &Matrix<Block>,
    ) -> Result<Matrix<Block>, AdapterError> {
        let start = Instant::now();
        let result = match self.width {
            IndexWidth::U8 => self.decode_with::<u8>(keys, structure),
            IndexWidth::U16 => self.decode_with::<u16>(keys, structure),
            IndexWidth::U32 => self.decode_with::<u32>(keys, structure),
            IndexWidth::U64 => self.decode_with::<u64>(keys, structure),
        };
        match result {
            Ok(values) => {
                tracing::info!(
                    elapsed_ms = start.elapsed().as_secs_f64() * 1e3,
                    size_mb = structure_mb(structure),
                    rows = structure.rows(),
                    "okvs decode complete"
                );
                Ok(values)
            }
            Err(e) => {
                tracing::error!(error = %e, "okvs decode failed");
                Err(AdapterError::Decoding(e))
            }
        }
    }

    fn encode_with<T: PaxosIdx>(
        &self,
        keys: &[Block],
        values: &Matrix<Block>,
    ) -> Result<Matrix<Block>, PaxosError> {
        Paxos::<T>::new(self.num_keys, self.params, self.seed)?.encode(keys, values)
    }

    fn decode_with<T: PaxosIdx>(
        &self,
        keys: &[Block],
        structure: &Matrix<Block>,
    ) -> Result<Matrix<Block>, PaxosError> {
        Paxos::<T>::new(self.num_keys, self.params, self.seed)?.decode(keys, structure)
    }
}

fn structure_mb(m: &Matrix<Block>) -> f64 {
    (m.rows() * m.cols() * Block::LEN) as f64 / (1024.0 * 1024.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use okvs_paxos::DenseType;
    use rstest::rstest;

    #[rstest]
    #[case(8, IndexWidth::U8)]
    #[case(16, IndexWidth::U16)]
    #[case(32, IndexWidth::U32)]
    #[case(64, IndexWidth::U64)]
    fn test_width_from_bits(#[case] bits: u32, #[case] expected: IndexWidth) {
        assert_eq!(IndexWidth::try_from(bits).unwrap(), expected);
        assert_eq!(expected.bits(), bits);
    }

    #[test]
    fn test_unsupported_width_rejected() {
        assert_eq!(IndexWidth::try_from(24), Err(UnsupportedWidthError(24)));
        assert_eq!(IndexWidth::try_from(0), Err(UnsupportedWidthError(0)));
    }

    #[test]
    fn test_adapter_round_trip() {
        let keys: Vec<Block> = (1..=20).map(Block::from_u64).collect();
        let values = crate::derive::derive_values(Block::from_u64(5), &keys);

        let params = PaxosParam::new(keys.len(), 3, 40, DenseType::Gf128);
        let adapter = OkvsAdapter::new(keys.len(), IndexWidth::U16, params, Block::ZERO);

        let structure = adapter.encode(&keys, &values).unwrap();
        assert_eq!(structure.rows(), adapter.structure_rows());
        assert_eq!(adapter.decode(&keys, &structure).unwrap(), values);
    }

    #[test]
    fn test_encoder_failure_is_contained() {
        // 8-bit indices cannot address the structure for this key count.
        let keys: Vec<Block> = (0..1000).map(Block::from_u64).collect();
        let values = crate::derive::derive_values(Block::ZERO, &keys);
        let params = PaxosParam::new(keys.len(), 3, 40, DenseType::Gf128);
        let adapter = OkvsAdapter::new(keys.len(), IndexWidth::U8, params, Block::ZERO);
        assert!(matches!(
            adapter.encode(&keys, &values),
            Err(AdapterError::Encoding(PaxosError::IndexOverflow { .. }))
        ));
    }
}
