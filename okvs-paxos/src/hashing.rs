//! Seed-keyed hashing of keys to sparse positions and dense coefficients.

use blake3::Hasher;
use okvs_core::Block;

/// Maps each key to its `weight` distinct sparse rows and one dense
/// element, keyed by the encode seed. Both sides of the protocol must use
/// the same seed or decode silently produces garbage.
#[derive(Debug, Clone)]
pub(crate) struct PositionHasher {
    key: [u8; 32],
    weight: usize,
    sparse_size: usize,
}

impl PositionHasher {
    pub(crate) fn new(seed: Block, weight: usize, sparse_size: usize) -> Self {
        debug_assert!(sparse_size >= weight);
        let mut key = [0u8; 32];
        key[..16].copy_from_slice(&seed.to_bytes());
        key[16..].copy_from_slice(&seed.to_bytes());
        Self {
            key,
            weight,
            sparse_size,
        }
    }

    /// The dense element and the sparse rows of `key`, in hash order.
    ///
    /// Rows are drawn from an extendable output stream with rejection of
    /// repeats, so they are pairwise distinct.
    pub(crate) fn hash_key(&self, key: Block, positions: &mut Vec<u64>) -> Block {
        let mut hasher = Hasher::new_keyed(&self.key);
        hasher.update(&key.to_bytes());
        let mut reader = hasher.finalize_xof();

        let mut dense = [0u8; 16];
        reader.fill(&mut dense);

        positions.clear();
        let mut word = [0u8; 8];
        while positions.len() < self.weight {
            reader.fill(&mut word);
            let pos = u64::from_le_bytes(word) % self.sparse_size as u64;
            if !positions.contains(&pos) {
                positions.push(pos);
            }
        }

        Block::new(dense)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positions_distinct_and_in_range() {
        let hasher = PositionHasher::new(Block::from_u64(7), 3, 10);
        let mut positions = Vec::new();
        for i in 0..100u64 {
            hasher.hash_key(Block::from_u64(i), &mut positions);
            assert_eq!(positions.len(), 3);
            assert!(positions.iter().all(|&p| p < 10));
            let mut sorted = positions.clone();
            sorted.sort_unstable();
            sorted.dedup();
            assert_eq!(sorted.len(), 3);
        }
    }

    #[test]
    fn test_deterministic_and_seed_sensitive() {
        let a = PositionHasher::new(Block::from_u64(1), 3, 1000);
        let b = PositionHasher::new(Block::from_u64(1), 3, 1000);
        let c = PositionHasher::new(Block::from_u64(2), 3, 1000);

        let key = Block::from_u64(0xabcd);
        let (mut pa, mut pb, mut pc) = (Vec::new(), Vec::new(), Vec::new());
        let da = a.hash_key(key, &mut pa);
        let db = b.hash_key(key, &mut pb);
        let dc = c.hash_key(key, &mut pc);

        assert_eq!(pa, pb);
        assert_eq!(da, db);
        assert!(pa != pc || da != dc);
    }
}
