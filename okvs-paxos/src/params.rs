//! Sizing parameters for the OKVS structure.

use serde::{Deserialize, Serialize};

/// Encoding domain of the dense columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DenseType {
    /// Dense coefficients are bits; the gap system is solved over GF(2).
    Binary,
    /// Dense coefficients are powers of a field element; the gap system is
    /// solved over GF(2^128).
    Gf128,
}

/// Parameters determining the shape of an OKVS structure.
///
/// All parties combining results must build these from identical inputs:
/// the structure produced under one parameter set is garbage under any
/// other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaxosParam {
    /// Number of sparse positions hashed per key.
    pub weight: usize,
    /// Statistical security parameter bounding the encode failure rate.
    pub ssp: usize,
    /// Dense column domain.
    pub dense_type: DenseType,
    /// Row count of the sparse region.
    pub sparse_size: usize,
    /// Row count of the dense region.
    pub dense_size: usize,
}

impl PaxosParam {
    /// Computes parameters for `num_items` keys.
    ///
    /// Pure in its arguments: equal inputs yield equal parameters on every
    /// party. The sparse region is expanded past the peeling threshold of
    /// the `weight`-regular hypergraph; the dense region absorbs the
    /// gap rows left by triangulation.
    pub fn new(num_items: usize, weight: usize, ssp: usize, dense_type: DenseType) -> Self {
        assert!(weight >= 2, "weight must be at least 2");

        let log_n = (num_items.max(2) as f64).log2();
        // Empirical fit of the gap growth rate for weight-3 hashing.
        let lambda = 7.529 / (log_n - 2.556).max(1.0) + 0.61;
        let gap = (ssp as f64 / lambda).ceil() as usize + 2;

        let expansion = match weight {
            2 => 2.4,
            _ => 1.28,
        };
        let sparse_size = ((num_items as f64 * expansion).ceil() as usize).max(weight * 2);

        let dense_size = match dense_type {
            DenseType::Gf128 => gap,
            DenseType::Binary => gap + ssp,
        };

        Self {
            weight,
            ssp,
            dense_type,
            sparse_size,
            dense_size,
        }
    }

    /// Total row count of the OKVS structure.
    #[inline]
    pub fn size(&self) -> usize {
        self.sparse_size + self.dense_size
    }
}
