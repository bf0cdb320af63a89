//! Gaussian solvers for the gap equations left by triangulation.
//!
//! Triangulation reduces the key set to a small gap whose equations,
//! already reduced modulo the peeled ones, involve the dense rows alone;
//! the surviving sparse columns keep their seed-derived fill and have been
//! folded into the right-hand sides. Free dense rows also keep their fill;
//! back-substitution folds their contribution into each pivot row.

use okvs_core::{Block, Matrix};

use crate::{error::PaxosError, params::PaxosParam};

/// `dst ^= src`, elementwise.
#[inline]
pub(crate) fn xor_row(dst: &mut [Block], src: &[Block]) {
    for (a, b) in dst.iter_mut().zip(src) {
        *a ^= *b;
    }
}

/// `dst ^= scalar * src` over GF(2^128), elementwise.
#[inline]
pub(crate) fn xor_scaled_row(dst: &mut [Block], scalar: Block, src: &[Block]) {
    for (a, b) in dst.iter_mut().zip(src) {
        *a ^= scalar.gfmul(*b);
    }
}

/// The GF(2^128) dense coefficients of a key: `d, d^2, ..., d^g`.
pub(crate) fn gf128_coeffs(dense: Block, g: usize) -> Vec<Block> {
    let mut coeffs = Vec::with_capacity(g);
    let mut power = Block::ONE;
    for _ in 0..g {
        power = power.gfmul(dense);
        coeffs.push(power);
    }
    coeffs
}

/// The binary dense coefficients of a key: the low `dense_size` bits of its
/// dense element.
#[inline]
pub(crate) fn binary_mask(dense: Block, dense_size: usize) -> u128 {
    debug_assert!(dense_size <= 128);
    if dense_size == 128 {
        dense.to_u128()
    } else {
        dense.to_u128() & ((1u128 << dense_size) - 1)
    }
}

/// Solves the gap system over GF(2^128) and writes the pivot dense rows
/// of `d` in place. `coeffs` holds one length-`dense_size` coefficient
/// vector per gap equation.
pub(crate) fn solve_dense_gf128(
    coeffs: Vec<Vec<Block>>,
    rhs: Vec<Vec<Block>>,
    d: &mut Matrix<Block>,
    params: &PaxosParam,
) -> Result<(), PaxosError> {
    let g = params.dense_size;
    let r = coeffs.len();
    if r > g {
        return Err(PaxosError::DenseOverflow {
            gap: r,
            capacity: g,
        });
    }

    let mut a = coeffs;
    let mut b = rhs;
    let mut pivots: Vec<(usize, usize)> = Vec::new();

    for e in 0..r {
        for &(pe, pc) in &pivots {
            let f = a[e][pc];
            if f.is_zero() {
                continue;
            }
            let factor = f.gfmul(a[pe][pc].gfinv());
            let pivot_coeffs = a[pe].clone();
            let pivot_rhs = b[pe].clone();
            xor_scaled_row(&mut a[e], factor, &pivot_coeffs);
            xor_scaled_row(&mut b[e], factor, &pivot_rhs);
        }
        match a[e].iter().position(|x| !x.is_zero()) {
            Some(pc) => pivots.push((e, pc)),
            None => {
                if b[e].iter().any(|x| !x.is_zero()) {
                    return Err(PaxosError::Unsolvable);
                }
            }
        }
    }

    for &(e, pc) in pivots.iter().rev() {
        let mut acc = b[e].clone();
        for q in 0..g {
            if q != pc && !a[e][q].is_zero() {
                let row = d.row(params.sparse_size + q).to_vec();
                xor_scaled_row(&mut acc, a[e][q], &row);
            }
        }
        let inverse = a[e][pc].gfinv();
        for (slot, v) in d.row_mut(params.sparse_size + pc).iter_mut().zip(&acc) {
            *slot = inverse.gfmul(*v);
        }
    }

    Ok(())
}

/// Solves the gap system over GF(2) and writes the pivot dense rows of
/// `d` in place. Each mask holds one equation's dense coefficient bits.
pub(crate) fn solve_dense_binary(
    masks: &[u128],
    rhs: Vec<Vec<Block>>,
    d: &mut Matrix<Block>,
    params: &PaxosParam,
) -> Result<(), PaxosError> {
    let g = params.dense_size;
    let r = masks.len();
    if r > g {
        return Err(PaxosError::DenseOverflow {
            gap: r,
            capacity: g,
        });
    }

    let mut a = masks.to_vec();
    let mut b = rhs;
    let mut pivots: Vec<(usize, usize)> = Vec::new();

    for e in 0..r {
        for &(pe, pc) in &pivots {
            if (a[e] >> pc) & 1 == 1 {
                let pivot_mask = a[pe];
                let pivot_rhs = b[pe].clone();
                a[e] ^= pivot_mask;
                xor_row(&mut b[e], &pivot_rhs);
            }
        }
        if a[e] == 0 {
            if b[e].iter().any(|x| !x.is_zero()) {
                return Err(PaxosError::Unsolvable);
            }
        } else {
            pivots.push((e, a[e].trailing_zeros() as usize));
        }
    }

    for &(e, pc) in pivots.iter().rev() {
        let mut acc = b[e].clone();
        for q in 0..g {
            if q != pc && (a[e] >> q) & 1 == 1 {
                let row = d.row(params.sparse_size + q).to_vec();
                xor_row(&mut acc, &row);
            }
        }
        d.row_mut(params.sparse_size + pc).copy_from_slice(&acc);
    }

    Ok(())
}
