//! Arithmetic in GF(2^128).
//!
//! Elements are u128 values where bit `i` is the coefficient of `x^i`. The
//! reduction polynomial is the GCM polynomial `x^128 + x^7 + x^2 + x + 1`.
//! A portable carry-less multiply is used throughout; this code is not on
//! the hot path of the protocol (only the dense core solve touches it).

/// Carry-less multiplication of two 64-bit polynomials.
#[inline]
fn clmul64(a: u64, b: u64) -> u128 {
    let a = a as u128;
    let mut r = 0u128;
    let mut i = 0;
    while i < 64 {
        r ^= ((b >> i) & 1) as u128 * (a << i);
        i += 1;
    }
    r
}

/// Carry-less multiplication of two 128-bit polynomials, returning the
/// 256-bit product as `(high, low)`.
#[inline]
fn clmul128(a: u128, b: u128) -> (u128, u128) {
    let (a1, a0) = ((a >> 64) as u64, a as u64);
    let (b1, b0) = ((b >> 64) as u64, b as u64);

    let lo = clmul64(a0, b0);
    let hi = clmul64(a1, b1);
    let mid = clmul64(a0, b1) ^ clmul64(a1, b0);

    (hi ^ (mid >> 64), lo ^ (mid << 64))
}

/// Reduces a 256-bit polynomial `high * x^128 + low` modulo
/// `x^128 + x^7 + x^2 + x + 1`.
///
/// `x^128 ≡ x^7 + x^2 + x + 1`, so the high half folds down once; the fold
/// overflows by at most 7 bits, which fold a second time with no further
/// carry.
#[inline]
fn reduce(high: u128, low: u128) -> u128 {
    let fold_lo = (high << 7) ^ (high << 2) ^ (high << 1) ^ high;
    let fold_hi = (high >> 121) ^ (high >> 126) ^ (high >> 127);
    low ^ fold_lo ^ (fold_hi << 7) ^ (fold_hi << 2) ^ (fold_hi << 1) ^ fold_hi
}

/// Multiplies two field elements.
#[inline]
pub fn mul(a: u128, b: u128) -> u128 {
    let (hi, lo) = clmul128(a, b);
    reduce(hi, lo)
}

/// Returns the multiplicative inverse of `a`, with `inv(0) == 0`.
///
/// Computed as `a^(2^128 - 2)` by square-and-multiply: the exponent is the
/// sum of `2^i` for `i` in `1..=127`.
pub fn inv(a: u128) -> u128 {
    let mut power = a;
    let mut acc = 1u128;
    for _ in 1..=127 {
        power = mul(power, power);
        acc = mul(acc, power);
    }
    acc
}
