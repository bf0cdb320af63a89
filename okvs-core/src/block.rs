//! A 128-bit element, the unit of every key, value and OKVS row.

use core::ops::{BitAnd, BitAndAssign, BitXor, BitXorAssign};
use rand::{distributions::Standard, prelude::Distribution, CryptoRng, Rng};
use serde::{Deserialize, Serialize};

use crate::gf128;

/// A block of 128 bits
#[repr(transparent)]
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    bytemuck::Pod,
    bytemuck::Zeroable,
)]
pub struct Block([u8; 16]);

impl Block {
    /// The length of a block in bytes
    pub const LEN: usize = 16;
    /// A zero block
    pub const ZERO: Self = Self([0; 16]);
    /// A block with all bits set to 1
    pub const ONES: Self = Self([0xff; 16]);
    /// The multiplicative identity of GF(2^128)
    pub const ONE: Self = {
        let mut bytes = [0; 16];
        bytes[0] = 1;
        Self(bytes)
    };

    /// Create a new block
    #[inline]
    pub fn new(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Returns the byte representation of the block
    #[inline]
    pub fn to_bytes(self) -> [u8; 16] {
        self.0
    }

    /// Widens a u64 into the low half of a block, upper half zero.
    #[inline]
    pub const fn from_u64(value: u64) -> Self {
        Self::from_u64s(0, value)
    }

    /// Builds a block from two u64 halves.
    #[inline]
    pub const fn from_u64s(high: u64, low: u64) -> Self {
        Self((((high as u128) << 64) | low as u128).to_le_bytes())
    }

    /// Returns the block as a little-endian u128.
    #[inline]
    pub fn to_u128(self) -> u128 {
        u128::from_le_bytes(self.0)
    }

    /// Generate a random block using the provided RNG
    #[inline]
    pub fn random<R: Rng + CryptoRng + ?Sized>(rng: &mut R) -> Self {
        Self::new(rng.gen())
    }

    /// Generate a random vector of blocks using the provided RNG
    #[inline]
    pub fn random_vec<R: Rng + CryptoRng + ?Sized>(rng: &mut R, n: usize) -> Vec<Self> {
        (0..n).map(|_| rng.gen::<[u8; 16]>().into()).collect()
    }

    /// The multiplication of two field elements in GF(2^128).
    #[inline]
    pub fn gfmul(self, x: Self) -> Self {
        Self(gf128::mul(self.to_u128(), x.to_u128()).to_le_bytes())
    }

    /// The multiplicative inverse in GF(2^128), with `gfinv(0) == 0`.
    #[inline]
    pub fn gfinv(self) -> Self {
        Self(gf128::inv(self.to_u128()).to_le_bytes())
    }

    /// Returns true if the block is all zero.
    #[inline]
    pub fn is_zero(self) -> bool {
        self == Self::ZERO
    }
}

impl From<[u8; 16]> for Block {
    #[inline]
    fn from(bytes: [u8; 16]) -> Self {
        Block::new(bytes)
    }
}

impl<'a> TryFrom<&'a [u8]> for Block {
    type Error = <[u8; 16] as TryFrom<&'a [u8]>>::Error;

    fn try_from(value: &'a [u8]) -> Result<Self, Self::Error> {
        <[u8; 16]>::try_from(value).map(Self::from)
    }
}

impl From<Block> for [u8; 16] {
    #[inline]
    fn from(b: Block) -> Self {
        b.0
    }
}

impl BitXor for Block {
    type Output = Self;

    #[inline]
    fn bitxor(self, other: Self) -> Self::Output {
        Self(std::array::from_fn(|i| self.0[i] ^ other.0[i]))
    }
}

impl BitXorAssign for Block {
    #[inline(always)]
    fn bitxor_assign(&mut self, rhs: Self) {
        *self = *self ^ rhs;
    }
}

impl BitAnd for Block {
    type Output = Self;

    #[inline]
    fn bitand(self, other: Self) -> Self::Output {
        Self(std::array::from_fn(|i| self.0[i] & other.0[i]))
    }
}

impl BitAndAssign for Block {
    #[inline(always)]
    fn bitand_assign(&mut self, rhs: Self) {
        *self = *self & rhs
    }
}

impl Distribution<Block> for Standard {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Block {
        Block::new(rng.gen())
    }
}

impl std::fmt::LowerHex for Block {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:032x}", self.to_u128())
    }
}

impl std::fmt::Display for Block {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:x}", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_u64_widens_low_half() {
        let b = Block::from_u64(0x0123_4567_89ab_cdef);
        assert_eq!(b.to_u128(), 0x0123_4567_89ab_cdef_u128);
        assert_eq!(&b.to_bytes()[8..], &[0u8; 8]);
    }

    #[test]
    fn test_from_u64s() {
        let b = Block::from_u64s(0x12345678, 0x90abcdef);
        assert_eq!(b.to_u128(), (0x12345678_u128 << 64) | 0x90abcdef);
    }

    #[test]
    fn test_xor() {
        let a = Block::from_u64s(0xdead, 0xbeef);
        assert_eq!(a ^ a, Block::ZERO);
        assert_eq!(a ^ Block::ZERO, a);

        let mut b = a;
        b ^= Block::ONES;
        assert_eq!(b ^ a, Block::ONES);
    }

    #[test]
    fn test_display_hex() {
        let b = Block::from_u64(0xff);
        assert_eq!(format!("{}", b), format!("{:032x}", 0xff_u128));
    }
}
