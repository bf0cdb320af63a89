//! A Paxos-style oblivious key-value store encoder.
//!
//! [`Paxos`] packs an ordered key set and a value matrix into an opaque
//! structure `D` such that decoding any member key against `D` recovers its
//! value exactly, provided the parameters and seed match the encode side
//! bit for bit. Decoding a non-member key yields unspecified garbage; the
//! structure has no meaning except relative to the `(keys, params, seed)`
//! triple that produced it.

#![deny(missing_docs, unreachable_pub, unused_must_use)]
#![deny(clippy::all)]

mod error;
mod hashing;
mod params;
mod paxos;
mod solve;

pub use error::PaxosError;
pub use params::{DenseType, PaxosParam};
pub use paxos::{Paxos, PaxosIdx};
