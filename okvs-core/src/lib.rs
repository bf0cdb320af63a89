//! Core types for the OKVS share-distribution protocol.
#![deny(missing_docs, unreachable_pub, unused_must_use)]
#![deny(clippy::all)]

pub mod block;
pub mod gf128;
pub mod matrix;

pub use block::Block;
pub use matrix::{Matrix, ShapeMismatchError};
