//! Binary matrix serialization and frame transport.
//!
//! One layout serves both channels: a 16-byte header of big-endian row and
//! column counts followed by the row-major 128-bit elements in host order.
//! [`codec`] reads and writes that layout against byte buffers and files;
//! [`transport`] moves it over a byte-stream connection, one frame per
//! transmission, preceded by a party-identity hello.
//!
//! There is no boundary marker beyond the declared length: peers that
//! disagree on the layout silently misinterpret the stream. That agreement
//! is a protocol precondition, not something this crate defends against.

#![deny(missing_docs, unreachable_pub, unused_must_use)]
#![deny(clippy::all)]

pub mod codec;
pub mod transport;

pub use codec::CodecError;
pub use transport::TransportError;
