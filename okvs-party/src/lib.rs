//! Role orchestration for the OKVS share-distribution protocol.
//!
//! A [`ShareParty`] derives one deterministic value per key of a shared key
//! sequence, packs the values into an OKVS structure and ships it to the
//! aggregator. The [`Aggregator`] collects one structure per party, decodes
//! each against the identical key sequence and XOR-folds the results: per
//! key, the combined value is the XOR of every party's share.
//!
//! All parties must agree out of band on the key sequence (count, order and
//! values), the encoding parameters and the seed; any disagreement makes
//! the decoded shares silent garbage rather than an error.

#![deny(missing_docs, unreachable_pub, unused_must_use)]
#![deny(clippy::all)]

pub mod adapter;
pub mod aggregator;
pub mod config;
pub mod derive;
pub mod keyset;
pub mod party;

pub use adapter::{AdapterError, IndexWidth, OkvsAdapter, UnsupportedWidthError};
pub use aggregator::{Aggregator, AggregatorError};
pub use config::{AggregatorConfig, EncodingConfig, PartyConfig, DEFAULT_SECRET};
pub use derive::{derive_value, derive_values};
pub use keyset::KeySetError;
pub use party::{PartyError, ShareParty};
