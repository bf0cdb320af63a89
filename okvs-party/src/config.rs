//! Role configuration.
//!
//! Historic deployments hard-coded a shared secret, seed zero, two
//! parties and port 9000; those survive only as defaults here. Parties
//! that must not produce trivially related shares override `secret` with
//! per-party values.

use std::path::PathBuf;
use std::time::Duration;

use derive_builder::Builder;
use okvs_core::Block;
use okvs_paxos::DenseType;

use crate::adapter::IndexWidth;

/// The well-known legacy secret. Shares derived from it are identical
/// across parties and XOR-combine to zero; any real deployment configures
/// distinct secrets.
pub const DEFAULT_SECRET: Block = Block::from_u64s(0x12345678, 0x90abcdef);

/// Default timeout applied to connect, read and write.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Parameters of the OKVS encoding, identical on every party.
#[derive(Debug, Clone, Builder)]
pub struct EncodingConfig {
    /// Row-index width of the encoder instantiation.
    #[builder(default = "IndexWidth::U64")]
    pub width: IndexWidth,
    /// Sparse positions hashed per key.
    #[builder(default = "3")]
    pub weight: usize,
    /// Statistical security parameter.
    #[builder(default = "40")]
    pub ssp: usize,
    /// Dense column domain.
    #[builder(default = "DenseType::Gf128")]
    pub dense_type: DenseType,
    /// Seed mixed into the encoder's randomness.
    #[builder(default = "Block::ZERO")]
    pub seed: Block,
}

impl Default for EncodingConfig {
    fn default() -> Self {
        EncodingConfigBuilder::default()
            .build()
            .expect("all fields have defaults")
    }
}

impl EncodingConfig {
    /// Creates a new builder for EncodingConfig.
    pub fn builder() -> EncodingConfigBuilder {
        EncodingConfigBuilder::default()
    }
}

/// Configuration of a share party.
#[derive(Debug, Clone, Builder)]
pub struct PartyConfig {
    /// Logical identity announced to the aggregator; must be unique per
    /// party and below the aggregator's party count.
    pub party_id: u64,
    /// Path of the common key file.
    pub key_path: PathBuf,
    /// Aggregator `host:port`.
    pub aggregator_addr: String,
    /// Secret seeding this party's value derivation.
    #[builder(default = "DEFAULT_SECRET")]
    pub secret: Block,
    /// Encoding parameters.
    #[builder(default)]
    pub encoding: EncodingConfig,
    /// Connect timeout; `None` blocks indefinitely.
    #[builder(default = "Some(DEFAULT_TIMEOUT)")]
    pub connect_timeout: Option<Duration>,
    /// Read/write timeout on the established connection.
    #[builder(default = "Some(DEFAULT_TIMEOUT)")]
    pub io_timeout: Option<Duration>,
}

impl PartyConfig {
    /// Creates a new builder for PartyConfig.
    pub fn builder() -> PartyConfigBuilder {
        PartyConfigBuilder::default()
    }
}

/// Configuration of the aggregator.
#[derive(Debug, Clone, Builder)]
pub struct AggregatorConfig {
    /// Listen address, `host:port`.
    pub listen_addr: String,
    /// Path of the common key file.
    pub key_path: PathBuf,
    /// Number of share parties to collect before combining.
    #[builder(default = "2")]
    pub num_parties: usize,
    /// Encoding parameters; must match every party's bit for bit.
    #[builder(default)]
    pub encoding: EncodingConfig,
    /// Read/write timeout per accepted connection.
    #[builder(default = "Some(DEFAULT_TIMEOUT)")]
    pub io_timeout: Option<Duration>,
    /// Where to persist the combined matrix; `None` reports only.
    #[builder(default)]
    pub output_path: Option<PathBuf>,
}

impl AggregatorConfig {
    /// Creates a new builder for AggregatorConfig.
    pub fn builder() -> AggregatorConfigBuilder {
        AggregatorConfigBuilder::default()
    }
}
