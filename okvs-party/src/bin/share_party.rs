//! Share party binary: derive, encode and ship one share to the
//! aggregator. Exits non-zero on any failure.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use okvs_core::Block;
use okvs_party::{EncodingConfig, IndexWidth, PartyConfig, ShareParty};
use okvs_paxos::DenseType;

#[derive(Parser)]
#[clap(name = "share-party", about = "Encode and send one OKVS share")]
struct Args {
    /// Path of the common key file, one unsigned integer per line.
    #[clap(long)]
    keys: PathBuf,

    /// Aggregator address, host:port.
    #[clap(long, default_value = "127.0.0.1:9000")]
    aggregator: String,

    /// Logical party identity, unique per party.
    #[clap(long)]
    party_id: u64,

    /// Row-index width of the encoder: 8, 16, 32 or 64.
    #[clap(long, default_value_t = 64)]
    width: u32,

    /// Per-party secret as 32 hex characters; defaults to the built-in
    /// shared constant (test configurations only).
    #[clap(long)]
    secret: Option<String>,

    /// Encoder seed, shared by all parties.
    #[clap(long, default_value_t = 0)]
    seed: u64,

    /// Use binary dense columns instead of GF(2^128).
    #[clap(long)]
    binary_dense: bool,

    /// Connect and I/O timeout in seconds; 0 blocks indefinitely.
    #[clap(long, default_value_t = 30)]
    timeout_secs: u64,
}

fn parse_secret(hex_str: &str) -> Result<Block, String> {
    let bytes = hex::decode(hex_str).map_err(|e| format!("invalid secret hex: {e}"))?;
    let bytes: [u8; 16] = bytes
        .try_into()
        .map_err(|_| "secret must be exactly 16 bytes of hex".to_string())?;
    Ok(Block::new(bytes))
}

fn run(args: Args) -> Result<(), String> {
    let width = IndexWidth::try_from(args.width).map_err(|e| e.to_string())?;
    let dense_type = if args.binary_dense {
        DenseType::Binary
    } else {
        DenseType::Gf128
    };
    let timeout = (args.timeout_secs > 0).then(|| Duration::from_secs(args.timeout_secs));

    let encoding = EncodingConfig::builder()
        .width(width)
        .dense_type(dense_type)
        .seed(Block::from_u64(args.seed))
        .build()
        .map_err(|e| e.to_string())?;

    let mut builder = PartyConfig::builder();
    builder
        .party_id(args.party_id)
        .key_path(args.keys)
        .aggregator_addr(args.aggregator)
        .encoding(encoding)
        .connect_timeout(timeout)
        .io_timeout(timeout);
    if let Some(hex_str) = &args.secret {
        builder.secret(parse_secret(hex_str)?);
    }
    let config = builder.build().map_err(|e| e.to_string())?;

    ShareParty::new(config).run().map_err(|e| e.to_string())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    if let Err(e) = run(args) {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}
