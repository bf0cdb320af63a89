//! Aggregator binary: collect one share per party, decode, XOR-combine
//! and report. Exits non-zero on any failure; no partial output is ever
//! written.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use okvs_core::Block;
use okvs_party::{Aggregator, AggregatorConfig, EncodingConfig, IndexWidth};
use okvs_paxos::DenseType;

#[derive(Parser)]
#[clap(name = "aggregator", about = "Collect and XOR-combine OKVS shares")]
struct Args {
    /// Path of the common key file, one unsigned integer per line.
    #[clap(long)]
    keys: PathBuf,

    /// Listen address, host:port.
    #[clap(long, default_value = "0.0.0.0:9000")]
    listen: String,

    /// Number of share parties to collect before combining.
    #[clap(long, default_value_t = 2)]
    parties: usize,

    /// Row-index width of the encoder: 8, 16, 32 or 64.
    #[clap(long, default_value_t = 64)]
    width: u32,

    /// Encoder seed, shared by all parties.
    #[clap(long, default_value_t = 0)]
    seed: u64,

    /// Use binary dense columns instead of GF(2^128).
    #[clap(long)]
    binary_dense: bool,

    /// Per-connection I/O timeout in seconds; 0 blocks indefinitely.
    #[clap(long, default_value_t = 30)]
    timeout_secs: u64,

    /// Persist the combined matrix to this path.
    #[clap(long)]
    output: Option<PathBuf>,
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

    let config = AggregatorConfig::builder()
        .listen_addr(args.listen)
        .key_path(args.keys)
        .num_parties(args.parties)
        .encoding(encoding)
        .io_timeout(timeout)
        .output_path(args.output)
        .build()
        .map_err(|e| e.to_string())?;

    let combined = Aggregator::bind(config)
        .and_then(Aggregator::run)
        .map_err(|e| e.to_string())?;
    tracing::info!(
        rows = combined.rows(),
        cols = combined.cols(),
        "aggregation complete"
    );
    Ok(())
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
