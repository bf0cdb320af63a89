//! The aggregator role: accept, decode, XOR-fold, report.

use std::net::{TcpListener, TcpStream};
use std::time::Instant;

use okvs_core::{Block, Matrix, ShapeMismatchError};
use okvs_paxos::PaxosParam;
use okvs_wire::{codec, transport, CodecError, TransportError};

use crate::{
    adapter::{AdapterError, OkvsAdapter},
    config::AggregatorConfig,
    keyset::{self, KeySetError},
};

/// Errors terminal to an aggregator run.
#[derive(Debug, thiserror::Error)]
#[allow(missing_docs)]
pub enum AggregatorError {
    #[error(transparent)]
    Keys(#[from] KeySetError),
    #[error(transparent)]
    Adapter(#[from] AdapterError),
    #[error("failed to bind listen address")]
    Bind(#[source] std::io::Error),
    #[error("failed to accept connection")]
    Accept(#[source] std::io::Error),
    #[error("failed to configure connection")]
    Socket(#[source] std::io::Error),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("number of parties must be at least 1")]
    NoParties,
    #[error("party id {id} out of range for {num_parties} parties")]
    PartyOutOfRange { id: u64, num_parties: usize },
    #[error("duplicate share from party {0}")]
    DuplicateParty(u64),
    #[error(transparent)]
    Shape(#[from] ShapeMismatchError),
    #[error("failed to persist combined result")]
    Output(#[source] CodecError),
}

/// The aggregator: collects one encoded share per party over strictly
/// sequential connections, decodes each against the common key sequence
/// and XOR-folds the decoded values.
pub struct Aggregator {
    config: AggregatorConfig,
    listener: TcpListener,
}

impl Aggregator {
    /// Binds the listen address and enters the listening state.
    pub fn bind(config: AggregatorConfig) -> Result<Self, AggregatorError> {
        if config.num_parties == 0 {
            return Err(AggregatorError::NoParties);
        }
        let listener = TcpListener::bind(config.listen_addr.as_str()).map_err(AggregatorError::Bind)?;
        tracing::info!(
            addr = %config.listen_addr,
            parties = config.num_parties,
            "listening"
        );
        Ok(Self { config, listener })
    }

    /// The bound local address, useful when the configured port was 0.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Collects all shares, combines them and returns the combined matrix.
    ///
    /// No partial output is ever produced: any failure before the combine
    /// completes aborts the whole run.
    pub fn run(self) -> Result<Matrix<Block>, AggregatorError> {
        let cfg = &self.config;

        let keys = keyset::load_keys(&cfg.key_path)?;
        tracing::info!(keys = keys.len(), "loaded key sequence");

        let params = PaxosParam::new(
            keys.len(),
            cfg.encoding.weight,
            cfg.encoding.ssp,
            cfg.encoding.dense_type,
        );
        let adapter = OkvsAdapter::new(keys.len(), cfg.encoding.width, params, cfg.encoding.seed);

        // One decoded share per party id, collected strictly sequentially.
        let mut shares: Vec<Option<Matrix<Block>>> = vec![None; cfg.num_parties];
        for i in 0..cfg.num_parties {
            tracing::info!(connection = i + 1, "waiting for share party");
            let (mut stream, peer) = self.listener.accept().map_err(AggregatorError::Accept)?;
            tracing::info!(connection = i + 1, %peer, "accepted");
            self.collect_share(&mut stream, &keys, &adapter, &mut shares)?;
        }

        let mut shares: Vec<Matrix<Block>> = shares
            .into_iter()
            .map(|s| s.expect("every party id collected exactly once"))
            .collect();

        // All shapes must agree before any combining happens.
        let (rows, cols) = shares[0].shape();
        for share in &shares[1..] {
            if share.shape() != (rows, cols) {
                return Err(AggregatorError::Shape(ShapeMismatchError {
                    lhs_rows: rows,
                    lhs_cols: cols,
                    rhs_rows: share.rows(),
                    rhs_cols: share.cols(),
                }));
            }
        }

        let start = Instant::now();
        let mut combined = shares.remove(0);
        for share in &shares {
            combined.xor_assign(share)?;
        }
        tracing::info!(
            elapsed_ms = start.elapsed().as_secs_f64() * 1e3,
            rows = combined.rows(),
            "xor combine complete"
        );

        if combined.cols() > 0 {
            for r in 0..combined.rows().min(3) {
                tracing::info!(row = r, value = %combined[(r, 0)], "combined value");
            }
        }

        if let Some(path) = &cfg.output_path {
            codec::write_to_file(&combined, path).map_err(AggregatorError::Output)?;
            tracing::info!(path = %path.display(), "combined result persisted");
        }

        Ok(combined)
    }

    fn collect_share(
        &self,
        stream: &mut TcpStream,
        keys: &[Block],
        adapter: &OkvsAdapter,
        shares: &mut [Option<Matrix<Block>>],
    ) -> Result<(), AggregatorError> {
        stream
            .set_read_timeout(self.config.io_timeout)
            .and_then(|_| stream.set_write_timeout(self.config.io_timeout))
            .map_err(AggregatorError::Socket)?;

        let id = transport::recv_hello(stream)?;
        if id as usize >= shares.len() {
            return Err(AggregatorError::PartyOutOfRange {
                id,
                num_parties: shares.len(),
            });
        }
        if shares[id as usize].is_some() {
            return Err(AggregatorError::DuplicateParty(id));
        }

        let structure = transport::recv_frame(stream)?;
        tracing::info!(
            party_id = id,
            rows = structure.rows(),
            cols = structure.cols(),
            "share received"
        );

        let values = adapter.decode(keys, &structure)?;
        shares[id as usize] = Some(values);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AggregatorConfig;
    use std::io::Write;

    #[test]
    fn test_bind_failure_reported() {
        let mut keyfile = tempfile::NamedTempFile::new().unwrap();
        keyfile.write_all(b"1\n").unwrap();

        let config = AggregatorConfig::builder()
            .listen_addr("240.0.0.1:0".into())
            .key_path(keyfile.path().to_path_buf())
            .build()
            .unwrap();
        assert!(matches!(
            Aggregator::bind(config),
            Err(AggregatorError::Bind(_))
        ));
    }
}
