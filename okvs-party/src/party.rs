//! The share party role: derive, encode, connect, send.

use std::net::{TcpStream, ToSocketAddrs};

use okvs_paxos::PaxosParam;
use okvs_wire::{transport, TransportError};

use crate::{
    adapter::{AdapterError, OkvsAdapter},
    config::PartyConfig,
    derive::derive_values,
    keyset::{self, KeySetError},
};

/// Errors terminal to a share party run.
#[derive(Debug, thiserror::Error)]
#[allow(missing_docs)]
pub enum PartyError {
    #[error(transparent)]
    Keys(#[from] KeySetError),
    #[error(transparent)]
    Adapter(#[from] AdapterError),
    #[error("cannot resolve aggregator address {0:?}")]
    Resolve(String),
    #[error("failed to connect to aggregator")]
    Connect(#[source] std::io::Error),
    #[error("failed to configure connection")]
    Socket(#[source] std::io::Error),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// One share party: derives its values from the common key sequence,
/// encodes them and ships the structure to the aggregator. Every failure
/// is terminal; there are no retries.
pub struct ShareParty {
    config: PartyConfig,
}

impl ShareParty {
    /// Creates a party from its configuration.
    pub fn new(config: PartyConfig) -> Self {
        Self { config }
    }

    /// Runs the party to completion.
    pub fn run(&self) -> Result<(), PartyError> {
        let cfg = &self.config;

        let keys = keyset::load_keys(&cfg.key_path)?;
        tracing::info!(party_id = cfg.party_id, keys = keys.len(), "loaded key sequence");

        let values = derive_values(cfg.secret, &keys);

        let params = PaxosParam::new(
            keys.len(),
            cfg.encoding.weight,
            cfg.encoding.ssp,
            cfg.encoding.dense_type,
        );
        let adapter = OkvsAdapter::new(keys.len(), cfg.encoding.width, params, cfg.encoding.seed);
        let structure = adapter.encode(&keys, &values)?;

        tracing::info!(
            addr = %cfg.aggregator_addr,
            "connecting to aggregator"
        );
        let mut stream = self.connect()?;
        stream
            .set_read_timeout(cfg.io_timeout)
            .and_then(|_| stream.set_write_timeout(cfg.io_timeout))
            .map_err(PartyError::Socket)?;

        transport::send_hello(&mut stream, cfg.party_id)?;
        transport::send_frame(&mut stream, &structure)?;
        tracing::info!(
            party_id = cfg.party_id,
            rows = structure.rows(),
            cols = structure.cols(),
            "share sent"
        );
        Ok(())
    }

    fn connect(&self) -> Result<TcpStream, PartyError> {
        let addr_str = &self.config.aggregator_addr;
        match self.config.connect_timeout {
            Some(timeout) => {
                let addr = addr_str
                    .to_socket_addrs()
                    .map_err(PartyError::Connect)?
                    .next()
                    .ok_or_else(|| PartyError::Resolve(addr_str.clone()))?;
                TcpStream::connect_timeout(&addr, timeout).map_err(PartyError::Connect)
            }
            None => TcpStream::connect(addr_str.as_str()).map_err(PartyError::Connect),
        }
    }
}
