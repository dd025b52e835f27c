//! DHT backend abstraction
//!
//! This module provides a trait-based abstraction over concrete DHT (or
//! blockchain) implementations, enabling discovery to run against
//! BitTorrent-style DHTs, chain-backed stores, or an in-memory table
//! without the orchestrator knowing implementation details.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;
use crate::key::InfoHash;
use crate::record::KnownHost;

pub mod memory;

pub use memory::{MemoryBackend, MemoryStore};

/// Receipt returned by a successful `put`
///
/// Blockchain-backed stores report the fee paid for the write; the core
/// treats this as informational metadata only.
#[derive(Debug, Clone, Default)]
pub struct WriteReceipt {
    /// Cost of the write in the backend's native unit, if any
    pub fee: Option<f64>,
}

/// Abstract key/value rendezvous store
///
/// Implementations wrap a real DHT client or chain RPC. Constructors must
/// be pure; all network I/O belongs in `bootstrap` and later calls. Every
/// method here is a potential long-latency suspension point and is run
/// under the session's configured timeout.
#[async_trait]
pub trait DhtBackend: Send + Sync {
    /// Join the DHT using the given bootstrap hosts
    ///
    /// An empty list is valid for backends that need no joining step
    /// (the in-memory backend, single-node test setups).
    async fn bootstrap(&self, bootstrap_hosts: &[KnownHost]) -> Result<()>;

    /// Fetch the value stored under `key`, if any
    ///
    /// `Ok(None)` means "no record", a normal state for a fresh network.
    async fn get(&self, key: InfoHash) -> Result<Option<Bytes>>;

    /// Store `value` under `key`
    async fn put(&self, key: InfoHash, value: Bytes) -> Result<WriteReceipt>;

    /// Release sockets and any other resources; idempotent
    async fn stop(&self) -> Result<()>;

    /// Address this node listens on, once bootstrapped
    ///
    /// Lets one local process hand its own node out as a bootstrap host
    /// for another. Backends without a listening socket return `None`.
    fn listening_host(&self) -> Option<KnownHost>;
}

impl std::fmt::Debug for dyn DhtBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DhtBackend").finish_non_exhaustive()
    }
}

/// Backend factory construction parameters
///
/// Carries everything a factory may need to build a backend instance for
/// one session. Credentials and endpoints for chain-backed backends come
/// from the embedding process's environment, never from the core.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Name of the network the session is bound to
    pub network_name: String,
    /// Port the backend should listen on (0 = ephemeral)
    pub listen_port: u16,
}

impl BackendConfig {
    /// Create a config for the given network with an ephemeral port
    pub fn new(network_name: impl Into<String>) -> Self {
        Self {
            network_name: network_name.into(),
            listen_port: 0,
        }
    }

    /// Set an explicit listen port
    pub fn with_listen_port(mut self, port: u16) -> Self {
        self.listen_port = port;
        self
    }
}
