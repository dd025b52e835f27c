//! bitboot
//!
//! Fully-decentralized peer discovery for P2P networks: processes find
//! each other by writing and reading a record keyed by the hash of a
//! human-chosen network name in an already-running DHT, with no central
//! discovery server.

pub mod backend;
pub mod cli;
pub mod error;
pub mod key;
pub mod record;
pub mod registry;
pub mod session;

pub use error::{BitBootError, Result};

pub use backend::{BackendConfig, DhtBackend, MemoryBackend, MemoryStore, WriteReceipt};
pub use key::{derive_info_hash, InfoHash};
pub use record::{KnownHost, PeerRecord, MAX_RECORD_SIZE, RECORD_FORMAT_VERSION};
pub use registry::{BackendFactory, BackendRegistry, DhtNetwork, NetworkRegistry};
pub use session::{BitBoot, BitBootConfig, PollHandle, RetryPolicy};
pub use cli::{CliArgs, ConfigFile};
