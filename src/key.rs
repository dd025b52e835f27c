//! Key derivation module
//!
//! Maps a network name to the fixed-width key addressing a record in the
//! DHT key space. The derivation is deterministic: the same name always
//! lands on the same key, so independent processes rendezvous without any
//! coordination beyond agreeing on the name.

use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};

/// DHT record key (20 bytes, BitTorrent-style address space)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InfoHash(pub [u8; 20]);

impl InfoHash {
    /// Create a new InfoHash from bytes
    pub fn new(hash: [u8; 20]) -> Self {
        Self(hash)
    }

    /// Get the InfoHash as bytes
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Get the InfoHash as a hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse an InfoHash from a hex string
    pub fn from_hex(hex_str: &str) -> Option<Self> {
        hex::decode(hex_str).ok().and_then(|bytes| {
            if bytes.len() == 20 {
                let mut hash = [0u8; 20];
                hash.copy_from_slice(&bytes);
                Some(Self(hash))
            } else {
                None
            }
        })
    }
}

impl std::fmt::Display for InfoHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Derive the DHT key for a logical network name.
///
/// The namespace bytes are hashed ahead of the name, so two networks with
/// different namespaces can never collide even for adversarial name choices.
pub fn derive_info_hash(namespace: &[u8], network_name: &str) -> InfoHash {
    let mut hasher = Sha1::new();
    hasher.update(namespace);
    hasher.update(network_name.as_bytes());
    let result = hasher.finalize();
    let mut hash = [0u8; 20];
    hash.copy_from_slice(&result);
    InfoHash::new(hash)
}
