//! Network registry
//!
//! Maps a network name to the descriptor needed to reach it: which
//! backend implementation to use, which hosts to bootstrap from, and the
//! namespace mixed into key derivation.

use tracing::debug;

use std::collections::BTreeMap;

use crate::error::{BitBootError, Result};
use crate::record::KnownHost;

/// Description of a DHT network and how to bootstrap it
#[derive(Debug, Clone)]
pub struct DhtNetwork {
    /// Unique network name within a registry
    pub name: String,
    /// Identifier of the backend implementation to instantiate
    pub backend_id: String,
    /// Known entry nodes, tried in order
    pub bootstrap_hosts: Vec<KnownHost>,
    /// Bytes prefixed to every name before key derivation
    pub key_namespace: Vec<u8>,
}

impl DhtNetwork {
    /// Create a network descriptor with no bootstrap hosts and an empty
    /// namespace
    pub fn new(name: impl Into<String>, backend_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            backend_id: backend_id.into(),
            bootstrap_hosts: Vec::new(),
            key_namespace: Vec::new(),
        }
    }

    /// Set the bootstrap hosts
    pub fn with_bootstrap_hosts(mut self, hosts: Vec<KnownHost>) -> Self {
        self.bootstrap_hosts = hosts;
        self
    }

    /// Set the key derivation namespace
    pub fn with_key_namespace(mut self, namespace: Vec<u8>) -> Self {
        self.key_namespace = namespace;
        self
    }
}

/// Registry holding all known [`DhtNetwork`] descriptors
#[derive(Debug, Default)]
pub struct NetworkRegistry {
    networks: BTreeMap<String, DhtNetwork>,
}

impl NetworkRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry pre-populated with the built-in networks
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for network in builtin_networks() {
            // Built-in names are distinct, so this cannot fail.
            let _ = registry.register(network);
        }
        registry
    }

    /// Register a network descriptor.
    ///
    /// Re-registration under an existing name is rejected with
    /// [`BitBootError::DuplicateNetwork`] rather than silently replacing.
    pub fn register(&mut self, network: DhtNetwork) -> Result<()> {
        if self.networks.contains_key(&network.name) {
            return Err(BitBootError::duplicate_network(&network.name));
        }
        debug!(
            "Registered network '{}' (backend: {}, {} bootstrap hosts)",
            network.name,
            network.backend_id,
            network.bootstrap_hosts.len()
        );
        self.networks.insert(network.name.clone(), network);
        Ok(())
    }

    /// Look up a network by name
    pub fn get(&self, name: &str) -> Result<&DhtNetwork> {
        self.networks
            .get(name)
            .ok_or_else(|| BitBootError::network_not_found(name))
    }

    /// Names of all registered networks
    pub fn list(&self) -> Vec<String> {
        self.networks.keys().cloned().collect()
    }
}

/// The networks every process knows about without any registration call.
///
/// `local` performs no network I/O and exists for offline and test use;
/// `bit_torrent` carries the public mainline DHT bootstrap nodes and
/// expects an externally registered `kademlia` backend.
pub fn builtin_networks() -> Vec<DhtNetwork> {
    vec![
        DhtNetwork::new("local", "memory"),
        DhtNetwork::new("bit_torrent", "kademlia").with_bootstrap_hosts(vec![
            KnownHost::new("dht.transmissionbt.com", 6881),
            KnownHost::new("dht.u-phoria.org", 6881),
            KnownHost::new("dht.bt.am", 2710),
            KnownHost::new("dht.ipred.org", 6969),
            KnownHost::new("dht.pirateparty.gr", 80),
            KnownHost::new("dht.zoink.nl", 80),
            KnownHost::new("dht.openbittorrent.com", 80),
            KnownHost::new("dht.istole.it", 6969),
            KnownHost::new("dht.ccc.de", 80),
            KnownHost::new("dht.leechers-paradise.org", 6969),
        ]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_get() {
        let mut registry = NetworkRegistry::new();
        registry
            .register(DhtNetwork::new("testnet", "memory"))
            .unwrap();
        let network = registry.get("testnet").unwrap();
        assert_eq!(network.backend_id, "memory");
        assert!(network.bootstrap_hosts.is_empty());
    }

    #[test]
    fn test_get_unknown_is_not_found() {
        let registry = NetworkRegistry::new();
        assert!(matches!(
            registry.get("nope"),
            Err(BitBootError::NetworkNotFound { .. })
        ));
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = NetworkRegistry::new();
        registry
            .register(DhtNetwork::new("testnet", "memory"))
            .unwrap();
        let err = registry
            .register(DhtNetwork::new("testnet", "kademlia"))
            .unwrap_err();
        assert!(matches!(err, BitBootError::DuplicateNetwork { .. }));
        // Existing entry is untouched.
        assert_eq!(registry.get("testnet").unwrap().backend_id, "memory");
    }

    #[test]
    fn test_builtins_include_local_and_bit_torrent() {
        let registry = NetworkRegistry::with_builtins();
        let names = registry.list();
        assert!(names.contains(&"local".to_string()));
        assert!(names.contains(&"bit_torrent".to_string()));

        let local = registry.get("local").unwrap();
        assert!(local.bootstrap_hosts.is_empty());
        assert_eq!(local.backend_id, "memory");

        let bt = registry.get("bit_torrent").unwrap();
        assert_eq!(bt.backend_id, "kademlia");
        assert!(!bt.bootstrap_hosts.is_empty());
    }

    #[test]
    fn test_list_is_sorted() {
        let mut registry = NetworkRegistry::new();
        registry.register(DhtNetwork::new("zeta", "memory")).unwrap();
        registry.register(DhtNetwork::new("alpha", "memory")).unwrap();
        assert_eq!(registry.list(), vec!["alpha", "zeta"]);
    }
}
