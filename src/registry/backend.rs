//! Backend registry
//!
//! Maps a backend id to a factory producing [`DhtBackend`] instances.
//! Factories are pure constructors; network and chain connections happen
//! later in `bootstrap`. This indirection keeps the orchestrator
//! backend-agnostic and lets tests substitute the in-memory backend.

use std::collections::BTreeMap;

use tracing::debug;

use crate::backend::{BackendConfig, DhtBackend, MemoryBackend};
use crate::error::{BitBootError, Result};

/// Constructor for a backend instance
pub type BackendFactory =
    Box<dyn Fn(&BackendConfig) -> Result<Box<dyn DhtBackend>> + Send + Sync>;

/// Registry of backend factories keyed by backend id
#[derive(Default)]
pub struct BackendRegistry {
    factories: BTreeMap<String, BackendFactory>,
}

impl BackendRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry pre-populated with the built-in `memory` backend
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("memory", |_config| {
            Ok(Box::new(MemoryBackend::new()) as Box<dyn DhtBackend>)
        });
        registry
    }

    /// Register a factory under `backend_id`, replacing any previous one
    pub fn register<F>(&mut self, backend_id: impl Into<String>, factory: F)
    where
        F: Fn(&BackendConfig) -> Result<Box<dyn DhtBackend>> + Send + Sync + 'static,
    {
        let backend_id = backend_id.into();
        debug!("Registered backend factory '{}'", backend_id);
        self.factories.insert(backend_id, Box::new(factory));
    }

    /// Build a backend instance for the given id
    pub fn create(&self, backend_id: &str, config: &BackendConfig) -> Result<Box<dyn DhtBackend>> {
        let factory = self
            .factories
            .get(backend_id)
            .ok_or_else(|| BitBootError::backend_not_found(backend_id))?;
        factory(config)
    }

    /// Ids of all registered backends
    pub fn list(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }
}

impl std::fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendRegistry")
            .field("backends", &self.list())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_provide_memory() {
        let registry = BackendRegistry::with_builtins();
        assert_eq!(registry.list(), vec!["memory"]);
        let backend = registry
            .create("memory", &BackendConfig::new("local"))
            .unwrap();
        assert!(backend.listening_host().is_none());
    }

    #[test]
    fn test_create_unknown_is_not_found() {
        let registry = BackendRegistry::with_builtins();
        let err = registry
            .create("kademlia", &BackendConfig::new("bit_torrent"))
            .unwrap_err();
        assert!(matches!(err, BitBootError::BackendNotFound { .. }));
    }

    #[test]
    fn test_custom_factory_sees_config() {
        let mut registry = BackendRegistry::new();
        registry.register("probe", |config| {
            assert_eq!(config.network_name, "mynet");
            assert_eq!(config.listen_port, 4001);
            Ok(Box::new(MemoryBackend::new()) as Box<dyn DhtBackend>)
        });
        let config = BackendConfig::new("mynet").with_listen_port(4001);
        assert!(registry.create("probe", &config).is_ok());
    }

    #[test]
    fn test_reregistration_replaces_factory() {
        let mut registry = BackendRegistry::new();
        registry.register("mem", |_| {
            Ok(Box::new(MemoryBackend::new()) as Box<dyn DhtBackend>)
        });
        let store = MemoryBackend::shared_store();
        let shared = store.clone();
        registry.register("mem", move |_| {
            Ok(Box::new(MemoryBackend::with_store(shared.clone())) as Box<dyn DhtBackend>)
        });
        assert_eq!(registry.list().len(), 1);
        assert!(registry.create("mem", &BackendConfig::new("n")).is_ok());
    }
}
