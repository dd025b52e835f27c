//! In-memory backend
//!
//! Backs the built-in `local` network. Performs no network I/O, which
//! makes it the substrate for offline use and for tests. Handing the same
//! [`MemoryStore`] to several backends simulates multiple sessions
//! rendezvousing over one shared DHT.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use tracing::{debug, trace};

use crate::backend::{DhtBackend, WriteReceipt};
use crate::error::{BitBootError, Result};
use crate::key::InfoHash;
use crate::record::KnownHost;

/// Shared key/value table standing in for a DHT
pub type MemoryStore = Arc<Mutex<HashMap<InfoHash, Bytes>>>;

/// DHT backend backed by a process-local table
pub struct MemoryBackend {
    store: MemoryStore,
    stopped: AtomicBool,
}

impl MemoryBackend {
    /// Create a backend with its own private store
    pub fn new() -> Self {
        Self::with_store(Arc::new(Mutex::new(HashMap::new())))
    }

    /// Create a backend over a shared store
    pub fn with_store(store: MemoryStore) -> Self {
        Self {
            store,
            stopped: AtomicBool::new(false),
        }
    }

    /// Create a fresh store for sharing between backends
    pub fn shared_store() -> MemoryStore {
        Arc::new(Mutex::new(HashMap::new()))
    }

    fn check_running(&self) -> Result<()> {
        if self.stopped.load(Ordering::SeqCst) {
            return Err(BitBootError::backend_unavailable("memory backend stopped"));
        }
        Ok(())
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DhtBackend for MemoryBackend {
    async fn bootstrap(&self, bootstrap_hosts: &[KnownHost]) -> Result<()> {
        self.check_running()?;
        // Nothing to join; bootstrap hosts are accepted and ignored.
        debug!(
            "Memory backend ready ({} bootstrap hosts ignored)",
            bootstrap_hosts.len()
        );
        Ok(())
    }

    async fn get(&self, key: InfoHash) -> Result<Option<Bytes>> {
        self.check_running()?;
        let store = self
            .store
            .lock()
            .map_err(|_| BitBootError::backend_unavailable("memory store poisoned"))?;
        let value = store.get(&key).cloned();
        trace!("Memory get {}: {} bytes", key, value.as_ref().map_or(0, |v| v.len()));
        Ok(value)
    }

    async fn put(&self, key: InfoHash, value: Bytes) -> Result<WriteReceipt> {
        self.check_running()?;
        let mut store = self
            .store
            .lock()
            .map_err(|_| BitBootError::backend_unavailable("memory store poisoned"))?;
        trace!("Memory put {}: {} bytes", key, value.len());
        store.insert(key, value);
        Ok(WriteReceipt::default())
    }

    async fn stop(&self) -> Result<()> {
        self.stopped.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn listening_host(&self) -> Option<KnownHost> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::derive_info_hash;

    #[tokio::test]
    async fn test_get_absent_returns_none() {
        let backend = MemoryBackend::new();
        let key = derive_info_hash(b"", "nobody-home");
        assert!(backend.get(key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let backend = MemoryBackend::new();
        let key = derive_info_hash(b"", "store-me");
        backend
            .put(key, Bytes::from_static(b"value"))
            .await
            .unwrap();
        assert_eq!(
            backend.get(key).await.unwrap(),
            Some(Bytes::from_static(b"value"))
        );
    }

    #[tokio::test]
    async fn test_shared_store_is_visible_across_backends() {
        let store = MemoryBackend::shared_store();
        let writer = MemoryBackend::with_store(store.clone());
        let reader = MemoryBackend::with_store(store);

        let key = derive_info_hash(b"", "shared");
        writer.put(key, Bytes::from_static(b"hi")).await.unwrap();
        assert_eq!(
            reader.get(key).await.unwrap(),
            Some(Bytes::from_static(b"hi"))
        );
    }

    #[tokio::test]
    async fn test_stopped_backend_refuses_operations() {
        let backend = MemoryBackend::new();
        backend.stop().await.unwrap();
        let key = derive_info_hash(b"", "closed");
        assert!(matches!(
            backend.get(key).await,
            Err(BitBootError::BackendUnavailable { .. })
        ));
        // stop is idempotent
        backend.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_bootstrap_accepts_empty_host_list() {
        let backend = MemoryBackend::new();
        assert!(backend.bootstrap(&[]).await.is_ok());
    }
}
