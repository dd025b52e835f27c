//! Discovery orchestrator
//!
//! The `BitBoot` session is the public API surface: it resolves a network
//! name through the registries, owns one backend instance for its
//! lifetime, and coordinates announce, lookup and continuous polling
//! against it with retry and timeout policy applied at every backend
//! call.
//!
//! The layer keeps no persistent state outside the DHT record itself, so
//! a network always re-forms after a total outage: the next announce
//! simply recreates the record from scratch.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::Mutex as AsyncMutex;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use crate::backend::{BackendConfig, DhtBackend};
use crate::error::{BitBootError, Result};
use crate::key::{derive_info_hash, InfoHash};
use crate::record::{self, KnownHost, PeerRecord};
use crate::registry::{BackendRegistry, DhtNetwork, NetworkRegistry};

pub mod poll;

pub use poll::PollHandle;

/// Retry policy for transient backend failures
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts per operation
    pub max_attempts: u32,
    /// Delay before the first retry
    pub backoff: Duration,
    /// Multiplier applied to the delay after each retry (1.0 = fixed wait)
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(5),
            backoff_multiplier: 1.0,
        }
    }
}

impl RetryPolicy {
    /// Fixed-wait policy with the given attempt count and delay
    pub fn fixed(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts,
            backoff,
            backoff_multiplier: 1.0,
        }
    }

    fn next_delay(&self, current: Duration) -> Duration {
        current.mul_f64(self.backoff_multiplier.max(1.0))
    }
}

/// Configuration for a discovery session
#[derive(Debug, Clone)]
pub struct BitBootConfig {
    /// Name of the registered network to bind the session to
    pub network_name: String,
    /// Port the backend listens on (0 = ephemeral)
    pub listen_port: u16,
    /// Interval between continuous-poll ticks
    pub poll_interval: Duration,
    /// Advisory freshness window for announcements; backends with
    /// expiring storage may apply it as a record TTL
    pub announce_ttl: Duration,
    /// Timeout applied to every backend call
    pub backend_timeout: Duration,
    /// Retry policy for transient backend failures
    pub retry: RetryPolicy,
}

impl BitBootConfig {
    /// Create a config for the given network with default timings
    pub fn new(network_name: impl Into<String>) -> Self {
        Self {
            network_name: network_name.into(),
            listen_port: 5678,
            poll_interval: Duration::from_secs(1),
            announce_ttl: Duration::from_secs(3600),
            backend_timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }

    /// Set the listen port
    pub fn with_listen_port(mut self, port: u16) -> Self {
        self.listen_port = port;
        self
    }

    /// Set the continuous-poll interval
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the per-call backend timeout
    pub fn with_backend_timeout(mut self, backend_timeout: Duration) -> Self {
        self.backend_timeout = backend_timeout;
        self
    }

    /// Set the retry policy
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.network_name.is_empty() {
            return Err(BitBootError::config_error_with_field(
                "network_name cannot be empty",
                "network_name",
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(BitBootError::config_error_with_field(
                "max_attempts must be at least 1",
                "retry.max_attempts",
            ));
        }
        if self.poll_interval == Duration::ZERO {
            return Err(BitBootError::config_error_with_field(
                "poll_interval must be positive",
                "poll_interval",
            ));
        }
        if self.backend_timeout == Duration::ZERO {
            return Err(BitBootError::config_error_with_field(
                "backend_timeout must be positive",
                "backend_timeout",
            ));
        }
        Ok(())
    }
}

struct SessionInner {
    config: BitBootConfig,
    network: DhtNetwork,
    backend: Box<dyn DhtBackend>,
    closed: AtomicBool,
    // Serializes read-merge-write cycles per key; a lost-update race
    // between two announces on the same session would otherwise drop a
    // host silently.
    key_locks: AsyncMutex<HashMap<InfoHash, Arc<AsyncMutex<()>>>>,
    // Last observed peer count per logical network name.
    peer_counts: std::sync::Mutex<HashMap<String, usize>>,
}

/// A discovery session bound to one network/backend pair
///
/// Cloning is cheap and shares the underlying session; `continuous_poll`
/// relies on this to run ticks as an independent task.
#[derive(Clone)]
pub struct BitBoot {
    inner: Arc<SessionInner>,
}

impl std::fmt::Debug for BitBoot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BitBoot").finish_non_exhaustive()
    }
}

impl BitBoot {
    /// Resolve the configured network, build its backend and bootstrap it.
    ///
    /// Fails with `NetworkNotFound` or `BackendNotFound` before any
    /// backend I/O when a registry misses.
    pub async fn create(
        config: BitBootConfig,
        networks: &NetworkRegistry,
        backends: &BackendRegistry,
    ) -> Result<Self> {
        config.validate()?;
        let network = networks.get(&config.network_name)?.clone();
        let backend_config =
            BackendConfig::new(&network.name).with_listen_port(config.listen_port);
        let backend = backends.create(&network.backend_id, &backend_config)?;

        info!(
            "Bootstrapping session on network '{}' via backend '{}'",
            network.name, network.backend_id
        );
        timeout(config.backend_timeout, backend.bootstrap(&network.bootstrap_hosts))
            .await
            .map_err(|_| BitBootError::backend_timeout("bootstrap"))?
            .map_err(|e| {
                BitBootError::bootstrap_error_with_source(
                    format!("failed to join network '{}'", network.name),
                    e.to_string(),
                )
            })?;

        Ok(Self {
            inner: Arc::new(SessionInner {
                config,
                network,
                backend,
                closed: AtomicBool::new(false),
                key_locks: AsyncMutex::new(HashMap::new()),
                peer_counts: std::sync::Mutex::new(HashMap::new()),
            }),
        })
    }

    /// The network this session is bound to
    pub fn network(&self) -> &DhtNetwork {
        &self.inner.network
    }

    /// The session configuration
    pub fn config(&self) -> &BitBootConfig {
        &self.inner.config
    }

    /// Address the backend listens on, for use as a bootstrap host by
    /// other local processes
    pub fn listening_host(&self) -> Option<KnownHost> {
        self.inner.backend.listening_host()
    }

    /// Last observed peer count per looked-up network name
    pub fn num_peers(&self) -> HashMap<String, usize> {
        self.inner
            .peer_counts
            .lock()
            .map(|counts| counts.clone())
            .unwrap_or_default()
    }

    /// Announce a host under a logical network name.
    ///
    /// Performs a read-merge-write cycle: the current record (absent or
    /// undecodable counts as empty) is unioned with the host and written
    /// back, then re-read to confirm the host survived a concurrent
    /// writer. The cycle retries per policy before failing with
    /// `WriteConflict`.
    pub async fn announce_peer(&self, network_name: &str, host: KnownHost) -> Result<()> {
        self.ensure_open()?;
        let key = self.derive_key(network_name);
        debug!("Announcing {} under '{}' ({})", host, network_name, key);

        let lock = self.key_lock(key).await;
        let _guard = lock.lock().await;

        let policy = &self.inner.config.retry;
        let mut delay = policy.backoff;
        for attempt in 1..=policy.max_attempts {
            let current = self.read_record(key).await?;
            let merged = current.merge(host.clone());
            let encoded = record::encode(&merged)?;

            let receipt = self.put_with_retry(key, Bytes::from(encoded)).await?;
            if let Some(fee) = receipt.fee {
                debug!("Backend reported write fee: {}", fee);
            }

            let written = self.read_record(key).await?;
            if written.contains(&host) {
                info!("Announced {} under '{}'", host, network_name);
                return Ok(());
            }

            warn!(
                "Announce of {} under '{}' lost to a concurrent writer (attempt {}/{})",
                host, network_name, attempt, policy.max_attempts
            );
            if attempt < policy.max_attempts {
                sleep(jittered(delay)).await;
                delay = policy.next_delay(delay);
            }
        }

        Err(BitBootError::write_conflict(
            network_name,
            policy.max_attempts,
        ))
    }

    /// Look up the hosts announced under a logical network name.
    ///
    /// An absent or undecodable record yields an empty list: "no one has
    /// announced yet" is a normal state for a fresh network.
    pub async fn lookup(&self, network_name: &str) -> Result<Vec<KnownHost>> {
        self.ensure_open()?;
        let key = self.derive_key(network_name);
        let record = self.read_record(key).await?;
        debug!(
            "Lookup '{}' ({}): {} hosts",
            network_name,
            key,
            record.hosts.len()
        );

        if let Ok(mut counts) = self.inner.peer_counts.lock() {
            counts.insert(network_name.to_string(), record.hosts.len());
        }
        Ok(record.hosts)
    }

    /// Announce a host, then immediately look the network up.
    ///
    /// Convenience for peers that first make themselves known and then
    /// query for others.
    pub async fn announce_and_lookup(
        &self,
        network_name: &str,
        host: KnownHost,
    ) -> Result<Vec<KnownHost>> {
        self.announce_peer(network_name, host).await?;
        self.lookup(network_name).await
    }

    /// Start polling a logical network name on a fixed interval.
    ///
    /// Every snapshot (including empty ones) is delivered through the
    /// returned handle until it is cancelled or the session stops. A
    /// failed tick is logged and retried on the next interval, so the
    /// stream survives backend outages.
    pub fn continuous_poll(&self, network_name: &str, interval: Option<Duration>) -> PollHandle {
        let interval = interval.unwrap_or(self.inner.config.poll_interval);
        poll::spawn(self.clone(), network_name.to_string(), interval)
    }

    /// Release backend resources; idempotent.
    ///
    /// After `stop`, every operation on the session (and its clones)
    /// fails with `SessionClosed`.
    pub async fn stop(&self) -> Result<()> {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        info!("Stopping session on network '{}'", self.inner.network.name);
        self.inner.backend.stop().await
    }

    fn ensure_open(&self) -> Result<()> {
        if self.inner.closed.load(Ordering::SeqCst) {
            return Err(BitBootError::SessionClosed);
        }
        Ok(())
    }

    fn derive_key(&self, network_name: &str) -> InfoHash {
        derive_info_hash(&self.inner.network.key_namespace, network_name)
    }

    async fn key_lock(&self, key: InfoHash) -> Arc<AsyncMutex<()>> {
        let mut locks = self.inner.key_locks.lock().await;
        locks.entry(key).or_default().clone()
    }

    /// Read and decode the record under `key`, treating absent and
    /// undecodable values as empty.
    async fn read_record(&self, key: InfoHash) -> Result<PeerRecord> {
        match self.get_with_retry(key).await? {
            None => Ok(PeerRecord::empty()),
            Some(value) => match record::decode(&value) {
                Ok(record) => Ok(record),
                Err(e) => {
                    warn!("Ignoring undecodable record at {}: {}", key, e);
                    Ok(PeerRecord::empty())
                }
            },
        }
    }

    async fn get_with_retry(&self, key: InfoHash) -> Result<Option<Bytes>> {
        let policy = &self.inner.config.retry;
        let mut delay = policy.backoff;
        let mut last_err = BitBootError::backend_unavailable("no attempts made");
        for attempt in 1..=policy.max_attempts {
            match timeout(self.inner.config.backend_timeout, self.inner.backend.get(key)).await {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(e)) if e.is_retryable() => last_err = e,
                Ok(Err(e)) => return Err(e),
                Err(_) => last_err = BitBootError::backend_timeout("get"),
            }
            warn!(
                "Backend get failed (attempt {}/{}): {}",
                attempt, policy.max_attempts, last_err
            );
            if attempt < policy.max_attempts {
                sleep(jittered(delay)).await;
                delay = policy.next_delay(delay);
            }
        }
        Err(last_err)
    }

    async fn put_with_retry(
        &self,
        key: InfoHash,
        value: Bytes,
    ) -> Result<crate::backend::WriteReceipt> {
        let policy = &self.inner.config.retry;
        let mut delay = policy.backoff;
        let mut last_err = BitBootError::backend_unavailable("no attempts made");
        for attempt in 1..=policy.max_attempts {
            match timeout(
                self.inner.config.backend_timeout,
                self.inner.backend.put(key, value.clone()),
            )
            .await
            {
                Ok(Ok(receipt)) => return Ok(receipt),
                Ok(Err(e)) if e.is_retryable() => last_err = e,
                Ok(Err(e)) => return Err(e),
                Err(_) => last_err = BitBootError::backend_timeout("put"),
            }
            warn!(
                "Backend put failed (attempt {}/{}): {}",
                attempt, policy.max_attempts, last_err
            );
            if attempt < policy.max_attempts {
                sleep(jittered(delay)).await;
                delay = policy.next_delay(delay);
            }
        }
        Err(last_err)
    }
}

/// Apply +/-20% jitter so retrying sessions do not thunder in lockstep
fn jittered(delay: Duration) -> Duration {
    use rand::Rng;
    let factor = rand::thread_rng().gen_range(0.8..1.2);
    delay.mul_f64(factor)
}
