//! Peer record codec
//!
//! Serializes the set of known hosts for a network into the byte value a
//! DHT stores, and parses it back. The format is a single leading version
//! byte followed by a bencoded record body, so old readers can reject a
//! newer format cleanly instead of misparsing it.
//!
//! Records are merged by union: announcing a host never removes another
//! announcer's entry. When the encoding would exceed [`MAX_RECORD_SIZE`]
//! the oldest hosts are dropped first (hosts are kept newest-first).

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{BitBootError, Result};

/// Current record format version
pub const RECORD_FORMAT_VERSION: u8 = 1;

/// Maximum encoded record size in bytes.
///
/// Chosen below the usual 8 KiB DHT value ceiling so a record survives
/// backends that bencode-wrap stored values themselves.
pub const MAX_RECORD_SIZE: usize = 8000;

/// A reachable peer endpoint announced into a network
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnownHost {
    /// Host address (IP or DNS name)
    pub host: String,
    /// Port number
    pub port: u16,
    /// Opaque application metadata carried alongside the endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Vec<u8>>,
}

impl KnownHost {
    /// Create a new KnownHost without metadata
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            metadata: None,
        }
    }

    /// Create a new KnownHost carrying opaque metadata
    pub fn with_metadata(host: impl Into<String>, port: u16, metadata: Vec<u8>) -> Self {
        Self {
            host: host.into(),
            port,
            metadata: Some(metadata),
        }
    }
}

// Equality and hashing consider only the endpoint, not metadata.

impl PartialEq for KnownHost {
    fn eq(&self, other: &Self) -> bool {
        self.host == other.host && self.port == other.port
    }
}

impl Eq for KnownHost {}

impl std::hash::Hash for KnownHost {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.host.hash(state);
        self.port.hash(state);
    }
}

impl std::fmt::Display for KnownHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl std::str::FromStr for KnownHost {
    type Err = BitBootError;

    fn from_str(s: &str) -> Result<Self> {
        let (host, port) = s
            .rsplit_once(':')
            .ok_or_else(|| BitBootError::config_error_with_field("expected host:port", "peer"))?;
        let port = port
            .parse::<u16>()
            .map_err(|e| BitBootError::config_error_with_field(e.to_string(), "peer"))?;
        if host.is_empty() {
            return Err(BitBootError::config_error_with_field(
                "host cannot be empty",
                "peer",
            ));
        }
        Ok(KnownHost::new(host, port))
    }
}

/// The value stored under a network's DHT key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerRecord {
    /// Known hosts, newest announcement first, unique by (host, port)
    pub hosts: Vec<KnownHost>,
    /// Monotonic write counter; each merge bumps past every version seen
    pub version: u64,
}

impl PeerRecord {
    /// Create an empty record
    pub fn empty() -> Self {
        Self {
            hosts: Vec::new(),
            version: 0,
        }
    }

    /// Merge a host into the record, returning the successor record.
    ///
    /// The merged host moves to the front (newest-first ordering); an
    /// existing entry for the same endpoint is replaced so re-announcing
    /// refreshes metadata without duplicating the host.
    pub fn merge(&self, host: KnownHost) -> Self {
        let mut hosts = Vec::with_capacity(self.hosts.len() + 1);
        hosts.push(host);
        for existing in &self.hosts {
            if !hosts.contains(existing) {
                hosts.push(existing.clone());
            }
        }
        Self {
            hosts,
            version: self.version + 1,
        }
    }

    /// Check whether the record contains the given endpoint
    pub fn contains(&self, host: &KnownHost) -> bool {
        self.hosts.contains(host)
    }
}

/// Encode a record into the DHT value format.
///
/// If the encoding exceeds [`MAX_RECORD_SIZE`], the oldest hosts are
/// dropped until it fits. An empty record always fits.
pub fn encode(record: &PeerRecord) -> Result<Vec<u8>> {
    let mut trimmed = record.clone();
    loop {
        let body = serde_bencode::to_bytes(&trimmed)?;
        if body.len() + 1 <= MAX_RECORD_SIZE || trimmed.hosts.is_empty() {
            let mut out = Vec::with_capacity(body.len() + 1);
            out.push(RECORD_FORMAT_VERSION);
            out.extend_from_slice(&body);
            if trimmed.hosts.len() < record.hosts.len() {
                warn!(
                    "Record truncated from {} to {} hosts to fit {} bytes",
                    record.hosts.len(),
                    trimmed.hosts.len(),
                    MAX_RECORD_SIZE
                );
            }
            return Ok(out);
        }
        trimmed.hosts.pop();
    }
}

/// Decode a DHT value into a record.
///
/// Malformed input and unknown format versions yield a typed
/// [`BitBootError::DecodeError`]; the orchestrator treats that as "no
/// valid record", never as a fatal fault.
pub fn decode(data: &[u8]) -> Result<PeerRecord> {
    let (format, body) = match data.split_first() {
        Some(parts) => parts,
        None => return Err(BitBootError::decode_error("empty value")),
    };
    if *format != RECORD_FORMAT_VERSION {
        return Err(BitBootError::decode_error(format!(
            "unknown record format version {}",
            format
        )));
    }
    let record: PeerRecord = serde_bencode::from_bytes(body)?;
    debug!(
        "Decoded record v{} with {} hosts",
        record.version,
        record.hosts.len()
    );
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host(n: u16) -> KnownHost {
        KnownHost::new(format!("10.0.0.{}", n % 250), 6881 + n)
    }

    #[test]
    fn test_round_trip() {
        let record = PeerRecord {
            hosts: vec![
                KnownHost::new("127.0.0.1", 6881),
                KnownHost::with_metadata("peer.example.org", 4001, b"v2".to_vec()),
            ],
            version: 7,
        };
        let encoded = encode(&record).unwrap();
        assert_eq!(encoded[0], RECORD_FORMAT_VERSION);
        assert_eq!(decode(&encoded).unwrap(), record);
    }

    #[test]
    fn test_round_trip_empty_record() {
        let encoded = encode(&PeerRecord::empty()).unwrap();
        let decoded = decode(&encoded).unwrap();
        assert!(decoded.hosts.is_empty());
        assert_eq!(decoded.version, 0);
    }

    #[test]
    fn test_decode_rejects_empty_value() {
        assert!(matches!(
            decode(&[]),
            Err(BitBootError::DecodeError { .. })
        ));
    }

    #[test]
    fn test_decode_rejects_unknown_version() {
        let mut encoded = encode(&PeerRecord::empty()).unwrap();
        encoded[0] = 99;
        assert!(matches!(
            decode(&encoded),
            Err(BitBootError::DecodeError { .. })
        ));
    }

    #[test]
    fn test_decode_rejects_garbage_body() {
        let data = [RECORD_FORMAT_VERSION, b'x', b'y', b'z'];
        assert!(matches!(
            decode(&data),
            Err(BitBootError::DecodeError { .. })
        ));
    }

    #[test]
    fn test_merge_is_union_and_newest_first() {
        let record = PeerRecord::empty()
            .merge(KnownHost::new("a", 1))
            .merge(KnownHost::new("b", 2));
        assert_eq!(record.hosts[0], KnownHost::new("b", 2));
        assert_eq!(record.hosts[1], KnownHost::new("a", 1));
        assert_eq!(record.version, 2);
    }

    #[test]
    fn test_merge_same_endpoint_is_idempotent() {
        let record = PeerRecord::empty()
            .merge(KnownHost::new("a", 1))
            .merge(KnownHost::new("a", 1));
        assert_eq!(record.hosts.len(), 1);
        assert_eq!(record.version, 2);
    }

    #[test]
    fn test_merge_refreshes_metadata() {
        let record = PeerRecord::empty()
            .merge(KnownHost::new("a", 1))
            .merge(KnownHost::with_metadata("a", 1, b"new".to_vec()));
        assert_eq!(record.hosts.len(), 1);
        assert_eq!(record.hosts[0].metadata.as_deref(), Some(&b"new"[..]));
    }

    #[test]
    fn test_equality_ignores_metadata() {
        let plain = KnownHost::new("a", 1);
        let tagged = KnownHost::with_metadata("a", 1, b"tag".to_vec());
        assert_eq!(plain, tagged);
    }

    #[test]
    fn test_truncation_drops_oldest() {
        let mut record = PeerRecord::empty();
        for n in 0..600 {
            record = record.merge(host(n));
        }
        let encoded = encode(&record).unwrap();
        assert!(encoded.len() <= MAX_RECORD_SIZE);

        let decoded = decode(&encoded).unwrap();
        assert!(decoded.hosts.len() < record.hosts.len());
        // Newest announcement survives truncation.
        assert_eq!(decoded.hosts[0], host(599));
        // The kept prefix is exactly the newest hosts.
        assert_eq!(
            decoded.hosts[..],
            record.hosts[..decoded.hosts.len()]
        );
    }

    #[test]
    fn test_known_host_from_str() {
        let parsed: KnownHost = "example.org:6881".parse().unwrap();
        assert_eq!(parsed, KnownHost::new("example.org", 6881));
        assert!("no-port".parse::<KnownHost>().is_err());
        assert!(":6881".parse::<KnownHost>().is_err());
        assert!("host:notaport".parse::<KnownHost>().is_err());
    }
}
