//! Error types for bitboot
//!
//! This module defines the typed errors surfaced by the discovery layer.
//! Library callers receive a `BitBootError` they can branch on; the CLI
//! maps these onto a non-zero exit code.

use std::fmt;

/// Comprehensive error type for discovery operations
#[derive(Debug, Clone)]
pub enum BitBootError {
    /// Requested network name is not present in the network registry
    NetworkNotFound {
        name: String,
    },

    /// Requested backend id has no registered factory
    BackendNotFound {
        backend_id: String,
    },

    /// A network with the same name is already registered
    DuplicateNetwork {
        name: String,
    },

    /// Backend failed while joining the DHT
    BootstrapError {
        message: String,
        source: Option<String>,
    },

    /// A backend call exceeded the configured timeout
    BackendTimeout {
        operation: String,
    },

    /// Backend I/O failure (transient; retried per policy before surfacing)
    BackendUnavailable {
        message: String,
        source: Option<String>,
    },

    /// Stored DHT value could not be decoded as a peer record
    DecodeError {
        message: String,
    },

    /// Announce retries exhausted without the host becoming visible
    WriteConflict {
        network_name: String,
        attempts: u32,
    },

    /// Operation attempted on a session after `stop()`
    SessionClosed,

    /// Invalid configuration supplied by the caller
    ConfigError {
        message: String,
        field: Option<String>,
    },
}

impl BitBootError {
    /// Create a new NetworkNotFound error
    pub fn network_not_found(name: impl Into<String>) -> Self {
        BitBootError::NetworkNotFound { name: name.into() }
    }

    /// Create a new BackendNotFound error
    pub fn backend_not_found(backend_id: impl Into<String>) -> Self {
        BitBootError::BackendNotFound {
            backend_id: backend_id.into(),
        }
    }

    /// Create a new DuplicateNetwork error
    pub fn duplicate_network(name: impl Into<String>) -> Self {
        BitBootError::DuplicateNetwork { name: name.into() }
    }

    /// Create a new BootstrapError
    pub fn bootstrap_error(message: impl Into<String>) -> Self {
        BitBootError::BootstrapError {
            message: message.into(),
            source: None,
        }
    }

    /// Create a new BootstrapError with source
    pub fn bootstrap_error_with_source(
        message: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        BitBootError::BootstrapError {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Create a new BackendTimeout error for the named operation
    pub fn backend_timeout(operation: impl Into<String>) -> Self {
        BitBootError::BackendTimeout {
            operation: operation.into(),
        }
    }

    /// Create a new BackendUnavailable error
    pub fn backend_unavailable(message: impl Into<String>) -> Self {
        BitBootError::BackendUnavailable {
            message: message.into(),
            source: None,
        }
    }

    /// Create a new BackendUnavailable error with source
    pub fn backend_unavailable_with_source(
        message: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        BitBootError::BackendUnavailable {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Create a new DecodeError
    pub fn decode_error(message: impl Into<String>) -> Self {
        BitBootError::DecodeError {
            message: message.into(),
        }
    }

    /// Create a new WriteConflict error
    pub fn write_conflict(network_name: impl Into<String>, attempts: u32) -> Self {
        BitBootError::WriteConflict {
            network_name: network_name.into(),
            attempts,
        }
    }

    /// Create a new ConfigError
    pub fn config_error(message: impl Into<String>) -> Self {
        BitBootError::ConfigError {
            message: message.into(),
            field: None,
        }
    }

    /// Create a new ConfigError with field
    pub fn config_error_with_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        BitBootError::ConfigError {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Whether the error is transient and worth retrying
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BitBootError::BackendTimeout { .. } | BitBootError::BackendUnavailable { .. }
        )
    }
}

impl fmt::Display for BitBootError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BitBootError::NetworkNotFound { name } => {
                write!(f, "Network not found: {}", name)
            }
            BitBootError::BackendNotFound { backend_id } => {
                write!(f, "Backend not found: {}", backend_id)
            }
            BitBootError::DuplicateNetwork { name } => {
                write!(f, "Network already registered: {}", name)
            }
            BitBootError::BootstrapError { message, source } => {
                if let Some(src) = source {
                    write!(f, "Bootstrap error: {} (source: {})", message, src)
                } else {
                    write!(f, "Bootstrap error: {}", message)
                }
            }
            BitBootError::BackendTimeout { operation } => {
                write!(f, "Backend timeout during {}", operation)
            }
            BitBootError::BackendUnavailable { message, source } => {
                if let Some(src) = source {
                    write!(f, "Backend unavailable: {} (source: {})", message, src)
                } else {
                    write!(f, "Backend unavailable: {}", message)
                }
            }
            BitBootError::DecodeError { message } => {
                write!(f, "Decode error: {}", message)
            }
            BitBootError::WriteConflict {
                network_name,
                attempts,
            } => {
                write!(
                    f,
                    "Write conflict on network '{}' after {} attempts",
                    network_name, attempts
                )
            }
            BitBootError::SessionClosed => {
                write!(f, "Session is closed")
            }
            BitBootError::ConfigError { message, field } => {
                if let Some(field_val) = field {
                    write!(f, "Config error: {} (field: {})", message, field_val)
                } else {
                    write!(f, "Config error: {}", message)
                }
            }
        }
    }
}

impl std::error::Error for BitBootError {}

/// Convenience alias used throughout the library
pub type Result<T> = std::result::Result<T, BitBootError>;

// Implement From traits for common error types

impl From<std::io::Error> for BitBootError {
    fn from(err: std::io::Error) -> Self {
        BitBootError::backend_unavailable_with_source(err.to_string(), err.kind().to_string())
    }
}

// Note: serde_bencode::Error is the public type, not de::Error or ser::Error
impl From<serde_bencode::Error> for BitBootError {
    fn from(err: serde_bencode::Error) -> Self {
        BitBootError::decode_error(err.to_string())
    }
}

impl From<serde_json::Error> for BitBootError {
    fn from(err: serde_json::Error) -> Self {
        BitBootError::config_error(format!("Failed to parse JSON config: {}", err))
    }
}

impl From<tokio::time::error::Elapsed> for BitBootError {
    fn from(_err: tokio::time::error::Elapsed) -> Self {
        BitBootError::backend_timeout("backend call")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_not_found() {
        let err = BitBootError::network_not_found("ghostnet");
        assert_eq!(err.to_string(), "Network not found: ghostnet");
    }

    #[test]
    fn test_backend_not_found() {
        let err = BitBootError::backend_not_found("kademlia");
        assert!(err.to_string().contains("Backend not found"));
        assert!(err.to_string().contains("kademlia"));
    }

    #[test]
    fn test_bootstrap_error_with_source() {
        let err = BitBootError::bootstrap_error_with_source("no nodes reachable", "socket closed");
        assert!(err.to_string().contains("Bootstrap error"));
        assert!(err.to_string().contains("no nodes reachable"));
        assert!(err.to_string().contains("socket closed"));
    }

    #[test]
    fn test_write_conflict_display() {
        let err = BitBootError::write_conflict("my-app", 3);
        assert!(err.to_string().contains("my-app"));
        assert!(err.to_string().contains("3 attempts"));
    }

    #[test]
    fn test_retryable_classification() {
        assert!(BitBootError::backend_timeout("get").is_retryable());
        assert!(BitBootError::backend_unavailable("down").is_retryable());
        assert!(!BitBootError::SessionClosed.is_retryable());
        assert!(!BitBootError::decode_error("bad bytes").is_retryable());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err: BitBootError = io_err.into();
        assert!(matches!(err, BitBootError::BackendUnavailable { .. }));
    }

    #[test]
    fn test_backend_timeout_display() {
        let err = BitBootError::backend_timeout("set");
        assert!(matches!(err, BitBootError::BackendTimeout { .. }));
        assert!(err.to_string().contains("set"));
    }

    #[test]
    fn test_config_error_with_field() {
        let err = BitBootError::config_error_with_field("must be positive", "poll_interval");
        assert!(err.to_string().contains("Config error"));
        assert!(err.to_string().contains("poll_interval"));
    }
}
