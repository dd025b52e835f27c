//! CLI configuration module
//!
//! Builds a session configuration from CLI arguments and an optional JSON
//! configuration file, and loads network-name lists from disk.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::cli::args::CliArgs;
use crate::error::{BitBootError, Result};
use crate::session::{BitBootConfig, RetryPolicy};

/// JSON configuration file shape
///
/// All fields are optional; anything absent falls back to the CLI
/// argument or the built-in default. Durations are given in seconds.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    /// Substrate network name
    pub network: Option<String>,
    /// Backend listen port
    pub listen_port: Option<u16>,
    /// Continuous poll interval in seconds
    pub poll_interval: Option<f64>,
    /// Announcement freshness window in seconds
    pub announce_ttl: Option<f64>,
    /// Per-call backend timeout in seconds
    pub backend_timeout: Option<f64>,
    /// Maximum retry attempts per operation
    pub max_attempts: Option<u32>,
    /// Delay between retries in seconds
    pub retry_delay: Option<f64>,
    /// Extra logical network names to operate on
    #[serde(default)]
    pub network_names: Vec<String>,
}

impl ConfigFile {
    /// Load a configuration file from disk
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|e| {
            BitBootError::config_error(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: ConfigFile = serde_json::from_str(&data)?;
        debug!("Loaded config file: {}", path.display());
        Ok(config)
    }
}

/// Build the session configuration from CLI arguments and the optional
/// config file (file values win over CLI defaults).
pub fn build_session_config(args: &CliArgs, file: &ConfigFile) -> Result<BitBootConfig> {
    let network_name = file.network.clone().unwrap_or_else(|| args.network.clone());

    let mut config = BitBootConfig::new(network_name)
        .with_poll_interval(secs(file.poll_interval.unwrap_or(args.poll_interval)));
    if let Some(port) = file.listen_port {
        config = config.with_listen_port(port);
    }
    if let Some(timeout) = file.backend_timeout {
        config = config.with_backend_timeout(secs(timeout));
    }
    if let Some(ttl) = file.announce_ttl {
        config.announce_ttl = secs(ttl);
    }

    let default_retry = RetryPolicy::default();
    let retry = RetryPolicy::fixed(
        file.max_attempts.unwrap_or(default_retry.max_attempts),
        file.retry_delay.map(secs).unwrap_or(default_retry.backoff),
    );
    config = config.with_retry(retry);

    config.validate()?;
    Ok(config)
}

/// Load network names from a file, one per line, skipping blanks
pub fn load_network_names(path: &Path) -> Result<Vec<String>> {
    let data = std::fs::read_to_string(path).map_err(|e| {
        BitBootError::config_error(format!(
            "Failed to read network names file '{}': {}",
            path.display(),
            e
        ))
    })?;
    Ok(data
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect())
}

fn secs(value: f64) -> Duration {
    Duration::from_secs_f64(value.max(0.0))
}
