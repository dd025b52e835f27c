//! CLI arguments module
//!
//! Defines command-line argument parsing using clap.

use clap::Parser;
use std::path::PathBuf;

/// CLI arguments for decentralized peer discovery
#[derive(Debug, Parser)]
#[command(name = "bitboot")]
#[command(about = "Decentralized peer discovery for P2P networks", long_about = None)]
pub struct CliArgs {
    /// Announce a peer in the specified network(s)
    #[arg(short, long, value_name = "NETWORK_NAME", num_args = 1..)]
    pub announce: Vec<String>,

    /// Lookup peers in the specified network(s)
    #[arg(short, long, value_name = "NETWORK_NAME", num_args = 1..)]
    pub lookup: Vec<String>,

    /// Continuously poll the specified network(s)
    #[arg(short, long, value_name = "NETWORK_NAME", num_args = 1..)]
    pub continuous: Vec<String>,

    /// Host address of the peer to announce
    #[arg(long, default_value = "127.0.0.1")]
    pub peer_host: String,

    /// Port number of the peer to announce
    #[arg(long, default_value_t = 6881)]
    pub peer_port: u16,

    /// Substrate network the session binds to
    #[arg(short, long, default_value = "local")]
    pub network: String,

    /// Poll interval in seconds for continuous mode
    #[arg(long, default_value_t = 1.0)]
    pub poll_interval: f64,

    /// Path to a JSON configuration file
    #[arg(long, value_name = "CONFIG_PATH")]
    pub config: Option<PathBuf>,

    /// Load extra network names from a file (one name per line)
    #[arg(long, value_name = "FILE_PATH")]
    pub network_names_file: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Quiet mode (no output except errors)
    #[arg(short, long)]
    pub quiet: bool,
}

impl CliArgs {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Check whether any operation was requested
    pub fn has_work(&self) -> bool {
        !self.announce.is_empty() || !self.lookup.is_empty() || !self.continuous.is_empty()
    }

    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Check if quiet mode is enabled
    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    /// Get the log level based on verbosity settings
    pub fn log_level(&self) -> tracing::Level {
        if self.verbose {
            tracing::Level::DEBUG
        } else if self.quiet {
            tracing::Level::ERROR
        } else {
            tracing::Level::INFO
        }
    }
}
