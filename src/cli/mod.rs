//! CLI module
//!
//! Command-line interface for decentralized peer discovery.

pub mod args;
pub mod config;

pub use args::CliArgs;
pub use config::{build_session_config, load_network_names, ConfigFile};
