//! Network and backend registries
//!
//! Read-mostly tables assembled once at process startup and injected into
//! sessions. No ambient global state: whoever assembles the process owns
//! the registries.

pub mod backend;
pub mod network;

pub use backend::{BackendFactory, BackendRegistry};
pub use network::{DhtNetwork, NetworkRegistry};
