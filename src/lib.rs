//! natlearn - NAT mapping inference for overlay nodes
//!
//! This library learns which externally visible transport addresses a node
//! can be reached at, using the mappings its peers report back to it.
//! Observations accumulate in an append-only history; a chain of NAT
//! behavior models turns that history into a ranked list of addresses to
//! advertise.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod nat;
pub mod settings;

#[cfg(test)]
mod tests;

/// Result type alias for natlearn operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for natlearn operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A transport address could not be parsed
    #[error("Invalid transport address: {0}")]
    InvalidAddress(String),

    /// Settings are present but unusable
    #[error("Config error: {0}")]
    Config(String),

    /// General I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Initialize natlearn logging
///
/// Honors `RUST_LOG`, falling back to `info` when it is unset or invalid.
pub fn init() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
