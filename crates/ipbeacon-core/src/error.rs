//! Error types for the ipbeacon system
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for ipbeacon operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the ipbeacon system
#[derive(Error, Debug)]
pub enum Error {
    /// Public-IP lookup errors (all services down or returning garbage)
    #[error("IP lookup error: {0}")]
    Lookup(String),

    /// Transport errors while pushing the IP to the publisher host.
    /// These are transient: the next tick retries the same value.
    #[error("transport error: {0}")]
    Transport(String),

    /// Cache store errors (origin-side last-pushed record)
    #[error("cache store error: {0}")]
    CacheStore(String),

    /// Fact store errors (publisher-side fact file)
    #[error("fact store error: {0}")]
    FactStore(String),

    /// The fact file exists but its content is empty or not a valid
    /// address under the configured policy. Distinct from absence: it
    /// indicates an operational problem, not a normal initial state.
    #[error("malformed fact: {0}")]
    MalformedFact(String),

    /// Configuration errors. These are fatal and detected before the
    /// loop/listener starts.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an IP lookup error
    pub fn lookup(msg: impl Into<String>) -> Self {
        Self::Lookup(msg.into())
    }

    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a cache store error
    pub fn cache_store(msg: impl Into<String>) -> Self {
        Self::CacheStore(msg.into())
    }

    /// Create a fact store error
    pub fn fact_store(msg: impl Into<String>) -> Self {
        Self::FactStore(msg.into())
    }

    /// Create a malformed fact error
    pub fn malformed_fact(msg: impl Into<String>) -> Self {
        Self::MalformedFact(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
