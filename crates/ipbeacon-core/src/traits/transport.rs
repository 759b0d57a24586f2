// # Transport Trait
//
// Defines the interface for moving the one-line IP payload from the origin
// to the publisher host. The transport is an external collaborator consumed,
// not built: "write these bytes to the configured remote path, succeed or
// fail". It must be authenticated and encrypted end-to-end, with credentials
// configured out of band.
//
// ## Implementations
//
// - scp over ssh: `ipbeacon-transport-scp` crate
// - Test doubles: `tests/common/mod.rs`
//
// ## Atomicity
//
// Whatever the mechanism, the remote replacement must be atomic from a
// reader's point of view (stage-then-rename, never an in-place truncate
// that a concurrent read could observe half-written). The publisher does no
// locking; this is the sole guarantee protecting it from torn reads.

use async_trait::async_trait;
use std::net::IpAddr;

/// Trait for transport implementations
///
/// The destination (remote host, remote path, credentials) is fixed at
/// construction; `send` pushes one value to it.
///
/// Transports must not retry internally and must not touch the cache store.
/// The engine treats any failure uniformly (the cache is left uncommitted
/// and the next tick retries), so a transport that retried on its own would
/// only hide how long a value has been unpublished.
///
/// # Error classification
///
/// - Transient failures (connectivity, auth hiccup) → [`Error::Transport`]
/// - Misconfiguration (missing binary, unusable destination) → [`Error::Config`]
///
/// [`Error::Transport`]: crate::Error::Transport
/// [`Error::Config`]: crate::Error::Config
#[async_trait]
pub trait Transport: Send + Sync {
    /// Push the given IP to the configured destination
    ///
    /// Overwrites any existing remote content. Must be bounded by a timeout.
    ///
    /// # Returns
    ///
    /// - `Ok(())`: The value is durably visible on the publisher host
    /// - `Err(Error)`: Nothing may be assumed about the remote state; the
    ///   caller must not commit its cache
    async fn send(&self, ip: IpAddr) -> Result<(), crate::Error>;

    /// Get the transport name (for logging/debugging)
    fn transport_name(&self) -> &'static str;
}
