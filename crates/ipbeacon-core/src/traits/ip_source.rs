// # IP Source Trait
//
// Defines the interface for resolving the current public IP address.
//
// ## Implementations
//
// - HTTP-based (external address services): `ipbeacon-lookup-http` crate
// - Test doubles: `tests/common/mod.rs`
//
// ## Usage
//
// ```rust,ignore
// use ipbeacon_core::IpSource;
//
// let source = /* IpSource implementation */;
// let current_ip = source.current().await?;
// ```

use async_trait::async_trait;
use std::net::IpAddr;

/// Trait for public-IP source implementations
///
/// An IP source answers one question: what is the origin's public IP right
/// now? It owns its own timeouts so a call can never hang the tick loop
/// indefinitely.
///
/// Sources must not push anything anywhere and must not touch the cache;
/// deciding whether a detected IP needs publishing is owned by
/// [`PublishEngine`](crate::engine::PublishEngine).
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Resolve the current public IP address
    ///
    /// # Returns
    ///
    /// - `Ok(IpAddr)`: A syntactically valid address of the configured family
    /// - `Err(Error)`: If no service produced a valid address. This is a
    ///   recoverable per-tick failure, never fatal to the loop.
    async fn current(&self) -> Result<IpAddr, crate::Error>;

    /// Get the source name (for logging/debugging)
    fn source_name(&self) -> &'static str;
}
