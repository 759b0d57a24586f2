// # Fact Store Trait
//
// Defines the interface for the publisher-side fact: the single persisted
// value representing the current published IP.
//
// ## States
//
// A fact store load distinguishes three states the HTTP layer must not
// conflate:
//
// - **Absent** (`Ok(None)`): the origin has never successfully published.
//   A valid, explicit state, not an error of the publisher itself.
// - **Malformed** (`Err(Error::MalformedFact)`): present but empty or not a
//   valid address under the configured policy. An operational problem
//   (corrupt write, wrong file) that must never be served as a `200`.
// - **Valid** (`Ok(Some(ip))`): the most recent successful transport write.
//
// ## Ownership
//
// The fact file is written only by the remote, authenticated transport; the
// publisher process reads it on every request and never writes it. Reads
// rely on writes being atomic replacements; no locking on this side.

use async_trait::async_trait;
use std::net::IpAddr;

/// Trait for fact store implementations
///
/// # Thread Safety
///
/// `load` is called once per incoming HTTP request, concurrently.
#[async_trait]
pub trait FactStore: Send + Sync {
    /// Read the current fact
    ///
    /// Implementations must re-read the backing state on every call rather
    /// than serving a stale in-memory copy across fact updates.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(IpAddr))`: The currently published IP
    /// - `Ok(None)`: No fact has ever been published
    /// - `Err(Error::MalformedFact)`: Present but empty/invalid content
    /// - `Err(Error)`: Other storage error
    async fn load(&self) -> Result<Option<IpAddr>, crate::Error>;
}
