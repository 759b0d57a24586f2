// # Cache Store Trait
//
// Defines the interface for the origin-side record of the last IP that was
// successfully pushed to the publisher.
//
// ## Purpose
//
// The cache record is what makes ticks idempotent: repeated ticks with an
// unchanged public IP produce zero transport side effects after the first
// successful push, across process restarts.
//
// ## Lifecycle
//
// Created on the first successful push, overwritten on every subsequent
// one, never deleted by normal operation. Absence is a valid initial state
// meaning "no push has ever succeeded".
//
// ## Implementations
//
// - File-based (single-line text file): `crate::cache::FileCacheStore`
// - In-memory: `crate::cache::MemoryCacheStore`

use async_trait::async_trait;
use std::net::IpAddr;

/// A cache record: the last successfully pushed IP plus the time of that
/// push, when the backing store can recover it.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CacheRecord {
    /// The last IP successfully pushed
    pub ip: IpAddr,
    /// When the push was committed, if known (file stores recover this from
    /// the file's modification time after a restart)
    pub pushed_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Trait for cache store implementations
///
/// The store is exclusively owned and mutated by the detector process.
///
/// # Commit ordering
///
/// Callers must invoke `commit` only after the transport has confirmed
/// success. Committing first and transporting second would silently drop a
/// real IP change forever if the transport failed, since every later tick
/// would see "no change" against a record that never propagated.
///
/// # Thread Safety
///
/// All methods must be safe to call concurrently from multiple tasks.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Get the last successfully pushed IP
    ///
    /// # Returns
    ///
    /// - `Ok(Some(IpAddr))`: The last pushed IP
    /// - `Ok(None)`: No push has ever succeeded
    /// - `Err(Error)`: Storage error
    async fn last_pushed(&self) -> Result<Option<IpAddr>, crate::Error>;

    /// Get the full cache record including push time
    async fn record(&self) -> Result<Option<CacheRecord>, crate::Error>;

    /// Record a successful push of `ip`, replacing any previous record
    ///
    /// File-backed implementations must replace atomically.
    async fn commit(&self, ip: IpAddr) -> Result<(), crate::Error>;
}
