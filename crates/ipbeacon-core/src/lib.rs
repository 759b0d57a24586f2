// # ipbeacon-core
//
// Core library for the ipbeacon IP publication system.
//
// ## Architecture Overview
//
// ipbeacon moves one fact (the origin machine's current public IP) from a
// NAT-bound host to a publicly reachable host, where it is served over HTTP.
// This crate provides everything except the concrete integrations:
//
// - **IpSource**: Trait for resolving the current public IP
// - **Transport**: Trait for pushing the IP to the publisher host
// - **CacheStore**: Trait for the origin-side last-pushed-IP record
// - **FactStore**: Trait for the publisher-side fact file
// - **PublishEngine**: Tick-driven loop orchestrating detect → compare →
//   transport → commit
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from implementations
// 2. **Tick-Driven**: One strictly sequential tick at a time, no overlapping
//    work; every external call is bounded by a timeout owned by its
//    implementation
// 3. **Idempotency**: The cache record guarantees that an unchanged IP
//    produces zero transport side effects after the first successful push
// 4. **Commit Ordering**: The cache is committed only after the transport
//    confirms success, so an unpushed change is retried until it lands

pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod fact;
pub mod traits;

// Re-export core types for convenience
pub use cache::{FileCacheStore, MemoryCacheStore};
pub use config::{AddressFamily, CacheStoreConfig, LookupConfig, PublishConfig, TransportConfig};
pub use engine::{EngineEvent, PublishEngine, TickOutcome};
pub use error::{Error, Result};
pub use fact::{FileFactStore, MemoryFactStore};
pub use traits::{CacheRecord, CacheStore, FactStore, IpSource, Transport};
