//! Core traits for the ipbeacon system
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`IpSource`]: Resolve the current public IP
//! - [`Transport`]: Push the IP to the publisher host
//! - [`CacheStore`]: Origin-side record of the last successfully pushed IP
//! - [`FactStore`]: Publisher-side single-value fact file

pub mod cache_store;
pub mod fact_store;
pub mod ip_source;
pub mod transport;

pub use cache_store::{CacheRecord, CacheStore};
pub use fact_store::FactStore;
pub use ip_source::IpSource;
pub use transport::Transport;
