// # Fact Store Implementations
//
// This module provides implementations of the FactStore trait backing the
// publisher's HTTP responder.

pub mod file;
pub mod memory;

pub use file::FileFactStore;
pub use memory::MemoryFactStore;
