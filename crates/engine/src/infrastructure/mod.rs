//! Infrastructure layer - ports and their implementations.

pub mod clock;
pub mod config;
pub mod documents;
pub mod memory_store;
pub mod ports;
pub mod resilient_writes;
