//! dstar-rs Core Library
//!
//! This crate provides the fundamental traits, types, and error handling
//! shared by the dstar-rs DHCP starvation toolkit.

pub mod attack;
pub mod error;
pub mod interface;
pub mod lease;
pub mod types;

// Re-export commonly used types
pub use attack::{Attack, AttackContext, AttackHandle, AttackStats, AttackStatsCounters};
pub use error::{Error, Result};
pub use interface::Interface;
pub use lease::{AcquiredLease, LeasePool, MemoryLeasePool};
pub use types::*;
