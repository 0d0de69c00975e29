//! Queue backend implementations.
//!
//! Only the in-memory backend lives in this crate; broker-backed
//! implementations of the same contract are provided by transport-specific
//! crates.

mod memory;

pub use memory::{MemoryMessageQueue, QueueCounters};
