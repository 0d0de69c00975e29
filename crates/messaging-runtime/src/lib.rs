//! # Messaging Runtime
//!
//! In-process message queue engine for microservice toolkits: producers
//! enqueue envelopes, consumers retrieve them by polling or by registering
//! a listener callback, and in-flight messages are protected by a
//! time-bounded lease so a crashed or slow consumer does not permanently
//! lose or duplicate work.
//!
//! This library provides:
//! - A backend-agnostic queue contract with per-backend capability flags
//! - An in-memory queue with FIFO delivery and lease-based locking
//! - A cancellable listener loop converting pull into push consumption
//! - At-least-once semantics for a single-process, memory-resident queue
//!
//! ## Module Organization
//!
//! - [error] - Error types for all queue operations
//! - [envelope] - Message envelope and domain identifiers
//! - [capabilities] - Per-backend capability descriptor
//! - [config] - Queue configuration and name resolution
//! - [queue] - The queue and receiver contracts plus the factory
//! - [listener] - Cancellation handle for listener loops
//! - [queues] - Backend implementations

// Module declarations
pub mod capabilities;
pub mod config;
pub mod envelope;
pub mod error;
pub mod listener;
pub mod queue;
pub mod queues;

// Re-export commonly used types at crate root for convenience
pub use capabilities::MessagingCapabilities;
pub use config::QueueConfig;
pub use envelope::{MessageEnvelope, MessageId, QueueName};
pub use error::{ConfigError, QueueError, ValidationError};
pub use listener::Listener;
pub use queue::{MessageQueue, MessageReceiver, QueueFactory};
pub use queues::{MemoryMessageQueue, QueueCounters};
