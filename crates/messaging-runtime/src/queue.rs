//! The queue contract implemented by all backends.

use crate::capabilities::MessagingCapabilities;
use crate::config::QueueConfig;
use crate::envelope::MessageEnvelope;
use crate::error::QueueError;
use crate::queues::MemoryMessageQueue;
use async_trait::async_trait;
use chrono::Duration;
use serde_json::Value;
use std::sync::Arc;

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;

/// Callback contract for push-style consumption.
///
/// Invoked once per delivered message by the listener loop. A returned
/// error is caught and logged at the loop boundary; it neither stops the
/// loop nor resolves the message. The envelope stays leased exactly as
/// delivered unless the receiver itself completes, abandons, or
/// dead-letters it through `queue`.
#[async_trait]
pub trait MessageReceiver: Send + Sync {
    async fn receive_message(
        &self,
        envelope: MessageEnvelope,
        queue: &dyn MessageQueue,
    ) -> Result<(), QueueError>;
}

/// Main interface for queue operations across all backends.
///
/// The in-memory queue implements this contract directly; broker-backed
/// queues implement the same contract against their transport and declare
/// what they support through [MessagingCapabilities]. All operations are
/// safe to call concurrently from multiple tasks.
///
/// Envelopes handed out by `receive` carry an opaque lock token. Passing
/// an envelope without a token (or with one the queue no longer knows)
/// into `renew_lock`/`complete`/`abandon`/`move_to_dead_letter` is a
/// silent no-op: the message was already resolved and that is not a
/// failure.
#[async_trait]
pub trait MessageQueue: Send + Sync {
    /// Queue name assigned at configuration time
    fn name(&self) -> &str;

    /// Operations this backend supports
    fn capabilities(&self) -> &MessagingCapabilities;

    /// Open the queue for use
    async fn open(&self) -> Result<(), QueueError>;

    /// Close the queue, cancelling any running listener
    async fn close(&self) -> Result<(), QueueError>;

    /// Unconditionally drop all visible and leased messages.
    ///
    /// Intended for test and reset use, not for concurrent production use.
    async fn clear(&self) -> Result<(), QueueError>;

    /// Number of envelopes in the visible buffer; leased messages are
    /// excluded
    async fn message_count(&self) -> u64;

    /// Stamp the send time and append the envelope to the buffer tail,
    /// waking one blocked `receive`
    async fn send(&self, envelope: MessageEnvelope) -> Result<(), QueueError>;

    /// Wrap a payload in a fresh envelope and send it
    async fn send_object(
        &self,
        correlation_id: Option<String>,
        message_type: Option<String>,
        message: Value,
    ) -> Result<(), QueueError> {
        self.send(MessageEnvelope::new(correlation_id, message_type, message))
            .await
    }

    /// Snapshot of the buffer head without mutating state.
    ///
    /// A concurrent send or receive may change the buffer immediately
    /// after the snapshot is taken.
    async fn peek(&self) -> Result<Option<MessageEnvelope>, QueueError>;

    /// Snapshot of the first `message_count` buffered envelopes
    async fn peek_batch(&self, message_count: usize) -> Result<Vec<MessageEnvelope>, QueueError>;

    /// Pop the buffer head and lease it to the caller.
    ///
    /// If the buffer is empty, waits up to `wait_timeout` for a send and
    /// re-checks once; `Ok(None)` means no message arrived in time. This
    /// is the sole transition point between visible and leased.
    ///
    /// The wait is best-effort, not a guaranteed deadline: a receiver
    /// woken by a send may lose the re-check to a competing receiver and
    /// return `Ok(None)` before `wait_timeout` elapses. Callers that need
    /// to wait out a full interval should loop on `receive`.
    async fn receive(&self, wait_timeout: Duration) -> Result<Option<MessageEnvelope>, QueueError>;

    /// Extend the lease on a received envelope to `now + lock_timeout`
    async fn renew_lock(
        &self,
        envelope: &MessageEnvelope,
        lock_timeout: Duration,
    ) -> Result<(), QueueError>;

    /// Resolve a received envelope permanently; it does not return to the
    /// buffer
    async fn complete(&self, envelope: &mut MessageEnvelope) -> Result<(), QueueError>;

    /// Release the lease and re-append the envelope to the buffer tail
    /// for redelivery.
    ///
    /// The copy held by the lease table is what returns to the buffer;
    /// mutations the consumer made to its own copy do not survive
    /// redelivery.
    ///
    /// An envelope whose lease already expired is dropped instead: a
    /// competing reclaim may be in flight and requeuing here would
    /// duplicate it.
    async fn abandon(&self, envelope: &mut MessageEnvelope) -> Result<(), QueueError>;

    /// Resolve a received envelope as undeliverable; removed without
    /// requeuing, counted as dead-lettered
    async fn move_to_dead_letter(&self, envelope: &mut MessageEnvelope) -> Result<(), QueueError>;

    /// Run the listener loop in the calling task until cancelled.
    ///
    /// Only one loop per queue instance: calling this while a loop is
    /// already running logs a warning and returns without starting a
    /// second one.
    async fn listen(&self, receiver: Arc<dyn MessageReceiver>) -> Result<(), QueueError>;

    /// Spawn the listener loop on a background task and return immediately
    fn begin_listen(&self, receiver: Arc<dyn MessageReceiver>);

    /// Cancel the listener loop; safe to call when none is running
    fn end_listen(&self);
}

/// Factory building queues from configuration.
///
/// Only the in-memory backend is constructed here; broker-backed
/// implementations of [MessageQueue] are wired up by their own crates.
pub struct QueueFactory;

impl QueueFactory {
    /// Create a queue from configuration
    pub fn create(config: &QueueConfig) -> Result<Box<dyn MessageQueue>, QueueError> {
        Ok(Box::new(MemoryMessageQueue::configure(config)?))
    }
}
