//! In-memory message queue backend.
//!
//! This backend keeps one mutex-guarded unit of state per queue instance:
//! the visible FIFO buffer and the lock table of leased messages. An
//! envelope is in exactly one of the two at any instant. Blocked receives
//! wait on a [Notify] that `send` signals, so wakeups are event-driven
//! rather than polled.
//!
//! Lease expiry is advisory and lazily checked: there is no background
//! reaper. An expired lease is only reconciled the next time `abandon`,
//! `renew_lock`, or `complete` is called against it.

use crate::capabilities::MessagingCapabilities;
use crate::config::QueueConfig;
use crate::envelope::{MessageEnvelope, QueueName};
use crate::error::QueueError;
use crate::listener::Listener;
use crate::queue::{MessageQueue, MessageReceiver};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{watch, Notify};
use tracing::{debug, error, trace, warn};

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;

// ============================================================================
// Internal Storage Structures
// ============================================================================

/// Lease bookkeeping for one in-flight envelope
struct LockedMessage {
    envelope: MessageEnvelope,
    expires_at: DateTime<Utc>,
}

/// Visible buffer plus lock table, guarded as a single unit
struct QueueState {
    messages: VecDeque<MessageEnvelope>,
    locked: HashMap<u64, LockedMessage>,
    lock_token_sequence: u64,
}

impl QueueState {
    fn new() -> Self {
        Self {
            messages: VecDeque::new(),
            locked: HashMap::new(),
            lock_token_sequence: 0,
        }
    }
}

/// Per-queue delivery counters
#[derive(Debug, Default)]
pub struct QueueCounters {
    sent: AtomicU64,
    received: AtomicU64,
    dead_lettered: AtomicU64,
}

impl QueueCounters {
    /// Messages appended to the visible buffer
    pub fn sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }

    /// Messages handed to a consumer under a lease
    pub fn received(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }

    /// Messages resolved as undeliverable
    pub fn dead_lettered(&self) -> u64 {
        self.dead_lettered.load(Ordering::Relaxed)
    }
}

struct QueueShared {
    name: QueueName,
    capabilities: MessagingCapabilities,
    lock_timeout: Duration,
    wait_timeout: Duration,
    state: Mutex<QueueState>,
    notify: Notify,
    counters: QueueCounters,
    listener: Listener,
}

// ============================================================================
// MemoryMessageQueue
// ============================================================================

/// Single-process, memory-resident message queue with at-least-once
/// delivery.
///
/// Clones share the same queue state, which is what allows the listener
/// loop to run on a background task while producers and consumers hold
/// their own handles.
///
/// # Example
///
/// ```rust
/// use messaging_runtime::{MemoryMessageQueue, MessageQueue, QueueName};
/// use chrono::Duration;
/// use serde_json::json;
///
/// # tokio_test::block_on(async {
/// let queue = MemoryMessageQueue::new(QueueName::new("orders").unwrap());
/// queue.send_object(None, Some("Greeting".to_string()), json!("hello")).await.unwrap();
///
/// let mut message = queue.receive(Duration::seconds(1)).await.unwrap().unwrap();
/// assert_eq!(message.message, json!("hello"));
/// queue.complete(&mut message).await.unwrap();
/// # });
/// ```
#[derive(Clone)]
pub struct MemoryMessageQueue {
    shared: Arc<QueueShared>,
}

impl MemoryMessageQueue {
    /// Create a queue with default lease and wait timeouts
    pub fn new(name: QueueName) -> Self {
        let defaults = QueueConfig::default();
        Self::with_timeouts(name, defaults.lock_timeout(), defaults.wait_timeout())
    }

    /// Create a queue from configuration.
    ///
    /// Fails when neither a name nor a descriptor resolves to a valid
    /// queue name.
    pub fn configure(config: &QueueConfig) -> Result<Self, QueueError> {
        let name = config.resolve_name()?;
        Ok(Self::with_timeouts(
            name,
            config.lock_timeout(),
            config.wait_timeout(),
        ))
    }

    fn with_timeouts(name: QueueName, lock_timeout: Duration, wait_timeout: Duration) -> Self {
        Self {
            shared: Arc::new(QueueShared {
                name,
                capabilities: MessagingCapabilities::all(),
                lock_timeout,
                wait_timeout,
                state: Mutex::new(QueueState::new()),
                notify: Notify::new(),
                counters: QueueCounters::default(),
                listener: Listener::new(),
            }),
        }
    }

    /// Delivery counters for this queue instance
    pub fn counters(&self) -> &QueueCounters {
        &self.shared.counters
    }

    fn state(&self) -> MutexGuard<'_, QueueState> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Pop the buffer head and move it into the lock table.
    ///
    /// The pop, token assignment, and lease insertion happen under one
    /// critical section so no other receive can observe the message.
    fn try_receive(&self) -> Option<MessageEnvelope> {
        let envelope = {
            let mut state = self.state();
            let mut envelope = state.messages.pop_front()?;

            let token = state.lock_token_sequence;
            state.lock_token_sequence += 1;
            envelope.set_lock_token(token);

            state.locked.insert(
                token,
                LockedMessage {
                    envelope: envelope.clone(),
                    expires_at: Utc::now() + self.shared.lock_timeout,
                },
            );
            envelope
        };

        self.shared.counters.received.fetch_add(1, Ordering::Relaxed);
        debug!(
            queue = %self.shared.name,
            message_id = %envelope.message_id,
            "Received message"
        );
        Some(envelope)
    }

    async fn run_listener(
        &self,
        receiver: Arc<dyn MessageReceiver>,
        mut stop: watch::Receiver<bool>,
    ) {
        loop {
            let received = tokio::select! {
                _ = stop.changed() => break,
                received = self.receive(self.shared.wait_timeout) => received,
            };

            // A message received in the same round as the stop signal is
            // left leased rather than dispatched.
            if *stop.borrow() {
                break;
            }

            let envelope = match received {
                Ok(Some(envelope)) => envelope,
                Ok(None) => continue,
                Err(err) => {
                    error!(
                        queue = %self.shared.name,
                        error = %err,
                        "Receive failed in listener loop"
                    );
                    continue;
                }
            };

            let message_id = envelope.message_id.clone();
            let correlation_id = envelope.correlation_id.clone();
            if let Err(err) = receiver.receive_message(envelope, self).await {
                error!(
                    queue = %self.shared.name,
                    message_id = %message_id,
                    correlation_id = correlation_id.as_deref().unwrap_or("---"),
                    error = %err,
                    "Receiver failed to process message"
                );
            }
        }
    }
}

impl std::fmt::Display for MemoryMessageQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.shared.name)
    }
}

#[async_trait]
impl MessageQueue for MemoryMessageQueue {
    fn name(&self) -> &str {
        self.shared.name.as_str()
    }

    fn capabilities(&self) -> &MessagingCapabilities {
        &self.shared.capabilities
    }

    async fn open(&self) -> Result<(), QueueError> {
        trace!(queue = %self.shared.name, "Opened queue");
        Ok(())
    }

    async fn close(&self) -> Result<(), QueueError> {
        self.end_listen();
        trace!(queue = %self.shared.name, "Closed queue");
        Ok(())
    }

    async fn clear(&self) -> Result<(), QueueError> {
        {
            let mut state = self.state();
            state.messages.clear();
            state.locked.clear();
        }

        trace!(queue = %self.shared.name, "Cleared queue");
        Ok(())
    }

    async fn message_count(&self) -> u64 {
        self.state().messages.len() as u64
    }

    async fn send(&self, mut envelope: MessageEnvelope) -> Result<(), QueueError> {
        envelope.sent_time_utc = Some(Utc::now());
        // The token never enters the visible buffer.
        envelope.clear_lock_token();

        let message_id = envelope.message_id.clone();
        let correlation_id = envelope.correlation_id.clone();
        {
            let mut state = self.state();
            state.messages.push_back(envelope);
        }

        self.shared.notify.notify_one();
        self.shared.counters.sent.fetch_add(1, Ordering::Relaxed);
        debug!(
            queue = %self.shared.name,
            message_id = %message_id,
            correlation_id = correlation_id.as_deref().unwrap_or("---"),
            "Sent message"
        );
        Ok(())
    }

    async fn peek(&self) -> Result<Option<MessageEnvelope>, QueueError> {
        let envelope = self.state().messages.front().cloned();

        if let Some(ref envelope) = envelope {
            trace!(
                queue = %self.shared.name,
                message_id = %envelope.message_id,
                "Peeked message"
            );
        }
        Ok(envelope)
    }

    async fn peek_batch(&self, message_count: usize) -> Result<Vec<MessageEnvelope>, QueueError> {
        let envelopes: Vec<MessageEnvelope> = self
            .state()
            .messages
            .iter()
            .take(message_count)
            .cloned()
            .collect();

        trace!(
            queue = %self.shared.name,
            count = envelopes.len(),
            "Peeked message batch"
        );
        Ok(envelopes)
    }

    async fn receive(&self, wait_timeout: Duration) -> Result<Option<MessageEnvelope>, QueueError> {
        // Register for the wakeup before the first check so a send landing
        // in between cannot be missed. Notify stores a single permit, so a
        // woken receiver that loses the re-check returns None early instead
        // of waiting out the rest of the timeout.
        let notified = self.shared.notify.notified();

        if let Some(envelope) = self.try_receive() {
            return Ok(Some(envelope));
        }

        let wait = wait_timeout.to_std().unwrap_or_default();
        let _ = tokio::time::timeout(wait, notified).await;

        Ok(self.try_receive())
    }

    async fn renew_lock(
        &self,
        envelope: &MessageEnvelope,
        lock_timeout: Duration,
    ) -> Result<(), QueueError> {
        let Some(token) = envelope.lock_token() else {
            return Ok(());
        };

        {
            let mut state = self.state();
            match state.locked.get_mut(&token) {
                Some(locked) => locked.expires_at = Utc::now() + lock_timeout,
                None => return Ok(()),
            }
        }

        trace!(
            queue = %self.shared.name,
            message_id = %envelope.message_id,
            "Renewed message lock"
        );
        Ok(())
    }

    async fn complete(&self, envelope: &mut MessageEnvelope) -> Result<(), QueueError> {
        let Some(token) = envelope.lock_token() else {
            return Ok(());
        };

        self.state().locked.remove(&token);
        envelope.clear_lock_token();

        trace!(
            queue = %self.shared.name,
            message_id = %envelope.message_id,
            "Completed message"
        );
        Ok(())
    }

    async fn abandon(&self, envelope: &mut MessageEnvelope) -> Result<(), QueueError> {
        let Some(token) = envelope.lock_token() else {
            return Ok(());
        };

        let locked = {
            let mut state = self.state();
            let Some(locked) = state.locked.remove(&token) else {
                return Ok(());
            };
            locked
        };
        envelope.clear_lock_token();

        if locked.expires_at <= Utc::now() {
            // A competing reclaim may already be in flight; requeuing here
            // would duplicate the message.
            trace!(
                queue = %self.shared.name,
                message_id = %envelope.message_id,
                "Dropped abandoned message with expired lock"
            );
            return Ok(());
        }

        trace!(
            queue = %self.shared.name,
            message_id = %envelope.message_id,
            "Abandoned message"
        );
        // The lease table's copy is authoritative; mutations the consumer
        // made to its own copy do not survive redelivery.
        self.send(locked.envelope).await
    }

    async fn move_to_dead_letter(&self, envelope: &mut MessageEnvelope) -> Result<(), QueueError> {
        let Some(token) = envelope.lock_token() else {
            return Ok(());
        };

        self.state().locked.remove(&token);
        envelope.clear_lock_token();

        self.shared
            .counters
            .dead_lettered
            .fetch_add(1, Ordering::Relaxed);
        trace!(
            queue = %self.shared.name,
            message_id = %envelope.message_id,
            "Moved message to dead letter"
        );
        Ok(())
    }

    async fn listen(&self, receiver: Arc<dyn MessageReceiver>) -> Result<(), QueueError> {
        let Some(stop) = self.shared.listener.start() else {
            warn!(queue = %self.shared.name, "Already listening on queue");
            return Ok(());
        };

        trace!(queue = %self.shared.name, "Started listening for messages");
        self.run_listener(receiver, stop).await;
        trace!(queue = %self.shared.name, "Stopped listening for messages");
        Ok(())
    }

    fn begin_listen(&self, receiver: Arc<dyn MessageReceiver>) {
        let queue = self.clone();
        tokio::spawn(async move {
            if let Err(err) = queue.listen(receiver).await {
                error!(queue = %queue.shared.name, error = %err, "Listener terminated");
            }
        });
    }

    fn end_listen(&self) {
        self.shared.listener.stop();
    }
}
