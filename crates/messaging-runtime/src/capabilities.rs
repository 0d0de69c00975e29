//! Capability descriptor shared by all queue backends.

#[cfg(test)]
#[path = "capabilities_tests.rs"]
mod tests;

/// Immutable set of flags a queue backend declares once at construction.
///
/// Heterogeneous backends implement the same [MessageQueue](crate::queue::MessageQueue)
/// contract but differ in what they can do; a broker-backed queue may not
/// support peeking a batch, for example. Callers must check the relevant
/// flag before invoking the corresponding operation on a backend they did
/// not construct themselves. Backends answer unsupported operations with
/// [QueueError::Unsupported](crate::error::QueueError::Unsupported).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessagingCapabilities {
    can_message_count: bool,
    can_send: bool,
    can_receive: bool,
    can_peek: bool,
    can_peek_batch: bool,
    can_renew_lock: bool,
    can_abandon: bool,
    can_dead_letter: bool,
    can_clear: bool,
}

impl MessagingCapabilities {
    #[allow(clippy::too_many_arguments)]
    pub const fn new(
        message_count: bool,
        send: bool,
        receive: bool,
        peek: bool,
        peek_batch: bool,
        renew_lock: bool,
        abandon: bool,
        dead_letter: bool,
        clear: bool,
    ) -> Self {
        Self {
            can_message_count: message_count,
            can_send: send,
            can_receive: receive,
            can_peek: peek,
            can_peek_batch: peek_batch,
            can_renew_lock: renew_lock,
            can_abandon: abandon,
            can_dead_letter: dead_letter,
            can_clear: clear,
        }
    }

    /// All nine operations supported
    pub const fn all() -> Self {
        Self::new(true, true, true, true, true, true, true, true, true)
    }

    pub const fn can_message_count(&self) -> bool {
        self.can_message_count
    }

    pub const fn can_send(&self) -> bool {
        self.can_send
    }

    pub const fn can_receive(&self) -> bool {
        self.can_receive
    }

    pub const fn can_peek(&self) -> bool {
        self.can_peek
    }

    pub const fn can_peek_batch(&self) -> bool {
        self.can_peek_batch
    }

    pub const fn can_renew_lock(&self) -> bool {
        self.can_renew_lock
    }

    pub const fn can_abandon(&self) -> bool {
        self.can_abandon
    }

    pub const fn can_dead_letter(&self) -> bool {
        self.can_dead_letter
    }

    pub const fn can_clear(&self) -> bool {
        self.can_clear
    }
}
