//! Message envelope and core domain identifiers.

use crate::error::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;

#[cfg(test)]
#[path = "envelope_tests.rs"]
mod tests;

// ============================================================================
// Core Domain Identifiers
// ============================================================================

/// Validated queue name with length and character restrictions
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueueName(String);

impl QueueName {
    /// Create new queue name with validation
    pub fn new(name: impl Into<String>) -> Result<Self, ValidationError> {
        let name = name.into();

        if name.is_empty() || name.len() > 260 {
            return Err(ValidationError::OutOfRange {
                field: "queue_name".to_string(),
                message: "must be 1-260 characters".to_string(),
            });
        }

        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ValidationError::InvalidFormat {
                field: "queue_name".to_string(),
                message: "only ASCII alphanumeric, hyphens, and underscores allowed".to_string(),
            });
        }

        if name.starts_with('-') || name.ends_with('-') || name.contains("--") {
            return Err(ValidationError::InvalidFormat {
                field: "queue_name".to_string(),
                message: "no leading/trailing hyphens or consecutive hyphens".to_string(),
            });
        }

        Ok(Self(name))
    }

    /// Get queue name as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for QueueName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for QueueName {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Unique identifier for messages within the queue system
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(String);

impl MessageId {
    /// Generate new random message ID
    pub fn new() -> Self {
        let id = uuid::Uuid::new_v4();
        Self(id.to_string())
    }

    /// Get message ID as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MessageId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ValidationError::Required {
                field: "message_id".to_string(),
            });
        }

        Ok(Self(s.to_string()))
    }
}

// ============================================================================
// Message Envelope
// ============================================================================

/// One unit of work in transit through a queue.
///
/// The serialized shape is the wire contract shared with broker-backed
/// queues: `correlation_id`, `message_id`, `message_type`, and `message`.
/// The lock token and send timestamp exist only for the lifetime of an
/// in-process lease and are never serialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageEnvelope {
    /// Opaque tracing identifier, not interpreted by the queue
    pub correlation_id: Option<String>,
    /// Unique message identifier, generated when absent
    #[serde(default)]
    pub message_id: MessageId,
    /// Application-defined discriminator
    pub message_type: Option<String>,
    /// Opaque application payload
    pub message: Value,
    /// Stamped by the queue at enqueue time
    #[serde(skip)]
    pub sent_time_utc: Option<DateTime<Utc>>,
    #[serde(skip)]
    lock_token: Option<u64>,
}

impl MessageEnvelope {
    /// Create a new envelope with a freshly generated message ID
    pub fn new(
        correlation_id: Option<String>,
        message_type: Option<String>,
        message: Value,
    ) -> Self {
        Self {
            correlation_id,
            message_id: MessageId::new(),
            message_type,
            message,
            sent_time_utc: None,
            lock_token: None,
        }
    }

    /// The active lease receipt, if the envelope is currently leased.
    ///
    /// Assigned and cleared only by the owning queue; callers pass the
    /// envelope back into complete/abandon/renew-lock and must not interpret
    /// the token.
    pub fn lock_token(&self) -> Option<u64> {
        self.lock_token
    }

    /// Attach a lease receipt. Backend use only.
    pub fn set_lock_token(&mut self, token: u64) {
        self.lock_token = Some(token);
    }

    /// Detach the lease receipt. Backend use only.
    pub fn clear_lock_token(&mut self) {
        self.lock_token = None;
    }
}

impl std::fmt::Display for MessageEnvelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let correlation = self.correlation_id.as_deref().unwrap_or("---");
        let message_type = self.message_type.as_deref().unwrap_or("---");
        match &self.message {
            Value::Null => write!(f, "[{},{},--]", correlation, message_type),
            Value::String(text) => write!(f, "[{},{},{}]", correlation, message_type, text),
            other => write!(f, "[{},{},{}]", correlation, message_type, other),
        }
    }
}
