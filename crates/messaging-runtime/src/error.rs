//! Error types for queue operations.

use thiserror::Error;

/// Comprehensive error type for all queue operations.
///
/// Operating on an envelope whose lock token is absent, stale, or already
/// resolved is a silent no-op, never an error. "No message available" is
/// `Ok(None)` on the receive/peek paths for the same reason: both outcomes
/// are part of normal operation, not failures.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Operation '{operation}' is not supported by queue '{queue}'")]
    Unsupported { operation: String, queue: String },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors raised while resolving queue configuration.
///
/// These surface synchronously at configure time and are fatal to queue
/// construction.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Queue name is not defined in 'name' or 'descriptor'")]
    MissingName,

    #[error("Invalid descriptor '{descriptor}': expected 'group:type:kind:name:version'")]
    InvalidDescriptor { descriptor: String },

    #[error("Configuration loading failed: {message}")]
    Load { message: String },
}

/// Validation errors for queue and message identifiers.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    Required { field: String },

    #[error("Invalid format for {field}: {message}")]
    InvalidFormat { field: String, message: String },

    #[error("Value out of range for {field}: {message}")]
    OutOfRange { field: String, message: String },
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
