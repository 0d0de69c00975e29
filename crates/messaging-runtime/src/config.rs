//! Queue configuration and name resolution.

use crate::envelope::QueueName;
use crate::error::{ConfigError, QueueError};
use chrono::Duration;
use serde::{Deserialize, Serialize};

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

const DEFAULT_LOCK_TIMEOUT_MS: i64 = 30_000;
const DEFAULT_WAIT_TIMEOUT_MS: i64 = 5_000;

/// Configuration for a single queue instance.
///
/// The queue name comes from `name` when present, otherwise it is derived
/// from the name segment of a `group:type:kind:name:version` descriptor.
/// Neither being present is fatal at configure time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Explicit queue name
    pub name: Option<String>,
    /// Structured descriptor a name can be derived from
    pub descriptor: Option<String>,
    /// Lease duration assigned to received messages
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: i64,
    /// Poll timeout used by the listener loop between receive attempts
    #[serde(default = "default_wait_timeout_ms")]
    pub wait_timeout_ms: i64,
}

fn default_lock_timeout_ms() -> i64 {
    DEFAULT_LOCK_TIMEOUT_MS
}

fn default_wait_timeout_ms() -> i64 {
    DEFAULT_WAIT_TIMEOUT_MS
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            name: None,
            descriptor: None,
            lock_timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
            wait_timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
        }
    }
}

impl QueueConfig {
    /// Create a configuration with an explicit name and default timeouts
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Load configuration from an optional file layered with
    /// `MESSAGING_`-prefixed environment variables.
    pub fn load(path: &str) -> Result<Self, QueueError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("MESSAGING"))
            .build()
            .map_err(|err| ConfigError::Load {
                message: err.to_string(),
            })?;

        settings.try_deserialize().map_err(|err| {
            QueueError::from(ConfigError::Load {
                message: err.to_string(),
            })
        })
    }

    /// Resolve and validate the queue name.
    ///
    /// Resolution order: explicit `name`, then the name segment of the
    /// descriptor.
    pub fn resolve_name(&self) -> Result<QueueName, QueueError> {
        let name = match (&self.name, &self.descriptor) {
            (Some(name), _) => name.clone(),
            (None, Some(descriptor)) => descriptor_name(descriptor)?,
            (None, None) => return Err(ConfigError::MissingName.into()),
        };

        Ok(QueueName::new(name)?)
    }

    /// Lease duration as a [chrono::Duration]
    pub fn lock_timeout(&self) -> Duration {
        Duration::milliseconds(self.lock_timeout_ms)
    }

    /// Listener poll timeout as a [chrono::Duration]
    pub fn wait_timeout(&self) -> Duration {
        Duration::milliseconds(self.wait_timeout_ms)
    }
}

/// Extract the name segment from a `group:type:kind:name:version` descriptor
fn descriptor_name(descriptor: &str) -> Result<String, ConfigError> {
    let segments: Vec<&str> = descriptor.split(':').collect();
    if segments.len() != 5 {
        return Err(ConfigError::InvalidDescriptor {
            descriptor: descriptor.to_string(),
        });
    }

    let name = segments[3].trim();
    if name.is_empty() || name == "*" {
        return Err(ConfigError::MissingName);
    }

    Ok(name.to_string())
}
