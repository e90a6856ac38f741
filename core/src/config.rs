//! Client configuration loaded from TOML.
//!
//! ```toml
//! retry_delay_ms = 2000
//! default_timeout_ms = 10000
//! default_max_attempts = 3
//! ```
//!
//! Every key is optional. The configured defaults seed descriptors created
//! through [`ClientConfig::endpoint`]; a descriptor is authoritative once it
//! exists.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::endpoint::{EndpointDescriptor, DEFAULT_MAX_ATTEMPTS, DEFAULT_TIMEOUT};
use crate::retry::{RetryPolicy, DEFAULT_RETRY_DELAY};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientConfig {
    pub retry_delay_ms: u64,
    pub default_timeout_ms: u64,
    pub default_max_attempts: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            retry_delay_ms: DEFAULT_RETRY_DELAY.as_millis() as u64,
            default_timeout_ms: DEFAULT_TIMEOUT.as_millis() as u64,
            default_max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl ClientConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: ClientConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.default_max_attempts == 0 {
            return Err(ConfigError::Invalid("default_max_attempts must be at least 1"));
        }
        if self.default_timeout_ms == 0 {
            return Err(ConfigError::Invalid("default_timeout_ms must be positive"));
        }
        Ok(())
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }

    /// Retry policy for a descriptor's attempt budget.
    pub fn retry_policy(&self, max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, self.retry_delay())
    }

    /// A descriptor seeded with this configuration's timeout and attempts.
    pub fn endpoint(&self, host: impl Into<String>, path: impl Into<String>) -> EndpointDescriptor {
        EndpointDescriptor::new(host, path)
            .with_timeout(self.default_timeout())
            .with_max_attempts(self.default_max_attempts)
    }
}
