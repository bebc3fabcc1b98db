//! Client configuration.
//!
//! Sources, applied in order (later sources override earlier ones):
//!  1. an optional configuration file (YAML, TOML or JSON, by extension)
//!  2. environment variables prefixed `SQS_RESOURCE__`, with `__` separating
//!     nested keys, e.g. `SQS_RESOURCE__REGION=eu-west-1`
//!
//! Every field is optional. Unset region and credentials fall through to the
//! AWS default provider chain.

use crate::error::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "SQS_RESOURCE";

/// Settings used to build an SQS client
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SqsClientConfig {
    /// AWS region, e.g. "us-east-1"
    pub region: Option<String>,
    /// Custom endpoint, e.g. a local SQS emulator
    pub endpoint_url: Option<String>,
    /// Named profile from the shared AWS config files
    pub profile: Option<String>,
    /// Default queue URL for tools that operate on a single queue
    pub queue_url: Option<String>,
}

impl SqsClientConfig {
    /// Load configuration from an optional file plus the environment
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigurationError> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let config = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        let loaded: Self = config.try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Reject values that can never produce a working client
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if matches!(self.region.as_deref(), Some("")) {
            return Err(ConfigurationError::Invalid {
                message: "region cannot be empty".to_string(),
            });
        }

        if let Some(endpoint) = self.endpoint_url.as_deref() {
            if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
                return Err(ConfigurationError::Invalid {
                    message: format!("endpoint_url must be an http(s) URL: {}", endpoint),
                });
            }
        }

        Ok(())
    }

    /// Queue URL, or an error naming the missing key
    pub fn require_queue_url(&self) -> Result<&str, ConfigurationError> {
        self.queue_url
            .as_deref()
            .filter(|url| !url.is_empty())
            .ok_or_else(|| ConfigurationError::Missing {
                key: "queue_url".to_string(),
            })
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_endpoint_url(mut self, endpoint_url: impl Into<String>) -> Self {
        self.endpoint_url = Some(endpoint_url.into());
        self
    }

    pub fn with_queue_url(mut self, queue_url: impl Into<String>) -> Self {
        self.queue_url = Some(queue_url.into());
        self
    }
}
