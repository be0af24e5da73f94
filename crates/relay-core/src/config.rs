//! Service settings.
//!
//! Every field has a default matching the stock three-agent deployment. The
//! CLI fills these from flags and environment variables; embedders can build
//! them directly.

use std::time::Duration;

use crate::error::ConfigError;
use crate::workflow::executor::DEFAULT_EVENT_BUFFER;
use crate::workflow::retry::{DEFAULT_BASE_DELAY, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_DELAY};
use crate::workflow::schema::{ChainDefinition, DEFAULT_MODELS};
use crate::workflow::timeout::DEFAULT_STEP_TIMEOUT;
use crate::workflow::{OrchestratorConfig, RetryPolicy};

pub const DEFAULT_APP_NAME: &str = "Relay Three-Agent Service";

#[derive(Debug, Clone, PartialEq)]
pub struct RelaySettings {
    pub app_name: String,
    pub host: String,
    pub port: u16,
    pub log_level: String,
    /// Per-step wall-clock bound
    pub agent_timeout: Duration,
    /// Total attempts per step, including the first
    pub retry_attempts: u32,
    pub retry_backoff: Duration,
    pub retry_max_backoff: Duration,
    pub event_buffer: usize,
    /// Optional chain YAML; the built-in chain is used when absent
    pub chain_file: Option<String>,
    /// Models of the built-in chain
    pub models: [String; 3],
    /// Replace every adapter with the offline echo adapter
    pub offline: bool,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            app_name: DEFAULT_APP_NAME.to_string(),
            host: "0.0.0.0".to_string(),
            port: 8000,
            log_level: "info".to_string(),
            agent_timeout: DEFAULT_STEP_TIMEOUT,
            retry_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_backoff: DEFAULT_BASE_DELAY,
            retry_max_backoff: DEFAULT_MAX_DELAY,
            event_buffer: DEFAULT_EVENT_BUFFER,
            chain_file: None,
            models: DEFAULT_MODELS.map(String::from),
            offline: false,
        }
    }
}

impl RelaySettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retry_attempts == 0 {
            return Err(ConfigError::InvalidSetting {
                name: "AGENT_RETRY_ATTEMPTS",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.agent_timeout.is_zero() {
            return Err(ConfigError::InvalidSetting {
                name: "AGENT_TIMEOUT_SECONDS",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.event_buffer == 0 {
            return Err(ConfigError::InvalidSetting {
                name: "RELAY_EVENT_BUFFER",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.retry_backoff > self.retry_max_backoff {
            return Err(ConfigError::InvalidSetting {
                name: "AGENT_RETRY_BACKOFF",
                reason: format!(
                    "base backoff {:?} exceeds maximum {:?}",
                    self.retry_backoff, self.retry_max_backoff
                ),
            });
        }
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry_attempts, self.retry_backoff, self.retry_max_backoff)
    }

    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            step_timeout: self.agent_timeout,
            retry: self.retry_policy(),
            event_buffer: self.event_buffer,
        }
    }

    /// The chain this deployment runs: the configured file, or the built-in one.
    pub fn chain(&self) -> Result<ChainDefinition, ConfigError> {
        let chain = match self.chain_file {
            Some(ref path) => ChainDefinition::from_file(path)?,
            None => ChainDefinition::builtin([
                self.models[0].as_str(),
                self.models[1].as_str(),
                self.models[2].as_str(),
            ]),
        };
        Ok(if self.offline { chain.into_echo() } else { chain })
    }
}
