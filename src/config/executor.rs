//! Executor settings section

use serde::Deserialize;
use std::time::Duration;

use crate::application::execution::ExecutorConfig;

use super::error::SettingsError;

/// Resilience limits for tool execution
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutorSettings {
    /// Process-wide cap on in-flight tool executions
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// Bounded wait for an execution slot in milliseconds
    #[serde(default = "default_bulkhead_wait_ms")]
    pub bulkhead_wait_ms: u64,

    /// Per-invocation timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub default_timeout_ms: u64,

    /// Consecutive failures before a tool's circuit opens
    #[serde(default = "default_breaker_threshold")]
    pub circuit_breaker_threshold: u32,

    /// Milliseconds an open circuit waits before probing recovery
    #[serde(default = "default_breaker_reset_ms")]
    pub circuit_breaker_reset_ms: u64,

    /// Total attempts for idempotent tools, including the first
    #[serde(default = "default_retry_attempts")]
    pub retry_max_attempts: u32,

    /// Delay before the first retry in milliseconds
    #[serde(default = "default_retry_initial_ms")]
    pub retry_initial_delay_ms: u64,

    /// Time-to-live for cached tool results in seconds, if set
    pub cache_ttl_secs: Option<u64>,
}

fn default_max_concurrent() -> usize {
    8
}

fn default_bulkhead_wait_ms() -> u64 {
    5_000
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_breaker_threshold() -> u32 {
    5
}

fn default_breaker_reset_ms() -> u64 {
    30_000
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_retry_initial_ms() -> u64 {
    100
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            bulkhead_wait_ms: default_bulkhead_wait_ms(),
            default_timeout_ms: default_timeout_ms(),
            circuit_breaker_threshold: default_breaker_threshold(),
            circuit_breaker_reset_ms: default_breaker_reset_ms(),
            retry_max_attempts: default_retry_attempts(),
            retry_initial_delay_ms: default_retry_initial_ms(),
            cache_ttl_secs: None,
        }
    }
}

impl ExecutorSettings {
    /// Validate executor settings
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.max_concurrent == 0 {
            return Err(SettingsError::InvalidMaxConcurrent);
        }
        if self.default_timeout_ms == 0 {
            return Err(SettingsError::InvalidTimeout);
        }
        if self.circuit_breaker_threshold == 0 {
            return Err(SettingsError::InvalidBreakerThreshold);
        }
        if self.retry_max_attempts == 0 {
            return Err(SettingsError::InvalidRetryAttempts);
        }
        Ok(())
    }

    /// Convert to the runtime executor configuration
    pub fn to_executor_config(&self) -> ExecutorConfig {
        ExecutorConfig {
            max_concurrent: self.max_concurrent,
            bulkhead_wait: Duration::from_millis(self.bulkhead_wait_ms),
            default_timeout: Duration::from_millis(self.default_timeout_ms),
            circuit_breaker_threshold: self.circuit_breaker_threshold,
            circuit_breaker_reset_timeout: Duration::from_millis(self.circuit_breaker_reset_ms),
            retry_max_attempts: self.retry_max_attempts,
            retry_initial_delay: Duration::from_millis(self.retry_initial_delay_ms),
            retry_max_delay: Duration::from_secs(30),
            cache_ttl: self.cache_ttl_secs.map(Duration::from_secs),
        }
    }
}
