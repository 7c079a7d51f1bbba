//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] SettingsError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("max_steps must be at least 1")]
    InvalidMaxSteps,

    #[error("max_concurrent must be at least 1")]
    InvalidMaxConcurrent,

    #[error("default_timeout_ms must be at least 1")]
    InvalidTimeout,

    #[error("circuit_breaker_threshold must be at least 1")]
    InvalidBreakerThreshold,

    #[error("retry_max_attempts must be at least 1")]
    InvalidRetryAttempts,
}
