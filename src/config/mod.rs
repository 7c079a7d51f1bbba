//! Engine configuration module
//!
//! Type-safe configuration loading from environment variables using the
//! `config` crate. Values are read with the `WAYPOINT` prefix and `__`
//! (double underscore) separating nested fields.
//!
//! # Example
//!
//! ```no_run
//! use waypoint::config::EngineSettings;
//!
//! let settings = EngineSettings::load().expect("failed to load settings");
//! settings.validate().expect("invalid settings");
//! let executor_config = settings.executor.to_executor_config();
//! ```

mod error;
mod executor;

pub use error::{ConfigError, SettingsError};
pub use executor::ExecutorSettings;

use serde::Deserialize;

/// Root engine settings
///
/// Hosts embedding the engine can load limits from the environment instead
/// of hard-coding them:
///
/// - `WAYPOINT__MAX_STEPS=50`
/// - `WAYPOINT__EXECUTOR__MAX_CONCURRENT=8`
/// - `WAYPOINT__EXECUTOR__DEFAULT_TIMEOUT_MS=30000`
#[derive(Debug, Clone, Deserialize)]
pub struct EngineSettings {
    /// Cap on steps per run
    #[serde(default = "default_max_steps")]
    pub max_steps: u32,

    /// Cap for the tool_calls budget counter, if any
    pub tool_calls_cap: Option<u64>,

    /// Resilience limits for tool execution
    #[serde(default)]
    pub executor: ExecutorSettings,
}

fn default_max_steps() -> u32 {
    50
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
            tool_calls_cap: None,
            executor: ExecutorSettings::default(),
        }
    }
}

impl EngineSettings {
    /// Load settings from environment variables
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into the expected
    /// types.
    pub fn load() -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("WAYPOINT")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    /// Validate all settings
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.max_steps == 0 {
            return Err(SettingsError::InvalidMaxSteps);
        }
        self.executor.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let settings = EngineSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.max_steps, 50);
        assert!(settings.tool_calls_cap.is_none());
    }

    #[test]
    fn zero_max_steps_is_rejected() {
        let settings = EngineSettings {
            max_steps: 0,
            ..EngineSettings::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::InvalidMaxSteps)
        ));
    }
}
