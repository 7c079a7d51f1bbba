//! Circuit breaker - Per-tool fail-fast filter.
//!
//! Each tool gets its own three-state machine:
//!
//! ```text
//! Closed --[failure_threshold consecutive failures]--> Open
//! Open --[reset_timeout elapsed]--> HalfOpen
//! HalfOpen --[one success]--> Closed
//! HalfOpen --[any failure]--> Open
//! ```
//!
//! While open, calls fail fast without invoking the handler. Timeouts,
//! handler errors, and panics all count as failures; a success resets the
//! consecutive-failure count.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use super::ExecutorError;

/// Circuit breaker states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    /// Normal operation; requests flow through.
    Closed,
    /// Too many failures; requests rejected immediately.
    Open,
    /// Testing recovery; the next result decides.
    HalfOpen,
}

/// Configuration for the per-tool breakers.
#[derive(Debug, Clone, Copy)]
pub struct BreakerConfig {
    /// Consecutive failures before the circuit opens.
    pub failure_threshold: u32,
    /// Time to wait before probing recovery.
    pub reset_timeout: Duration,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            reset_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug)]
struct BreakerEntry {
    state: BreakerState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
}

impl BreakerEntry {
    fn new() -> Self {
        Self {
            state: BreakerState::Closed,
            consecutive_failures: 0,
            opened_at: None,
        }
    }
}

/// Table of per-tool circuit breakers.
///
/// Shared across all runs driven by one executor; entries are created
/// lazily on first use.
#[derive(Debug)]
pub struct CircuitBreaker {
    config: BreakerConfig,
    entries: Mutex<HashMap<String, BreakerEntry>>,
}

impl CircuitBreaker {
    /// Creates a breaker table with the given configuration.
    pub fn new(config: BreakerConfig) -> Self {
        Self {
            config,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Checks admission for a tool.
    ///
    /// An open circuit whose reset timeout has elapsed moves to half-open
    /// and admits one probe call.
    pub fn check(&self, tool: &str) -> Result<(), ExecutorError> {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let entry = entries
            .entry(tool.to_string())
            .or_insert_with(BreakerEntry::new);
        match entry.state {
            BreakerState::Closed | BreakerState::HalfOpen => Ok(()),
            BreakerState::Open => {
                let elapsed = entry
                    .opened_at
                    .map(|at| at.elapsed() >= self.config.reset_timeout)
                    .unwrap_or(true);
                if elapsed {
                    tracing::debug!(tool, "circuit half-open; admitting probe");
                    entry.state = BreakerState::HalfOpen;
                    Ok(())
                } else {
                    Err(ExecutorError::CircuitOpen {
                        tool: tool.to_string(),
                    })
                }
            }
        }
    }

    /// Records a successful invocation.
    pub fn record_success(&self, tool: &str) {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let entry = entries
            .entry(tool.to_string())
            .or_insert_with(BreakerEntry::new);
        if entry.state == BreakerState::HalfOpen {
            tracing::debug!(tool, "circuit closed after successful probe");
        }
        entry.state = BreakerState::Closed;
        entry.consecutive_failures = 0;
        entry.opened_at = None;
    }

    /// Records a failed invocation.
    pub fn record_failure(&self, tool: &str) {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let entry = entries
            .entry(tool.to_string())
            .or_insert_with(BreakerEntry::new);
        match entry.state {
            BreakerState::HalfOpen => {
                tracing::warn!(tool, "circuit reopened: probe failed");
                entry.state = BreakerState::Open;
                entry.opened_at = Some(Instant::now());
            }
            BreakerState::Closed => {
                entry.consecutive_failures += 1;
                if entry.consecutive_failures >= self.config.failure_threshold {
                    tracing::warn!(
                        tool,
                        failures = entry.consecutive_failures,
                        "circuit opened"
                    );
                    entry.state = BreakerState::Open;
                    entry.opened_at = Some(Instant::now());
                }
            }
            BreakerState::Open => {}
        }
    }

    /// Returns the current state for a tool.
    pub fn state(&self, tool: &str) -> BreakerState {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(tool)
            .map(|entry| entry.state)
            .unwrap_or(BreakerState::Closed)
    }

    /// Returns the consecutive-failure count for a tool.
    pub fn consecutive_failures(&self, tool: &str) -> u32 {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(tool)
            .map(|entry| entry.consecutive_failures)
            .unwrap_or(0)
    }
}
