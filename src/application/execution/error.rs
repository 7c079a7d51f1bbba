//! Error types for the resilient executor.

use thiserror::Error;

use crate::ports::ToolError;

/// Errors from a tool invocation through the resilience stack.
#[derive(Debug, Clone, Error)]
pub enum ExecutorError {
    /// The invocation exceeded the configured timeout.
    #[error("tool '{tool}' timed out after {millis}ms")]
    Timeout { tool: String, millis: u64 },

    /// The tool's circuit is open; the handler was not invoked.
    #[error("circuit open for tool '{tool}'")]
    CircuitOpen { tool: String },

    /// The bulkhead stayed full past the bounded wait.
    #[error("bulkhead full: no execution slot within {millis}ms")]
    BulkheadFull { millis: u64 },

    /// The handler panicked; the panic was contained.
    #[error("tool '{tool}' panicked: {message}")]
    Panicked { tool: String, message: String },

    /// The handler returned an error.
    #[error(transparent)]
    Tool(#[from] ToolError),

    /// The surrounding context was cancelled.
    #[error("execution cancelled")]
    Cancelled,
}

impl ExecutorError {
    /// Returns true if a retry may be attempted for an idempotent tool.
    ///
    /// Only handler errors and contained panics qualify. Open circuits,
    /// cancellation, and bulkhead rejection are never retried, and a
    /// timeout ends the invocation outright because its deadline spans
    /// every attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ExecutorError::Tool(_) | ExecutorError::Panicked { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circuit_open_is_not_retryable() {
        let err = ExecutorError::CircuitOpen {
            tool: "x".to_string(),
        };
        assert!(!err.is_retryable());
    }

    #[test]
    fn cancellation_is_not_retryable() {
        assert!(!ExecutorError::Cancelled.is_retryable());
    }

    #[test]
    fn tool_errors_and_panics_are_retryable() {
        assert!(
            ExecutorError::Tool(ToolError::execution_failed("x", "boom")).is_retryable()
        );
        assert!(ExecutorError::Panicked {
            tool: "x".to_string(),
            message: "boom".to_string(),
        }
        .is_retryable());
    }

    #[test]
    fn timeouts_are_terminal_for_the_invocation() {
        assert!(!ExecutorError::Timeout {
            tool: "x".to_string(),
            millis: 100,
        }
        .is_retryable());
    }
}
