//! Tool Handler Port - How a tool executes.
//!
//! Handlers receive an execution context and an opaque input document and
//! return an output document, optionally carrying a reference to a stored
//! artifact. The tool is responsible for validating its own input against
//! its schema; schemas are opaque to the engine.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::domain::foundation::RunId;

use super::ArtifactRef;

/// Errors a tool handler can produce.
#[derive(Debug, Clone, Error)]
pub enum ToolError {
    /// The input document failed the tool's own validation.
    #[error("invalid input for tool '{tool}': {reason}")]
    InvalidInput { tool: String, reason: String },

    /// The tool started but could not complete its work.
    #[error("tool '{tool}' execution failed: {reason}")]
    ExecutionFailed { tool: String, reason: String },

    /// A collaborator the tool depends on was unavailable.
    #[error("tool '{tool}' dependency unavailable: {reason}")]
    Unavailable { tool: String, reason: String },
}

impl ToolError {
    /// Creates an invalid input error.
    pub fn invalid_input(tool: impl Into<String>, reason: impl Into<String>) -> Self {
        ToolError::InvalidInput {
            tool: tool.into(),
            reason: reason.into(),
        }
    }

    /// Creates an execution failure error.
    pub fn execution_failed(tool: impl Into<String>, reason: impl Into<String>) -> Self {
        ToolError::ExecutionFailed {
            tool: tool.into(),
            reason: reason.into(),
        }
    }

    /// Creates a dependency unavailable error.
    pub fn unavailable(tool: impl Into<String>, reason: impl Into<String>) -> Self {
        ToolError::Unavailable {
            tool: tool.into(),
            reason: reason.into(),
        }
    }
}

/// Result of a successful tool invocation.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Opaque output document.
    pub content: JsonValue,
    /// Optional reference to a stored artifact.
    pub artifact: Option<ArtifactRef>,
}

impl ToolOutput {
    /// Creates an output carrying only a document.
    pub fn new(content: JsonValue) -> Self {
        Self {
            content,
            artifact: None,
        }
    }

    /// Attaches an artifact reference.
    pub fn with_artifact(mut self, artifact: ArtifactRef) -> Self {
        self.artifact = Some(artifact);
        self
    }
}

/// Runtime context passed to a tool handler.
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// Run the invocation belongs to.
    pub run_id: RunId,
    /// Token for cooperative cancellation; handlers are expected to
    /// honour it promptly.
    pub cancellation: CancellationToken,
    /// Run variables visible to tools.
    pub vars: HashMap<String, JsonValue>,
}

impl ToolContext {
    /// Creates a context for a run with no variables.
    pub fn new(run_id: RunId, cancellation: CancellationToken) -> Self {
        Self {
            run_id,
            cancellation,
            vars: HashMap::new(),
        }
    }

    /// Sets the run variables.
    pub fn with_vars(mut self, vars: HashMap<String, JsonValue>) -> Self {
        self.vars = vars;
        self
    }
}

/// Capability interface implemented by every tool.
///
/// Handlers own no per-run state; they receive input and return output.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Executes the tool with the given context and input document.
    async fn handle(&self, ctx: &ToolContext, input: JsonValue) -> Result<ToolOutput, ToolError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Echo;

    #[async_trait]
    impl ToolHandler for Echo {
        async fn handle(
            &self,
            _ctx: &ToolContext,
            input: JsonValue,
        ) -> Result<ToolOutput, ToolError> {
            Ok(ToolOutput::new(json!({ "echoed": input["m"] })))
        }
    }

    #[tokio::test]
    async fn handler_returns_output_document() {
        let ctx = ToolContext::new(RunId::new(), CancellationToken::new());
        let output = Echo.handle(&ctx, json!({"m": "hi"})).await.unwrap();
        assert_eq!(output.content, json!({"echoed": "hi"}));
        assert!(output.artifact.is_none());
    }

    #[test]
    fn tool_error_messages_name_the_tool() {
        let err = ToolError::execution_failed("search", "socket closed");
        assert!(err.to_string().contains("search"));
        assert!(err.to_string().contains("socket closed"));
    }
}
