//! Approver Port - Interface for human approval of risky tool invocations.
//!
//! The engine consults the approver before executing any tool that is
//! destructive or carries high/critical risk. Denial is a decision, not an
//! error; approver errors mean the question itself could not be answered.
//! Approval is per invocation and never cached.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::domain::foundation::RunId;
use crate::domain::tool::RiskLevel;

/// Errors from the approval channel itself.
#[derive(Debug, Clone, Error)]
pub enum ApproverError {
    /// The approver could not be reached or timed out.
    #[error("approver unavailable: {0}")]
    Unavailable(String),
}

/// Question put to the approver about one tool invocation.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ApprovalRequest {
    /// Run the invocation belongs to.
    pub run_id: RunId,
    /// Tool the planner wants to invoke.
    pub tool_name: String,
    /// Input the tool would receive.
    pub tool_input: JsonValue,
    /// Risk classification of the tool.
    pub risk_level: RiskLevel,
    /// Whether the tool is destructive.
    pub destructive: bool,
    /// The planner's stated reason for the invocation.
    pub reason: String,
}

/// Port for approving or denying risky tool invocations.
#[async_trait]
pub trait Approver: Send + Sync {
    /// Returns true to approve, false to deny.
    async fn approve(&self, request: ApprovalRequest) -> Result<bool, ApproverError>;
}
