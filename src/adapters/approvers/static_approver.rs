//! Static approver with a fixed verdict.

use async_trait::async_trait;

use crate::ports::{ApprovalRequest, Approver, ApproverError};

/// Approver that answers every request with the same verdict.
#[derive(Debug, Clone, Copy)]
pub struct StaticApprover {
    verdict: bool,
}

impl StaticApprover {
    /// Approves every request.
    pub fn approve_all() -> Self {
        Self { verdict: true }
    }

    /// Denies every request.
    pub fn deny_all() -> Self {
        Self { verdict: false }
    }
}

#[async_trait]
impl Approver for StaticApprover {
    async fn approve(&self, _request: ApprovalRequest) -> Result<bool, ApproverError> {
        Ok(self.verdict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::RunId;
    use crate::domain::tool::RiskLevel;
    use serde_json::json;

    fn request() -> ApprovalRequest {
        ApprovalRequest {
            run_id: RunId::new(),
            tool_name: "delete".to_string(),
            tool_input: json!({}),
            risk_level: RiskLevel::High,
            destructive: true,
            reason: "test".to_string(),
        }
    }

    #[tokio::test]
    async fn approve_all_grants() {
        assert!(StaticApprover::approve_all().approve(request()).await.unwrap());
    }

    #[tokio::test]
    async fn deny_all_denies() {
        assert!(!StaticApprover::deny_all().approve(request()).await.unwrap());
    }
}
