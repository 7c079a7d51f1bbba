//! Recording approver for assertions on approval traffic.
//!
//! Captures every request it answers. For test code only; lock poisoning
//! panics rather than recovers.

use async_trait::async_trait;
use std::sync::RwLock;

use crate::ports::{ApprovalRequest, Approver, ApproverError};

/// Approver that records requests and answers with a fixed verdict.
pub struct RecordingApprover {
    verdict: bool,
    requests: RwLock<Vec<ApprovalRequest>>,
}

impl RecordingApprover {
    /// Creates a recording approver with the given verdict.
    pub fn new(verdict: bool) -> Self {
        Self {
            verdict,
            requests: RwLock::new(Vec::new()),
        }
    }

    /// Returns all captured requests.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn requests(&self) -> Vec<ApprovalRequest> {
        self.requests
            .read()
            .expect("RecordingApprover: requests lock poisoned")
            .clone()
    }

    /// Number of requests answered.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn request_count(&self) -> usize {
        self.requests
            .read()
            .expect("RecordingApprover: requests lock poisoned")
            .len()
    }
}

#[async_trait]
impl Approver for RecordingApprover {
    async fn approve(&self, request: ApprovalRequest) -> Result<bool, ApproverError> {
        self.requests
            .write()
            .expect("RecordingApprover: requests lock poisoned")
            .push(request);
        Ok(self.verdict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::RunId;
    use crate::domain::tool::RiskLevel;
    use serde_json::json;

    #[tokio::test]
    async fn captures_answered_requests() {
        let approver = RecordingApprover::new(true);
        let request = ApprovalRequest {
            run_id: RunId::new(),
            tool_name: "deploy".to_string(),
            tool_input: json!({"env": "prod"}),
            risk_level: RiskLevel::Critical,
            destructive: false,
            reason: "ship it".to_string(),
        };
        assert!(approver.approve(request).await.unwrap());
        assert_eq!(approver.request_count(), 1);
        assert_eq!(approver.requests()[0].tool_name, "deploy");
    }
}
