use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::{ActionId, SessionId};

/// Lifecycle of a proposed tool action.
///
/// `pending -> approved | rejected`, `approved -> executing -> executed | failed`.
/// Actions that need no approval go straight from `pending` to `executing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionStatus {
    Pending,
    Approved,
    Rejected,
    Executing,
    Executed,
    Failed,
}

impl ActionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ActionStatus::Executed | ActionStatus::Rejected | ActionStatus::Failed
        )
    }
}

impl fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ActionStatus::Pending => "pending",
            ActionStatus::Approved => "approved",
            ActionStatus::Rejected => "rejected",
            ActionStatus::Executing => "executing",
            ActionStatus::Executed => "executed",
            ActionStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// A tool call proposed by the assistant, tracked through approval and execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiAction {
    pub id: ActionId,
    pub session_id: SessionId,
    pub tool_name: String,
    pub input: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<serde_json::Value>,
    pub status: ActionStatus,
    pub requires_approval: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl AiAction {
    pub fn new(
        session_id: SessionId,
        tool_name: impl Into<String>,
        input: serde_json::Value,
        requires_approval: bool,
    ) -> Self {
        Self {
            id: ActionId::new(),
            session_id,
            tool_name: tool_name.into(),
            input,
            output: None,
            status: ActionStatus::Pending,
            requires_approval,
            approved_by: None,
            approved_at: None,
            executed_at: None,
            created_at: Utc::now(),
        }
    }
}
