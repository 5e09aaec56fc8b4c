use serde::{Deserialize, Serialize};

use crate::types::{AiAction, MessageRole};

/// Wire form of every session state transition that subscribers observe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// A message was appended, or (when `partial`) a streamed chunk of one.
    Message {
        role: MessageRole,
        content: String,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        partial: bool,
    },
    /// An action started executing.
    ToolUse { tool: String, action: AiAction },
    /// An action finished, failed or was rejected.
    ToolResult {
        tool: String,
        content: String,
        action: AiAction,
    },
    /// An action is parked until a human approves or rejects it.
    ApprovalRequired { tool: String, action: AiAction },
    Error { error: String },
    /// A conversation turn finished.
    Done,
}

impl StreamEvent {
    pub fn message(role: MessageRole, content: impl Into<String>) -> Self {
        StreamEvent::Message {
            role,
            content: content.into(),
            partial: false,
        }
    }

    pub fn chunk(content: impl Into<String>) -> Self {
        StreamEvent::Message {
            role: MessageRole::Assistant,
            content: content.into(),
            partial: true,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            StreamEvent::Message { .. } => "message",
            StreamEvent::ToolUse { .. } => "tool_use",
            StreamEvent::ToolResult { .. } => "tool_result",
            StreamEvent::ApprovalRequired { .. } => "approval_required",
            StreamEvent::Error { .. } => "error",
            StreamEvent::Done => "done",
        }
    }

    /// Partial text chunks may be dropped for slow subscribers; everything else may not.
    pub fn is_lossy(&self) -> bool {
        matches!(self, StreamEvent::Message { partial: true, .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::SessionId;

    #[test]
    fn message_event_json_shape() {
        let ev = StreamEvent::message(MessageRole::User, "restart api");
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], "message");
        assert_eq!(json["role"], "user");
        assert_eq!(json["content"], "restart api");
        assert!(json.get("partial").is_none());
    }

    #[test]
    fn chunk_is_lossy_and_flagged() {
        let ev = StreamEvent::chunk("Looking");
        assert!(ev.is_lossy());
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["partial"], true);
    }

    #[test]
    fn tool_events_are_reliable() {
        let action = AiAction::new(SessionId::new(), "deploy", serde_json::json!({}), true);
        let ev = StreamEvent::ApprovalRequired {
            tool: "deploy".into(),
            action,
        };
        assert!(!ev.is_lossy());
        assert_eq!(ev.kind(), "approval_required");
        assert!(!StreamEvent::Done.is_lossy());
        assert!(!StreamEvent::Error { error: "x".into() }.is_lossy());
    }

    #[test]
    fn done_event_json_shape() {
        let json = serde_json::to_string(&StreamEvent::Done).unwrap();
        assert_eq!(json, r#"{"type":"done"}"#);
        let parsed: StreamEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, StreamEvent::Done);
    }
}
