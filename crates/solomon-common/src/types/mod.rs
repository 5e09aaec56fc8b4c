mod action;
mod audit;
mod entity;
mod session;
mod tool;

pub use action::*;
pub use audit::*;
pub use entity::*;
pub use session::*;
pub use tool::*;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::SessionId;

    #[test]
    fn session_status_serializes_lowercase() {
        let json = serde_json::to_string(&SessionStatus::Terminated).unwrap();
        assert_eq!(json, "\"terminated\"");
        assert_eq!(SessionStatus::Active.to_string(), "active");
    }

    #[test]
    fn message_role_round_trip() {
        let msg = Message::tool("[Tool Result: get_health] ok");
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"role\":\"tool\""));
        let parsed: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.role, MessageRole::Tool);
        assert_eq!(parsed.content, msg.content);
    }

    #[test]
    fn context_kind_parses() {
        assert_eq!("service".parse::<ContextKind>().unwrap(), ContextKind::Service);
        assert_eq!("Incident".parse::<ContextKind>().unwrap(), ContextKind::Incident);
        assert!("cluster".parse::<ContextKind>().is_err());
    }

    #[test]
    fn terminal_action_states() {
        assert!(ActionStatus::Executed.is_terminal());
        assert!(ActionStatus::Rejected.is_terminal());
        assert!(ActionStatus::Failed.is_terminal());
        assert!(!ActionStatus::Pending.is_terminal());
        assert!(!ActionStatus::Approved.is_terminal());
        assert!(!ActionStatus::Executing.is_terminal());
    }

    #[test]
    fn new_action_starts_pending() {
        let sid = SessionId::new();
        let action = AiAction::new(sid, "get_health", serde_json::json!({"service": "api"}), false);
        assert_eq!(action.status, ActionStatus::Pending);
        assert_eq!(action.session_id, sid);
        assert!(action.output.is_none());
        assert!(action.approved_by.is_none());
    }

    #[test]
    fn tool_tiers_are_ordered() {
        assert!(ToolTier::Read < ToolTier::Mutate);
        assert!(ToolTier::Mutate < ToolTier::Privileged);
        assert_eq!("privileged".parse::<ToolTier>().unwrap(), ToolTier::Privileged);
    }

    #[test]
    fn audit_entry_carries_resource() {
        let sid = SessionId::new();
        let entry = AuditEntry::new(
            "alice",
            ActorType::User,
            "session.create",
            ResourceRef::session(&sid),
            serde_json::json!({}),
        );
        assert_eq!(entry.resource_type, "ai_session");
        assert_eq!(entry.resource_id, sid.to_string());
        assert_eq!(entry.actor_type, ActorType::User);
    }
}
