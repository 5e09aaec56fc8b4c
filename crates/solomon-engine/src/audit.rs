//! Audit trail writer. Failures are logged and never abort the operation
//! being audited.

use std::sync::Arc;

use serde_json::json;
use solomon_common::{
    ActorType, AiAction, AuditEntry, ResourceRef, SessionId, SessionStatus, SessionSummary,
};
use tracing::warn;

use crate::gate::Proposal;
use crate::store::SessionStore;

/// Actor name used for entries the assistant causes.
pub const AI_ACTOR: &str = "solomon";
/// Actor name used for entries the engine causes on its own.
pub const SYSTEM_ACTOR: &str = "system";

#[derive(Clone)]
pub struct Auditor {
    store: Arc<dyn SessionStore>,
}

impl Auditor {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    pub async fn record(
        &self,
        actor: &str,
        actor_type: ActorType,
        action: &str,
        resource: ResourceRef,
        details: serde_json::Value,
    ) {
        let entry = AuditEntry::new(actor, actor_type, action, resource, details);
        if let Err(e) = self.store.append_audit_entry(entry).await {
            warn!(action, error = %e, "Failed to write audit entry");
        }
    }

    pub async fn session_created(&self, summary: &SessionSummary) {
        self.record(
            &summary.user_id,
            ActorType::User,
            "session.create",
            ResourceRef::session(&summary.id),
            json!({ "context": summary.context, "model": summary.model }),
        )
        .await;
    }

    pub async fn message_sent(&self, session: &SessionId, user: &str, length: usize) {
        self.record(
            user,
            ActorType::User,
            "message.send",
            ResourceRef::session(session),
            json!({ "length": length }),
        )
        .await;
    }

    pub async fn action_proposed(&self, proposal: &Proposal) {
        let action = proposal.action();
        let outcome = match proposal {
            Proposal::Ready(_) => "running",
            Proposal::Parked(_) => "awaiting_approval",
            Proposal::Refused(_) => "refused",
        };
        self.record(
            AI_ACTOR,
            ActorType::Ai,
            "action.propose",
            ResourceRef::action(&action.id),
            json!({
                "session": action.session_id,
                "tool": action.tool_name,
                "input": action.input,
                "outcome": outcome,
            }),
        )
        .await;
    }

    pub async fn action_approved(&self, action: &AiAction, approver: &str) {
        self.record(
            approver,
            ActorType::User,
            "action.approve",
            ResourceRef::action(&action.id),
            json!({ "session": action.session_id, "tool": action.tool_name }),
        )
        .await;
    }

    pub async fn action_rejected(&self, action: &AiAction, user: &str, reason: &str) {
        self.record(
            user,
            ActorType::User,
            "action.reject",
            ResourceRef::action(&action.id),
            json!({ "session": action.session_id, "tool": action.tool_name, "reason": reason }),
        )
        .await;
    }

    pub async fn action_executed(&self, action: &AiAction) {
        self.record(
            AI_ACTOR,
            ActorType::Ai,
            "action.execute",
            ResourceRef::action(&action.id),
            json!({
                "session": action.session_id,
                "tool": action.tool_name,
                "status": action.status,
                "approvedBy": action.approved_by,
            }),
        )
        .await;
    }

    pub async fn session_ended(
        &self,
        session: &SessionId,
        actor: &str,
        actor_type: ActorType,
        action: &str,
        status: SessionStatus,
    ) {
        self.record(
            actor,
            actor_type,
            action,
            ResourceRef::session(session),
            json!({ "status": status }),
        )
        .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;

    #[tokio::test]
    async fn writes_entries_in_call_order() {
        let store = Arc::new(InMemoryStore::new());
        let auditor = Auditor::new(store.clone());
        let sid = SessionId::new();

        auditor.message_sent(&sid, "alice", 12).await;
        auditor
            .session_ended(&sid, "alice", ActorType::User, "session.terminate", SessionStatus::Terminated)
            .await;

        let entries = store.audit_entries();
        assert_eq!(store.audit_actions(), vec!["message.send", "session.terminate"]);
        assert_eq!(entries[0].resource_type, "ai_session");
        assert_eq!(entries[0].resource_id, sid.to_string());
        assert_eq!(entries[1].details["status"], "terminated");
    }

    #[tokio::test]
    async fn store_failure_is_swallowed() {
        let store = Arc::new(InMemoryStore::new());
        store.set_reject_writes(true);
        let auditor = Auditor::new(store.clone());
        auditor.message_sent(&SessionId::new(), "alice", 1).await;
        assert!(store.audit_entries().is_empty());
    }
}
