//! Session persistence and the audit trail.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use solomon_common::{AuditEntry, EngineError, Result, SessionId, SessionStatus, SessionSummary};

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn save_session(&self, summary: &SessionSummary) -> Result<()>;

    async fn update_session_status(
        &self,
        id: &SessionId,
        status: SessionStatus,
        ended_at: Option<DateTime<Utc>>,
    ) -> Result<()>;

    async fn append_audit_entry(&self, entry: AuditEntry) -> Result<()>;
}

/// Store that keeps everything in process memory.
#[derive(Default)]
pub struct InMemoryStore {
    sessions: Mutex<HashMap<SessionId, SessionSummary>>,
    audit: Mutex<Vec<AuditEntry>>,
    reject_writes: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail, to exercise error paths.
    pub fn set_reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }

    pub fn session(&self, id: &SessionId) -> Option<SessionSummary> {
        self.sessions.lock().ok()?.get(id).cloned()
    }

    pub fn audit_entries(&self) -> Vec<AuditEntry> {
        self.audit.lock().map(|a| a.clone()).unwrap_or_default()
    }

    /// Audit actions recorded so far, in order.
    pub fn audit_actions(&self) -> Vec<String> {
        self.audit_entries().into_iter().map(|e| e.action).collect()
    }

    fn check_writable(&self) -> Result<()> {
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(EngineError::Persistence("store is read-only".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl SessionStore for InMemoryStore {
    async fn save_session(&self, summary: &SessionSummary) -> Result<()> {
        self.check_writable()?;
        let mut sessions = self
            .sessions
            .lock()
            .map_err(|e| EngineError::Persistence(e.to_string()))?;
        sessions.insert(summary.id, summary.clone());
        Ok(())
    }

    async fn update_session_status(
        &self,
        id: &SessionId,
        status: SessionStatus,
        ended_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        self.check_writable()?;
        let mut sessions = self
            .sessions
            .lock()
            .map_err(|e| EngineError::Persistence(e.to_string()))?;
        let summary = sessions
            .get_mut(id)
            .ok_or_else(|| EngineError::session_not_found(id))?;
        summary.status = status;
        summary.ended_at = ended_at;
        Ok(())
    }

    async fn append_audit_entry(&self, entry: AuditEntry) -> Result<()> {
        self.check_writable()?;
        self.audit
            .lock()
            .map_err(|e| EngineError::Persistence(e.to_string()))?
            .push(entry);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solomon_common::{ActorType, ResourceRef};

    fn summary() -> SessionSummary {
        SessionSummary {
            id: SessionId::new(),
            user_id: "alice".into(),
            context: None,
            status: SessionStatus::Active,
            model: "m".into(),
            started_at: Utc::now(),
            ended_at: None,
            message_count: 1,
            pending_actions: 0,
        }
    }

    #[tokio::test]
    async fn save_then_update_status() {
        let store = InMemoryStore::new();
        let s = summary();
        store.save_session(&s).await.unwrap();

        let ended = Utc::now();
        store
            .update_session_status(&s.id, SessionStatus::Terminated, Some(ended))
            .await
            .unwrap();

        let saved = store.session(&s.id).unwrap();
        assert_eq!(saved.status, SessionStatus::Terminated);
        assert_eq!(saved.ended_at, Some(ended));
    }

    #[tokio::test]
    async fn update_unknown_session_fails() {
        let store = InMemoryStore::new();
        let err = store
            .update_session_status(&SessionId::new(), SessionStatus::Completed, None)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NotFound { kind: "session", .. }));
    }

    #[tokio::test]
    async fn rejected_writes_surface_as_persistence_errors() {
        let store = InMemoryStore::new();
        store.set_reject_writes(true);
        let err = store.save_session(&summary()).await.unwrap_err();
        assert!(matches!(err, EngineError::Persistence(_)));

        let entry = AuditEntry::new(
            "system",
            ActorType::System,
            "session.reap",
            ResourceRef::session(&SessionId::new()),
            serde_json::json!({}),
        );
        assert!(store.append_audit_entry(entry).await.is_err());
        assert!(store.audit_entries().is_empty());
    }
}
