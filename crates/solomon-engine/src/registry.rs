//! Session registry: the process-wide directory of live sessions.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use solomon_common::{EngineError, Result, SessionId, SessionSummary};

use crate::session::Session;

/// Sharded map from session id to session. Lookups hand out `Arc`s, so a
/// session may be terminated by someone else while a caller still holds it.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<SessionId, Arc<Session>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, session: Arc<Session>) -> Result<()> {
        match self.sessions.entry(session.id()) {
            Entry::Occupied(_) => Err(EngineError::AlreadyExists(session.id())),
            Entry::Vacant(slot) => {
                slot.insert(session);
                Ok(())
            }
        }
    }

    pub fn get(&self, id: &SessionId) -> Result<Arc<Session>> {
        self.sessions
            .get(id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| EngineError::session_not_found(id))
    }

    /// Remove a session. Removing an unknown id is a no-op.
    pub fn remove(&self, id: &SessionId) -> Option<Arc<Session>> {
        self.sessions.remove(id).map(|(_, session)| session)
    }

    /// Every registered session, without holding any shard lock afterwards.
    pub fn sessions(&self) -> Vec<Arc<Session>> {
        self.sessions
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    /// Point-in-time summaries of active sessions, oldest first.
    pub fn list_active(&self) -> Vec<SessionSummary> {
        let mut summaries: Vec<SessionSummary> = self
            .sessions()
            .iter()
            .filter(|s| s.is_active())
            .map(|s| s.summary())
            .collect();
        summaries.sort_by_key(|s| s.started_at);
        summaries
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::BroadcastHub;
    use crate::catalog::ToolCatalog;
    use crate::context::{SessionContext, UserIdentity};
    use solomon_common::SessionStatus;
    use solomon_config::ToolAccessConfig;
    use tokio_util::sync::CancellationToken;

    fn session(user: &str) -> Arc<Session> {
        let context = SessionContext {
            user: UserIdentity::new(user, Vec::new()),
            target: None,
            runbooks: Vec::new(),
            tools: ToolAccessConfig::default(),
            catalog: ToolCatalog::default(),
        };
        Arc::new(Session::new(
            SessionId::new(),
            "m",
            context,
            BroadcastHub::new(4, 16),
            CancellationToken::new(),
        ))
    }

    #[test]
    fn create_get_remove() {
        let registry = SessionRegistry::new();
        let s = session("alice");
        registry.create(Arc::clone(&s)).unwrap();

        assert_eq!(registry.get(&s.id()).unwrap().id(), s.id());
        assert!(registry.remove(&s.id()).is_some());
        assert!(registry.remove(&s.id()).is_none());
        assert!(matches!(
            registry.get(&s.id()),
            Err(EngineError::NotFound { kind: "session", .. })
        ));
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let registry = SessionRegistry::new();
        let s = session("alice");
        registry.create(Arc::clone(&s)).unwrap();
        assert!(matches!(
            registry.create(s),
            Err(EngineError::AlreadyExists(_))
        ));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn list_active_skips_ended_sessions() {
        let registry = SessionRegistry::new();
        let a = session("alice");
        let b = session("bob");
        registry.create(Arc::clone(&a)).unwrap();
        registry.create(Arc::clone(&b)).unwrap();

        b.end(SessionStatus::Terminated);
        let active = registry.list_active();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].user_id, "alice");
    }

    #[test]
    fn listing_is_a_snapshot() {
        let registry = SessionRegistry::new();
        let a = session("alice");
        registry.create(Arc::clone(&a)).unwrap();
        let listed = registry.list_active();
        registry.remove(&a.id());
        assert_eq!(listed.len(), 1);
        assert!(registry.is_empty());
    }
}
