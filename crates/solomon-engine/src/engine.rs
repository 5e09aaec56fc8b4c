//! The engine facade: the operations callers use, independent of transport.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use solomon_common::{
    ActionId, ActorType, AiAction, ContextKind, ContextRef, Result, SessionId, SessionStatus,
    SessionSummary,
};
use solomon_config::{AccessConfig, ConsoleConfig, EngineConfig, ToolAccessConfig};
use tracing::{info, warn};
use uuid::Uuid;

use crate::access::ToolGrant;
use crate::audit::{Auditor, SYSTEM_ACTOR};
use crate::broadcast::{BroadcastHub, Subscription};
use crate::catalog::ToolCatalog;
use crate::context::{ContextBuilder, UserIdentity};
use crate::driver::Runtime;
use crate::lookup::EntityLookup;
use crate::model::ModelClient;
use crate::pool::WorkPool;
use crate::registry::SessionRegistry;
use crate::session::{Session, SessionSnapshot};
use crate::store::SessionStore;
use crate::tools::ToolRunner;

/// The external capabilities an engine is wired to.
pub struct Collaborators {
    pub lookup: Arc<dyn EntityLookup>,
    pub model: Arc<dyn ModelClient>,
    pub runner: ToolRunner,
    pub store: Arc<dyn SessionStore>,
    /// Every tool any session may be granted.
    pub catalog: ToolCatalog,
}

impl Collaborators {
    pub fn new(
        lookup: Arc<dyn EntityLookup>,
        model: Arc<dyn ModelClient>,
        runner: ToolRunner,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            lookup,
            model,
            runner,
            store,
            catalog: ToolCatalog::builtin(),
        }
    }

    pub fn with_catalog(mut self, catalog: ToolCatalog) -> Self {
        self.catalog = catalog;
        self
    }
}

/// Parameters of `Engine::create_session`.
#[derive(Debug, Clone)]
pub struct CreateSessionRequest {
    pub user: UserIdentity,
    /// What the caller's roles entitle them to, decided upstream.
    pub grant: ToolGrant,
    pub context: Option<ContextRef>,
}

impl CreateSessionRequest {
    pub fn new(user: UserIdentity, grant: ToolGrant) -> Self {
        Self {
            user,
            grant,
            context: None,
        }
    }

    pub fn with_context(mut self, kind: ContextKind, id: Uuid) -> Self {
        self.context = Some(ContextRef::new(kind, id));
        self
    }
}

pub struct Engine {
    registry: SessionRegistry,
    runtime: Arc<Runtime>,
    lookup: Arc<dyn EntityLookup>,
    store: Arc<dyn SessionStore>,
    catalog: ToolCatalog,
    access: AccessConfig,
    tool_access: ToolAccessConfig,
    model_name: String,
    config: EngineConfig,
}

impl Engine {
    pub fn new(config: &ConsoleConfig, collaborators: Collaborators) -> Self {
        let Collaborators {
            lookup,
            model,
            runner,
            store,
            catalog,
        } = collaborators;

        for tool in catalog.tools() {
            if !runner.has_handler(&tool.name) {
                warn!(tool = %tool.name, "No handler registered; runs of this tool will fail");
            }
        }

        let runtime = Runtime {
            model,
            runner,
            audit: Auditor::new(Arc::clone(&store)),
            pool: WorkPool::new(),
            max_tool_rounds: config.engine.max_tool_rounds,
            resume_after_approval: config.engine.resume_after_approval,
        };

        Self {
            registry: SessionRegistry::new(),
            runtime: Arc::new(runtime),
            lookup,
            store,
            catalog,
            access: config.access.clone(),
            tool_access: config.tools.clone(),
            model_name: config.model.default_model.clone(),
            config: config.engine.clone(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The grant the configured access table gives `roles`.
    pub fn grant_for<S: AsRef<str>>(&self, roles: &[S]) -> ToolGrant {
        ToolGrant::for_roles(roles, &self.access)
    }

    /// Resolve the context, persist and register a new session. Nothing is
    /// registered if any step fails.
    pub async fn create_session(&self, request: CreateSessionRequest) -> Result<SessionSummary> {
        let CreateSessionRequest {
            user,
            grant,
            context,
        } = request;

        let catalog = self.catalog.granted(&grant);
        let session_context = ContextBuilder::new(self.lookup.as_ref(), &self.tool_access)
            .build(user, context, catalog)
            .await?;

        let session = Arc::new(Session::new(
            SessionId::new(),
            self.model_name.clone(),
            session_context,
            BroadcastHub::new(
                self.config.subscriber_buffer,
                self.config.subscriber_backlog_limit,
            ),
            self.runtime.pool.child_token(),
        ));
        let summary = session.summary();

        self.store.save_session(&summary).await?;
        self.registry.create(Arc::clone(&session))?;
        self.runtime.audit.session_created(&summary).await;

        info!(
            session = %summary.id,
            user = %summary.user_id,
            context = ?summary.context,
            tools = session.context().catalog.len(),
            "Session created"
        );
        Ok(summary)
    }

    /// Append a user message and queue the turn it triggers. Returns once the
    /// message is recorded, not when the assistant answers.
    pub async fn send_message(&self, id: SessionId, text: impl Into<String>) -> Result<()> {
        let text = text.into();
        let session = self.registry.get(&id)?;
        let length = text.len();
        let ticket = session.accept_user_message(text)?;
        self.runtime
            .audit
            .message_sent(&id, session.user_id(), length)
            .await;

        info!(session = %id, ticket, "Message accepted");
        self.runtime.schedule_turn(session, ticket);
        Ok(())
    }

    /// Approve a pending action and run it in the background.
    pub async fn approve_action(
        &self,
        id: SessionId,
        action_id: ActionId,
        approver: &str,
    ) -> Result<AiAction> {
        let session = self.registry.get(&id)?;
        let action = session.approve(action_id, approver)?;
        self.runtime.audit.action_approved(&action, approver).await;
        self.runtime.schedule_approved(session, action_id);
        Ok(action)
    }

    pub async fn reject_action(
        &self,
        id: SessionId,
        action_id: ActionId,
        reason: &str,
    ) -> Result<AiAction> {
        let session = self.registry.get(&id)?;
        let action = session.reject(action_id, reason)?;
        self.runtime
            .audit
            .action_rejected(&action, session.user_id(), reason)
            .await;
        Ok(action)
    }

    /// End a session. Safe to call at any time and any number of times.
    pub async fn terminate_session(&self, id: SessionId) {
        let Some(session) = self.registry.remove(&id) else {
            return;
        };
        let actor = session.user_id().to_string();
        self.end_session(
            &session,
            SessionStatus::Terminated,
            &actor,
            ActorType::User,
            "session.terminate",
        )
        .await;
    }

    pub fn subscribe(&self, id: SessionId) -> Result<Subscription> {
        self.registry.get(&id)?.subscribe()
    }

    pub fn list_active_sessions(&self) -> Vec<SessionSummary> {
        self.registry.list_active()
    }

    pub fn session_snapshot(&self, id: SessionId) -> Result<SessionSnapshot> {
        Ok(self.registry.get(&id)?.snapshot())
    }

    /// End sessions idle for longer than the configured timeout.
    pub async fn reap_idle(&self) -> usize {
        let timeout = std::time::Duration::from_secs(self.config.idle_timeout_secs);
        let cutoff = Duration::from_std(timeout)
            .ok()
            .and_then(|timeout| Utc::now().checked_sub_signed(timeout))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        self.reap_inactive_since(cutoff).await
    }

    /// End every session with no activity since `cutoff`, no turn queued and
    /// no tool running.
    pub async fn reap_inactive_since(&self, cutoff: DateTime<Utc>) -> usize {
        let status = SessionStatus::Completed;
        let mut reaped = 0;
        for session in self.registry.sessions() {
            let Some(ended_at) = session.end_if_idle(cutoff, status) else {
                continue;
            };
            self.registry.remove(&session.id());
            info!(session = %session.id(), "Reaped idle session");
            self.record_end(
                &session,
                status,
                ended_at,
                SYSTEM_ACTOR,
                ActorType::System,
                "session.reap",
            )
            .await;
            reaped += 1;
        }
        reaped
    }

    /// Wait for every queued turn and tool execution to finish.
    pub async fn wait_idle(&self) {
        self.runtime.pool.wait_idle().await;
    }

    /// Terminate every session and stop all background work.
    pub async fn shutdown(&self) {
        let sessions = self.registry.sessions();
        info!(sessions = sessions.len(), "Engine shutting down");
        for session in sessions {
            self.terminate_session(session.id()).await;
        }
        self.runtime.pool.shutdown().await;
    }

    async fn end_session(
        &self,
        session: &Session,
        status: SessionStatus,
        actor: &str,
        actor_type: ActorType,
        audit_action: &str,
    ) {
        let Some(ended_at) = session.end(status) else {
            return;
        };
        self.record_end(session, status, ended_at, actor, actor_type, audit_action)
            .await;
    }

    async fn record_end(
        &self,
        session: &Session,
        status: SessionStatus,
        ended_at: DateTime<Utc>,
        actor: &str,
        actor_type: ActorType,
        audit_action: &str,
    ) {
        if let Err(e) = self
            .store
            .update_session_status(&session.id(), status, Some(ended_at))
            .await
        {
            warn!(session = %session.id(), error = %e, "Failed to persist session end");
        }
        self.runtime
            .audit
            .session_ended(&session.id(), actor, actor_type, audit_action, status)
            .await;
    }
}
