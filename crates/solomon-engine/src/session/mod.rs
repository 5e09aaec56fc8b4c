//! A live operations session: message log, tool actions and subscribers.
//!
//! All mutable state sits behind one lock that is held only for the length of
//! a state change. Events are published while the lock is held, so every
//! subscriber sees them in the order the changes happened.

mod state;
mod turns;

pub(crate) use state::SessionState;
pub(crate) use turns::TurnGuard;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use solomon_common::{
    ActionId, ActionStatus, AiAction, EngineError, Message, Result, SessionId, SessionStatus, SessionSummary,
    StreamEvent,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::broadcast::{BroadcastHub, Subscription};
use crate::context::{SessionContext, TargetContext};

use turns::TurnQueue;

/// Point-in-time copy of a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub summary: SessionSummary,
    pub messages: Vec<Message>,
    pub actions: Vec<AiAction>,
    /// A conversation turn is queued or running.
    pub busy: bool,
    pub subscribers: usize,
}

pub struct Session {
    id: SessionId,
    model: String,
    started_at: DateTime<Utc>,
    context: Arc<SessionContext>,
    state: Mutex<SessionState>,
    turns: TurnQueue,
    cancel: CancellationToken,
}

impl Session {
    pub(crate) fn new(
        id: SessionId,
        model: impl Into<String>,
        context: SessionContext,
        hub: BroadcastHub,
        cancel: CancellationToken,
    ) -> Self {
        let prompt = context.system_prompt();
        Self {
            id,
            model: model.into(),
            started_at: Utc::now(),
            context: Arc::new(context),
            state: Mutex::new(SessionState::new(prompt, hub)),
            turns: TurnQueue::new(),
            cancel,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn user_id(&self) -> &str {
        &self.context.user.id
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    pub(crate) fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Lock the session state. A poisoned lock is recovered: every state
    /// change leaves the state consistent between statements.
    pub(crate) fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_active(&self) -> bool {
        self.state().is_active()
    }

    pub fn last_activity(&self) -> DateTime<Utc> {
        self.state().last_activity
    }

    /// Whether a turn is queued or running.
    pub fn is_busy(&self) -> bool {
        let issued = self.state().next_turn;
        issued > self.turns.completed()
    }

    pub fn summary(&self) -> SessionSummary {
        let state = self.state();
        self.summary_locked(&state)
    }

    fn summary_locked(&self, state: &SessionState) -> SessionSummary {
        SessionSummary {
            id: self.id,
            user_id: self.context.user.id.clone(),
            context: self.context.target.as_ref().map(TargetContext::reference),
            status: state.status,
            model: self.model.clone(),
            started_at: self.started_at,
            ended_at: state.ended_at,
            message_count: state.messages.len(),
            pending_actions: state.pending_count(),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let busy = self.is_busy();
        let state = self.state();
        SessionSnapshot {
            summary: self.summary_locked(&state),
            messages: state.messages.clone(),
            actions: state.actions.clone(),
            busy,
            subscribers: state.hub.subscriber_count(),
        }
    }

    pub fn messages(&self) -> Vec<Message> {
        self.state().messages.clone()
    }

    pub fn action(&self, id: ActionId) -> Option<AiAction> {
        self.state().action(id).cloned()
    }

    /// Register an observer. Fails once the session has ended.
    pub fn subscribe(&self) -> Result<Subscription> {
        let mut state = self.state();
        if state.hub.is_closed() {
            return Err(EngineError::session_not_found(&self.id));
        }
        debug!(session = %self.id, "Subscriber attached");
        Ok(state.hub.subscribe())
    }

    pub(crate) fn publish(&self, event: StreamEvent) {
        self.state().publish(event);
    }

    pub(crate) fn record(&self, message: Message) {
        self.state().record(message);
    }

    /// Append a user message, echo it, and reserve the turn it triggers.
    pub(crate) fn accept_user_message(&self, text: String) -> Result<u64> {
        let mut state = self.state();
        if !state.is_active() {
            return Err(EngineError::SessionClosed(self.id));
        }
        state.record(Message::user(text));
        Ok(state.take_ticket())
    }

    /// Reserve a turn that is not triggered by a user message.
    pub(crate) fn reserve_turn(&self) -> Result<u64> {
        let mut state = self.state();
        if !state.is_active() {
            return Err(EngineError::SessionClosed(self.id));
        }
        Ok(state.take_ticket())
    }

    pub(crate) async fn begin_turn(&self, ticket: u64) -> TurnGuard<'_> {
        self.turns.wait_for(ticket).await
    }

    /// Move to a final status, close every subscription and cancel in-flight
    /// work. Returns the end time if this call did the transition.
    pub(crate) fn end(&self, status: SessionStatus) -> Option<DateTime<Utc>> {
        let ended_at = {
            let mut state = self.state();
            if !state.is_active() {
                return None;
            }
            Self::close(&mut state, status)
        };
        Some(self.after_close(status, ended_at))
    }

    /// Like [`Session::end`], but only if no turn is queued or running, no
    /// tool is executing and nothing happened since `cutoff`. The check and
    /// the transition share one lock, so a message accepted concurrently
    /// either keeps the session alive or is refused.
    pub(crate) fn end_if_idle(
        &self,
        cutoff: DateTime<Utc>,
        status: SessionStatus,
    ) -> Option<DateTime<Utc>> {
        let ended_at = {
            let mut state = self.state();
            let busy = state.next_turn > self.turns.completed()
                || state.actions.iter().any(|a| a.status == ActionStatus::Executing);
            if !state.is_active() || busy || state.last_activity >= cutoff {
                return None;
            }
            Self::close(&mut state, status)
        };
        Some(self.after_close(status, ended_at))
    }

    fn close(state: &mut SessionState, status: SessionStatus) -> DateTime<Utc> {
        let now = Utc::now();
        state.status = status;
        state.ended_at = Some(now);
        state.hub.terminate();
        now
    }

    fn after_close(&self, status: SessionStatus, ended_at: DateTime<Utc>) -> DateTime<Utc> {
        self.cancel.cancel();
        info!(session = %self.id, %status, "Session ended");
        ended_at
    }
}
