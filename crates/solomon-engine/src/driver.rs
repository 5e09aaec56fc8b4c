//! Conversation driver: runs the assistant's turns and the tool work they
//! cause as supervised background tasks.
//!
//! A turn calls the model with the full message log, appends what it says,
//! and raises each requested tool call through the approval gate. Calls that
//! clear the gate run concurrently; their results go back to the model in
//! the next round. The turn ends when the model asks for nothing more, when
//! only parked calls remain, or after `max_tool_rounds` rounds. It always
//! ends with a `done` event.

use std::sync::Arc;

use futures_util::future::join_all;
use solomon_common::{ActionId, AiAction, EngineError, Message, Result, StreamEvent};
use tracing::{debug, info, warn};

use crate::audit::Auditor;
use crate::gate::Proposal;
use crate::model::{ChunkSink, ModelClient};
use crate::pool::WorkPool;
use crate::session::Session;
use crate::tools::ToolRunner;

pub(crate) struct Runtime {
    pub(crate) model: Arc<dyn ModelClient>,
    pub(crate) runner: ToolRunner,
    pub(crate) audit: Auditor,
    pub(crate) pool: WorkPool,
    pub(crate) max_tool_rounds: u32,
    pub(crate) resume_after_approval: bool,
}

impl Runtime {
    /// Queue the turn holding `ticket`. It starts once earlier turns finish.
    pub(crate) fn schedule_turn(self: &Arc<Self>, session: Arc<Session>, ticket: u64) {
        let runtime = Arc::clone(self);
        self.pool
            .spawn("turn", async move { runtime.run_turn(session, ticket).await });
    }

    /// Run an approved action in the background.
    pub(crate) fn schedule_approved(self: &Arc<Self>, session: Arc<Session>, id: ActionId) {
        let runtime = Arc::clone(self);
        self.pool
            .spawn("execute", async move { runtime.run_approved(session, id).await });
    }

    async fn run_turn(self: Arc<Self>, session: Arc<Session>, ticket: u64) {
        let cancel = session.cancel_token().clone();
        let turn = tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            guard = session.begin_turn(ticket) => guard,
        };
        if !session.is_active() {
            return;
        }

        debug!(session = %session.id(), ticket = turn.ticket(), "Turn started");
        match self.drive(&session).await {
            Ok(rounds) => debug!(session = %session.id(), ticket, rounds, "Turn finished"),
            Err(e) => {
                warn!(session = %session.id(), ticket, error = %e, "Turn failed");
                session.publish(StreamEvent::Error {
                    error: e.to_string(),
                });
            }
        }
        session.publish(StreamEvent::Done);
    }

    /// The model/tool loop of one turn. Returns the number of model calls.
    async fn drive(&self, session: &Arc<Session>) -> Result<u32> {
        let tools = session.context().catalog.tools();

        for round in 1..=self.max_tool_rounds {
            let messages = session.messages();
            let sink = Arc::clone(session);
            let on_chunk: ChunkSink =
                Box::new(move |chunk| sink.publish(StreamEvent::chunk(chunk)));

            let reply = tokio::select! {
                biased;
                _ = session.cancel_token().cancelled() => {
                    return Err(EngineError::SessionClosed(session.id()));
                }
                reply = self.model.converse(&messages, tools, on_chunk) => reply?,
            };

            if !reply.content.is_empty() {
                session.record(Message::assistant(reply.content));
            }
            if reply.tool_calls.is_empty() {
                return Ok(round);
            }

            let mut ready = Vec::new();
            let mut refused = false;
            let mut closed = None;
            for call in reply.tool_calls {
                let proposal = match session.propose(call) {
                    Ok(proposal) => proposal,
                    Err(e) => {
                        closed = Some(e);
                        break;
                    }
                };
                self.audit.action_proposed(&proposal).await;
                match proposal {
                    Proposal::Ready(action) => ready.push(action),
                    Proposal::Refused(_) => refused = true,
                    Proposal::Parked(_) => {}
                }
            }
            if let Some(e) = closed {
                // Already-cleared actions see the cancelled token and settle as failed.
                join_all(ready.iter().map(|action| self.run_action(session, action))).await;
                return Err(e);
            }
            if ready.is_empty() && !refused {
                // Only parked calls: approval picks the conversation back up.
                return Ok(round);
            }

            join_all(ready.iter().map(|action| self.run_action(session, action))).await;
        }

        Err(EngineError::ModelInvocationFailed(format!(
            "tool-call limit of {} rounds reached",
            self.max_tool_rounds
        )))
    }

    async fn run_action(&self, session: &Session, action: &AiAction) {
        if let Some(done) = session.execute(action, &self.runner).await {
            self.audit.action_executed(&done).await;
        }
    }

    async fn run_approved(self: Arc<Self>, session: Arc<Session>, id: ActionId) {
        let action = match session.begin_execution(id) {
            Ok(action) => action,
            Err(e) => {
                debug!(
                    session = %session.id(),
                    action = %id,
                    error = %e,
                    "Approved action not run"
                );
                return;
            }
        };
        self.run_action(&session, &action).await;

        if !self.resume_after_approval {
            return;
        }
        match session.reserve_turn() {
            Ok(ticket) => {
                info!(
                    session = %session.id(),
                    action = %id,
                    ticket,
                    "Resuming conversation after approved action"
                );
                self.schedule_turn(session, ticket);
            }
            Err(e) => {
                debug!(session = %session.id(), error = %e, "Session ended before resuming")
            }
        }
    }
}
