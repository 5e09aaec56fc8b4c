//! The approval gate: the state machine every proposed tool action moves
//! through.
//!
//! ```text
//! gated:      pending -> approved -> executing -> executed | failed
//!             pending -> rejected
//! not gated:  executing -> executed | failed
//! ```
//!
//! Every transition checks the current status under the session lock, so
//! approve, reject and execute on one action are mutually exclusive and an
//! action can run at most once.

use chrono::Utc;
use serde_json::json;
use solomon_common::{ActionId, ActionStatus, AiAction, EngineError, Message, Result, StreamEvent};
use tracing::{info, warn};

use crate::model::ToolCall;
use crate::session::{Session, SessionState};
use crate::tools::ToolRunner;

/// What happened to a tool call the model asked for.
#[derive(Debug, Clone, PartialEq)]
pub enum Proposal {
    /// Cleared to run now; already `executing`.
    Ready(AiAction),
    /// Parked as `pending` until a human decides.
    Parked(AiAction),
    /// Not in the session's catalog; recorded as `rejected`.
    Refused(AiAction),
}

impl Proposal {
    pub fn action(&self) -> &AiAction {
        match self {
            Proposal::Ready(a) | Proposal::Parked(a) | Proposal::Refused(a) => a,
        }
    }
}

/// Environment a call targets: its own `environment` input if it names one,
/// otherwise the session's default.
pub fn target_environment<'a>(
    input: &'a serde_json::Value,
    default: Option<&'a str>,
) -> Option<&'a str> {
    input
        .get("environment")
        .and_then(serde_json::Value::as_str)
        .filter(|env| !env.is_empty())
        .or(default)
}

fn ensure_active(state: &SessionState, session: &Session) -> Result<()> {
    if state.is_active() {
        Ok(())
    } else {
        Err(EngineError::SessionClosed(session.id()))
    }
}

/// The action with `id`, provided it is currently in `expected`.
fn action_in(
    state: &mut SessionState,
    id: ActionId,
    expected: ActionStatus,
) -> Result<&mut AiAction> {
    let action = state
        .action_mut(id)
        .ok_or_else(|| EngineError::action_not_found(&id))?;
    if action.status != expected {
        return Err(EngineError::InvalidState {
            id,
            status: action.status,
        });
    }
    Ok(action)
}

fn result_message(action: &AiAction, content: &str) -> Message {
    Message::tool(format!("[Tool Result: {}] {}", action.tool_name, content))
}

fn output_text(output: &serde_json::Value) -> String {
    match output {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl Session {
    /// Record a tool call and decide whether it may run now.
    /// Fails once the session has ended, so nothing new is recorded or run.
    pub(crate) fn propose(&self, call: ToolCall) -> Result<Proposal> {
        let context = self.context();
        let mut state = self.state();
        ensure_active(&state, self)?;
        state.touch();

        let Some(tool) = context.catalog.get(&call.name) else {
            let reason = format!("tool '{}' is not available in this session", call.name);
            let mut action = AiAction::new(self.id(), call.name, call.input, false);
            action.status = ActionStatus::Rejected;
            action.output = Some(json!({ "reason": reason }));
            warn!(
                session = %self.id(),
                tool = %action.tool_name,
                "Model asked for an unavailable tool"
            );

            state.actions.push(action.clone());
            state.publish(StreamEvent::ToolResult {
                tool: action.tool_name.clone(),
                content: reason.clone(),
                action: action.clone(),
            });
            state.record(result_message(&action, &reason));
            return Ok(Proposal::Refused(action));
        };

        let env =
            target_environment(&call.input, context.default_environment()).map(str::to_owned);
        let requires_approval = tool.requires_approval_in(env.as_deref());
        let mut action = AiAction::new(self.id(), call.name, call.input, requires_approval);

        if requires_approval {
            info!(
                session = %self.id(),
                action = %action.id,
                tool = %action.tool_name,
                env = ?env,
                "Action awaiting approval"
            );
            state.actions.push(action.clone());
            state.publish(StreamEvent::ApprovalRequired {
                tool: action.tool_name.clone(),
                action: action.clone(),
            });
            Ok(Proposal::Parked(action))
        } else {
            action.status = ActionStatus::Executing;
            state.actions.push(action.clone());
            state.publish(StreamEvent::ToolUse {
                tool: action.tool_name.clone(),
                action: action.clone(),
            });
            Ok(Proposal::Ready(action))
        }
    }

    /// Approve a pending action. Execution is triggered by the caller.
    pub(crate) fn approve(&self, id: ActionId, approver: &str) -> Result<AiAction> {
        let mut state = self.state();
        ensure_active(&state, self)?;
        let action = action_in(&mut state, id, ActionStatus::Pending)?;

        action.status = ActionStatus::Approved;
        action.approved_by = Some(approver.to_string());
        action.approved_at = Some(Utc::now());
        let approved = action.clone();
        state.touch();

        info!(session = %self.id(), action = %id, approver, "Action approved");
        Ok(approved)
    }

    /// Reject a pending action. It will never run.
    pub(crate) fn reject(&self, id: ActionId, reason: &str) -> Result<AiAction> {
        let mut state = self.state();
        ensure_active(&state, self)?;
        let action = action_in(&mut state, id, ActionStatus::Pending)?;

        action.status = ActionStatus::Rejected;
        action.output = Some(json!({ "reason": reason }));
        let rejected = action.clone();

        let content = format!("Rejected: {reason}");
        state.publish(StreamEvent::ToolResult {
            tool: rejected.tool_name.clone(),
            content: content.clone(),
            action: rejected.clone(),
        });
        state.record(result_message(&rejected, &content));

        info!(session = %self.id(), action = %id, reason, "Action rejected");
        Ok(rejected)
    }

    /// Move an approved action to `executing`.
    pub(crate) fn begin_execution(&self, id: ActionId) -> Result<AiAction> {
        let mut state = self.state();
        ensure_active(&state, self)?;
        let action = action_in(&mut state, id, ActionStatus::Approved)?;

        action.status = ActionStatus::Executing;
        let running = action.clone();
        state.publish(StreamEvent::ToolUse {
            tool: running.tool_name.clone(),
            action: running.clone(),
        });
        Ok(running)
    }

    /// Record the outcome of an executing action. Returns `None` if the
    /// action is not executing.
    pub(crate) fn finish_execution(
        &self,
        id: ActionId,
        outcome: Result<serde_json::Value>,
    ) -> Option<AiAction> {
        let mut state = self.state();
        let action = state.action_mut(id)?;
        if action.status != ActionStatus::Executing {
            return None;
        }

        let content = match outcome {
            Ok(output) => {
                let text = output_text(&output);
                action.status = ActionStatus::Executed;
                action.output = Some(output);
                text
            }
            Err(error) => {
                let error = error.to_string();
                let text = format!("Error: {error}");
                action.status = ActionStatus::Failed;
                action.output = Some(json!({ "error": error }));
                text
            }
        };
        action.executed_at = Some(Utc::now());
        let finished = action.clone();

        state.publish(StreamEvent::ToolResult {
            tool: finished.tool_name.clone(),
            content: content.clone(),
            action: finished.clone(),
        });
        state.record(result_message(&finished, &content));
        Some(finished)
    }

    /// Run an `executing` action through `runner` and record the result.
    /// Termination of the session abandons the run and fails the action.
    pub(crate) async fn execute(&self, action: &AiAction, runner: &ToolRunner) -> Option<AiAction> {
        let outcome = tokio::select! {
            biased;
            _ = self.cancel_token().cancelled() => Err(EngineError::SessionClosed(self.id())),
            result = runner.run(&action.tool_name, &action.input) => result,
        };

        if let Err(error) = &outcome {
            warn!(
                session = %self.id(),
                action = %action.id,
                tool = %action.tool_name,
                %error,
                "Tool execution failed"
            );
        }
        let finished = self.finish_execution(action.id, outcome);
        if let Some(done) = &finished {
            info!(
                session = %self.id(),
                action = %done.id,
                status = %done.status,
                "Action finished"
            );
        }
        finished
    }
}

#[cfg(test)]
mod tests;
