use super::*;
use serde_json::json;
use solomon_common::{Environment, MessageRole, SessionId, SessionStatus};
use solomon_config::ToolAccessConfig;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::broadcast::{BroadcastHub, Subscription};
use crate::catalog::ToolCatalog;
use crate::context::{SessionContext, TargetContext, UserIdentity};
use crate::tools::FnHandler;

fn session_with(target: Option<TargetContext>) -> Session {
    let context = SessionContext {
        user: UserIdentity::new("alice", vec!["admin".into()]),
        target,
        runbooks: Vec::new(),
        tools: ToolAccessConfig::default(),
        catalog: ToolCatalog::builtin(),
    };
    Session::new(
        SessionId::new(),
        "test-model",
        context,
        BroadcastHub::new(64, 256),
        CancellationToken::new(),
    )
}

fn session() -> Session {
    session_with(None)
}

fn drain(sub: &mut Subscription) -> Vec<StreamEvent> {
    std::iter::from_fn(|| sub.try_recv()).collect()
}

fn scale(env: &str) -> ToolCall {
    ToolCall::new(
        "scale_service",
        json!({"service": "api", "environment": env, "replicas": 4}),
    )
}

fn parked(session: &Session, call: ToolCall) -> AiAction {
    match session.propose(call).unwrap() {
        Proposal::Parked(action) => action,
        other => panic!("expected a parked action, got {other:?}"),
    }
}

#[test]
fn staging_call_runs_without_pending() {
    let s = session();
    let mut sub = s.subscribe().unwrap();

    let proposal = s.propose(scale("staging")).unwrap();
    let Proposal::Ready(action) = proposal else {
        panic!("staging scale should not be gated");
    };
    assert_eq!(action.status, ActionStatus::Executing);
    assert!(!action.requires_approval);

    let events = drain(&mut sub);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind(), "tool_use");
    assert!(events.iter().all(|e| e.kind() != "approval_required"));
}

#[test]
fn prod_call_parks_and_announces() {
    let s = session();
    let mut sub = s.subscribe().unwrap();

    let action = parked(&s, scale("prod"));
    assert_eq!(action.status, ActionStatus::Pending);
    assert!(action.requires_approval);
    assert_eq!(s.summary().pending_actions, 1);

    let events = drain(&mut sub);
    assert!(matches!(
        &events[..],
        [StreamEvent::ApprovalRequired { tool, .. }] if tool == "scale_service"
    ));
}

#[test]
fn session_environment_applies_when_call_names_none() {
    let env = Environment {
        id: Uuid::new_v4(),
        service_id: Uuid::new_v4(),
        name: "prod".into(),
        cluster: String::new(),
        namespace: String::new(),
    };
    let service = solomon_common::Service {
        id: env.service_id,
        name: "api".into(),
        display_name: "API".into(),
        description: String::new(),
        team: String::new(),
        tier: String::new(),
        repository: String::new(),
    };
    let s = session_with(Some(TargetContext::Environment {
        environment: env,
        service,
    }));

    let call = ToolCall::new("restart_service", json!({"service": "api"}));
    assert!(matches!(s.propose(call).unwrap(), Proposal::Parked(_)));

    let call = ToolCall::new("restart_service", json!({"service": "api", "environment": "dev"}));
    assert!(matches!(s.propose(call).unwrap(), Proposal::Ready(_)));
}

#[test]
fn unknown_environment_is_gated() {
    let s = session();
    let call = ToolCall::new("restart_service", json!({"service": "api"}));
    assert!(matches!(s.propose(call).unwrap(), Proposal::Parked(_)));
}

#[test]
fn tool_outside_catalog_is_refused() {
    let s = session();
    let mut sub = s.subscribe().unwrap();

    let proposal = s.propose(ToolCall::new("drop_database", json!({}))).unwrap();
    let Proposal::Refused(action) = proposal else {
        panic!("unknown tool must be refused");
    };
    assert_eq!(action.status, ActionStatus::Rejected);
    assert!(action.output.unwrap()["reason"]
        .as_str()
        .unwrap()
        .contains("drop_database"));

    let events = drain(&mut sub);
    assert_eq!(events[0].kind(), "tool_result");
    assert_eq!(s.messages().last().unwrap().role, MessageRole::Tool);
}

#[test]
fn approve_records_approver_once() {
    let s = session();
    let action = parked(&s, scale("prod"));

    let approved = s.approve(action.id, "bob").unwrap();
    assert_eq!(approved.status, ActionStatus::Approved);
    assert_eq!(approved.approved_by.as_deref(), Some("bob"));
    assert!(approved.approved_at.is_some());

    let err = s.approve(action.id, "carol").unwrap_err();
    assert!(matches!(
        err,
        EngineError::InvalidState {
            status: ActionStatus::Approved,
            ..
        }
    ));
    assert_eq!(s.action(action.id).unwrap().approved_by.as_deref(), Some("bob"));
}

#[test]
fn reject_stores_reason_and_blocks_execution() {
    let s = session();
    let mut sub = s.subscribe().unwrap();
    let action = parked(&s, scale("prod"));
    drain(&mut sub);

    let rejected = s.reject(action.id, "insufficient capacity").unwrap();
    assert_eq!(rejected.status, ActionStatus::Rejected);
    assert_eq!(
        rejected.output,
        Some(json!({"reason": "insufficient capacity"}))
    );

    let events = drain(&mut sub);
    assert!(matches!(
        &events[0],
        StreamEvent::ToolResult { content, .. } if content.contains("insufficient capacity")
    ));
    assert!(s
        .messages()
        .last()
        .unwrap()
        .content
        .starts_with("[Tool Result: scale_service] Rejected"));

    assert!(matches!(
        s.begin_execution(action.id),
        Err(EngineError::InvalidState { .. })
    ));
    assert!(matches!(
        s.approve(action.id, "bob"),
        Err(EngineError::InvalidState { .. })
    ));
    assert_eq!(s.action(action.id).unwrap().status, ActionStatus::Rejected);
}

#[test]
fn unknown_action_is_not_found() {
    let s = session();
    let err = s.approve(ActionId::new(), "bob").unwrap_err();
    assert!(matches!(err, EngineError::NotFound { kind: "action", .. }));
    let err = s.reject(ActionId::new(), "no").unwrap_err();
    assert!(matches!(err, EngineError::NotFound { kind: "action", .. }));
}

#[test]
fn pending_action_cannot_skip_approval() {
    let s = session();
    let action = parked(&s, scale("prod"));
    assert!(matches!(
        s.begin_execution(action.id),
        Err(EngineError::InvalidState {
            status: ActionStatus::Pending,
            ..
        })
    ));
    assert!(s.finish_execution(action.id, Ok(json!({}))).is_none());
    assert_eq!(s.action(action.id).unwrap().status, ActionStatus::Pending);
}

#[tokio::test]
async fn approved_action_executes_once() {
    let s = session();
    let runner = ToolRunner::new().with_handler(
        "scale_service",
        FnHandler::new(|input| Ok(json!({"replicas": input["replicas"]}))),
    );
    let action = parked(&s, scale("prod"));
    s.approve(action.id, "bob").unwrap();

    let running = s.begin_execution(action.id).unwrap();
    assert_eq!(running.status, ActionStatus::Executing);
    let done = s.execute(&running, &runner).await.unwrap();
    assert_eq!(done.status, ActionStatus::Executed);
    assert_eq!(done.output, Some(json!({"replicas": 4})));
    assert!(done.executed_at.is_some());

    // A second run attempt finds nothing to do.
    assert!(s.execute(&running, &runner).await.is_none());
    assert!(matches!(
        s.approve(action.id, "bob"),
        Err(EngineError::InvalidState {
            status: ActionStatus::Executed,
            ..
        })
    ));
}

#[tokio::test]
async fn handler_error_marks_failed() {
    let s = session();
    let runner = ToolRunner::new().with_handler(
        "get_health",
        FnHandler::new(|_| Err("health endpoint timed out".to_string())),
    );
    let Proposal::Ready(action) = s
        .propose(ToolCall::new("get_health", json!({"service": "api"})))
        .unwrap()
    else {
        panic!("get_health is never gated");
    };

    let done = s.execute(&action, &runner).await.unwrap();
    assert_eq!(done.status, ActionStatus::Failed);
    assert_eq!(
        done.output,
        Some(json!({"error": "tool execution failed: health endpoint timed out"}))
    );
    assert_eq!(
        s.messages().last().unwrap().content,
        "[Tool Result: get_health] Error: tool execution failed: health endpoint timed out"
    );
}

#[test]
fn decisions_fail_after_session_ends() {
    let s = session();
    let action = parked(&s, scale("prod"));
    s.end(SessionStatus::Terminated);

    assert!(matches!(
        s.approve(action.id, "bob"),
        Err(EngineError::SessionClosed(_))
    ));
    assert!(matches!(
        s.reject(action.id, "late"),
        Err(EngineError::SessionClosed(_))
    ));
}

#[tokio::test]
async fn ended_session_never_runs_a_cleared_action() {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    let runs = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&runs);
    let runner = ToolRunner::new().with_handler(
        "get_health",
        FnHandler::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(json!({"status": "healthy"}))
        }),
    );

    for _ in 0..50 {
        let s = session();
        let Proposal::Ready(action) = s
            .propose(ToolCall::new("get_health", json!({"service": "api"})))
            .unwrap()
        else {
            panic!("get_health is never gated");
        };
        s.end(SessionStatus::Terminated);

        let done = s.execute(&action, &runner).await.unwrap();
        assert_eq!(done.status, ActionStatus::Failed);
        assert!(done.output.unwrap()["error"]
            .as_str()
            .unwrap()
            .contains("no longer active"));
    }
    assert_eq!(runs.load(Ordering::SeqCst), 0);
}

#[test]
fn ended_session_accepts_no_proposals() {
    let s = session();
    s.end(SessionStatus::Terminated);

    assert!(matches!(
        s.propose(scale("staging")),
        Err(EngineError::SessionClosed(_))
    ));
    assert!(s.snapshot().actions.is_empty());
}

#[test]
fn target_environment_prefers_input() {
    let input = json!({"environment": "dev"});
    assert_eq!(target_environment(&input, Some("prod")), Some("dev"));
    assert_eq!(target_environment(&json!({}), Some("prod")), Some("prod"));
    assert_eq!(target_environment(&json!({"environment": ""}), None), None);
    assert_eq!(target_environment(&json!({"environment": 3}), None), None);
}
