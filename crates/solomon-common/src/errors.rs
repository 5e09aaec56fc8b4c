use std::path::PathBuf;

use crate::id::{ActionId, SessionId};
use crate::types::ActionStatus;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),
}

/// Errors surfaced by the session engine to its callers.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("action {id} is {status}, not pending")]
    InvalidState { id: ActionId, status: ActionStatus },

    #[error("session {0} is no longer active")]
    SessionClosed(SessionId),

    #[error("session already exists: {0}")]
    AlreadyExists(SessionId),

    #[error("context resolution failed: {0}")]
    ContextResolutionFailed(String),

    #[error("tool execution failed: {0}")]
    ToolExecutionFailed(String),

    #[error("model invocation failed: {0}")]
    ModelInvocationFailed(String),

    #[error("persistence error: {0}")]
    Persistence(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl EngineError {
    pub fn session_not_found(id: &SessionId) -> Self {
        Self::NotFound {
            kind: "session",
            id: id.to_string(),
        }
    }

    pub fn action_not_found(id: &ActionId) -> Self {
        Self::NotFound {
            kind: "action",
            id: id.to_string(),
        }
    }

    pub fn entity_not_found(kind: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = ConfigError::FileNotFound(PathBuf::from("/tmp/missing.toml"));
        assert_eq!(err.to_string(), "config file not found: /tmp/missing.toml");

        let err = ConfigError::ValidationError("engine.subscriber_buffer must be > 0".into());
        assert_eq!(
            err.to_string(),
            "config validation error: engine.subscriber_buffer must be > 0"
        );
    }

    #[test]
    fn not_found_names_the_kind() {
        let sid = SessionId::new();
        let err = EngineError::session_not_found(&sid);
        assert_eq!(err.to_string(), format!("session not found: {sid}"));

        let err = EngineError::entity_not_found("service", "S1");
        assert_eq!(err.to_string(), "service not found: S1");
    }

    #[test]
    fn invalid_state_reports_current_status() {
        let aid = ActionId::new();
        let err = EngineError::InvalidState {
            id: aid,
            status: ActionStatus::Executed,
        };
        assert_eq!(err.to_string(), format!("action {aid} is executed, not pending"));
    }

    #[test]
    fn engine_error_from_config() {
        let err: EngineError = ConfigError::ParseError("bad toml".into()).into();
        assert!(matches!(err, EngineError::Config(_)));
        assert!(err.to_string().contains("bad toml"));
    }
}
