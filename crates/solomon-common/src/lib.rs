pub mod errors;
pub mod events;
pub mod id;
pub mod types;

pub use errors::{ConfigError, EngineError};
pub use events::StreamEvent;
pub use id::{new_id, ActionId, SessionId};
pub use types::{
    ActionStatus, ActorType, AiAction, AuditEntry, ContextKind, ContextRef, Environment, Incident,
    Message, MessageRole, ResourceRef, Runbook, Service, SessionStatus, SessionSummary, ToolTier,
};

pub type Result<T> = std::result::Result<T, EngineError>;
