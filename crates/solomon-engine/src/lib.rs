//! Session engine for the Solomon operations console.
//!
//! An operator opens a session scoped to a service, environment or incident
//! and talks to the assistant. The assistant may ask to run tools; dangerous
//! ones wait for a human to approve or reject them. Every state change is
//! broadcast to live subscribers and recorded in the audit trail.
//!
//! The engine talks to the outside world only through traits:
//! [`EntityLookup`], [`ModelClient`], [`ToolHandler`] and [`SessionStore`].
//! In-memory and scripted implementations ship alongside for tests and
//! the console binary.

pub mod access;
pub mod audit;
pub mod broadcast;
pub mod catalog;
pub mod context;
mod driver;
pub mod engine;
pub mod gate;
pub mod lookup;
pub mod model;
pub mod pool;
pub mod registry;
pub mod session;
pub mod store;
pub mod tools;

pub use access::ToolGrant;
pub use broadcast::Subscription;
pub use catalog::{builtin_tools, Tool, ToolCatalog};
pub use context::{SessionContext, TargetContext, UserIdentity};
pub use engine::{Collaborators, CreateSessionRequest, Engine};
pub use gate::Proposal;
pub use lookup::{DirectorySeed, EntityLookup, InMemoryDirectory};
pub use model::{ChunkSink, DirectiveModel, ModelClient, ModelReply, ScriptedModel, ToolCall};
pub use session::SessionSnapshot;
pub use store::{InMemoryStore, SessionStore};
pub use tools::{DryRunHandler, FnHandler, ToolHandler, ToolRunner};
