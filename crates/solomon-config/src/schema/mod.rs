//! Configuration schema types for the operations console.
//!
//! All structs use `serde(default)` so partial configs work correctly.

mod access;
mod engine;
mod model;
mod system;
mod tools;

pub use access::*;
pub use engine::*;
pub use model::*;
pub use system::*;
pub use tools::*;

use serde::{Deserialize, Serialize};

/// Current config schema version.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub engine: EngineConfig,
    pub model: ModelConfig,
    pub tools: ToolAccessConfig,
    pub access: AccessConfig,
    pub logging: LoggingConfig,
}
