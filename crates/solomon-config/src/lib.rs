//! Configuration for the Solomon operations console.
//!
//! TOML-based, with every section defaulted so partial files work, plus
//! `SOLOMON_*` environment overrides and full validation.

pub mod env;
pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use env::apply_env_overrides;
pub use schema::{
    AccessConfig, ConsoleConfig, EngineConfig, LogLevel, LoggingConfig, ModelConfig,
    ToolAccessConfig, CONFIG_SCHEMA_VERSION,
};

use solomon_common::ConfigError;
use std::path::Path;

/// Load config from `path` (or the platform default when `None`), apply
/// environment overrides, and validate the result.
pub fn load_config(path: Option<&Path>) -> Result<ConsoleConfig, ConfigError> {
    let mut config = match path {
        Some(path) => toml_loader::load_from_path(path)?,
        None => toml_loader::load_default()?,
    };
    apply_env_overrides(&mut config)?;
    validation::validate(&config)?;
    Ok(config)
}

/// Serialize a config to a pretty-printed JSON string.
pub fn config_to_json(config: &ConsoleConfig) -> String {
    serde_json::to_string_pretty(config)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize config: {e}\"}}"))
}
