//! `SOLOMON_*` environment variable overrides, applied after file loading.

use crate::schema::ConsoleConfig;
use solomon_common::ConfigError;
use tracing::debug;

/// Apply overrides from the process environment.
pub fn apply_env_overrides(config: &mut ConsoleConfig) -> Result<(), ConfigError> {
    apply_overrides(config, |key| std::env::var(key).ok())
}

/// Apply overrides from an arbitrary lookup (the process environment in production).
pub fn apply_overrides(
    config: &mut ConsoleConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    if let Some(model) = lookup("SOLOMON_MODEL") {
        debug!(model = %model, "model overridden from environment");
        config.model.default_model = model;
    }

    if let Some(level) = lookup("SOLOMON_LOG_LEVEL") {
        config.logging.level = level
            .parse()
            .map_err(|e: String| ConfigError::ParseError(format!("SOLOMON_LOG_LEVEL: {e}")))?;
    }

    if let Some(secs) = lookup("SOLOMON_IDLE_TIMEOUT_SECS") {
        config.engine.idle_timeout_secs = secs.trim().parse().map_err(|e| {
            ConfigError::ParseError(format!("SOLOMON_IDLE_TIMEOUT_SECS: {e}"))
        })?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::LogLevel;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn no_overrides_leaves_config_untouched() {
        let mut config = ConsoleConfig::default();
        apply_overrides(&mut config, lookup_from(&[])).unwrap();
        assert_eq!(config.model.default_model, "claude-sonnet-4-20250514");
    }

    #[test]
    fn overrides_model_level_and_timeout() {
        let mut config = ConsoleConfig::default();
        apply_overrides(
            &mut config,
            lookup_from(&[
                ("SOLOMON_MODEL", "claude-haiku"),
                ("SOLOMON_LOG_LEVEL", "debug"),
                ("SOLOMON_IDLE_TIMEOUT_SECS", "90"),
            ]),
        )
        .unwrap();
        assert_eq!(config.model.default_model, "claude-haiku");
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.engine.idle_timeout_secs, 90);
    }

    #[test]
    fn bad_timeout_is_a_parse_error() {
        let mut config = ConsoleConfig::default();
        let err = apply_overrides(
            &mut config,
            lookup_from(&[("SOLOMON_IDLE_TIMEOUT_SECS", "soon")]),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
        assert!(err.to_string().contains("SOLOMON_IDLE_TIMEOUT_SECS"));
    }
}
