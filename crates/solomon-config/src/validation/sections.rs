//! Validators for the engine, model and access sections.

use crate::schema::ConsoleConfig;

use super::helpers::validate_range;

pub(crate) fn validate_engine(errors: &mut Vec<String>, config: &ConsoleConfig) {
    let engine = &config.engine;
    validate_range(
        errors,
        "engine.subscriber_buffer",
        engine.subscriber_buffer as u64,
        1,
        100_000,
    );
    if engine.subscriber_backlog_limit <= engine.subscriber_buffer {
        errors.push(format!(
            "engine.subscriber_backlog_limit = {} must exceed engine.subscriber_buffer = {}",
            engine.subscriber_backlog_limit, engine.subscriber_buffer
        ));
    }
    validate_range(
        errors,
        "engine.max_tool_rounds",
        engine.max_tool_rounds as u64,
        1,
        100,
    );
    validate_range(
        errors,
        "engine.idle_timeout_secs",
        engine.idle_timeout_secs,
        1,
        7 * 24 * 3600,
    );
    validate_range(
        errors,
        "engine.reaper_interval_secs",
        engine.reaper_interval_secs,
        1,
        3600,
    );
}

pub(crate) fn validate_model(errors: &mut Vec<String>, config: &ConsoleConfig) {
    if config.model.default_model.trim().is_empty() {
        errors.push("model.default_model must not be empty".into());
    }
}

pub(crate) fn validate_access(errors: &mut Vec<String>, config: &ConsoleConfig) {
    for role in config.access.roles.keys() {
        if role.trim().is_empty() {
            errors.push("access.roles contains an empty role name".into());
        }
    }
}
