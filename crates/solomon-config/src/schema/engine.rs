use serde::{Deserialize, Serialize};

/// Session engine limits and scheduling knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Queue depth at which a subscriber stops receiving partial text chunks.
    pub subscriber_buffer: usize,
    /// Queue depth at which a subscriber is evicted.
    pub subscriber_backlog_limit: usize,
    /// Model round-trips allowed within one conversation turn.
    pub max_tool_rounds: u32,
    /// Sessions idle for longer than this are terminated by the reaper.
    pub idle_timeout_secs: u64,
    pub reaper_interval_secs: u64,
    /// Run a follow-up turn once an approved action has finished.
    pub resume_after_approval: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            subscriber_buffer: 100,
            subscriber_backlog_limit: 1000,
            max_tool_rounds: 10,
            idle_timeout_secs: 1800,
            reaper_interval_secs: 60,
            resume_after_approval: true,
        }
    }
}
