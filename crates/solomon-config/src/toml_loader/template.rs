//! Default TOML config template with inline documentation comments.

/// Generate the default TOML config content with comments.
pub(crate) fn default_config_toml() -> String {
    r##"# Solomon operations console configuration
# Schema version 1
# Only override what you want to change -- missing fields use defaults.

[engine]
# subscriber_buffer = 100           # partial chunks are dropped for subscribers this far behind
# subscriber_backlog_limit = 1000   # subscribers this far behind are disconnected
# max_tool_rounds = 10              # model round-trips per conversation turn (1-100)
# idle_timeout_secs = 1800          # idle sessions are terminated after this long
# reaper_interval_secs = 60
# resume_after_approval = true      # continue the conversation once an approved action finishes

[model]
# default_model = "claude-sonnet-4-20250514"

[tools.kubectl]
# contexts = ["prod", "staging", "dev"]
# namespaces = ["cobalt-services", "monitoring"]

[tools.aws]
# role = "SolomonAgentRole"
# regions = ["us-east-1"]

[tools.github]
# repos = ["cobalt/*"]
# permissions = ["read", "write:pr"]

[access.roles]
# Highest tool tier each role may use: "read", "mutate" or "privileged".
# Roles not listed here grant no tools at all.
viewer = "read"
operator = "mutate"
admin = "privileged"

[logging]
# level = "info"                    # trace, debug, info, warn, error
"##
    .to_string()
}
