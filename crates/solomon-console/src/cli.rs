use std::path::PathBuf;

use clap::Parser;
use solomon_common::ContextKind;
use uuid::Uuid;

/// Solomon: an operations console with an approval-gated assistant.
#[derive(Parser, Debug)]
#[command(name = "solomon-console", version, about)]
pub struct Args {
    /// Config file path override.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level override (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Operator id recorded on the session and in the audit trail.
    #[arg(long, default_value = "operator")]
    pub user: String,

    /// Comma-separated roles, mapped to tool tiers by `[access]`.
    #[arg(long, value_delimiter = ',', default_value = "viewer")]
    pub roles: Vec<String>,

    /// Kind of entity the session is scoped to.
    #[arg(long, requires = "context_id")]
    pub context_kind: Option<ContextKind>,

    /// Id of the entity the session is scoped to.
    #[arg(long, requires = "context_kind")]
    pub context_id: Option<Uuid>,

    /// JSON file seeding services, environments, incidents and runbooks.
    #[arg(long)]
    pub fixtures: Option<PathBuf>,
}

pub fn parse() -> Args {
    Args::parse()
}
