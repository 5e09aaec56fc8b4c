//! solomon-console: drive an operations session by hand.
//!
//! Wires the engine to in-memory collaborators, a directive model and
//! dry-run tools, opens one session and reads operator commands from stdin.
//! Every session event is printed to stdout as a JSON line; logs go to
//! stderr.

mod cli;
mod repl;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use solomon_common::EngineError;
use solomon_config::{ConsoleConfig, LogLevel};
use solomon_engine::{
    Collaborators, CreateSessionRequest, DirectiveModel, DirectorySeed, DryRunHandler, Engine,
    InMemoryDirectory, InMemoryStore, ToolRunner, UserIdentity,
};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use crate::cli::Args;

#[derive(Debug, thiserror::Error)]
enum ConsoleError {
    #[error("failed to read fixtures {path}: {source}")]
    FixturesUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid fixtures {path}: {source}")]
    FixturesInvalid {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("console input failed: {0}")]
    Io(#[from] std::io::Error),
}

fn init_logging(args: &Args, config: &ConsoleConfig) {
    let level = args
        .log_level
        .as_deref()
        .and_then(|level| level.parse::<LogLevel>().ok())
        .unwrap_or(config.logging.level);
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.directive()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_fixtures(path: Option<&Path>) -> Result<InMemoryDirectory, ConsoleError> {
    let Some(path) = path else {
        return Ok(InMemoryDirectory::new());
    };
    let raw = std::fs::read_to_string(path).map_err(|source| ConsoleError::FixturesUnreadable {
        path: path.to_path_buf(),
        source,
    })?;
    let seed: DirectorySeed =
        serde_json::from_str(&raw).map_err(|source| ConsoleError::FixturesInvalid {
            path: path.to_path_buf(),
            source,
        })?;
    info!(
        services = seed.services.len(),
        environments = seed.environments.len(),
        incidents = seed.incidents.len(),
        runbooks = seed.runbooks.len(),
        "Loaded fixtures"
    );
    Ok(InMemoryDirectory::from_seed(seed))
}

async fn run(args: Args, config: ConsoleConfig) -> Result<(), ConsoleError> {
    debug!(config = %solomon_config::config_to_json(&config), "Effective configuration");
    let directory = load_fixtures(args.fixtures.as_deref())?;
    let collaborators = Collaborators::new(
        Arc::new(directory),
        Arc::new(DirectiveModel::new()),
        ToolRunner::new().with_fallback(DryRunHandler::new("dry-run")),
        Arc::new(InMemoryStore::new()),
    );
    let engine = Arc::new(Engine::new(&config, collaborators));

    let grant = engine.grant_for(args.roles.as_slice());
    let mut request =
        CreateSessionRequest::new(UserIdentity::new(args.user.clone(), args.roles.clone()), grant);
    if let (Some(kind), Some(id)) = (args.context_kind, args.context_id) {
        request = request.with_context(kind, id);
    }
    let summary = engine.create_session(request).await?;
    repl::print_json(&summary);

    let mut events = engine.subscribe(summary.id)?;
    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            repl::print_json(&event);
        }
    });

    // Spawn idle session reaper.
    let reaper_engine = Arc::clone(&engine);
    let interval = Duration::from_secs(engine.config().reaper_interval_secs);
    let reaper = tokio::spawn(async move {
        loop {
            tokio::time::sleep(interval).await;
            let reaped = reaper_engine.reap_idle().await;
            debug!(reaped, "Reaper tick");
        }
    });

    let outcome = repl::run(&engine, summary.id, &args.user).await;

    reaper.abort();
    engine.terminate_session(summary.id).await;
    engine.shutdown().await;
    if let Err(e) = printer.await {
        debug!(error = %e, "Event printer stopped abnormally");
    }
    outcome.map_err(ConsoleError::from)
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = cli::parse();

    let config = match solomon_config::load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("solomon-console: {e}");
            return ExitCode::FAILURE;
        }
    };
    init_logging(&args, &config);

    match run(args, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "solomon-console failed");
            ExitCode::FAILURE
        }
    }
}
