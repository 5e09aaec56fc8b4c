//! Line-oriented operator console on stdin.

use solomon_common::{ActionId, SessionId};
use solomon_engine::Engine;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Say(String),
    Approve(ActionId),
    Reject { action: ActionId, reason: String },
    Show,
    Sessions,
    Quit,
}

/// Parse one input line. Blank lines yield `Ok(None)`.
pub fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Ok(Some(Command::Say(line.to_string())));
    };

    let (name, args) = match rest.split_once(char::is_whitespace) {
        Some((name, args)) => (name, args.trim()),
        None => (rest, ""),
    };
    let command = match name {
        "approve" => Command::Approve(parse_action_id(args)?),
        "reject" => {
            let (id, reason) = args.split_once(char::is_whitespace).unwrap_or((args, ""));
            let reason = reason.trim();
            if reason.is_empty() {
                return Err("usage: /reject <action-id> <reason>".into());
            }
            Command::Reject {
                action: parse_action_id(id)?,
                reason: reason.to_string(),
            }
        }
        "show" => Command::Show,
        "sessions" => Command::Sessions,
        "quit" | "exit" => Command::Quit,
        other => return Err(format!("unknown command '/{other}'")),
    };
    Ok(Some(command))
}

fn parse_action_id(raw: &str) -> Result<ActionId, String> {
    if raw.is_empty() {
        return Err("missing action id".into());
    }
    raw.parse()
        .map_err(|e| format!("invalid action id '{raw}': {e}"))
}

/// Read commands until `/quit` or end of input.
pub async fn run(engine: &Engine, session: SessionId, user: &str) -> std::io::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                eprintln!("{e}");
                continue;
            }
        };
        if command == Command::Quit {
            break;
        }
        execute(engine, session, user, command).await;
    }

    info!(session = %session, "Console closing");
    Ok(())
}

async fn execute(engine: &Engine, session: SessionId, user: &str, command: Command) {
    let outcome = match command {
        Command::Say(text) => engine.send_message(session, text).await,
        Command::Approve(action) => engine
            .approve_action(session, action, user)
            .await
            .map(|_| ()),
        Command::Reject { action, reason } => engine
            .reject_action(session, action, &reason)
            .await
            .map(|_| ()),
        Command::Show => engine
            .session_snapshot(session)
            .map(|snapshot| print_json(&snapshot)),
        Command::Sessions => {
            print_json(&engine.list_active_sessions());
            Ok(())
        }
        Command::Quit => Ok(()),
    };
    if let Err(e) = outcome {
        warn!(session = %session, error = %e, "Command failed");
        eprintln!("error: {e}");
    }
}

pub fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string(value) {
        Ok(line) => println!("{line}"),
        Err(e) => warn!(error = %e, "Failed to serialize console output"),
    }
}
