//! # CLI Adapter
//!
//! Bridges the terminal and the core. Reads input, turns it into actions,
//! runs the provider task the effects ask for, and prints what changed.
//!
//! ```text
//! stdin ──→ Action::Submit ──→ update() ──→ Effect::StartStream
//!                                              │
//!               ┌──────────────────────────────┘
//!               ▼
//!      provider task ──mpsc──→ Action::Stream ──→ update() ──→ TurnPrinter
//! ```

pub mod markdown;
pub mod render;

use std::error::Error;
use std::io::{self, Write};
use std::sync::Arc;

use log::{debug, info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::api::{RenameOutcome, SessionClient};
use crate::core::action::{Action, Effect, update};
use crate::core::config::ResolvedConfig;
use crate::core::history::HistoryStore;
use crate::core::state::ChatState;
use crate::core::title::TitleEditor;
use crate::inference::{ChatProvider, ChatRequest, LensProvider, StreamEvent};
use render::TurnPrinter;

pub type CliResult = Result<(), Box<dyn Error>>;

/// Column width used for wrapping.
pub const WRAP_WIDTH: usize = 100;

/// Runs one turn: submits `query`, streams events into the state and
/// prints them as they land.
///
/// The first Ctrl-C asks the provider to stop; a second one aborts the task.
pub async fn run_turn<W: Write>(
    provider: Arc<dyn ChatProvider>,
    state: &mut ChatState,
    query: &str,
    printer: &mut TurnPrinter<W>,
) -> io::Result<()> {
    let Effect::StartStream { turn_id, query } = update(state, Action::Submit(query.to_string()))
    else {
        return Ok(());
    };
    info!("Streaming turn {} via {}", turn_id, provider.name());

    let params = state.request_params();
    let stop = state.stop.clone();
    let (tx, mut rx) = mpsc::channel::<StreamEvent>(100);

    let handle = tokio::spawn(async move {
        let request = ChatRequest {
            query: &query,
            extra_params: &params,
        };
        provider.stream_chat(request, tx, stop).await
    });

    let mut interrupted = false;
    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Some(event) => {
                    let effect = update(state, Action::Stream(event));
                    printer.show(&effect, state.current(), &state.history)?;
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                if interrupted {
                    warn!("Second interrupt, aborting stream task");
                    handle.abort();
                    break;
                }
                interrupted = true;
                update(state, Action::Stop);
            }
        }
    }

    let result = match handle.await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(e.to_string()),
        Err(e) if e.is_cancelled() => Ok(()),
        Err(e) => Err(format!("stream task failed: {e}")),
    };
    debug!("Turn {} ended: {:?}", turn_id, result);
    let effect = update(state, Action::StreamEnded(result));
    printer.show(&effect, state.current(), &state.history)
}

fn require_user(config: &ResolvedConfig) -> Result<&str, Box<dyn Error>> {
    config
        .user_id
        .as_deref()
        .ok_or_else(|| "no user id: pass --user, set LENS_USER_ID or general.user_id".into())
}

fn session_client(config: &ResolvedConfig) -> SessionClient {
    SessionClient::new(&config.base_url, &config.session_path)
}

async fn load_store(config: &ResolvedConfig) -> Result<HistoryStore, Box<dyn Error>> {
    let user_id = require_user(config)?;
    let sessions = session_client(config).fetch_sessions(user_id).await?;
    Ok(HistoryStore::new(sessions))
}

/// `lens chat`: one query, or a prompt loop when `query` is `None`.
pub async fn chat(config: &ResolvedConfig, query: Option<String>, session: Option<String>) -> CliResult {
    let provider: Arc<dyn ChatProvider> = Arc::new(LensProvider::new(
        config.base_url.clone(),
        Some(config.stream_path.clone()),
        config.request_timeout,
    )?);
    let mut state = ChatState::new(&config.sources_tool, config.extra_params.clone());

    if let Some(session_id) = session {
        let store = load_store(config).await?;
        let summary = store
            .find(&session_id)
            .cloned()
            .ok_or_else(|| format!("no session {session_id}"))?;
        update(&mut state, Action::LoadSession(summary));
        println!("{}", render::render_transcript(&[], &state.history, WRAP_WIDTH));
        println!();
    }

    let mut printer = TurnPrinter::new(io::stdout(), WRAP_WIDTH);

    if let Some(query) = query {
        run_turn(provider, &mut state, &query, &mut printer).await?;
        return match state.error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        };
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        io::stdout().flush()?;
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            println!();
            break;
        };
        match line.trim() {
            "/quit" | "/exit" => break,
            "/new" => {
                update(&mut state, Action::NewChat);
                println!("Started a new chat.");
            }
            "/history" => {
                println!(
                    "{}",
                    render::render_transcript(state.current(), &state.history, WRAP_WIDTH)
                );
            }
            "" => {}
            query => run_turn(provider.clone(), &mut state, query, &mut printer).await?,
        }
    }
    Ok(())
}

/// `lens sessions list`
pub async fn list_sessions(config: &ResolvedConfig) -> CliResult {
    let store = load_store(config).await?;
    let shown = store.sidebar();
    if shown.is_empty() {
        println!("No saved chats.");
    }
    for session in shown {
        let updated = session
            .updated_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("{}  {}  {}", session.session_id, updated, session.display_title());
    }
    Ok(())
}

/// `lens sessions show <id>`
pub async fn show_session(config: &ResolvedConfig, session_id: &str) -> CliResult {
    let store = load_store(config).await?;
    let session = store
        .find(session_id)
        .ok_or_else(|| format!("no session {session_id}"))?;
    println!("# {}", session.display_title());
    println!();
    println!("{}", render::render_transcript(&[], &session.messages, WRAP_WIDTH));
    Ok(())
}

/// `lens sessions rename <id> <title>`
pub async fn rename_session(config: &ResolvedConfig, session_id: &str, title: &str) -> CliResult {
    let user_id = require_user(config)?;
    let mut store = load_store(config).await?;
    let current = store
        .find(session_id)
        .map(|s| s.title.clone())
        .ok_or_else(|| format!("no session {session_id}"))?;

    let mut editor = TitleEditor::new(current);
    editor.begin();
    editor.set_draft(title);
    match session_client(config)
        .commit_title(user_id, session_id, &mut editor)
        .await
    {
        RenameOutcome::Renamed(title) => {
            store.rename(session_id, &title);
            println!("Renamed to \"{title}\".");
            Ok(())
        }
        RenameOutcome::Skipped => {
            println!("Title unchanged: \"{}\".", editor.shown());
            Ok(())
        }
        RenameOutcome::RolledBack(e) => {
            Err(format!("rename failed, title stays \"{}\": {e}", editor.shown()).into())
        }
    }
}

/// `lens sessions delete <id>`
pub async fn delete_session(config: &ResolvedConfig, session_id: &str) -> CliResult {
    let user_id = require_user(config)?;
    session_client(config).delete_session(user_id, session_id).await?;
    println!("Deleted {session_id}.");
    Ok(())
}

/// `lens health`
pub async fn health(config: &ResolvedConfig) -> CliResult {
    let client = session_client(config);
    let health = client.health().await?;
    println!(
        "backend: {} (version {})",
        health.status,
        health.version.as_deref().unwrap_or("unknown")
    );
    match client.agent_status().await {
        Ok(agent) => println!("agent: {}", agent.status),
        Err(e) => println!("agent: unavailable ({e})"),
    }
    if health.is_healthy() {
        Ok(())
    } else {
        Err(format!("backend reports {}", health.status).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::Message;
    use crate::test_support::{ScriptedProvider, test_state};
    use serde_json::json;

    fn printer() -> TurnPrinter<Vec<u8>> {
        TurnPrinter::new(Vec::new(), 80)
    }

    #[tokio::test]
    async fn test_run_turn_streams_into_state() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            StreamEvent::StartResponse,
            StreamEvent::Chunk("Hel".into()),
            StreamEvent::Chunk("lo".into()),
            StreamEvent::Done,
        ]));
        let mut state = test_state();
        let mut out = printer();

        run_turn(provider, &mut state, "hi", &mut out).await.unwrap();

        assert!(!state.is_busy());
        assert_eq!(state.current().len(), 2);
        assert_eq!(state.current()[1].content(), "Hello");
        let text = String::from_utf8(out.into_inner()).unwrap();
        assert!(text.contains("Hello"));
    }

    #[tokio::test]
    async fn test_run_turn_correlates_tools() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            StreamEvent::ToolUse {
                tool_id: "7".into(),
                tool_name: "search_laws".into(),
                tool_args: json!({"query": "lease"}),
                content: "Searching statutes".into(),
            },
            StreamEvent::ToolResult {
                tool_id: "7".into(),
                tool_name: "search_laws".into(),
                tool_result: json!("[{\"law_name\":\"Civil Code\",\"article_title\":\"Art. 1\",\"distance\":0.1}]"),
            },
            StreamEvent::StartResponse,
            StreamEvent::Chunk("Answer".into()),
            StreamEvent::Done,
        ]));
        let mut state = test_state();
        let mut out = printer();

        run_turn(provider, &mut state, "lease law", &mut out).await.unwrap();

        match state.current().last().unwrap() {
            Message::Text(text) => {
                assert_eq!(text.content, "Answer");
                assert_eq!(text.sources.len(), 1);
            }
            other => panic!("expected text, got {:?}", other),
        }
        let text = String::from_utf8(out.into_inner()).unwrap();
        assert!(text.contains("Civil Code Art. 1 (90% match)"));
    }

    #[tokio::test]
    async fn test_run_turn_reports_transport_error() {
        let mut scripted = ScriptedProvider::new(vec![StreamEvent::Chunk("part".into())]);
        scripted.fail_with = Some("connection reset".into());
        let mut state = test_state();
        let mut out = printer();

        run_turn(Arc::new(scripted), &mut state, "q", &mut out).await.unwrap();

        assert!(!state.is_busy());
        assert_eq!(state.error.as_deref(), Some("network error: connection reset"));
        assert_eq!(state.current().last().unwrap().content(), "part");
        let text = String::from_utf8(out.into_inner()).unwrap();
        assert!(text.ends_with("Error: network error: connection reset\n"));
    }

    #[tokio::test]
    async fn test_blank_query_starts_nothing() {
        let provider = Arc::new(ScriptedProvider::new(vec![StreamEvent::Chunk("x".into())]));
        let mut state = test_state();
        let mut out = printer();

        run_turn(provider, &mut state, "   ", &mut out).await.unwrap();

        assert!(state.current().is_empty());
        assert!(out.into_inner().is_empty());
    }
}
