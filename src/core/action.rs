//! # Actions
//!
//! Everything that can happen during a chat becomes an `Action`.
//! User submits a query? That's `Action::Submit(query)`.
//! The stream delivers an event? That's `Action::Stream(event)`.
//!
//! The `update()` function takes the current state and an action, mutates
//! the state, and returns an `Effect` telling the adapter what to do next.
//! No side effects here. I/O happens elsewhere.
//!
//! ```text
//! State + Action  →  update()  →  New State + Effect
//! ```

use log::{debug, info, warn};
use uuid::Uuid;

use crate::core::history::SessionSummary;
use crate::core::reducer::Transition;
use crate::core::state::ChatState;
use crate::inference::StreamEvent;

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// User submitted a query.
    Submit(String),
    /// The provider delivered a decoded event.
    Stream(StreamEvent),
    /// The provider finished; `Err` carries a transport failure.
    StreamEnded(Result<(), String>),
    /// User asked to stop the running turn.
    Stop,
    /// Switch to a saved session: its messages become history.
    LoadSession(SessionSummary),
    /// Start over with an empty chat.
    NewChat,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    None,
    /// Start streaming `query` for the turn `turn_id`.
    StartStream { turn_id: Uuid, query: String },
    /// The message list changed.
    Render(Transition),
    /// The turn is over. `error` is set if it failed.
    TurnComplete { error: Option<String> },
}

pub fn update(state: &mut ChatState, action: Action) -> Effect {
    match action {
        Action::Submit(query) => {
            let query = query.trim();
            if query.is_empty() {
                return Effect::None;
            }
            if state.is_busy() {
                warn!("Submit ignored: a turn is already in flight");
                return Effect::None;
            }
            state.stop.reset();
            state.error = None;
            state.is_chat_loading = true;
            let turn_id = state.transcript.begin_turn(query);
            info!("Turn {} submitted ({} chars)", turn_id, query.len());
            Effect::StartStream {
                turn_id,
                query: query.to_string(),
            }
        }
        Action::Stream(event) => {
            if !state.is_chat_loading {
                debug!("Event after turn ended, dropped: {:?}", event);
                return Effect::None;
            }
            if state.stop.is_stopped() {
                debug!("Event after stop, dropped: {:?}", event);
                return Effect::None;
            }
            let finishing = event == StreamEvent::Done;
            state.is_streaming = !finishing;
            let transition = state.transcript.apply(event);
            if let Transition::Failed(message) = &transition {
                warn!("Server reported error: {}", message);
                state.error = Some(message.clone());
            }
            Effect::Render(transition)
        }
        Action::StreamEnded(result) => {
            state.is_chat_loading = false;
            state.is_streaming = false;
            state.stop.reset();
            if let Err(message) = result {
                warn!("Turn failed: {}", message);
                state.error = Some(message);
            }
            Effect::TurnComplete {
                error: state.error.clone(),
            }
        }
        Action::Stop => {
            if state.is_busy() {
                info!("Stop requested");
                state.stop.stop();
            }
            Effect::None
        }
        Action::LoadSession(summary) => {
            if state.is_busy() {
                warn!("Cannot switch sessions while a turn is in flight");
                return Effect::None;
            }
            info!(
                "Loaded session {} ({} messages)",
                summary.session_id,
                summary.messages.len()
            );
            state.session_id = Some(summary.session_id);
            state.history = summary.messages;
            state.transcript.clear();
            state.error = None;
            Effect::None
        }
        Action::NewChat => {
            if state.is_busy() {
                warn!("Cannot start a new chat while a turn is in flight");
                return Effect::None;
            }
            state.session_id = None;
            state.history.clear();
            state.transcript.clear();
            state.error = None;
            Effect::None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::Message;
    use crate::test_support::test_state;
    use serde_json::json;

    fn run(state: &mut ChatState, events: Vec<StreamEvent>) {
        for event in events {
            update(state, Action::Stream(event));
        }
    }

    #[test]
    fn test_hello_turn() {
        let mut state = test_state();
        let effect = update(&mut state, Action::Submit("hi".into()));
        assert!(matches!(effect, Effect::StartStream { ref query, .. } if query == "hi"));
        assert!(state.is_chat_loading);

        run(
            &mut state,
            vec![
                StreamEvent::StartResponse,
                StreamEvent::Chunk("Hel".into()),
                StreamEvent::Chunk("lo".into()),
            ],
        );
        assert!(state.is_streaming);
        update(&mut state, Action::Stream(StreamEvent::Done));
        assert!(!state.is_streaming);

        let last = state.current().last().unwrap();
        assert!(last.is_ai_text());
        assert_eq!(last.content(), "Hello");
        assert_eq!(state.current().iter().filter(|m| m.is_ai_text()).count(), 1);

        let effect = update(&mut state, Action::StreamEnded(Ok(())));
        assert_eq!(effect, Effect::TurnComplete { error: None });
        assert!(!state.is_busy());
    }

    #[test]
    fn test_empty_submit_ignored() {
        let mut state = test_state();
        assert_eq!(update(&mut state, Action::Submit("   ".into())), Effect::None);
        assert!(state.current().is_empty());
    }

    #[test]
    fn test_submit_while_busy_ignored() {
        let mut state = test_state();
        update(&mut state, Action::Submit("one".into()));
        assert_eq!(update(&mut state, Action::Submit("two".into())), Effect::None);
        assert_eq!(state.current().len(), 1);
    }

    #[test]
    fn test_transport_error_resets_flags() {
        let mut state = test_state();
        update(&mut state, Action::Submit("q".into()));
        update(&mut state, Action::Stream(StreamEvent::Chunk("part".into())));
        let effect = update(&mut state, Action::StreamEnded(Err("network error: reset".into())));
        assert_eq!(
            effect,
            Effect::TurnComplete { error: Some("network error: reset".into()) }
        );
        assert!(!state.is_chat_loading && !state.is_streaming);
        // Partial content survives.
        assert_eq!(state.current().last().unwrap().content(), "part");
    }

    #[test]
    fn test_in_band_error_is_reported_at_turn_end() {
        let mut state = test_state();
        update(&mut state, Action::Submit("q".into()));
        update(&mut state, Action::Stream(StreamEvent::Error("agent failed".into())));
        let effect = update(&mut state, Action::StreamEnded(Ok(())));
        assert_eq!(effect, Effect::TurnComplete { error: Some("agent failed".into()) });
    }

    #[test]
    fn test_stop_sets_signal_only_while_busy() {
        let mut state = test_state();
        update(&mut state, Action::Stop);
        assert!(!state.stop.is_stopped());

        update(&mut state, Action::Submit("q".into()));
        let provider_side = state.stop.clone();
        update(&mut state, Action::Stop);
        assert!(provider_side.is_stopped());

        update(&mut state, Action::StreamEnded(Ok(())));
        assert!(!provider_side.is_stopped());
    }

    #[test]
    fn test_events_after_stop_dropped() {
        let mut state = test_state();
        update(&mut state, Action::Submit("q".into()));
        update(&mut state, Action::Stream(StreamEvent::Chunk("kept".into())));
        update(&mut state, Action::Stop);
        assert_eq!(
            update(&mut state, Action::Stream(StreamEvent::Chunk(" late".into()))),
            Effect::None
        );
        assert_eq!(state.current().last().unwrap().content(), "kept");

        update(&mut state, Action::StreamEnded(Ok(())));
        assert!(!state.is_busy());
    }

    #[test]
    fn test_events_after_turn_end_dropped() {
        let mut state = test_state();
        update(&mut state, Action::Submit("q".into()));
        update(&mut state, Action::StreamEnded(Ok(())));
        assert_eq!(
            update(&mut state, Action::Stream(StreamEvent::Chunk("late".into()))),
            Effect::None
        );
        assert_eq!(state.current().len(), 1);
    }

    #[test]
    fn test_load_session_replaces_history_and_clears_current() {
        let mut state = test_state();
        update(&mut state, Action::Submit("q".into()));
        update(&mut state, Action::StreamEnded(Ok(())));

        let summary: SessionSummary = serde_json::from_value(json!({
            "sessionId": "s-9",
            "title": "Leases",
            "messages": [{"type": "text", "role": "human", "content": "old"}],
            "updatedAt": "2026-10-01T10:00:00Z"
        }))
        .unwrap();
        update(&mut state, Action::LoadSession(summary));
        assert_eq!(state.session_id.as_deref(), Some("s-9"));
        assert_eq!(state.history, vec![Message::human("old")]);
        assert!(state.current().is_empty());

        update(&mut state, Action::NewChat);
        assert!(state.session_id.is_none());
        assert!(state.history.is_empty());
    }
}
