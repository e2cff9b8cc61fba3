//! # Chat State
//!
//! Everything the turn handler owns, in one place. No I/O happens here:
//! the adapter runs the provider and feeds results back as actions.
//!
//! ```text
//! ChatState
//! ├── transcript: Transcript      // current chat, grows turn by turn
//! ├── history: Vec<Message>       // loaded session, read-only
//! ├── session_id: Option<String>  // None = unsaved new chat
//! ├── is_chat_loading: bool       // a turn is in flight (input disabled)
//! ├── is_streaming: bool          // events are arriving
//! ├── stop: StopSignal            // shared with the running provider
//! ├── error: Option<String>       // last turn failure, user-visible
//! └── extra_params: Map           // merged into every request body
//! ```
//!
//! State changes only happen through `update(state, action)` in action.rs.

use serde_json::{Map, Value};

use crate::core::message::Message;
use crate::core::reducer::Transcript;
use crate::inference::StopSignal;

pub struct ChatState {
    pub transcript: Transcript,
    pub history: Vec<Message>,
    pub session_id: Option<String>,
    pub is_chat_loading: bool,
    pub is_streaming: bool,
    pub stop: StopSignal,
    pub error: Option<String>,
    pub extra_params: Map<String, Value>,
}

impl ChatState {
    pub fn new(sources_tool: &str, extra_params: Map<String, Value>) -> Self {
        Self {
            transcript: Transcript::new(sources_tool),
            history: Vec::new(),
            session_id: None,
            is_chat_loading: false,
            is_streaming: false,
            stop: StopSignal::new(),
            error: None,
            extra_params,
        }
    }

    /// True while a turn is in flight; new submissions are refused.
    pub fn is_busy(&self) -> bool {
        self.is_chat_loading || self.is_streaming
    }

    /// The current chat list (the turn being streamed plus earlier turns of this chat).
    pub fn current(&self) -> &[Message] {
        self.transcript.messages()
    }

    /// Request body params for the next turn, including the session id if known.
    pub fn request_params(&self) -> Map<String, Value> {
        let mut params = self.extra_params.clone();
        if let Some(id) = &self.session_id {
            params
                .entry("session_id".to_string())
                .or_insert_with(|| Value::String(id.clone()));
        }
        params
    }
}
