//! # Reducer
//!
//! Folds stream events into the message list, one event at a time:
//!
//! ```text
//! Transcript + StreamEvent  →  apply()  →  Transcript' + Transition
//! ```
//!
//! The list is append-only. The one in-place mutation is appending a chunk
//! (or attaching prompts) to the turn's open text bubble: the AI text
//! message most recently appended in the current turn, provided nothing
//! else has been appended since. Tool events always become their own
//! entries so each stays addressable for correlation.

use log::{debug, warn};
use uuid::Uuid;

use crate::core::message::{
    ChooseAgentMessage, Message, Role, TextMessage, ToolResultMessage, ToolUseMessage,
};
use crate::core::tools::{LAW_SEARCH_TOOL, result_records};
use crate::inference::StreamEvent;

/// What an applied event did to the list.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// A new message was appended at this index.
    Pushed(usize),
    /// Text was appended to the message at this index.
    Extended { index: usize, text: String },
    /// Follow-up prompts were attached to the message at this index.
    PromptsAttached(usize),
    /// The server signalled end of turn.
    Finished,
    /// The server reported an in-band failure.
    Failed(String),
    /// The event was dropped (duplicate tool event).
    Ignored,
}

/// Ordered message list plus the accumulator state of the active turn.
#[derive(Debug, Clone)]
pub struct Transcript {
    messages: Vec<Message>,
    turn_id: Uuid,
    /// Index of the first message belonging to the active turn.
    turn_start: usize,
    /// The AI text bubble chunks currently accumulate into.
    open_text: Option<usize>,
    /// Tool whose results are attached as answer sources.
    sources_tool: String,
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new(LAW_SEARCH_TOOL)
    }
}

impl Transcript {
    pub fn new(sources_tool: impl Into<String>) -> Self {
        Self {
            messages: Vec::new(),
            turn_id: Uuid::new_v4(),
            turn_start: 0,
            open_text: None,
            sources_tool: sources_tool.into(),
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn turn_id(&self) -> Uuid {
        self.turn_id
    }

    /// Messages belonging to the active turn.
    pub fn turn_messages(&self) -> &[Message] {
        &self.messages[self.turn_start..]
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Drops every message and starts a fresh accumulator.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.turn_start = 0;
        self.open_text = None;
        self.turn_id = Uuid::new_v4();
    }

    /// Starts a new turn with the human query and returns its id.
    pub fn begin_turn(&mut self, query: &str) -> Uuid {
        self.turn_id = Uuid::new_v4();
        self.turn_start = self.messages.len();
        self.open_text = None;
        self.push(Message::human(query));
        debug!("Turn {} started at index {}", self.turn_id, self.turn_start);
        self.turn_id
    }

    fn push(&mut self, message: Message) -> usize {
        let index = self.messages.len();
        self.open_text = message.is_ai_text().then_some(index);
        self.messages.push(message);
        index
    }

    fn open_text_mut(&mut self) -> Option<(usize, &mut TextMessage)> {
        let index = self.open_text?;
        match self.messages.get_mut(index) {
            Some(Message::Text(text)) if text.role == Role::Ai => Some((index, text)),
            _ => None,
        }
    }

    /// First non-empty result of the sources tool after the turn's last human message.
    fn turn_sources(&self) -> Vec<serde_json::Value> {
        let from = self
            .messages
            .iter()
            .rposition(Message::is_human)
            .map_or(self.turn_start, |i| i + 1);
        self.messages[from..]
            .iter()
            .filter_map(Message::as_tool_result)
            .find(|r| r.tool_name == self.sources_tool && !is_blank(&r.tool_result))
            .map(|r| result_records(&r.tool_result))
            .unwrap_or_default()
    }

    fn turn_has_tool_use(&self, name: &str, id: &str) -> bool {
        self.turn_messages().iter().any(|m| {
            matches!(m, Message::ToolUse(t) if t.tool_name == name && t.tool_id == id)
        })
    }

    fn turn_has_tool_result(&self, name: &str, id: &str) -> bool {
        self.turn_messages().iter().any(|m| {
            matches!(m, Message::ToolResult(t) if t.tool_name == name && t.tool_id == id)
        })
    }

    /// Applies one event and reports what changed.
    pub fn apply(&mut self, event: StreamEvent) -> Transition {
        match event {
            StreamEvent::StartResponse => {
                let sources = self.turn_sources();
                Transition::Pushed(self.push(Message::Text(TextMessage {
                    role: Role::Ai,
                    content: String::new(),
                    sources,
                    prompts: Vec::new(),
                })))
            }
            StreamEvent::Chunk(chunk) => match self.open_text_mut() {
                Some((index, text)) => {
                    text.content.push_str(&chunk);
                    Transition::Extended { index, text: chunk }
                }
                None => Transition::Pushed(self.push(Message::ai_text(chunk))),
            },
            StreamEvent::Done => Transition::Finished,
            StreamEvent::Text(content) => Transition::Pushed(self.push(Message::ai_text(content))),
            StreamEvent::ToolUse {
                tool_id,
                tool_name,
                tool_args,
                content,
            } => {
                if self.turn_has_tool_use(&tool_name, &tool_id) {
                    warn!("Duplicate tool_use {}/{} in turn, dropped", tool_name, tool_id);
                    return Transition::Ignored;
                }
                Transition::Pushed(self.push(Message::ToolUse(ToolUseMessage {
                    role: Role::Ai,
                    content,
                    tool_id,
                    tool_name,
                    tool_args,
                })))
            }
            StreamEvent::ToolResult {
                tool_id,
                tool_name,
                tool_result,
            } => {
                if self.turn_has_tool_result(&tool_name, &tool_id) {
                    warn!("Duplicate tool_result {}/{} in turn, dropped", tool_name, tool_id);
                    return Transition::Ignored;
                }
                Transition::Pushed(self.push(Message::ToolResult(ToolResultMessage {
                    role: Role::Ai,
                    content: String::new(),
                    tool_id,
                    tool_name,
                    tool_result,
                })))
            }
            StreamEvent::Prompts(prompts) => match self.open_text_mut() {
                Some((index, text)) => {
                    text.prompts = prompts;
                    Transition::PromptsAttached(index)
                }
                None => Transition::Pushed(self.push(Message::Text(TextMessage {
                    role: Role::Ai,
                    content: String::new(),
                    sources: Vec::new(),
                    prompts,
                }))),
            },
            StreamEvent::ChooseAgent { agent, content } => {
                Transition::Pushed(self.push(Message::ChooseAgent(ChooseAgentMessage {
                    role: Role::Ai,
                    agent,
                    content,
                })))
            }
            StreamEvent::Error(message) => Transition::Failed(message),
        }
    }
}

fn is_blank(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => true,
        serde_json::Value::String(s) => s.is_empty(),
        _ => false,
    }
}
