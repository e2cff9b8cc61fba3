//! # Message Model
//!
//! The render model for a conversation. Every entry the backend can produce
//! is one variant of [`Message`], discriminated on the wire by `type`:
//!
//! ```text
//! Message
//! ├── Text        { role, content, sources[], prompts[] }
//! ├── ToolUse     { role: ai, tool_id, tool_name, tool_args, content }
//! ├── ToolResult  { role: ai, tool_id, tool_name, tool_result }
//! └── ChooseAgent { role: ai, agent, content }
//! ```
//!
//! The same shape is used for live turns and for history fetched from the
//! session API, so it round-trips through serde unchanged.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Text of an id sent either as a JSON string or as a number.
pub(crate) fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Tool ids: backends send strings, some send numbers.
pub(crate) fn lenient_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    id_text(&value).ok_or_else(|| D::Error::custom(format!("expected string or number id, got {value}")))
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Human,
    Ai,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TextMessage {
    pub role: Role,
    #[serde(default)]
    pub content: String,
    /// Retrieval results backing this answer (law search records).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<Value>,
    /// Suggested follow-up queries.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prompts: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ToolUseMessage {
    pub role: Role,
    /// Human-readable label, e.g. "Searching statutes".
    #[serde(default)]
    pub content: String,
    #[serde(deserialize_with = "lenient_id")]
    pub tool_id: String,
    pub tool_name: String,
    #[serde(default)]
    pub tool_args: Value,
}

impl ToolUseMessage {
    /// Stable key used to track expand/collapse and panel selection.
    pub fn disclosure_key(&self) -> String {
        format!("tool-{}-{}", self.tool_name, self.tool_id)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ToolResultMessage {
    pub role: Role,
    #[serde(default)]
    pub content: String,
    #[serde(deserialize_with = "lenient_id")]
    pub tool_id: String,
    #[serde(default)]
    pub tool_name: String,
    /// Either a plain string (often JSON-encoded) or a structured payload.
    #[serde(default)]
    pub tool_result: Value,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ChooseAgentMessage {
    pub role: Role,
    pub agent: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    Text(TextMessage),
    ToolUse(ToolUseMessage),
    ToolResult(ToolResultMessage),
    ChooseAgent(ChooseAgentMessage),
}

impl Message {
    pub fn human(content: impl Into<String>) -> Self {
        Message::Text(TextMessage {
            role: Role::Human,
            content: content.into(),
            sources: Vec::new(),
            prompts: Vec::new(),
        })
    }

    pub fn ai_text(content: impl Into<String>) -> Self {
        Message::Text(TextMessage {
            role: Role::Ai,
            content: content.into(),
            sources: Vec::new(),
            prompts: Vec::new(),
        })
    }

    pub fn role(&self) -> Role {
        match self {
            Message::Text(m) => m.role,
            Message::ToolUse(m) => m.role,
            Message::ToolResult(m) => m.role,
            Message::ChooseAgent(m) => m.role,
        }
    }

    pub fn content(&self) -> &str {
        match self {
            Message::Text(m) => &m.content,
            Message::ToolUse(m) => &m.content,
            Message::ToolResult(m) => &m.content,
            Message::ChooseAgent(m) => &m.content,
        }
    }

    pub fn is_human(&self) -> bool {
        self.role() == Role::Human
    }

    /// True for the assistant text bubble that streamed chunks accumulate into.
    pub fn is_ai_text(&self) -> bool {
        matches!(self, Message::Text(m) if m.role == Role::Ai)
    }

    pub fn as_tool_result(&self) -> Option<&ToolResultMessage> {
        match self {
            Message::ToolResult(m) => Some(m),
            _ => None,
        }
    }
}
