use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::core::message::id_text;

/// One `data: ` line from the chat stream, as sent by the backend.
///
/// The backend is loose about shape: any subset of these fields may be
/// present on a single line, so everything is optional and the typed
/// events are derived afterwards by [`RawEvent::into_events`].
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
pub struct RawEvent {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub chunk: Option<String>,
    #[serde(default)]
    pub done: Option<bool>,
    #[serde(default)]
    pub content: Option<Value>,
    #[serde(default, deserialize_with = "lenient_id")]
    pub tool_id: Option<String>,
    #[serde(default)]
    pub tool_name: Option<String>,
    #[serde(default)]
    pub tool_args: Option<Value>,
    #[serde(default)]
    pub tool_result: Option<Value>,
    #[serde(default)]
    pub agent: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Accepts ids sent either as strings or as numbers.
fn lenient_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(deserializer)?
        .as_ref()
        .and_then(id_text))
}

/// A typed event the reducer knows how to apply.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    StartResponse,
    Chunk(String),
    Done,
    Text(String),
    ToolUse {
        tool_id: String,
        tool_name: String,
        tool_args: Value,
        content: String,
    },
    ToolResult {
        tool_id: String,
        tool_name: String,
        tool_result: Value,
    },
    Prompts(Vec<String>),
    ChooseAgent {
        agent: String,
        content: String,
    },
    /// Server-side failure reported in-band.
    Error(String),
}

fn content_string(content: &Option<Value>) -> String {
    match content {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

impl RawEvent {
    /// Expands one wire record into the typed events it carries, in the
    /// fixed order: start_response, chunk, done, then the `type`-specific event.
    pub fn into_events(self) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        let kind = self.kind.as_deref().unwrap_or_default();

        if kind == "start_response" {
            events.push(StreamEvent::StartResponse);
        }
        if let Some(chunk) = &self.chunk
            && !chunk.is_empty()
        {
            events.push(StreamEvent::Chunk(chunk.clone()));
        }
        if self.done == Some(true) {
            events.push(StreamEvent::Done);
        }

        match kind {
            "text" => events.push(StreamEvent::Text(content_string(&self.content))),
            "tool_use" => events.push(StreamEvent::ToolUse {
                tool_id: self.tool_id.clone().unwrap_or_default(),
                tool_name: self.tool_name.clone().unwrap_or_default(),
                tool_args: self.tool_args.clone().unwrap_or(Value::Null),
                content: content_string(&self.content),
            }),
            "tool_result" => events.push(StreamEvent::ToolResult {
                tool_id: self.tool_id.clone().unwrap_or_default(),
                tool_name: self.tool_name.clone().unwrap_or_default(),
                tool_result: self.tool_result.clone().unwrap_or(Value::Null),
            }),
            "prompts" => {
                let prompts = match &self.content {
                    Some(Value::Array(items)) => items
                        .iter()
                        .filter_map(|v| v.as_str().map(str::to_string))
                        .collect(),
                    _ => Vec::new(),
                };
                events.push(StreamEvent::Prompts(prompts));
            }
            "choose_agent" => events.push(StreamEvent::ChooseAgent {
                agent: self.agent.clone().unwrap_or_default(),
                content: content_string(&self.content),
            }),
            "error" => events.push(StreamEvent::Error(
                self.message
                    .clone()
                    .unwrap_or_else(|| content_string(&self.content)),
            )),
            _ => {}
        }

        events
    }
}
