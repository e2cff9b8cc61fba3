//! # Tool Correlation
//!
//! Pairs a `tool_use` with its `tool_result` by `(tool_name, tool_id)`.
//!
//! History and the current list form one timeline, history first. A tool
//! use found on that timeline pairs with the first matching result after
//! it, up to the next tool use with the same key: ids are only unique
//! within a turn, so a later turn reusing one must not inherit an older
//! result. A tool use held outside both lists falls back to the first
//! matching result, current list first, then history. No match means the
//! tool is still pending.
//!
//! [`find_tool_result`] scans linearly, which is fine for tens of messages.
//! [`ToolIndex`] builds the same lookup once for callers that resolve every
//! tool use in a long transcript.

use std::collections::HashMap;
use std::ptr;

use serde_json::Value;

use crate::core::message::{Message, ToolResultMessage, ToolUseMessage};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ToolStatus<'a> {
    Pending,
    Completed(&'a ToolResultMessage),
}

impl ToolStatus<'_> {
    pub fn is_pending(&self) -> bool {
        matches!(self, ToolStatus::Pending)
    }
}

fn pairs_with(result: &ToolResultMessage, tool_use: &ToolUseMessage) -> bool {
    result.tool_name == tool_use.tool_name && result.tool_id == tool_use.tool_id
}

fn same_key(a: &ToolUseMessage, b: &ToolUseMessage) -> bool {
    a.tool_name == b.tool_name && a.tool_id == b.tool_id
}

fn is_this_use(message: &Message, tool_use: &ToolUseMessage) -> bool {
    matches!(message, Message::ToolUse(t) if ptr::eq(t, tool_use))
}

/// Finds the result for `tool_use`.
pub fn find_tool_result<'a>(
    tool_use: &ToolUseMessage,
    current: &'a [Message],
    history: &'a [Message],
) -> Option<&'a ToolResultMessage> {
    let timeline = || history.iter().chain(current.iter());
    match timeline().position(|m| is_this_use(m, tool_use)) {
        Some(at) => timeline()
            .skip(at + 1)
            .map_while(|m| match m {
                Message::ToolUse(other) if same_key(other, tool_use) => None,
                _ => Some(m),
            })
            .filter_map(Message::as_tool_result)
            .find(|result| pairs_with(result, tool_use)),
        None => current
            .iter()
            .chain(history.iter())
            .filter_map(Message::as_tool_result)
            .find(|result| pairs_with(result, tool_use)),
    }
}

pub fn tool_status<'a>(
    tool_use: &ToolUseMessage,
    current: &'a [Message],
    history: &'a [Message],
) -> ToolStatus<'a> {
    match find_tool_result(tool_use, current, history) {
        Some(result) => ToolStatus::Completed(result),
        None => ToolStatus::Pending,
    }
}

/// Every payload produced by `tool_name`, current turn first, then history.
pub fn collect_tool_results<'a>(
    tool_name: &str,
    current: &'a [Message],
    history: &'a [Message],
) -> Vec<&'a Value> {
    current
        .iter()
        .chain(history.iter())
        .filter_map(Message::as_tool_result)
        .filter(|result| result.tool_name == tool_name)
        .map(|result| &result.tool_result)
        .collect()
}

/// Finds a tool use by its disclosure key (`tool-<name>-<id>`).
pub fn find_tool_use<'a>(
    key: &str,
    current: &'a [Message],
    history: &'a [Message],
) -> Option<&'a ToolUseMessage> {
    current
        .iter()
        .chain(history.iter())
        .find_map(|m| match m {
            Message::ToolUse(tool) if tool.disclosure_key() == key => Some(tool),
            _ => None,
        })
}

type ToolKey<'a> = (&'a str, &'a str);

/// Precomputed tool-use to result lookup, same answers as [`find_tool_result`].
#[derive(Debug, Default)]
pub struct ToolIndex<'a> {
    /// Tool uses on the timeline, by address, with their paired result.
    paired: HashMap<*const ToolUseMessage, Option<&'a ToolResultMessage>>,
    /// First result per key, current list first.
    by_key: HashMap<ToolKey<'a>, &'a ToolResultMessage>,
}

impl<'a> ToolIndex<'a> {
    pub fn build(current: &'a [Message], history: &'a [Message]) -> Self {
        let mut by_key = HashMap::new();
        for result in current
            .iter()
            .chain(history.iter())
            .filter_map(Message::as_tool_result)
        {
            by_key
                .entry((result.tool_name.as_str(), result.tool_id.as_str()))
                .or_insert(result);
        }

        let mut paired = HashMap::new();
        // Latest unanswered use per key; an older one is left pending.
        let mut open: HashMap<ToolKey<'a>, *const ToolUseMessage> = HashMap::new();
        for message in history.iter().chain(current.iter()) {
            match message {
                Message::ToolUse(tool) => {
                    let at = ptr::from_ref(tool);
                    paired.insert(at, None);
                    open.insert((tool.tool_name.as_str(), tool.tool_id.as_str()), at);
                }
                Message::ToolResult(result) => {
                    if let Some(at) = open.remove(&(result.tool_name.as_str(), result.tool_id.as_str())) {
                        paired.insert(at, Some(result));
                    }
                }
                _ => {}
            }
        }

        Self { paired, by_key }
    }

    pub fn status(&self, tool_use: &ToolUseMessage) -> ToolStatus<'a> {
        let found = match self.paired.get(&ptr::from_ref(tool_use)) {
            Some(result) => *result,
            None => self
                .by_key
                .get(&(tool_use.tool_name.as_str(), tool_use.tool_id.as_str()))
                .copied(),
        };
        match found {
            Some(result) => ToolStatus::Completed(result),
            None => ToolStatus::Pending,
        }
    }

    /// Number of distinct `(tool_name, tool_id)` results.
    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}
