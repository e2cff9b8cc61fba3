//! Plain-text rendering of the message list.
//!
//! Two entry points: [`render_transcript`] draws a whole conversation (used
//! for saved sessions), [`TurnPrinter`] writes a live turn incrementally as
//! the reducer reports transitions.

use std::io::{self, Write};

use serde_json::Value;

use crate::cli::markdown;
use crate::core::action::Effect;
use crate::core::correlation::{ToolIndex, ToolStatus};
use crate::core::message::{Message, Role, TextMessage, ToolUseMessage};
use crate::core::reducer::Transition;
use crate::core::tools::{ToolOutcome, similarity_percent};

const RECORD_TEXT_LIMIT: usize = 200;

/// Label for browser-style tool actions.
pub fn action_label(tool_args: &Value) -> &'static str {
    match tool_args.get("action").and_then(Value::as_str) {
        Some("web_search") => "Searching",
        Some("go_to_url") => "Navigating",
        Some("scroll_down") => "Scrolling down",
        _ => "Processing",
    }
}

fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        text.to_string()
    } else {
        let cut: String = text.chars().take(limit).collect();
        format!("{cut}...")
    }
}

fn wrap_into(out: &mut Vec<String>, text: &str, indent: &str, width: usize) {
    let options = textwrap::Options::new(width)
        .initial_indent(indent)
        .subsequent_indent(indent);
    for line in textwrap::wrap(text, options) {
        out.push(line.into_owned());
    }
}

/// Describes a tool payload as indented lines.
pub fn render_tool_result(tool_name: &str, payload: &Value, width: usize) -> Vec<String> {
    let mut out = Vec::new();
    match ToolOutcome::classify(tool_name, payload) {
        ToolOutcome::Error(message) => out.push(format!("    Error: {message}")),
        ToolOutcome::Laws(laws) if laws.is_empty() => out.push("    No matching statutes.".into()),
        ToolOutcome::Laws(laws) => {
            for law in laws {
                out.push(format!(
                    "    {} {} ({}% match)",
                    law.law_name,
                    law.article_title,
                    similarity_percent(law.distance)
                ));
                let body = if law.snippet.is_empty() { &law.article_content } else { &law.snippet };
                if !body.is_empty() {
                    wrap_into(&mut out, &truncate(body, RECORD_TEXT_LIMIT), "      ", width);
                }
            }
        }
        ToolOutcome::Cases(cases) if cases.is_empty() => out.push("    No matching cases.".into()),
        ToolOutcome::Cases(cases) => {
            for case in cases {
                out.push(format!(
                    "    {} [{}] ({}% match)",
                    case.case_title,
                    case.chunk_label(),
                    similarity_percent(case.distance)
                ));
                if !case.chunk_text.is_empty() {
                    wrap_into(&mut out, &truncate(&case.chunk_text, RECORD_TEXT_LIMIT), "      ", width);
                }
            }
        }
        ToolOutcome::Records(items) => {
            for item in items {
                match item.get("title").and_then(Value::as_str) {
                    Some(title) => {
                        out.push(format!("    • {title}"));
                        if let Some(link) = item.get("link").and_then(Value::as_str) {
                            out.push(format!("      {link}"));
                        }
                        for key in ["text", "content"] {
                            if let Some(text) = item.get(key).and_then(Value::as_str) {
                                wrap_into(&mut out, &truncate(text, RECORD_TEXT_LIMIT), "      ", width);
                            }
                        }
                    }
                    None => {
                        let shown = match &item {
                            Value::String(s) => s.clone(),
                            other => other.to_string(),
                        };
                        wrap_into(&mut out, &format!("• {shown}"), "    ", width);
                    }
                }
            }
        }
        ToolOutcome::Fields(fields) => {
            for (key, value) in fields {
                wrap_into(&mut out, &format!("{key}: {value}"), "    ", width);
            }
        }
        ToolOutcome::Text(text) => {
            for line in markdown::render(&text, width.saturating_sub(4)) {
                out.push(format!("    {line}"));
            }
        }
    }
    out
}

fn tool_use_header(tool: &ToolUseMessage, status: &ToolStatus<'_>) -> String {
    let label = if tool.content.is_empty() {
        action_label(&tool.tool_args)
    } else {
        tool.content.as_str()
    };
    let marker = if status.is_pending() { "…" } else { "✓" };
    format!("  ▸ {label} {marker}  ({})", tool.tool_name)
}

fn render_text(out: &mut Vec<String>, text: &TextMessage, width: usize) {
    if text.role == Role::Human {
        out.push("You:".into());
        wrap_into(out, &text.content, "  ", width);
        return;
    }
    if !text.content.is_empty() {
        out.push("Lens:".into());
        for line in markdown::render(&text.content, width.saturating_sub(2)) {
            out.push(format!("  {line}"));
        }
    }
    if !text.sources.is_empty() {
        out.push(format!("  Sources: {}", text.sources.len()));
        for source in &text.sources {
            let name = source.get("law_name").and_then(Value::as_str).unwrap_or_default();
            let article = source.get("article_title").and_then(Value::as_str).unwrap_or_default();
            out.push(format!("    - {name} {article}").trim_end().to_string());
        }
    }
    render_prompts(out, &text.prompts);
}

fn render_prompts(out: &mut Vec<String>, prompts: &[String]) {
    if prompts.is_empty() {
        return;
    }
    out.push("  Suggested:".into());
    for prompt in prompts {
        out.push(format!("    - {prompt}"));
    }
}

/// Renders one message. Tool uses show their correlated result, or a
/// pending marker when none has arrived.
pub fn render_message(message: &Message, index: &ToolIndex<'_>, width: usize) -> Vec<String> {
    let mut out = Vec::new();
    match message {
        Message::Text(text) => render_text(&mut out, text, width),
        Message::ToolUse(tool) => {
            let status = index.status(tool);
            out.push(tool_use_header(tool, &status));
            if let ToolStatus::Completed(result) = status {
                out.extend(render_tool_result(&tool.tool_name, &result.tool_result, width));
            }
        }
        // Shown under their tool use.
        Message::ToolResult(_) => {}
        Message::ChooseAgent(choice) => {
            out.push(format!("  → {}: {}", choice.agent, choice.content));
        }
    }
    out
}

/// Renders history followed by the current chat.
pub fn render_transcript(current: &[Message], history: &[Message], width: usize) -> String {
    let index = ToolIndex::build(current, history);
    let mut lines = Vec::new();
    for message in history.iter().chain(current.iter()) {
        let rendered = render_message(message, &index, width);
        if rendered.is_empty() {
            continue;
        }
        if message.is_human() && !lines.is_empty() {
            lines.push(String::new());
        }
        lines.extend(rendered);
    }
    lines.join("\n")
}

/// Writes a live turn as effects arrive.
pub struct TurnPrinter<W: Write> {
    out: W,
    width: usize,
    /// True when the cursor sits mid-line after streamed text.
    mid_line: bool,
}

impl<W: Write> TurnPrinter<W> {
    pub fn new(out: W, width: usize) -> Self {
        Self {
            out,
            width,
            mid_line: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn end_line(&mut self) -> io::Result<()> {
        if self.mid_line {
            writeln!(self.out)?;
            self.mid_line = false;
        }
        Ok(())
    }

    fn write_lines(&mut self, lines: &[String]) -> io::Result<()> {
        self.end_line()?;
        for line in lines {
            writeln!(self.out, "{line}")?;
        }
        Ok(())
    }

    /// Reflects one effect. `current`/`history` are read after the update.
    pub fn show(&mut self, effect: &Effect, current: &[Message], history: &[Message]) -> io::Result<()> {
        match effect {
            Effect::Render(Transition::Pushed(i)) => {
                let Some(message) = current.get(*i) else {
                    return Ok(());
                };
                match message {
                    Message::Text(text) if text.role == Role::Ai => {
                        self.end_line()?;
                        writeln!(self.out, "Lens:")?;
                        if !text.sources.is_empty() {
                            writeln!(self.out, "  (backed by {} sources)", text.sources.len())?;
                        }
                        if !text.content.is_empty() {
                            write!(self.out, "  {}", text.content)?;
                            self.mid_line = true;
                        }
                        if !text.prompts.is_empty() {
                            let mut lines = Vec::new();
                            render_prompts(&mut lines, &text.prompts);
                            self.write_lines(&lines)?;
                        }
                    }
                    Message::ToolResult(result) => {
                        let mut lines = vec![format!("  ✓ {} finished", result.tool_name)];
                        lines.extend(render_tool_result(&result.tool_name, &result.tool_result, self.width));
                        self.write_lines(&lines)?;
                    }
                    other => {
                        let index = ToolIndex::build(current, history);
                        let lines = render_message(other, &index, self.width);
                        self.write_lines(&lines)?;
                    }
                }
            }
            Effect::Render(Transition::Extended { text, .. }) => {
                if !self.mid_line {
                    write!(self.out, "  ")?;
                }
                write!(self.out, "{text}")?;
                self.mid_line = true;
            }
            Effect::Render(Transition::PromptsAttached(i)) => {
                if let Some(Message::Text(text)) = current.get(*i) {
                    let mut lines = Vec::new();
                    render_prompts(&mut lines, &text.prompts);
                    self.write_lines(&lines)?;
                }
            }
            Effect::Render(Transition::Finished) => self.end_line()?,
            Effect::Render(Transition::Failed(_) | Transition::Ignored) | Effect::None => {}
            Effect::StartStream { .. } => {}
            Effect::TurnComplete { error } => {
                self.end_line()?;
                if let Some(error) = error {
                    writeln!(self.out, "Error: {error}")?;
                }
            }
        }
        self.out.flush()
    }
}
