//! Markdown → plain terminal lines.
//!
//! Thin wrapper around `pulldown_cmark` that flattens markdown events into
//! wrapped text lines. Headings, emphasis, inline code, fenced code blocks,
//! lists, blockquotes, links and rules. Styling is dropped; structure is
//! kept with prefixes.

use pulldown_cmark::{CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};

/// Render markdown content into lines no wider than `width` (code blocks excepted).
pub fn render(content: &str, width: usize) -> Vec<String> {
    let mut opts = Options::empty();
    opts.insert(Options::ENABLE_STRIKETHROUGH);
    opts.insert(Options::ENABLE_TASKLISTS);
    opts.insert(Options::ENABLE_TABLES);

    let mut w = Writer::new(width.max(20));
    for event in Parser::new_ext(content, opts) {
        w.handle(event);
    }
    w.finish()
}

// ── Writer ──────────────────────────────────────────────────────────────────

struct Writer {
    width: usize,
    lines: Vec<String>,
    /// Inline text of the paragraph/heading/item being built.
    current: String,
    /// Per-line prefixes (blockquote `│ `).
    quote_depth: usize,
    /// List nesting: None = unordered, Some(n) = ordered at index n.
    list_indices: Vec<Option<u64>>,
    /// Bullet for the first line of the current list item.
    pending_bullet: Option<String>,
    in_code_block: bool,
    /// Stored link URL, appended after the link text closes.
    link_url: Option<String>,
    needs_blank: bool,
}

impl Writer {
    fn new(width: usize) -> Self {
        Self {
            width,
            lines: Vec::new(),
            current: String::new(),
            quote_depth: 0,
            list_indices: Vec::new(),
            pending_bullet: None,
            in_code_block: false,
            link_url: None,
            needs_blank: false,
        }
    }

    fn prefix(&self) -> String {
        let mut prefix = "│ ".repeat(self.quote_depth);
        prefix.push_str(&"  ".repeat(self.list_indices.len().saturating_sub(1)));
        prefix
    }

    fn blank_line_if_needed(&mut self) {
        if self.needs_blank && !self.lines.is_empty() {
            self.lines.push(String::new());
        }
        self.needs_blank = false;
    }

    /// Wraps and emits the accumulated inline text.
    fn flush(&mut self) {
        if self.current.trim().is_empty() {
            self.current.clear();
            return;
        }
        let text = std::mem::take(&mut self.current);
        let base = self.prefix();
        let first = match self.pending_bullet.take() {
            Some(bullet) => format!("{base}{bullet}"),
            None => base.clone(),
        };
        let rest = format!("{base}{}", " ".repeat(first.chars().count() - base.chars().count()));
        let options = textwrap::Options::new(self.width)
            .initial_indent(&first)
            .subsequent_indent(&rest);
        for line in textwrap::wrap(text.trim(), options) {
            self.lines.push(line.into_owned());
        }
    }

    fn handle(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.open(tag),
            Event::End(tag) => self.close(tag),
            Event::Text(t) => self.text(t),
            Event::Code(c) => {
                self.current.push('`');
                self.current.push_str(&c);
                self.current.push('`');
            }
            Event::SoftBreak => self.current.push(' '),
            Event::HardBreak => self.flush(),
            Event::Rule => {
                self.flush();
                self.blank_line_if_needed();
                self.lines.push("─".repeat(self.width.min(40)));
                self.needs_blank = true;
            }
            Event::TaskListMarker(checked) => {
                self.current.push_str(if checked { "[x] " } else { "[ ] " });
            }
            _ => {} // HTML, footnotes, math: skip
        }
    }

    fn open(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => self.blank_line_if_needed(),
            Tag::Heading { level, .. } => {
                self.flush();
                self.blank_line_if_needed();
                self.current.push_str(&"#".repeat(level as usize));
                self.current.push(' ');
            }
            Tag::BlockQuote(_) => {
                self.flush();
                self.blank_line_if_needed();
                self.quote_depth += 1;
            }
            Tag::CodeBlock(kind) => {
                self.flush();
                self.blank_line_if_needed();
                if let CodeBlockKind::Fenced(lang) = kind
                    && !lang.is_empty()
                {
                    self.lines.push(format!("{}[{}]", self.prefix(), lang));
                }
                self.in_code_block = true;
            }
            Tag::List(start) => {
                self.flush();
                if self.list_indices.is_empty() {
                    self.blank_line_if_needed();
                }
                self.list_indices.push(start);
            }
            Tag::Item => {
                self.flush();
                let bullet = match self.list_indices.last_mut() {
                    Some(Some(n)) => {
                        let b = format!("{n}. ");
                        *n += 1;
                        b
                    }
                    _ => "• ".to_string(),
                };
                self.pending_bullet = Some(bullet);
            }
            Tag::Link { dest_url, .. } => self.link_url = Some(dest_url.to_string()),
            _ => {}
        }
    }

    fn close(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph | TagEnd::Heading(_) => {
                self.flush();
                self.needs_blank = true;
            }
            TagEnd::BlockQuote(_) => {
                self.flush();
                self.quote_depth = self.quote_depth.saturating_sub(1);
                self.needs_blank = true;
            }
            TagEnd::CodeBlock => {
                self.in_code_block = false;
                self.needs_blank = true;
            }
            TagEnd::List(_) => {
                self.flush();
                self.list_indices.pop();
                if self.list_indices.is_empty() {
                    self.needs_blank = true;
                }
            }
            TagEnd::Item => self.flush(),
            TagEnd::Link => {
                if let Some(url) = self.link_url.take() {
                    self.current.push_str(&format!(" ({url})"));
                }
            }
            TagEnd::TableCell => self.current.push_str(" | "),
            TagEnd::TableHead | TagEnd::TableRow => self.flush(),
            _ => {}
        }
    }

    fn text(&mut self, t: CowStr<'_>) {
        if self.in_code_block {
            let prefix = self.prefix();
            for line in t.lines() {
                self.lines.push(format!("{prefix}    {line}"));
            }
        } else {
            self.current.push_str(&t);
        }
    }

    fn finish(mut self) -> Vec<String> {
        self.flush();
        while self.lines.last().is_some_and(|l| l.is_empty()) {
            self.lines.pop();
        }
        self.lines
    }
}
