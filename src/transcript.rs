//! Chat transcript types
//!
//! The transcript is append-only: entries are rendered once from a [`Message`]
//! and never edited or removed. It also owns the scroll position of the panel
//! that displays it, so every append can bring the newest entry into view.

use ratatui::{
    style::Style,
    text::Line,
    widgets::{Paragraph, Wrap},
};
use serde::{Deserialize, Serialize};

/// Text shown when a query returns no results
pub const NO_RESULTS_TEXT: &str = "No relevant information found.";

/// Prefix of the System message a failed round trip renders
pub const ERROR_PREFIX: &str = "Error: ";

/// Who a message came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sender {
    User,
    Assistant,
    /// Client and server operational notices (upload results, errors)
    System,
}

impl Sender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sender::User => "User",
            Sender::Assistant => "Assistant",
            Sender::System => "System",
        }
    }

    /// Lowercased tag used to pick the style of a rendered entry
    pub fn class_name(&self) -> String {
        self.as_str().to_lowercase()
    }

    /// Label printed above an entry
    pub fn label(&self) -> &'static str {
        match self {
            Sender::User => "You:",
            Sender::Assistant => "AI:",
            Sender::System => "System:",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageBody {
    Text(String),
    Lines(Vec<String>),
}

impl MessageBody {
    pub fn display_text(&self) -> String {
        match self {
            MessageBody::Text(text) => text.clone(),
            MessageBody::Lines(lines) => lines.join("\n"),
        }
    }
}

impl From<&str> for MessageBody {
    fn from(text: &str) -> Self {
        MessageBody::Text(text.to_string())
    }
}

impl From<String> for MessageBody {
    fn from(text: String) -> Self {
        MessageBody::Text(text)
    }
}

impl From<Vec<String>> for MessageBody {
    fn from(lines: Vec<String>) -> Self {
        MessageBody::Lines(lines)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub sender: Sender,
    pub body: MessageBody,
}

impl Message {
    pub fn new(sender: Sender, body: impl Into<MessageBody>) -> Self {
        Self {
            sender,
            body: body.into(),
        }
    }

    pub fn user(body: impl Into<MessageBody>) -> Self {
        Self::new(Sender::User, body)
    }

    pub fn assistant(body: impl Into<MessageBody>) -> Self {
        Self::new(Sender::Assistant, body)
    }

    pub fn system(body: impl Into<MessageBody>) -> Self {
        Self::new(Sender::System, body)
    }
}

/// A message as it appears in the transcript
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub sender: Sender,
    pub class: String,
    pub text: String,
}

impl Entry {
    fn from_message(message: Message) -> Self {
        Self {
            sender: message.sender,
            class: message.sender.class_name(),
            text: message.body.display_text(),
        }
    }

    /// Whether this entry reports a failed round trip
    pub fn is_error(&self) -> bool {
        self.sender == Sender::System && self.text.starts_with(ERROR_PREFIX)
    }

    /// Label line, one line per body line, then a blank separator
    pub fn lines(&self, label_style: Style, body_style: Style) -> Vec<Line<'_>> {
        let mut lines = vec![Line::styled(self.sender.label(), label_style)];
        lines.extend(self.text.split('\n').map(|line| Line::styled(line, body_style)));
        lines.push(Line::default());
        lines
    }
}

#[derive(Debug, Default)]
pub struct Transcript {
    entries: Vec<Entry>,
    scroll: u16,
    // Inner size of the panel, updated on every frame
    viewport_width: u16,
    viewport_height: u16,
    // Lines drawn after the last entry (the pending indicator)
    trailer_lines: u16,
    // Cleared when the user scrolls away from the newest entry
    detached: bool,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render `message` into an entry, append it and reveal it.
    pub fn render(&mut self, message: Message) -> &Entry {
        self.entries.push(Entry::from_message(message));
        self.scroll_to_bottom();
        &self.entries[self.entries.len() - 1]
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&Entry> {
        self.entries.last()
    }

    pub fn scroll(&self) -> u16 {
        self.scroll
    }

    pub fn set_viewport(&mut self, width: u16, height: u16) {
        self.viewport_width = width;
        self.viewport_height = height;
        self.refresh_scroll();
    }

    pub fn set_trailer_lines(&mut self, lines: u16) {
        self.trailer_lines = lines;
        self.refresh_scroll();
    }

    /// Number of display lines the transcript occupies at the current width,
    /// wrapped the same way the panel draws it
    pub fn total_lines(&self) -> u16 {
        // Use actual panel width for wrap calculation, default to 50 if not set
        let wrap_width = if self.viewport_width > 0 {
            self.viewport_width
        } else {
            50
        };

        let lines: Vec<Line> = self
            .entries
            .iter()
            .flat_map(|entry| entry.lines(Style::default(), Style::default()))
            .collect();
        let count = Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .line_count(wrap_width);

        u16::try_from(count)
            .unwrap_or(u16::MAX)
            .saturating_add(self.trailer_lines)
    }

    pub fn max_scroll(&self) -> u16 {
        let visible_height = if self.viewport_height > 0 {
            self.viewport_height
        } else {
            20
        };
        self.total_lines().saturating_sub(visible_height)
    }

    pub fn is_at_bottom(&self) -> bool {
        self.scroll >= self.max_scroll()
    }

    pub fn scroll_to_bottom(&mut self) {
        self.detached = false;
        self.scroll = self.max_scroll();
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_sub(lines);
        self.detached = !self.is_at_bottom();
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_add(lines).min(self.max_scroll());
        self.detached = !self.is_at_bottom();
    }

    pub fn scroll_to_top(&mut self) {
        self.scroll = 0;
        self.detached = !self.is_at_bottom();
    }

    fn refresh_scroll(&mut self) {
        if self.detached {
            self.scroll = self.scroll.min(self.max_scroll());
        } else {
            self.scroll = self.max_scroll();
        }
    }
}
