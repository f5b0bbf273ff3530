//! Single-line text input widget.

use crate::ui::theme::Styles;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Paragraph, Widget},
};
use unicode_width::UnicodeWidthStr;

/// A single-line text input widget.
#[derive(Debug, Clone)]
pub struct TextInput<'a> {
    content: &'a str,
    /// Cursor position (byte index, always on a char boundary).
    cursor: usize,
    block: Option<Block<'a>>,
    focused: bool,
    placeholder: Option<&'a str>,
}

impl<'a> TextInput<'a> {
    /// Create a new text input.
    pub fn new(content: &'a str) -> Self {
        Self {
            content,
            cursor: content.len(),
            block: None,
            focused: false,
            placeholder: None,
        }
    }

    /// Set the block for the text input.
    #[must_use]
    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }

    /// Set focus state.
    #[must_use]
    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    /// Set placeholder text.
    #[must_use]
    pub fn placeholder(mut self, placeholder: &'a str) -> Self {
        self.placeholder = Some(placeholder);
        self
    }
}

impl Widget for TextInput<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner = if let Some(block) = &self.block {
            let inner = block.inner(area);
            block.clone().render(area, buf);
            inner
        } else {
            area
        };

        if inner.height < 1 || inner.width < 1 {
            return;
        }

        let mut spans = Vec::new();
        if self.content.is_empty() {
            if self.focused {
                spans.push(Span::styled("_", Styles::active()));
            }
            if let Some(placeholder) = self.placeholder {
                spans.push(Span::styled(placeholder, Styles::dim()));
            }
        } else if self.focused {
            let (before, after) = self.content.split_at(self.cursor);
            // Keep the cursor visible on narrow fields
            let budget = usize::from(inner.width).saturating_sub(1);
            let before = tail_within(before, budget);
            spans.push(Span::styled(before, Styles::default()));
            if after.is_empty() {
                spans.push(Span::styled("_", Styles::active()));
            } else {
                spans.push(Span::styled("|", Styles::active()));
                spans.push(Span::styled(after, Styles::default()));
            }
        } else {
            spans.push(Span::styled(self.content, Styles::default()));
        }

        Paragraph::new(Line::from(spans)).render(inner, buf);
    }
}

/// Longest suffix of `text` no wider than `width` columns.
fn tail_within(text: &str, width: usize) -> &str {
    let mut start = 0;
    while text[start..].width() > width {
        match text[start..].chars().next() {
            Some(ch) => start += ch.len_utf8(),
            None => break,
        }
    }
    &text[start..]
}

/// State for a text input, managing content and cursor position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextInputState {
    content: String,
    /// Cursor position (byte index, always on a char boundary).
    cursor: usize,
}

impl TextInputState {
    /// Create a new empty text input state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current content.
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Check if the content is empty.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Replace the content and move the cursor to the end.
    pub fn set(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.cursor = self.content.len();
    }

    /// Clear the content.
    pub fn clear(&mut self) {
        self.content.clear();
        self.cursor = 0;
    }

    /// Insert a character at the cursor position.
    pub fn insert(&mut self, ch: char) {
        self.content.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
    }

    /// Delete the character before the cursor (backspace).
    pub fn backspace(&mut self) {
        if let Some(ch) = self.content[..self.cursor].chars().next_back() {
            self.cursor -= ch.len_utf8();
            self.content.remove(self.cursor);
        }
    }

    /// Delete the character at the cursor (delete).
    pub fn delete(&mut self) {
        if self.cursor < self.content.len() {
            self.content.remove(self.cursor);
        }
    }

    /// Move cursor left.
    pub fn move_left(&mut self) {
        if let Some(ch) = self.content[..self.cursor].chars().next_back() {
            self.cursor -= ch.len_utf8();
        }
    }

    /// Move cursor right.
    pub fn move_right(&mut self) {
        if let Some(ch) = self.content[self.cursor..].chars().next() {
            self.cursor += ch.len_utf8();
        }
    }

    /// Move cursor to start.
    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    /// Move cursor to end.
    pub fn move_end(&mut self) {
        self.cursor = self.content.len();
    }

    /// Create a widget from this state.
    pub fn widget(&self) -> TextInput<'_> {
        let mut input = TextInput::new(&self.content);
        input.cursor = self.cursor;
        input
    }
}
