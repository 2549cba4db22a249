//! Input capture: the message composer and its widget.
//!
//! [`InputState`] buffers keystrokes and decides when a submission happens.
//! It only clears itself through [`InputState::commit`], which the app calls
//! once the session has accepted the text.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::theme::Theme;

/// Advisory maximum length of a message, in characters.
pub const DEFAULT_MAX_CHARS: usize = 1000;

/// Placeholder shown while the composer is empty.
pub const PLACEHOLDER: &str = "Ask about market trends, stocks, or analysis...";

/// What a key press did to the composer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputOutcome {
    /// Submit this trimmed text. The buffer is left untouched.
    Submit(String),
    /// The buffer or cursor changed.
    Changed,
    /// The key was not for the composer.
    Ignored,
}

/// Composer state: content, cursor and submission history.
#[derive(Debug, Clone)]
pub struct InputState {
    content: String,
    /// Cursor position (character index).
    cursor: usize,
    max_chars: usize,
    disabled: bool,
    history: Vec<String>,
    /// Position while browsing history (0 = most recent).
    history_index: Option<usize>,
    /// Draft saved when history browsing started.
    saved_input: String,
}

impl Default for InputState {
    fn default() -> Self {
        Self::new()
    }
}

impl InputState {
    pub fn new() -> Self {
        Self::with_max_chars(DEFAULT_MAX_CHARS)
    }

    pub fn with_max_chars(max_chars: usize) -> Self {
        Self {
            content: String::new(),
            cursor: 0,
            max_chars,
            disabled: false,
            history: Vec::new(),
            history_index: None,
            saved_input: String::new(),
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn char_count(&self) -> usize {
        self.content.chars().count()
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Whether the buffer is past the advisory limit. Input is not blocked.
    pub fn over_limit(&self) -> bool {
        self.char_count() > self.max_chars
    }

    /// Character counter text, e.g. `12/1000`.
    pub fn counter(&self) -> String {
        format!("{}/{}", self.char_count(), self.max_chars)
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Enable or disable the composer. Disabled input ignores every key.
    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    /// Trimmed content if it would be a valid submission.
    pub fn candidate(&self) -> Option<String> {
        let trimmed = self.content.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }

    fn byte_index(&self, char_idx: usize) -> usize {
        self.content
            .char_indices()
            .nth(char_idx)
            .map_or(self.content.len(), |(i, _)| i)
    }

    /// Insert a character at the cursor position.
    pub fn insert(&mut self, ch: char) {
        let idx = self.byte_index(self.cursor);
        self.content.insert(idx, ch);
        self.cursor += 1;
    }

    /// Insert a string at the cursor position.
    pub fn insert_str(&mut self, s: &str) {
        let idx = self.byte_index(self.cursor);
        self.content.insert_str(idx, s);
        self.cursor += s.chars().count();
    }

    /// Delete the character before the cursor.
    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let idx = self.byte_index(self.cursor);
            self.content.remove(idx);
        }
    }

    /// Delete the character at the cursor.
    pub fn delete(&mut self) {
        if self.cursor < self.char_count() {
            let idx = self.byte_index(self.cursor);
            self.content.remove(idx);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        if self.cursor < self.char_count() {
            self.cursor += 1;
        }
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.char_count();
    }

    /// Clear the buffer after an accepted submission and record it.
    pub fn commit(&mut self) -> String {
        let content = std::mem::take(&mut self.content);
        self.cursor = 0;
        let trimmed = content.trim();
        if !trimmed.is_empty() {
            self.history.push(trimmed.to_string());
        }
        self.history_index = None;
        self.saved_input.clear();
        content
    }

    /// Navigate to the previous history entry.
    pub fn history_prev(&mut self) {
        if self.history.is_empty() {
            return;
        }

        let next = match self.history_index {
            None => {
                self.saved_input = self.content.clone();
                0
            }
            Some(i) if i + 1 < self.history.len() => i + 1,
            Some(_) => return,
        };
        self.history_index = Some(next);
        self.content = self.history[self.history.len() - 1 - next].clone();
        self.move_end();
    }

    /// Navigate to the next history entry, restoring the draft at the end.
    pub fn history_next(&mut self) {
        match self.history_index {
            None => {}
            Some(0) => {
                self.history_index = None;
                self.content = std::mem::take(&mut self.saved_input);
                self.move_end();
            }
            Some(i) => {
                self.history_index = Some(i - 1);
                self.content = self.history[self.history.len() - i].clone();
                self.move_end();
            }
        }
    }

    /// Apply a key press.
    ///
    /// Enter submits; Shift+Enter and Ctrl+J insert a newline.
    pub fn handle_key(&mut self, key: KeyEvent) -> InputOutcome {
        if self.disabled {
            return InputOutcome::Ignored;
        }

        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let shift = key.modifiers.contains(KeyModifiers::SHIFT);

        match key.code {
            KeyCode::Enter if shift => {
                self.insert('\n');
                InputOutcome::Changed
            }
            KeyCode::Char('j') if ctrl => {
                self.insert('\n');
                InputOutcome::Changed
            }
            KeyCode::Enter => match self.candidate() {
                Some(text) => InputOutcome::Submit(text),
                None => InputOutcome::Ignored,
            },
            _ if ctrl || key.modifiers.contains(KeyModifiers::ALT) => InputOutcome::Ignored,
            KeyCode::Char(c) => {
                self.insert(c);
                InputOutcome::Changed
            }
            KeyCode::Backspace => {
                self.backspace();
                InputOutcome::Changed
            }
            KeyCode::Delete => {
                self.delete();
                InputOutcome::Changed
            }
            KeyCode::Left => {
                self.move_left();
                InputOutcome::Changed
            }
            KeyCode::Right => {
                self.move_right();
                InputOutcome::Changed
            }
            KeyCode::Home => {
                self.move_home();
                InputOutcome::Changed
            }
            KeyCode::End => {
                self.move_end();
                InputOutcome::Changed
            }
            KeyCode::Up if self.is_empty() || self.history_index.is_some() => {
                self.history_prev();
                InputOutcome::Changed
            }
            KeyCode::Down if self.history_index.is_some() => {
                self.history_next();
                InputOutcome::Changed
            }
            _ => InputOutcome::Ignored,
        }
    }
}

/// Full-width input bar for composing messages.
pub struct InputBar<'a> {
    input: &'a InputState,
    theme: &'a Theme,
}

impl<'a> InputBar<'a> {
    pub fn new(input: &'a InputState, theme: &'a Theme) -> Self {
        Self { input, theme }
    }

    /// Lines to display, and the index of the line holding the cursor.
    fn build_lines(&self) -> (Vec<Line<'static>>, usize) {
        let text_style = Style::default().fg(self.theme.text);
        let prompt_style = Style::default().fg(self.theme.primary);

        if self.input.is_empty() {
            let mut spans = vec![
                Span::styled("> ", prompt_style),
                Span::styled("\u{2588}", text_style), // █
            ];
            spans.push(Span::styled(
                PLACEHOLDER,
                Style::default().fg(self.theme.muted),
            ));
            return (vec![Line::from(spans)], 0);
        }

        let mut lines = Vec::new();
        let mut cursor_line = 0;
        let mut offset = 0;

        for (line_idx, text) in self.input.content().split('\n').enumerate() {
            let len = text.chars().count();
            let prefix = if line_idx == 0 { "> " } else { "  " };
            let mut spans = vec![Span::styled(prefix, prompt_style)];

            let cursor = self.input.cursor();
            if cursor >= offset && cursor <= offset + len {
                cursor_line = line_idx;
                let col = cursor - offset;
                let before: String = text.chars().take(col).collect();
                let after: String = text.chars().skip(col).collect();
                spans.push(Span::styled(before, text_style));
                spans.push(Span::styled("\u{2588}", text_style));
                spans.push(Span::styled(after, text_style));
            } else {
                spans.push(Span::styled(text.to_string(), text_style));
            }

            lines.push(Line::from(spans));
            // +1 for the newline
            offset += len + 1;
        }

        (lines, cursor_line)
    }
}

impl Widget for InputBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border_style = if self.input.is_disabled() {
            Style::default().fg(self.theme.border)
        } else {
            Style::default().fg(self.theme.border_focused)
        };

        let mut block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style);

        if !self.input.is_empty() {
            let counter_color = if self.input.over_limit() {
                self.theme.warning
            } else {
                self.theme.muted
            };
            block = block.title_bottom(
                Line::from(Span::styled(
                    format!(" {} ", self.input.counter()),
                    Style::default().fg(counter_color),
                ))
                .right_aligned(),
            );
        }

        if self.input.is_disabled() {
            Paragraph::new(Span::styled(
                "\u{25cf} Analyzing market data...",
                Style::default().fg(self.theme.muted),
            ))
            .block(block)
            .render(area, buf);
            return;
        }

        let (lines, cursor_line) = self.build_lines();

        // Keep the cursor line visible
        let inner_height = area.height.saturating_sub(2) as usize;
        let scroll = if inner_height > 0 && cursor_line >= inner_height {
            cursor_line + 1 - inner_height
        } else {
            0
        };

        Paragraph::new(lines)
            .block(block)
            .scroll((u16::try_from(scroll).unwrap_or(u16::MAX), 0))
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_str(state: &mut InputState, s: &str) {
        for ch in s.chars() {
            state.handle_key(key(KeyCode::Char(ch)));
        }
    }

    fn render(state: &InputState, width: u16, height: u16) -> String {
        let theme = Theme::default();
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal
            .draw(|frame| frame.render_widget(InputBar::new(state, &theme), frame.area()))
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(ratatui::buffer::Cell::symbol)
            .collect()
    }

    #[test]
    fn test_basic_editing() {
        let mut state = InputState::new();
        assert!(state.is_empty());

        type_str(&mut state, "Hi");
        assert_eq!(state.content(), "Hi");
        assert_eq!(state.cursor(), 2);

        state.handle_key(key(KeyCode::Backspace));
        assert_eq!(state.content(), "H");
    }

    #[test]
    fn test_cursor_movement_with_multibyte_chars() {
        let mut state = InputState::new();
        state.insert_str("caf\u{e9}s");
        state.move_left();
        state.insert('!');
        assert_eq!(state.content(), "caf\u{e9}!s");

        state.move_home();
        state.delete();
        assert_eq!(state.content(), "af\u{e9}!s");

        state.move_end();
        assert_eq!(state.cursor(), 5);
    }

    #[test]
    fn test_enter_submits_trimmed_text_without_clearing() {
        let mut state = InputState::new();
        type_str(&mut state, "  What is AAPL doing?  ");

        let outcome = state.handle_key(key(KeyCode::Enter));
        assert_eq!(outcome, InputOutcome::Submit("What is AAPL doing?".into()));
        assert!(!state.is_empty());

        state.commit();
        assert!(state.is_empty());
        assert_eq!(state.cursor(), 0);
    }

    #[test]
    fn test_enter_on_whitespace_is_ignored() {
        let mut state = InputState::new();
        type_str(&mut state, "   ");
        assert_eq!(state.handle_key(key(KeyCode::Enter)), InputOutcome::Ignored);
        assert_eq!(state.content(), "   ");
    }

    #[test]
    fn test_shift_enter_inserts_newline() {
        let mut state = InputState::new();
        type_str(&mut state, "line one");
        let outcome = state.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::SHIFT));
        assert_eq!(outcome, InputOutcome::Changed);
        type_str(&mut state, "line two");
        assert_eq!(state.content(), "line one\nline two");

        state.handle_key(KeyEvent::new(KeyCode::Char('j'), KeyModifiers::CONTROL));
        assert!(state.content().ends_with('\n'));
    }

    #[test]
    fn test_disabled_ignores_keys() {
        let mut state = InputState::new();
        type_str(&mut state, "draft");
        state.set_disabled(true);

        assert_eq!(state.handle_key(key(KeyCode::Char('x'))), InputOutcome::Ignored);
        assert_eq!(state.handle_key(key(KeyCode::Enter)), InputOutcome::Ignored);
        assert_eq!(state.content(), "draft");

        state.set_disabled(false);
        assert_eq!(
            state.handle_key(key(KeyCode::Enter)),
            InputOutcome::Submit("draft".into())
        );
    }

    #[test]
    fn test_control_chords_are_ignored() {
        let mut state = InputState::new();
        let outcome = state.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert_eq!(outcome, InputOutcome::Ignored);
        assert!(state.is_empty());
    }

    #[test]
    fn test_counter_is_advisory() {
        let mut state = InputState::with_max_chars(5);
        type_str(&mut state, "abcdefg");
        assert_eq!(state.content(), "abcdefg");
        assert_eq!(state.counter(), "7/5");
        assert!(state.over_limit());
        assert_eq!(
            state.handle_key(key(KeyCode::Enter)),
            InputOutcome::Submit("abcdefg".into())
        );
    }

    #[test]
    fn test_history_navigation() {
        let mut state = InputState::new();
        type_str(&mut state, "first");
        state.commit();
        type_str(&mut state, "second");
        state.commit();

        state.handle_key(key(KeyCode::Up));
        assert_eq!(state.content(), "second");
        state.handle_key(key(KeyCode::Up));
        assert_eq!(state.content(), "first");
        state.handle_key(key(KeyCode::Up));
        assert_eq!(state.content(), "first");

        state.handle_key(key(KeyCode::Down));
        assert_eq!(state.content(), "second");
        state.handle_key(key(KeyCode::Down));
        assert!(state.is_empty());
    }

    #[test]
    fn test_input_bar_shows_placeholder_and_counter() {
        let mut state = InputState::new();
        let empty = render(&state, 70, 3);
        assert!(empty.contains("Ask about market trends"));
        assert!(!empty.contains("/1000"));

        type_str(&mut state, "hello");
        let typed = render(&state, 70, 3);
        assert!(typed.contains("hello"));
        assert!(typed.contains("5/1000"));
    }

    #[test]
    fn test_input_bar_disabled_shows_loading() {
        let mut state = InputState::new();
        state.set_disabled(true);
        let content = render(&state, 60, 3);
        assert!(content.contains("Analyzing market data"));
    }
}
