//! Message list widget.
//!
//! Only messages inside the viewport are laid out: the bottom anchor is found
//! by walking back from the newest message, and rendering stops at the last
//! visible row.
//!
//! Each message occupies a block of rows: its own lines, a gap before the
//! next message, and for the newest message the loading row while busy.

use marketdesk_engine::Message;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, StatefulWidget, Widget},
};

use super::render::{loading_line, message_height, render_message, EMPTY_TRANSCRIPT};
use super::view::{ScrollAnchor, TranscriptView};
use crate::theme::Theme;

/// Renders the message log into a bordered pane.
pub struct TranscriptWidget<'a> {
    messages: &'a [Message],
    theme: &'a Theme,
    busy: bool,
}

impl<'a> TranscriptWidget<'a> {
    pub fn new(messages: &'a [Message], theme: &'a Theme) -> Self {
        Self {
            messages,
            theme,
            busy: false,
        }
    }

    /// Show the loading row after the newest message.
    #[must_use]
    pub fn busy(mut self, busy: bool) -> Self {
        self.busy = busy;
        self
    }

    fn is_last(&self, index: usize) -> bool {
        index + 1 == self.messages.len()
    }

    /// Rows taken by message `index` and whatever follows it.
    fn block_height(&self, index: usize, width: usize) -> usize {
        let trailer = if !self.is_last(index) {
            1
        } else if self.busy {
            2
        } else {
            0
        };
        message_height(&self.messages[index], width, self.theme) + trailer
    }

    fn block_lines(&self, index: usize, width: usize) -> Vec<Line<'static>> {
        let mut lines = render_message(&self.messages[index], width, self.theme);
        if !self.is_last(index) || self.busy {
            lines.push(Line::default());
        }
        if self.is_last(index) && self.busy {
            lines.push(loading_line(self.theme));
        }
        lines
    }

    /// Anchor that puts the last row of the newest block on the last row of
    /// the pane, or the very first row when everything fits.
    fn bottom_anchor(&self, width: usize, height: usize) -> ScrollAnchor {
        let mut used = 0;
        for index in (0..self.messages.len()).rev() {
            used += self.block_height(index, width);
            if used >= height {
                return ScrollAnchor::new(index, used - height);
            }
        }
        ScrollAnchor::default()
    }

    fn render_jump_hint(&self, unseen: usize, area: Rect, buf: &mut Buffer) {
        let label = if unseen > 0 {
            format!(" \u{2193} {unseen} new \u{00b7} Ctrl+G jump to latest ")
        } else {
            " \u{2193} Ctrl+G jump to latest ".to_string()
        };
        let row = Rect::new(area.x, area.y + area.height - 1, area.width, 1);
        Paragraph::new(Line::from(Span::styled(
            label,
            Style::default()
                .fg(self.theme.base)
                .bg(self.theme.primary)
                .add_modifier(Modifier::BOLD),
        )))
        .alignment(Alignment::Right)
        .render(row, buf);
    }
}

fn row(y: usize) -> u16 {
    u16::try_from(y).unwrap_or(u16::MAX)
}

impl StatefulWidget for TranscriptWidget<'_> {
    type State = TranscriptView;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut TranscriptView) {
        let block = Block::default()
            .title(" Market Assistant ")
            .title_style(Style::default().fg(self.theme.text))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(self.theme.border))
            .style(Style::default().bg(self.theme.base));

        let inner = block.inner(area);
        block.render(area, buf);

        if inner.height == 0 || inner.width == 0 {
            return;
        }

        if self.messages.is_empty() {
            state.resolve(ScrollAnchor::default(), |_| 0);
            let row = Rect::new(inner.x, inner.y + inner.height / 2, inner.width, 1);
            Paragraph::new(Span::styled(
                EMPTY_TRANSCRIPT,
                Style::default().fg(self.theme.muted),
            ))
            .alignment(Alignment::Center)
            .render(row, buf);
            return;
        }

        let width = inner.width as usize;
        let height = inner.height as usize;

        state.resolve(self.bottom_anchor(width, height), |index| {
            self.block_height(index, width)
        });
        let top = state.top();
        let (start, mut skip) = if top.message < self.messages.len() {
            (top.message, top.line)
        } else {
            (self.messages.len() - 1, 0)
        };

        let mut y = 0usize;
        'blocks: for index in start..self.messages.len() {
            for line in self.block_lines(index, width).into_iter().skip(skip) {
                if y >= height {
                    break 'blocks;
                }
                buf.set_line(inner.x, inner.y + row(y), &line, inner.width);
                y += 1;
            }
            skip = 0;
        }

        if state.show_jump_to_latest() {
            self.render_jump_hint(state.unseen(), inner, buf);
        }
    }
}
