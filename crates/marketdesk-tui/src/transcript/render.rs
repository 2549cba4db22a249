//! Projection of messages into styled terminal lines.
//!
//! Everything here is a pure function of its inputs: rendering the same
//! messages twice yields the same lines.

use chrono::{DateTime, Local};
use marketdesk_engine::{Message, MessageMetadata, Role};
use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span},
};

use crate::text::wrap_text;
use crate::theme::Theme;

/// Indentation of message content under its header.
pub const CONTENT_INDENT: &str = "    ";

/// Shown when the log has no messages at all.
pub const EMPTY_TRANSCRIPT: &str = "No messages yet. Start a conversation!";

/// Shown while a reply is being generated.
pub const LOADING_TEXT: &str = "Analyzing market data...";

/// Speaker glyph for a role.
pub fn speaker_symbol(role: Role) -> &'static str {
    match role {
        Role::User => "\u{203a}",      // ›
        Role::Assistant => "\u{25cf}", // ●
        Role::System => "\u{25c6}",    // ◆
        Role::Error => "!",
        Role::Loading => "\u{2026}", // …
        Role::Market => "$",
    }
}

/// Message time formatted for display (HH:MM in local time).
pub fn time_str(message: &Message) -> String {
    let local: DateTime<Local> = message.timestamp.into();
    local.format("%H:%M").to_string()
}

/// Short textual tags for message metadata, in display order.
pub fn metadata_tags(metadata: &MessageMetadata) -> Vec<String> {
    let mut tags = Vec::new();
    if let Some(symbol) = &metadata.stock_symbol {
        tags.push(format!("${symbol}"));
    }
    if let Some(change) = metadata.price_change {
        tags.push(format!("{change:+.2}%"));
    }
    if let Some(sentiment) = metadata.sentiment {
        tags.push(sentiment.to_string());
    }
    match metadata.links.len() {
        0 => {}
        1 => tags.push("1 link".to_string()),
        n => tags.push(format!("{n} links")),
    }
    for reaction in &metadata.reactions {
        tags.push(format!("{} {}", reaction.kind, reaction.count));
    }
    tags
}

fn metadata_line(metadata: &MessageMetadata, theme: &Theme) -> Option<Line<'static>> {
    let tags = metadata_tags(metadata);
    if tags.is_empty() {
        return None;
    }

    let mut spans = vec![Span::raw(CONTENT_INDENT)];
    for (i, tag) in tags.into_iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw("  "));
        }
        let color = if tag.starts_with('$') {
            theme.warning
        } else if let (Some(change), true) = (metadata.price_change, tag.ends_with('%')) {
            theme.change_color(change)
        } else {
            theme.subtext
        };
        spans.push(Span::styled(
            tag,
            Style::default().fg(color).bg(theme.surface),
        ));
    }
    Some(Line::from(spans))
}

/// Render one message: a header line, wrapped content, then a tag line.
pub fn render_message(message: &Message, width: usize, theme: &Theme) -> Vec<Line<'static>> {
    let accent = theme.role_color(message.role);

    let mut lines = vec![Line::from(vec![
        Span::styled(
            speaker_symbol(message.role),
            Style::default().fg(accent).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(time_str(message), Style::default().fg(theme.muted)),
        Span::raw("  "),
        Span::styled(message.role.label(), Style::default().fg(accent)),
    ])];

    let content_style = match message.role {
        Role::Error => Style::default().fg(theme.error),
        Role::System | Role::Loading => Style::default()
            .fg(theme.subtext)
            .add_modifier(Modifier::ITALIC),
        _ => Style::default().fg(theme.text),
    };
    let content_width = width.saturating_sub(CONTENT_INDENT.len()).max(1);
    for text in wrap_text(&message.content, content_width) {
        lines.push(Line::from(vec![
            Span::raw(CONTENT_INDENT),
            Span::styled(text, content_style),
        ]));
    }

    if let Some(line) = message
        .metadata
        .as_ref()
        .and_then(|m| metadata_line(m, theme))
    {
        lines.push(line);
    }

    lines
}

/// Number of lines [`render_message`] produces.
pub fn message_height(message: &Message, width: usize, theme: &Theme) -> usize {
    render_message(message, width, theme).len()
}

/// Placeholder row for a pending reply.
pub fn loading_line(theme: &Theme) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            speaker_symbol(Role::Assistant),
            Style::default().fg(theme.muted),
        ),
        Span::raw(" "),
        Span::styled(
            LOADING_TEXT,
            Style::default()
                .fg(theme.muted)
                .add_modifier(Modifier::ITALIC),
        ),
    ])
}

/// Render a whole log, with a blank line between messages.
pub fn render_transcript(messages: &[Message], width: usize, theme: &Theme) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for (i, message) in messages.iter().enumerate() {
        if i > 0 {
            lines.push(Line::default());
        }
        lines.extend(render_message(message, width, theme));
    }
    lines
}
