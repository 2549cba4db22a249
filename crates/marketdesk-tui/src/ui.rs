//! Screen layout: header, message list, composer and footer.

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget},
    Frame,
};

use crate::app::App;
use crate::input::InputBar;
use crate::text::{truncate_to_width, visual_width};
use crate::theme::Theme;
use crate::transcript::TranscriptWidget;

/// Most composer lines shown before it scrolls.
const MAX_INPUT_LINES: usize = 5;

const HELP_TEXT: &str = r"
  Composer
    Enter             Send message
    Shift+Enter       New line (Ctrl+J also works)
    Up/Down           Input history

  Messages
    PageUp/PageDown   Scroll
    Ctrl+G            Jump to latest
    Ctrl+Home         Jump to first

  Ctrl+L  Clear    F1  Help    Ctrl+C  Quit
";

/// A rect of a fixed size centered in `area`.
pub fn centered_fixed(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}

/// Height of the composer including borders.
fn input_height(app: &App) -> u16 {
    let lines = if app.input.is_disabled() {
        1
    } else {
        app.input.content().split('\n').count().clamp(1, MAX_INPUT_LINES)
    };
    u16::try_from(lines + 2).unwrap_or(u16::MAX)
}

/// Draw one frame of the app.
pub fn draw(frame: &mut Frame<'_>, app: &mut App) {
    let area = frame.area();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(input_height(app)),
            Constraint::Length(1),
        ])
        .split(area);

    render_header(app, chunks[0], frame.buffer_mut());

    let transcript =
        TranscriptWidget::new(app.session.messages(), &app.theme).busy(app.session.is_busy());
    frame.render_stateful_widget(transcript, chunks[1], &mut app.transcript);

    frame.render_widget(InputBar::new(&app.input, &app.theme), chunks[2]);

    render_footer(app, chunks[3], frame.buffer_mut());

    if app.show_help {
        render_help_overlay(&app.theme, area, frame.buffer_mut());
    }
}

fn render_header(app: &App, area: Rect, buf: &mut Buffer) {
    let theme = &app.theme;
    let (status, color) = if app.session.is_busy() {
        ("\u{25cf} Analyzing", theme.warning)
    } else {
        ("\u{25cf} Ready", theme.success)
    };

    let left = vec![
        Span::styled(
            " marketdesk",
            Style::default()
                .fg(theme.primary)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(" \u{2502} ", Style::default().fg(theme.muted)),
        Span::styled(
            app.session.backend_name().to_string(),
            Style::default().fg(theme.subtext),
        ),
    ];
    let right = vec![Span::styled(format!("{status} "), Style::default().fg(color))];

    Paragraph::new(spread(left, right, area.width))
        .style(Style::default().bg(theme.surface))
        .render(area, buf);
}

/// Key hints for the footer.
///
/// Shift+Enter is only distinguishable from Enter when the terminal accepted
/// the keyboard enhancement flags; otherwise Ctrl+J is the newline key.
fn footer_hints(keyboard_enhanced: bool) -> [(&'static str, &'static str); 4] {
    let newline = if keyboard_enhanced {
        "Shift+Enter"
    } else {
        "Ctrl+J"
    };
    [
        ("Enter", "send"),
        (newline, "newline"),
        ("Ctrl+L", "clear"),
        ("F1", "help"),
    ]
}

fn render_footer(app: &App, area: Rect, buf: &mut Buffer) {
    let theme = &app.theme;

    let left = match &app.notification {
        Some(msg) => vec![Span::styled(
            format!(" {msg}"),
            Style::default().fg(theme.info),
        )],
        None => vec![Span::styled(
            format!(" {} messages", app.session.len()),
            Style::default().fg(theme.subtext),
        )],
    };

    let mut right = Vec::new();
    for (i, (key, action)) in footer_hints(app.keyboard_enhanced).into_iter().enumerate() {
        if i > 0 {
            right.push(Span::styled(" \u{2502} ", Style::default().fg(theme.muted)));
        }
        right.push(Span::styled("[", Style::default().fg(theme.muted)));
        right.push(Span::styled(key, Style::default().fg(theme.primary)));
        right.push(Span::styled("] ", Style::default().fg(theme.muted)));
        right.push(Span::styled(action, Style::default().fg(theme.subtext)));
    }
    right.push(Span::raw(" "));

    Paragraph::new(spread(left, right, area.width))
        .style(Style::default().bg(theme.surface))
        .render(area, buf);
}

/// Lay `left` and `right` out on one line, padding between them.
///
/// When both do not fit, the right side is dropped and the left truncated.
fn spread(
    mut left: Vec<Span<'static>>,
    right: Vec<Span<'static>>,
    width: u16,
) -> Line<'static> {
    let width = width as usize;
    let left_width: usize = left.iter().map(|s| visual_width(&s.content)).sum();
    let right_width: usize = right.iter().map(|s| visual_width(&s.content)).sum();

    if left_width + right_width > width {
        let text: String = left.iter().map(|s| s.content.as_ref()).collect();
        let style = left.first().map(|s| s.style).unwrap_or_default();
        return Line::from(Span::styled(truncate_to_width(&text, width), style));
    }

    left.push(Span::raw(" ".repeat(width - left_width - right_width)));
    left.extend(right);
    Line::from(left)
}

fn render_help_overlay(theme: &Theme, area: Rect, buf: &mut Buffer) {
    let width = 52.min(area.width.saturating_sub(4));
    let height = 16.min(area.height.saturating_sub(2));
    let overlay_area = centered_fixed(width, height, area);

    Clear.render(overlay_area, buf);

    let block = Block::default()
        .title(" Help ")
        .title_style(Style::default().fg(theme.primary).add_modifier(Modifier::BOLD))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border_focused))
        .style(Style::default().bg(theme.base).fg(theme.text));

    Paragraph::new(HELP_TEXT).block(block).render(overlay_area, buf);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Action;
    use crate::test_utils::{create_test_app, render_app_to_string, TEST_HEIGHT, TEST_WIDTH};
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    #[test]
    fn test_initial_screen() {
        let mut app = create_test_app();
        let screen = render_app_to_string(&mut app, TEST_WIDTH, TEST_HEIGHT);

        assert!(screen.contains("marketdesk"));
        assert!(screen.contains("Ready"));
        assert!(screen.contains("Market Assistant"));
        assert!(screen.contains("Hello! I'm your AI market analysis assistant."));
        assert!(screen.contains("Ask about market trends"));
        assert!(screen.contains("[F1] help"));
    }

    #[test]
    fn test_footer_newline_hint_follows_keyboard_support() {
        let mut app = create_test_app();
        let screen = render_app_to_string(&mut app, TEST_WIDTH, TEST_HEIGHT);
        assert!(screen.contains("[Ctrl+J] newline"));
        assert!(!screen.contains("Shift+Enter"));

        app.keyboard_enhanced = true;
        let screen = render_app_to_string(&mut app, TEST_WIDTH, TEST_HEIGHT);
        assert!(screen.contains("[Shift+Enter] newline"));
        assert!(screen.contains("[F1] help"));
    }

    #[test]
    fn test_counter_appears_with_text() {
        let mut app = create_test_app();
        for c in "AAPL".chars() {
            app.handle_key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE));
        }
        let screen = render_app_to_string(&mut app, TEST_WIDTH, TEST_HEIGHT);
        assert!(screen.contains("4/1000"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_busy_screen() {
        let mut app = create_test_app();
        for c in "hi".chars() {
            app.handle_key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE));
        }
        app.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));

        let screen = render_app_to_string(&mut app, TEST_WIDTH, TEST_HEIGHT);
        assert!(screen.contains("Analyzing market data..."));
        assert!(screen.contains("\u{25cf} Analyzing"));
        assert!(!screen.contains("Ask about market trends"));
    }

    #[test]
    fn test_help_overlay() {
        let mut app = create_test_app();
        app.handle_action(Action::Help);
        let screen = render_app_to_string(&mut app, TEST_WIDTH, TEST_HEIGHT);
        assert!(screen.contains("Help"));
        assert!(screen.contains("Jump to latest"));
    }

    #[test]
    fn test_small_terminal_does_not_panic() {
        let mut app = create_test_app();
        app.handle_action(Action::Help);
        render_app_to_string(&mut app, 20, 6);
    }

    #[test]
    fn test_spread_truncates_when_narrow() {
        let line = spread(
            vec![Span::raw("a long left side")],
            vec![Span::raw("right")],
            8,
        );
        assert!(line.width() <= 8);
    }

    #[test]
    fn test_centered_fixed() {
        let area = Rect::new(0, 0, 100, 50);
        let centered = centered_fixed(40, 10, area);
        assert_eq!(centered, Rect::new(30, 20, 40, 10));
    }
}
