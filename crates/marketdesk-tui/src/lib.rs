//! marketdesk-tui: Terminal UI for the marketdesk market assistant
//!
//! This crate provides:
//! - The chat screen (message list, composer, status line)
//! - Input capture with a character counter and multi-line editing
//! - A lazily laid out message list with follow mode
//! - A plain-text transcript projection for line mode

mod app;
mod event;
pub mod input;
pub mod text;
pub mod theme;
pub mod transcript;
mod ui;

#[cfg(test)]
pub mod test_utils;

pub use app::App;
pub use event::{Action, Event, EventHandler};
pub use marketdesk_engine;

use crossterm::{
    cursor::Show as ShowCursor,
    event::{
        DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
        KeyEventKind, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
        PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use marketdesk_engine::Config;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, stdout};
use tracing::info;

/// Tick interval of the event loop.
const TICK_RATE_MS: u64 = 100;

/// Keyboard protocol flags requested when the terminal supports them.
///
/// Disambiguated escape codes report Shift+Enter separately from Enter.
fn keyboard_flags() -> KeyboardEnhancementFlags {
    KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
}

/// RAII guard for terminal state restoration.
struct TerminalGuard {
    /// Keyboard enhancement flags were pushed and must be popped.
    keyboard_enhanced: bool,
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if self.keyboard_enhanced {
            let _ = execute!(stdout(), PopKeyboardEnhancementFlags);
        }
        let _ = disable_raw_mode();
        let _ = execute!(
            stdout(),
            DisableBracketedPaste,
            DisableMouseCapture,
            LeaveAlternateScreen,
            ShowCursor
        );
    }
}

/// Run the TUI application.
///
/// Sets up the terminal, runs the event loop, and restores the terminal on
/// exit, including when the loop fails.
pub async fn run_tui(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    enable_raw_mode()?;
    let keyboard_enhanced = matches!(supports_keyboard_enhancement(), Ok(true));
    let _guard = TerminalGuard { keyboard_enhanced };

    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture, EnableBracketedPaste)?;
    if keyboard_enhanced {
        execute!(stdout, PushKeyboardEnhancementFlags(keyboard_flags()))?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config);
    app.keyboard_enhanced = keyboard_enhanced;
    info!(session_id = %app.session.id(), keyboard_enhanced, "TUI started");

    let mut events = EventHandler::new(TICK_RATE_MS);

    let result = run_loop(&mut terminal, &mut app, &mut events).await;

    // An in-flight reply must not outlive the screen.
    app.shutdown();
    info!(session_id = %app.session.id(), "TUI stopped");

    terminal.show_cursor()?;

    result
}

async fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &mut EventHandler,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        terminal.draw(|frame| ui::draw(frame, app))?;

        let Some(event) = events.next().await else {
            // The terminal stopped producing events.
            break;
        };
        match event {
            Event::Key(key) => {
                if key.kind != KeyEventKind::Release {
                    app.handle_key(key);
                }
            }
            Event::Mouse(mouse) => app.handle_mouse(mouse),
            Event::Paste(text) => app.handle_paste(&text),
            Event::Tick => app.tick(),
            Event::Resize(_, _) => {
                // Next draw picks up the new size
            }
        }

        app.poll_session().await;

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

/// Get the TUI version.
pub fn tui_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
