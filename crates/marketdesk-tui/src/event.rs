//! Event handling for the marketdesk TUI.

use crossterm::event::{self, Event as CrosstermEvent, KeyCode, KeyEvent, KeyModifiers, MouseEvent};
use std::io;
use std::time::Duration;
use tokio::sync::mpsc;

/// Events that can occur in the TUI.
#[derive(Debug, Clone)]
pub enum Event {
    /// A key was pressed.
    Key(KeyEvent),
    /// A mouse event occurred.
    Mouse(MouseEvent),
    /// A paste from the terminal.
    Paste(String),
    /// No input within the tick interval.
    Tick,
    /// Terminal was resized.
    Resize(u16, u16),
}

/// Terminal event source backed by a polling thread.
///
/// The channel closes when the polling thread stops, which happens once
/// the terminal can no longer be read.
pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
    /// Create a new event handler with the specified tick rate.
    pub fn new(tick_rate_ms: u64) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        // crossterm polling is blocking, so it gets its own thread
        std::thread::spawn(move || {
            forward_events(
                Duration::from_millis(tick_rate_ms),
                event::poll,
                event::read,
                &tx,
            );
        });

        Self { rx }
    }

    /// Get the next event, waiting until one is available.
    ///
    /// Returns `None` once the terminal stopped producing events.
    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }
}

fn convert(event: CrosstermEvent) -> Option<Event> {
    match event {
        CrosstermEvent::Key(key) => Some(Event::Key(key)),
        CrosstermEvent::Mouse(mouse) => Some(Event::Mouse(mouse)),
        CrosstermEvent::Paste(text) => Some(Event::Paste(text)),
        CrosstermEvent::Resize(w, h) => Some(Event::Resize(w, h)),
        _ => None,
    }
}

/// Pump terminal events into `tx` until the receiver goes away or the
/// terminal fails.
fn forward_events(
    tick_rate: Duration,
    mut poll: impl FnMut(Duration) -> io::Result<bool>,
    mut read: impl FnMut() -> io::Result<CrosstermEvent>,
    tx: &mpsc::UnboundedSender<Event>,
) {
    loop {
        let event = match poll(tick_rate) {
            Ok(true) => match read() {
                Ok(evt) => convert(evt),
                Err(e) => {
                    tracing::warn!(error = %e, "Terminal read failed");
                    return;
                }
            },
            Ok(false) => Some(Event::Tick),
            Err(e) => {
                tracing::warn!(error = %e, "Terminal poll failed");
                return;
            }
        };
        if let Some(event) = event {
            if tx.send(event).is_err() {
                return;
            }
        }
    }
}

/// App-level action bound to a key chord.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    Clear,
    JumpToLatest,
    JumpToStart,
    Help,
    Back,
    ScrollUp,
    ScrollDown,
    PageUp,
    PageDown,
    None,
}

/// Map a key to an app-level action.
///
/// Plain typing maps to [`Action::None`] and belongs to the input box.
pub fn key_to_action(key: KeyEvent) -> Action {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c' | 'q') => Action::Quit,
            KeyCode::Char('l') => Action::Clear,
            KeyCode::Char('g') | KeyCode::End => Action::JumpToLatest,
            KeyCode::Home => Action::JumpToStart,
            _ => Action::None,
        };
    }

    match key.code {
        KeyCode::F(1) => Action::Help,
        KeyCode::Esc => Action::Back,
        KeyCode::PageUp => Action::PageUp,
        KeyCode::PageDown => Action::PageDown,
        _ => Action::None,
    }
}
