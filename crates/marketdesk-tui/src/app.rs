//! Application state and update logic for the marketdesk TUI.

use crossterm::event::{KeyCode, KeyEvent, MouseEvent, MouseEventKind};
use marketdesk_engine::{ClearOutcome, Config, Session, SubmitError};
use tracing::debug;

use crate::event::{key_to_action, Action};
use crate::input::{InputOutcome, InputState};
use crate::theme::Theme;
use crate::transcript::{TranscriptView, SCROLL_SPEED};

/// Lines moved per PageUp/PageDown.
const PAGE_SCROLL: usize = 10;

/// Ticks a notification stays on screen.
const NOTIFICATION_TICKS: usize = 12;

/// Main application state.
pub struct App {
    /// The conversation being shown.
    pub session: Session,
    /// Composer state.
    pub input: InputState,
    /// Scroll state of the message list.
    pub transcript: TranscriptView,
    pub theme: Theme,
    /// Whether the app should exit.
    pub should_quit: bool,
    pub show_help: bool,
    /// Whether the terminal reports Shift+Enter apart from Enter.
    pub keyboard_enhanced: bool,
    /// Transient status line text.
    pub notification: Option<String>,
    notification_ttl: usize,
}

impl App {
    /// Create an app with a session built from `config`.
    pub fn new(config: Config) -> Self {
        Self::with_session(Session::new(config))
    }

    pub fn with_session(session: Session) -> Self {
        let mut app = Self {
            input: InputState::with_max_chars(session.config().max_input_chars),
            session,
            transcript: TranscriptView::new(),
            theme: Theme::default(),
            should_quit: false,
            show_help: false,
            keyboard_enhanced: false,
            notification: None,
            notification_ttl: 0,
        };
        app.sync();
        app
    }

    /// Route a key press to an app action or to the composer.
    pub fn handle_key(&mut self, key: KeyEvent) {
        let action = key_to_action(key);
        if action != Action::None {
            self.handle_action(action);
            return;
        }

        // Help overlay swallows the next key
        if self.show_help {
            self.show_help = false;
            return;
        }

        match self.input.handle_key(key) {
            InputOutcome::Submit(text) => self.submit(&text),
            InputOutcome::Changed => {}
            InputOutcome::Ignored => match key.code {
                KeyCode::Up => self.handle_action(Action::ScrollUp),
                KeyCode::Down => self.handle_action(Action::ScrollDown),
                _ => {}
            },
        }
    }

    pub fn handle_action(&mut self, action: Action) {
        match action {
            Action::Quit => {
                if self.show_help {
                    self.show_help = false;
                } else {
                    self.should_quit = true;
                }
                return;
            }
            Action::Help => {
                self.show_help = !self.show_help;
                return;
            }
            _ => {}
        }

        if self.show_help {
            self.show_help = false;
            return;
        }

        match action {
            Action::Clear => self.clear(),
            Action::JumpToLatest => self.transcript.jump_to_latest(),
            Action::JumpToStart => self.transcript.jump_to_start(),
            Action::ScrollUp => self.transcript.scroll_up(1),
            Action::ScrollDown => self.transcript.scroll_down(1),
            Action::PageUp => self.transcript.scroll_up(PAGE_SCROLL),
            Action::PageDown => self.transcript.scroll_down(PAGE_SCROLL),
            Action::Back => {
                self.notification = None;
                self.notification_ttl = 0;
            }
            Action::Quit | Action::Help | Action::None => {}
        }
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        match mouse.kind {
            MouseEventKind::ScrollUp => self.transcript.scroll_up(SCROLL_SPEED),
            MouseEventKind::ScrollDown => self.transcript.scroll_down(SCROLL_SPEED),
            _ => {}
        }
    }

    /// Insert pasted text into the composer, unless it is disabled.
    pub fn handle_paste(&mut self, text: &str) {
        if !self.input.is_disabled() {
            self.input.insert_str(&text.replace("\r\n", "\n"));
        }
    }

    fn submit(&mut self, text: &str) {
        match self.session.submit(text) {
            Ok(id) => {
                debug!(message_id = %id, "Submitted from input");
                self.input.commit();
                self.transcript.jump_to_latest();
            }
            // The composer never offers blank text; nothing to report.
            Err(SubmitError::InvalidInput) => {}
            Err(e) => self.set_notification(format!("Not sent: {e}")),
        }
        self.sync();
    }

    fn clear(&mut self) {
        match self.session.clear() {
            ClearOutcome::Cleared => self.set_notification("Conversation cleared".to_string()),
            ClearOutcome::Deferred => {
                self.set_notification("Clearing after the current reply".to_string());
            }
        }
        self.sync();
    }

    /// Apply a finished reply, if any, and refresh derived view state.
    pub async fn poll_session(&mut self) {
        self.session.poll_reply().await;
        self.sync();
    }

    fn sync(&mut self) {
        self.input.set_disabled(self.session.is_busy());
        self.transcript.observe(self.session.len());
    }

    fn set_notification(&mut self, msg: String) {
        self.notification = Some(msg);
        self.notification_ttl = NOTIFICATION_TICKS;
    }

    /// Advance timers (called on each tick event).
    pub fn tick(&mut self) {
        if self.notification_ttl > 0 {
            self.notification_ttl -= 1;
            if self.notification_ttl == 0 {
                self.notification = None;
            }
        }
    }

    /// Tear down the session before exit.
    pub fn shutdown(&mut self) {
        self.session.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_app, create_test_app_with_backend};
    use crossterm::event::{KeyModifiers, MouseEvent};
    use marketdesk_engine::{BackendError, Reply, ReplyBackend, ReplyRequest, Role};
    use std::sync::Arc;
    use std::time::Duration;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
    }

    async fn wait_for_reply(app: &mut App) {
        tokio::time::sleep(Duration::from_millis(1001)).await;
        app.session.settle().await;
        app.poll_session().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_cycle_disables_then_reenables_input() {
        let mut app = create_test_app();
        assert_eq!(app.session.len(), 1);

        type_text(&mut app, "What is AAPL doing?");
        app.handle_key(key(KeyCode::Enter));

        assert_eq!(app.session.len(), 2);
        assert!(app.session.is_busy());
        assert!(app.input.is_disabled());
        assert!(app.input.is_empty());

        // Typing while busy is ignored
        type_text(&mut app, "more");
        assert!(app.input.is_empty());

        wait_for_reply(&mut app).await;
        assert_eq!(app.session.len(), 3);
        assert!(!app.input.is_disabled());
        assert_eq!(app.session.messages()[2].role, Role::Assistant);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_before_latency_changes_nothing() {
        let mut app = create_test_app();
        type_text(&mut app, "hi");
        app.handle_key(key(KeyCode::Enter));

        tokio::time::sleep(Duration::from_millis(500)).await;
        app.poll_session().await;
        assert_eq!(app.session.len(), 2);
        assert!(app.input.is_disabled());
    }

    #[tokio::test]
    async fn test_whitespace_enter_does_nothing() {
        let mut app = create_test_app();
        type_text(&mut app, "   ");
        app.handle_key(key(KeyCode::Enter));

        assert_eq!(app.session.len(), 1);
        assert!(!app.session.is_busy());
        assert_eq!(app.input.content(), "   ");
    }

    #[tokio::test]
    async fn test_shift_enter_inserts_newline() {
        let mut app = create_test_app();
        type_text(&mut app, "line one");
        app.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::SHIFT));
        type_text(&mut app, "line two");

        assert_eq!(app.input.content(), "line one\nline two");
        assert_eq!(app.session.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_while_busy_is_deferred() {
        let mut app = create_test_app();
        type_text(&mut app, "hello");
        app.handle_key(key(KeyCode::Enter));

        app.handle_key(KeyEvent::new(KeyCode::Char('l'), KeyModifiers::CONTROL));
        assert_eq!(
            app.notification.as_deref(),
            Some("Clearing after the current reply")
        );
        assert_eq!(app.session.len(), 2);

        wait_for_reply(&mut app).await;
        assert_eq!(app.session.len(), 1);
        assert!(app.transcript.is_following());
    }

    #[tokio::test]
    async fn test_clear_when_idle() {
        let mut app = create_test_app();
        app.handle_action(Action::Clear);
        assert_eq!(app.notification.as_deref(), Some("Conversation cleared"));
        assert_eq!(app.session.len(), 1);
    }

    struct Unavailable;

    #[async_trait::async_trait]
    impl ReplyBackend for Unavailable {
        fn name(&self) -> &str {
            "unavailable"
        }

        async fn reply(&self, _request: ReplyRequest) -> Result<Reply, BackendError> {
            Err(BackendError::Failed("service unavailable".into()))
        }
    }

    #[tokio::test]
    async fn test_backend_failure_reenables_input() {
        let mut app = create_test_app_with_backend(Arc::new(Unavailable));
        type_text(&mut app, "hi");
        app.handle_key(key(KeyCode::Enter));

        app.session.settle().await;
        app.poll_session().await;

        assert!(!app.input.is_disabled());
        let last = app.session.messages().last().unwrap();
        assert_eq!(last.role, Role::Error);
    }

    #[test]
    fn test_help_toggle_and_close_on_key() {
        let mut app = create_test_app();
        app.handle_action(Action::Help);
        assert!(app.show_help);

        app.handle_key(key(KeyCode::Char('x')));
        assert!(!app.show_help);
        assert!(app.input.is_empty());
    }

    #[test]
    fn test_quit_closes_help_first() {
        let mut app = create_test_app();
        app.show_help = true;
        app.handle_action(Action::Quit);
        assert!(!app.show_help);
        assert!(!app.should_quit);

        app.handle_action(Action::Quit);
        assert!(app.should_quit);
    }

    #[test]
    fn test_notification_expires_after_ticks() {
        let mut app = create_test_app();
        app.set_notification("hello".into());
        for _ in 0..NOTIFICATION_TICKS {
            assert!(app.notification.is_some());
            app.tick();
        }
        assert!(app.notification.is_none());
    }

    #[test]
    fn test_paste_inserts_text() {
        let mut app = create_test_app();
        app.handle_paste("line\r\nnext");
        assert_eq!(app.input.content(), "line\nnext");
    }

    #[test]
    fn test_mouse_scroll_without_overflow_keeps_following() {
        let mut app = create_test_app();
        app.handle_mouse(MouseEvent {
            kind: MouseEventKind::ScrollUp,
            column: 0,
            row: 0,
            modifiers: KeyModifiers::NONE,
        });
        assert!(app.transcript.is_following());
    }

    #[tokio::test]
    async fn test_shutdown_closes_session() {
        let mut app = create_test_app();
        type_text(&mut app, "hi");
        app.handle_key(key(KeyCode::Enter));
        app.shutdown();

        assert!(app.session.is_closed());
        assert_eq!(app.session.len(), 2);
    }
}
