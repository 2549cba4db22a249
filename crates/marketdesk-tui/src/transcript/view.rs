//! View-local scroll state for the transcript.
//!
//! Holds no messages. The app reports the log length with
//! [`TranscriptView::observe`]. Scroll requests are recorded as a line delta
//! and resolved by the widget with [`TranscriptView::resolve`], which knows
//! the row count of each message at the current width.

/// Lines scrolled per mouse wheel tick.
pub const SCROLL_SPEED: usize = 3;

/// First visible row: a message index and the rows of it scrolled past.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct ScrollAnchor {
    pub message: usize,
    pub line: usize,
}

impl ScrollAnchor {
    pub fn new(message: usize, line: usize) -> Self {
        Self { message, line }
    }
}

/// Scroll and follow state of the message list.
#[derive(Debug, Clone)]
pub struct TranscriptView {
    /// Keep the newest row in view as the log grows.
    follow: bool,
    /// First visible row when not following.
    top: ScrollAnchor,
    /// Anchor that puts the newest row on the last line of the pane.
    bottom: ScrollAnchor,
    /// Lines requested since the last resolve; negative is towards older.
    pending: isize,
    /// Log length at the last observation.
    seen_len: usize,
    /// Messages that arrived while scrolled away.
    unseen: usize,
}

impl Default for TranscriptView {
    fn default() -> Self {
        Self::new()
    }
}

impl TranscriptView {
    pub fn new() -> Self {
        Self {
            follow: true,
            top: ScrollAnchor::default(),
            bottom: ScrollAnchor::default(),
            pending: 0,
            seen_len: 0,
            unseen: 0,
        }
    }

    pub fn is_following(&self) -> bool {
        self.follow
    }

    /// First visible row as of the last resolve.
    pub fn top(&self) -> ScrollAnchor {
        if self.follow {
            self.bottom
        } else {
            self.top
        }
    }

    pub fn unseen(&self) -> usize {
        self.unseen
    }

    /// Whether to offer a "jump to latest" affordance instead of scrolling.
    pub fn show_jump_to_latest(&self) -> bool {
        !self.follow
    }

    /// Record the current log length.
    pub fn observe(&mut self, len: usize) {
        if len > self.seen_len && !self.follow {
            self.unseen += len - self.seen_len;
        }
        if len < self.seen_len {
            // The log was reset.
            self.top = ScrollAnchor::default();
            self.bottom = ScrollAnchor::default();
            self.jump_to_latest();
        }
        self.seen_len = len;
    }

    /// Apply pending scrolling against the current layout.
    ///
    /// `bottom` is the anchor that shows the newest row last; `rows(i)` is
    /// the number of rows message `i` occupies. Only messages between the
    /// old and new top are measured.
    pub fn resolve(&mut self, bottom: ScrollAnchor, rows: impl Fn(usize) -> usize) {
        self.bottom = bottom;
        let mut delta = std::mem::take(&mut self.pending);
        if self.follow {
            return;
        }

        let mut top = self.top.min(bottom);
        // Layout may have changed since the last resolve.
        while top < bottom && top.line >= rows(top.message) {
            top = ScrollAnchor::new(top.message + 1, top.line - rows(top.message));
        }

        while delta < 0 {
            if top.line > 0 {
                let step = top.line.min(delta.unsigned_abs());
                top.line -= step;
                delta += signed(step);
            } else if top.message > 0 {
                top.message -= 1;
                top.line = rows(top.message);
            } else {
                break;
            }
        }

        while delta > 0 && top < bottom {
            let height = rows(top.message);
            let limit = if top.message == bottom.message {
                bottom.line
            } else {
                height
            };
            let step = limit.saturating_sub(top.line).min(delta.unsigned_abs());
            top.line += step;
            delta -= signed(step);
            if top.message < bottom.message && top.line >= height {
                top = ScrollAnchor::new(top.message + 1, 0);
            }
        }

        self.top = top;
        if self.top >= bottom {
            self.jump_to_latest();
        }
    }

    /// Scroll towards older rows. Disables follow mode.
    pub fn scroll_up(&mut self, lines: usize) {
        if self.follow {
            if self.bottom == ScrollAnchor::default() {
                // Everything already fits.
                return;
            }
            self.top = self.bottom;
            self.follow = false;
        }
        self.pending = self.pending.saturating_sub(signed(lines));
    }

    /// Scroll towards newer rows; reaching the bottom resumes following.
    pub fn scroll_down(&mut self, lines: usize) {
        if self.follow {
            return;
        }
        self.pending = self.pending.saturating_add(signed(lines));
    }

    /// Jump to the first message. Disables follow mode.
    pub fn jump_to_start(&mut self) {
        if self.bottom == ScrollAnchor::default() {
            return;
        }
        self.follow = false;
        self.top = ScrollAnchor::default();
        self.pending = 0;
    }

    /// Jump to the newest row and resume following.
    pub fn jump_to_latest(&mut self) {
        self.follow = true;
        self.top = self.bottom;
        self.pending = 0;
        self.unseen = 0;
    }
}

fn signed(n: usize) -> isize {
    isize::try_from(n).unwrap_or(isize::MAX)
}
