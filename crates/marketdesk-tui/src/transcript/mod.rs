//! Message list renderer.
//!
//! This module provides:
//! - [`render`] - pure projection of messages into styled lines
//! - [`TranscriptView`] - scroll and follow state, owned by the view
//! - [`TranscriptWidget`] - the bordered, lazily laid out message pane
//! - [`plain`] - unstyled text projection for line mode

pub mod plain;
pub mod render;
mod view;
mod widget;

pub use render::{render_message, render_transcript, EMPTY_TRANSCRIPT, LOADING_TEXT};
pub use view::{ScrollAnchor, TranscriptView, SCROLL_SPEED};
pub use widget::TranscriptWidget;
