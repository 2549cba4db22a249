//! marketdesk-engine: Headless conversation core for the marketdesk assistant
//!
//! This crate provides:
//! - Message types and the append-only message log
//! - The conversation session and its reply protocol
//! - Reply backends (canned placeholder and external command)
//! - Configuration loading

pub mod backend;
pub mod config;
pub mod log;
pub mod message;
pub mod session;

// Re-export commonly used types
pub use backend::{
    backend_from_config, build_prompt, BackendError, CannedBackend, CommandBackend, Reply,
    ReplyBackend, ReplyRequest, CANNED_REPLY,
};
pub use config::{BackendConfig, Config, ConfigError, CONFIG_FILE, MARKETDESK_DIR};
pub use log::MessageLog;
pub use message::{Message, MessageId, MessageMetadata, Reaction, Role, Sentiment};
pub use session::{ClearOutcome, Session, SessionSnapshot, SessionStatus, SubmitError};

/// Returns the engine version.
pub fn engine_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_version() {
        let version = engine_version();
        assert!(!version.is_empty());
        assert!(version.starts_with("0."));
    }
}
