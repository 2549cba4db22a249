//! Append-only message log.
//!
//! The log owns id assignment. Ids keep increasing across [`MessageLog::reset`]
//! so a renderer keyed by id never sees a reused key.

use crate::message::{Message, MessageId, MessageMetadata, Role};

/// Ordered record of the messages in one session.
#[derive(Debug, Clone)]
pub struct MessageLog {
    messages: Vec<Message>,
    /// Content of the greeting placed at the start of the log.
    seed: Option<String>,
    /// Next id to assign.
    next_id: u64,
}

impl MessageLog {
    /// Create an empty log without a seed.
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            seed: None,
            next_id: 1,
        }
    }

    /// Create a log holding one assistant greeting.
    pub fn seeded(greeting: impl Into<String>) -> Self {
        let mut log = Self::new();
        log.seed = Some(greeting.into());
        log.reset();
        log
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Append a message and return its id.
    ///
    /// Only conversational roles belong in the log; `Loading` and `Market`
    /// are display-only.
    pub fn append(
        &mut self,
        role: Role,
        content: impl Into<String>,
        metadata: Option<MessageMetadata>,
    ) -> MessageId {
        debug_assert!(role.is_conversational(), "{role:?} is not stored in the log");
        let id = MessageId(self.next_id);
        self.next_id += 1;
        self.messages
            .push(Message::new(id, role, content).with_metadata(metadata));
        id
    }

    /// Return the log to its initial seeded state.
    pub fn reset(&mut self) {
        self.messages.clear();
        if let Some(greeting) = self.seed.clone() {
            self.append(Role::Assistant, greeting, None);
        }
    }

}

impl Default for MessageLog {
    fn default() -> Self {
        Self::new()
    }
}
