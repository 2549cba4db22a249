//! Message types for market assistant conversations.
//!
//! A [`Message`] is immutable once created. Identifiers are handed out by the
//! owning log so that they stay unique for the whole session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique, strictly increasing identifier of a message within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub u64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Role of a message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Text typed by the user.
    User,
    /// Reply produced by the assistant backend.
    Assistant,
    /// Informational notice from the application.
    System,
    /// A failed reply cycle.
    Error,
    /// Reserved for renderers showing a pending reply.
    Loading,
    /// Reserved for market data annotations.
    Market,
}

impl Role {
    /// Short uppercase label used in headers and plain output.
    pub fn label(self) -> &'static str {
        match self {
            Role::User => "YOU",
            Role::Assistant => "ASSISTANT",
            Role::System => "SYSTEM",
            Role::Error => "ERROR",
            Role::Loading => "LOADING",
            Role::Market => "MARKET",
        }
    }

    /// Whether messages with this role are stored in a log.
    /// `MessageLog::append` asserts it.
    pub fn is_conversational(self) -> bool {
        matches!(self, Role::User | Role::Assistant | Role::System | Role::Error)
    }
}

/// Sentiment tag attached by an analytics backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
        };
        f.write_str(s)
    }
}

/// Reaction counter on a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    /// Reaction kind (e.g. "like").
    #[serde(rename = "type")]
    pub kind: String,
    /// How many times it was given.
    pub count: u32,
    /// Who gave it.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub users: Vec<String>,
}

/// Optional structured annotations on a message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageMetadata {
    /// Related ticker symbol, without the `$` prefix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock_symbol: Option<String>,
    /// Price change in percent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_change: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<Sentiment>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reactions: Vec<Reaction>,
}

impl MessageMetadata {
    /// Metadata tagging a single ticker symbol.
    pub fn for_symbol(symbol: impl Into<String>) -> Self {
        Self {
            stock_symbol: Some(symbol.into()),
            ..Self::default()
        }
    }

    /// True when no annotation is set.
    pub fn is_empty(&self) -> bool {
        self.stock_symbol.is_none()
            && self.price_change.is_none()
            && self.sentiment.is_none()
            && self.links.is_empty()
            && self.reactions.is_empty()
    }
}

/// A single entry in a conversation log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub role: Role,
    pub content: String,
    /// Creation time (UTC).
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MessageMetadata>,
}

impl Message {
    /// Create a message stamped with the current time.
    pub fn new(id: MessageId, role: Role, content: impl Into<String>) -> Self {
        Self::with_timestamp(id, role, content, Utc::now())
    }

    /// Create a message with an explicit timestamp.
    pub fn with_timestamp(
        id: MessageId,
        role: Role,
        content: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            role,
            content: content.into(),
            timestamp,
            metadata: None,
        }
    }

    /// Attach metadata. Empty metadata is dropped.
    #[must_use]
    pub fn with_metadata(mut self, metadata: Option<MessageMetadata>) -> Self {
        self.metadata = metadata.filter(|m| !m.is_empty());
        self
    }
}
