//! Conversation session: the message log plus the reply protocol.
//!
//! A session is `Idle` or `Busy`. An accepted submission appends the user
//! message, flips to `Busy` and spawns one reply task. Applying the reply
//! (or its failure) appends exactly one message and returns to `Idle`.
//! Submissions while `Busy` are rejected without touching the log.
//!
//! All log mutation goes through `&mut Session`; the reply task only
//! produces a value that the owner applies with [`Session::poll_reply`] or
//! [`Session::settle`].

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::backend::{backend_from_config, BackendError, Reply, ReplyBackend, ReplyRequest};
use crate::config::Config;
use crate::log::MessageLog;
use crate::message::{Message, MessageId, Role};

/// Reply-cycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStatus {
    /// Ready to accept a submission.
    #[default]
    Idle,
    /// A reply is in flight; submissions are rejected.
    Busy,
}

/// What observers see after every change.
#[derive(Debug, Clone, Default)]
pub struct SessionSnapshot {
    /// Increments on every published change.
    pub revision: u64,
    pub status: SessionStatus,
    pub closed: bool,
    pub messages: Vec<Message>,
}

/// Result of a clear request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearOutcome {
    /// The log was reset to its seed.
    Cleared,
    /// A reply is in flight; the reset happens right after it is applied.
    Deferred,
}

/// Why a submission was not accepted. None of these change the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    /// Empty or whitespace-only text.
    #[error("message is empty")]
    InvalidInput,

    /// A reply is already being generated.
    #[error("a reply is already in progress")]
    Busy,

    /// The session has been closed.
    #[error("session is closed")]
    Closed,
}

type ReplyResult = Result<Reply, BackendError>;

struct PendingReply {
    handle: JoinHandle<ReplyResult>,
    started: Instant,
}

/// One user's conversation.
pub struct Session {
    id: Uuid,
    config: Config,
    log: MessageLog,
    status: SessionStatus,
    backend: Arc<dyn ReplyBackend>,
    pending: Option<PendingReply>,
    clear_requested: bool,
    closed: bool,
    revision: u64,
    snapshot_tx: watch::Sender<SessionSnapshot>,
}

impl Session {
    /// Create a session using the backend named in the configuration.
    pub fn new(config: Config) -> Self {
        let backend = backend_from_config(&config);
        Self::with_backend(config, backend)
    }

    /// Create a session with an explicit backend.
    pub fn with_backend(config: Config, backend: Arc<dyn ReplyBackend>) -> Self {
        let log = MessageLog::seeded(config.greeting.clone());
        let (snapshot_tx, _) = watch::channel(SessionSnapshot {
            revision: 0,
            status: SessionStatus::Idle,
            closed: false,
            messages: log.messages().to_vec(),
        });
        let id = Uuid::new_v4();
        info!(session_id = %id, backend = backend.name(), "Session started");

        Self {
            id,
            config,
            log,
            status: SessionStatus::Idle,
            backend,
            pending: None,
            clear_requested: false,
            closed: false,
            revision: 0,
            snapshot_tx,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn messages(&self) -> &[Message] {
        self.log.messages()
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_busy(&self) -> bool {
        self.status == SessionStatus::Busy
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Whether a clear is waiting for the in-flight reply.
    pub fn clear_pending(&self) -> bool {
        self.clear_requested
    }

    /// Name of the reply backend.
    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Observe session changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Submit user text.
    ///
    /// On success the trimmed text is appended as a user message and a reply
    /// is scheduled. Must be called from within a Tokio runtime.
    pub fn submit(&mut self, text: &str) -> Result<MessageId, SubmitError> {
        if self.closed {
            return Err(SubmitError::Closed);
        }
        let content = text.trim();
        if content.is_empty() {
            debug!(session_id = %self.id, "Rejected empty submission");
            return Err(SubmitError::InvalidInput);
        }
        if self.is_busy() {
            debug!(session_id = %self.id, "Rejected submission while busy");
            return Err(SubmitError::Busy);
        }

        let id = self.log.append(Role::User, content, None);
        self.status = SessionStatus::Busy;

        let request = ReplyRequest {
            session_id: self.id,
            history: self.log.messages().to_vec(),
            latest: content.to_string(),
        };
        let backend = Arc::clone(&self.backend);
        let timeout = self.config.reply_timeout();
        let handle = tokio::spawn(async move {
            match tokio::time::timeout(timeout, backend.reply(request)).await {
                Ok(result) => result,
                Err(_) => Err(BackendError::Timeout(timeout)),
            }
        });
        self.pending = Some(PendingReply {
            handle,
            started: Instant::now(),
        });

        info!(
            session_id = %self.id,
            message_id = %id,
            chars = content.chars().count(),
            "Accepted submission"
        );
        self.publish();
        Ok(id)
    }

    /// Apply the in-flight reply if it has finished. Never waits for it.
    ///
    /// Returns the id of the appended assistant or error message.
    pub async fn poll_reply(&mut self) -> Option<MessageId> {
        if !self
            .pending
            .as_ref()
            .is_some_and(|p| p.handle.is_finished())
        {
            return None;
        }
        self.settle().await
    }

    /// Wait for the in-flight reply, if any, and apply it.
    ///
    /// Cancel-safe: dropping this future leaves the reply pending.
    pub async fn settle(&mut self) -> Option<MessageId> {
        let joined = {
            let pending = self.pending.as_mut()?;
            (&mut pending.handle).await
        };
        let pending = self.pending.take()?;
        Some(self.complete(joined, pending.started))
    }

    fn complete(&mut self, joined: Result<ReplyResult, JoinError>, started: Instant) -> MessageId {
        #[allow(clippy::cast_possible_truncation)]
        let duration_ms = started.elapsed().as_millis() as u64;

        let id = match joined {
            Ok(Ok(reply)) => {
                let id = self
                    .log
                    .append(Role::Assistant, reply.content, reply.metadata);
                info!(session_id = %self.id, message_id = %id, duration_ms, "Reply appended");
                id
            }
            Ok(Err(e)) => {
                warn!(session_id = %self.id, error = %e, duration_ms, "Reply failed");
                self.log.append(Role::Error, format!("Error: {e}"), None)
            }
            Err(e) => {
                warn!(session_id = %self.id, error = %e, "Reply task aborted");
                self.log
                    .append(Role::Error, format!("Error: reply task failed: {e}"), None)
            }
        };

        self.status = SessionStatus::Idle;
        if self.clear_requested {
            self.clear_requested = false;
            self.log.reset();
            info!(session_id = %self.id, "Deferred clear applied");
        }
        self.publish();
        id
    }

    /// Reset the log to its seeded state.
    ///
    /// While a reply is in flight the reset is deferred until that reply has
    /// been applied, so the reply never lands in a cleared log.
    pub fn clear(&mut self) -> ClearOutcome {
        if self.is_busy() {
            self.clear_requested = true;
            debug!(session_id = %self.id, "Clear deferred until reply completes");
            return ClearOutcome::Deferred;
        }
        self.log.reset();
        info!(session_id = %self.id, "Conversation cleared");
        self.publish();
        ClearOutcome::Cleared
    }

    /// Tear the session down, cancelling any in-flight reply.
    ///
    /// A cancelled reply is never appended. Further submissions fail with
    /// [`SubmitError::Closed`].
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        if let Some(pending) = self.pending.take() {
            pending.handle.abort();
            info!(session_id = %self.id, "Cancelled in-flight reply");
        }
        self.closed = true;
        self.clear_requested = false;
        self.status = SessionStatus::Idle;
        self.publish();
    }

    fn publish(&mut self) {
        self.revision += 1;
        self.snapshot_tx.send_replace(SessionSnapshot {
            revision: self.revision,
            status: self.status,
            closed: self.closed,
            messages: self.log.messages().to_vec(),
        });
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.handle.abort();
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("status", &self.status)
            .field("len", &self.log.len())
            .field("backend", &self.backend.name())
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}
