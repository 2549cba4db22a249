//! Reply backends.
//!
//! A backend turns the current conversation into exactly one reply or one
//! error. The session owns timeouts and cancellation; backends only produce
//! a result.

use crate::config::{BackendConfig, Config};
use crate::message::{Message, MessageMetadata, Role};
use async_trait::async_trait;
use regex::Regex;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;
use uuid::Uuid;

/// Placeholder text returned by [`CannedBackend`].
pub const CANNED_REPLY: &str = "I'm analyzing the market data for your query. This is a \
placeholder response while we implement the actual AI integration.";

/// Input to a backend call.
#[derive(Debug, Clone)]
pub struct ReplyRequest {
    /// Session issuing the request.
    pub session_id: Uuid,
    /// Log snapshot at the time of submission, ending with the user message.
    pub history: Vec<Message>,
    /// Text of the latest user message.
    pub latest: String,
}

/// Successful backend result.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub content: String,
    pub metadata: Option<MessageMetadata>,
}

impl Reply {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: None,
        }
    }
}

/// A collaborator producing assistant replies.
#[async_trait]
pub trait ReplyBackend: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Produce a reply for the request. Called at most once per request.
    async fn reply(&self, request: ReplyRequest) -> Result<Reply, BackendError>;
}

/// Build the backend described by the configuration.
pub fn backend_from_config(config: &Config) -> Arc<dyn ReplyBackend> {
    match &config.backend {
        BackendConfig::Canned => Arc::new(CannedBackend::new(
            config.reply_latency(),
            &config.watchlist,
        )),
        BackendConfig::Command { command_argv } => {
            Arc::new(CommandBackend::new(command_argv.clone()))
        }
    }
}

/// Stub backend: waits a fixed latency and returns [`CANNED_REPLY`].
///
/// When the user text names a watchlist ticker the reply is tagged with it.
#[derive(Debug, Clone)]
pub struct CannedBackend {
    latency: Duration,
    symbols: Option<Regex>,
}

impl CannedBackend {
    pub fn new(latency: Duration, watchlist: &[String]) -> Self {
        Self {
            latency,
            symbols: watchlist_regex(watchlist),
        }
    }

    /// First watchlist ticker mentioned in `text`, uppercased.
    pub fn detect_symbol(&self, text: &str) -> Option<String> {
        let re = self.symbols.as_ref()?;
        re.captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_ascii_uppercase())
    }
}

fn watchlist_regex(watchlist: &[String]) -> Option<Regex> {
    let alternatives: Vec<String> = watchlist
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(regex::escape)
        .collect();
    if alternatives.is_empty() {
        return None;
    }
    Regex::new(&format!(r"(?i)(?:^|[^A-Za-z0-9])\$?({})\b", alternatives.join("|"))).ok()
}

#[async_trait]
impl ReplyBackend for CannedBackend {
    fn name(&self) -> &str {
        "canned"
    }

    async fn reply(&self, request: ReplyRequest) -> Result<Reply, BackendError> {
        tokio::time::sleep(self.latency).await;
        let metadata = self
            .detect_symbol(&request.latest)
            .map(MessageMetadata::for_symbol);
        Ok(Reply {
            content: CANNED_REPLY.to_string(),
            metadata,
        })
    }
}

/// Backend that pipes a prompt into an external command and reads stdout.
#[derive(Debug, Clone)]
pub struct CommandBackend {
    command_argv: Vec<String>,
}

impl CommandBackend {
    pub fn new(command_argv: Vec<String>) -> Self {
        Self { command_argv }
    }
}

#[async_trait]
impl ReplyBackend for CommandBackend {
    fn name(&self) -> &str {
        self.command_argv.first().map_or("command", String::as_str)
    }

    async fn reply(&self, request: ReplyRequest) -> Result<Reply, BackendError> {
        let Some((program, args)) = self.command_argv.split_first() else {
            return Err(BackendError::Failed("empty command".into()));
        };

        let prompt = build_prompt(&request);

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(BackendError::Spawn)?;

        if let Some(mut stdin) = child.stdin.take() {
            // A command may exit without reading its input; its status decides.
            if let Err(e) = stdin.write_all(prompt.as_bytes()).await {
                if e.kind() != std::io::ErrorKind::BrokenPipe {
                    return Err(e.into());
                }
            }
            drop(stdin);
        }

        let output = child.wait_with_output().await?;
        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        debug!(
            program = %program,
            status = ?output.status.code(),
            bytes = stdout.len(),
            "Command backend finished"
        );

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(BackendError::Failed(if stderr.is_empty() {
                format!("{program} exited with {}", output.status)
            } else {
                stderr
            }));
        }
        if stdout.is_empty() {
            return Err(BackendError::EmptyResponse);
        }

        Ok(Reply::text(stdout))
    }
}

/// Build the prompt sent to a text backend.
pub fn build_prompt(request: &ReplyRequest) -> String {
    use std::fmt::Write;

    let mut prompt = String::new();
    prompt.push_str(MARKET_SYSTEM_PROMPT);
    prompt.push_str("\n\nConversation:\n");

    for msg in &request.history {
        let speaker = match msg.role {
            Role::User => "User",
            Role::Assistant => "Assistant",
            Role::System => "[System]",
            // Failed turns and reserved roles carry no conversational content.
            Role::Error | Role::Loading | Role::Market => continue,
        };
        let _ = write!(prompt, "{speaker}: {}\n\n", msg.content);
    }

    prompt.push_str("\nRespond to the user's last message.\n");
    prompt
}

const MARKET_SYSTEM_PROMPT: &str = "You are a market analysis assistant. Answer questions \
about stocks, market trends and financial insights concisely. When you mention a ticker, \
write it in uppercase. Do not give personalised investment advice.";

/// Errors a backend can produce.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// Failed to spawn the backend process.
    #[error("Failed to spawn backend: {0}")]
    Spawn(#[source] std::io::Error),

    /// I/O error talking to the backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The reply did not arrive in time.
    #[error("Reply timed out after {0:?}")]
    Timeout(Duration),

    /// The backend reported a failure.
    #[error("Backend failed: {0}")]
    Failed(String),

    /// The backend returned no content.
    #[error("Backend returned an empty response")]
    EmptyResponse,
}
