//! Configuration types for the marketdesk engine.
//!
//! Configuration lives in `.marketdesk/config.json`. Every field has a
//! default so a partial (or missing) file is valid.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Directory holding marketdesk state, relative to the working directory.
pub const MARKETDESK_DIR: &str = ".marketdesk";

/// Config file name inside [`MARKETDESK_DIR`].
pub const CONFIG_FILE: &str = "config.json";

/// Main configuration for a conversation session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Assistant greeting seeded into every new log.
    #[serde(default = "default_greeting")]
    pub greeting: String,

    /// Simulated latency of the canned backend, in milliseconds.
    #[serde(default = "default_reply_latency_ms")]
    pub reply_latency_ms: u64,

    /// Upper bound on a single reply, in seconds.
    #[serde(default = "default_reply_timeout_seconds")]
    pub reply_timeout_seconds: u64,

    /// Advisory input length shown by the character counter.
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,

    /// Ticker symbols recognised in user text.
    #[serde(default = "default_watchlist")]
    pub watchlist: Vec<String>,

    /// Which reply backend to use.
    #[serde(default)]
    pub backend: BackendConfig,
}

fn default_greeting() -> String {
    "Hello! I'm your AI market analysis assistant. Ask me anything about stocks, \
     market trends, or financial insights."
        .into()
}

fn default_reply_latency_ms() -> u64 {
    1000
}

fn default_reply_timeout_seconds() -> u64 {
    300
}

fn default_max_input_chars() -> usize {
    1000
}

fn default_watchlist() -> Vec<String> {
    vec!["AAPL".into(), "TSLA".into(), "MSFT".into(), "NVDA".into()]
}

/// Reply backend selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendConfig {
    /// Fixed placeholder reply after the configured latency.
    #[default]
    Canned,
    /// External command receiving the prompt on stdin.
    Command {
        /// Command and arguments to invoke.
        command_argv: Vec<String>,
    },
}

impl std::fmt::Display for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Canned => write!(f, "canned"),
            Self::Command { command_argv } => write!(f, "command ({})", command_argv.join(" ")),
        }
    }
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        serde_json::from_str(&content).map_err(ConfigError::Parse)
    }

    /// Load configuration, falling back to defaults when the file is absent.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigError::Io)?;
        }
        std::fs::write(path, content).map_err(ConfigError::Io)
    }

    pub fn reply_latency(&self) -> Duration {
        Duration::from_millis(self.reply_latency_ms)
    }

    pub fn reply_timeout(&self) -> Duration {
        Duration::from_secs(self.reply_timeout_seconds)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            greeting: default_greeting(),
            reply_latency_ms: default_reply_latency_ms(),
            reply_timeout_seconds: default_reply_timeout_seconds(),
            max_input_chars: default_max_input_chars(),
            watchlist: default_watchlist(),
            backend: BackendConfig::default(),
        }
    }
}

/// Errors that can occur when working with configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// I/O error reading or writing config.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error parsing config JSON.
    #[error("Parse error: {0}")]
    Parse(#[source] serde_json::Error),

    /// Error serializing config to JSON.
    #[error("Serialize error: {0}")]
    Serialize(#[source] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.greeting.starts_with("Hello! I'm your AI market analysis assistant"));
        assert_eq!(config.reply_latency(), Duration::from_millis(1000));
        assert_eq!(config.max_input_chars, 1000);
        assert_eq!(config.watchlist, vec!["AAPL", "TSLA", "MSFT", "NVDA"]);
        assert_eq!(config.backend, BackendConfig::Canned);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = serde_json::from_str(r#"{"reply_latency_ms": 50}"#).unwrap();
        assert_eq!(config.reply_latency_ms, 50);
        assert_eq!(config.reply_timeout_seconds, 300);
        assert_eq!(config.backend, BackendConfig::Canned);
    }

    #[test]
    fn test_command_backend_parses() {
        let config: Config = serde_json::from_str(
            r#"{"backend": {"kind": "command", "command_argv": ["claude", "-p"]}}"#,
        )
        .unwrap();
        assert_eq!(
            config.backend,
            BackendConfig::Command {
                command_argv: vec!["claude".into(), "-p".into()]
            }
        );
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(MARKETDESK_DIR).join(CONFIG_FILE);

        let mut config = Config::default();
        config.watchlist.push("AMZN".into());
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(&dir.path().join("missing.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_invalid_json_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_backend_display() {
        assert_eq!(BackendConfig::Canned.to_string(), "canned");
        let command = BackendConfig::Command {
            command_argv: vec!["claude".into(), "-p".into()],
        };
        assert_eq!(command.to_string(), "command (claude -p)");
    }
}
