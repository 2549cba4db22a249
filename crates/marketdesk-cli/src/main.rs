//! marketdesk CLI: terminal market-analysis chat assistant

use clap::{Parser, Subcommand};
use marketdesk_engine::{Config, ConfigError, Session, SubmitError, CONFIG_FILE, MARKETDESK_DIR};
use marketdesk_tui::transcript::plain::{format_message, format_transcript};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log file inside the marketdesk directory, used while the TUI owns the screen.
const LOG_FILE: &str = "marketdesk.log";

/// Market analysis chat assistant with TUI
#[derive(Parser)]
#[command(name = "marketdesk")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (default: .marketdesk/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the simulated reply latency in milliseconds
    #[arg(long, global = true)]
    latency_ms: Option<u64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the TUI (default when no command specified)
    Tui,

    /// Chat over stdin/stdout, one message per line
    Chat,

    /// Initialize .marketdesk/ directory and config
    Init,

    /// Print the effective configuration
    Config {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        None | Some(Commands::Tui) => {
            init_logging(true);
            load_config(&cli).map_err(Into::into).and_then(|config| {
                block_on(marketdesk_tui::run_tui(config))
            })
        }
        Some(Commands::Chat) => {
            init_logging(false);
            load_config(&cli)
                .map_err(Into::into)
                .and_then(|config| block_on(cmd_chat(config)))
        }
        Some(Commands::Init) => cmd_init(),
        Some(Commands::Config { json }) => load_config(&cli)
            .map_err(Into::into)
            .and_then(|config| cmd_config(&config, json)),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn block_on<F>(future: F) -> CliResult
where
    F: std::future::Future<Output = CliResult>,
{
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(future)
}

fn config_path(cli: &Cli) -> PathBuf {
    cli.config
        .clone()
        .unwrap_or_else(|| Path::new(MARKETDESK_DIR).join(CONFIG_FILE))
}

/// Load the config file (defaults when absent) and apply flag overrides.
fn load_config(cli: &Cli) -> Result<Config, ConfigError> {
    let mut config = Config::load_or_default(&config_path(cli))?;
    if let Some(latency_ms) = cli.latency_ms {
        config.reply_latency_ms = latency_ms;
    }
    Ok(config)
}

/// Install the global subscriber.
///
/// The TUI owns the terminal, so in TUI mode logs go to a file; if the file
/// cannot be opened, logging stays off. Otherwise logs go to stderr.
fn init_logging(tui: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| "marketdesk=info".into());

    if tui {
        let dir = Path::new(MARKETDESK_DIR);
        let file = fs::create_dir_all(dir).and_then(|()| {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(dir.join(LOG_FILE))
        });
        if let Ok(file) = file {
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
                .init();
        }
        return;
    }

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn cmd_chat(config: Config) -> CliResult {
    let mut session = Session::new(config);
    tracing::info!(session_id = %session.id(), "Line mode started");

    println!("{}", format_transcript(session.messages()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "/quit" | "/exit" => break,
            "/clear" => {
                session.clear();
                println!("{}", format_transcript(session.messages()));
                continue;
            }
            _ => {}
        }

        match session.submit(&line) {
            Ok(_) => {
                if let Some(message) = session.messages().last() {
                    println!("{}", format_message(message));
                }
                if session.settle().await.is_some() {
                    if let Some(message) = session.messages().last() {
                        println!("{}", format_message(message));
                    }
                }
            }
            Err(SubmitError::InvalidInput) => {}
            Err(e) => eprintln!("Not sent: {e}"),
        }
    }

    session.close();
    tracing::info!(session_id = %session.id(), "Line mode finished");
    Ok(())
}

fn cmd_init() -> CliResult {
    let dir = Path::new(MARKETDESK_DIR);
    fs::create_dir_all(dir)?;

    let config_path = dir.join(CONFIG_FILE);
    if config_path.exists() {
        println!("Config already exists at {}", config_path.display());
    } else {
        Config::default().save(&config_path)?;
        println!("Created {}", config_path.display());
    }

    println!("\nReady. Run `marketdesk` to start chatting.");
    Ok(())
}

fn cmd_config(config: &Config, json: bool) -> CliResult {
    if json {
        println!("{}", serde_json::to_string_pretty(config)?);
        return Ok(());
    }

    println!("Greeting:       {}", config.greeting);
    println!("Reply latency:  {} ms", config.reply_latency_ms);
    println!("Reply timeout:  {} s", config.reply_timeout_seconds);
    println!("Input limit:    {} chars", config.max_input_chars);
    println!("Watchlist:      {}", config.watchlist.join(", "));
    println!("Backend:        {}", config.backend);
    Ok(())
}
