//! CLI command definitions, routing, and tracing setup.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use tokio::io::BufReader;
use tokio::net::TcpListener;
use tracing::info;

use wordsearch_api::AppState;
use wordsearch_core::PuzzleBuilder;
use wordsearch_sessions::SessionStore;
use wordsearch_shared::{AppConfig, init_config, load_config, resolve_api_key};

use crate::play;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Word search: turn any biology topic into a playable puzzle.
#[derive(Parser)]
#[command(
    name = "wordsearch",
    version,
    about = "Generate word search puzzles from researched biology topics.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run the HTTP game API.
    Serve {
        /// Address to bind (defaults to `server.host` from config).
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (defaults to `server.port` from config).
        #[arg(long, env = "PORT")]
        port: Option<u16>,
    },

    /// Play in the terminal.
    Play,

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "wordsearch=info,tower_http=info",
        1 => "wordsearch=debug,tower_http=debug",
        _ => "wordsearch=trace,tower_http=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Serve { host, port } => cmd_serve(host, port).await,
        Command::Play => cmd_play().await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

/// Load config and wire the puzzle builder against the live services.
fn puzzle_builder(config: &AppConfig) -> Result<PuzzleBuilder> {
    let api_key = resolve_api_key(config)?;
    Ok(PuzzleBuilder::from_config(config, &api_key)?)
}

async fn cmd_serve(host: Option<String>, port: Option<u16>) -> Result<()> {
    let config = load_config()?;
    let builder = puzzle_builder(&config)?;
    let sessions = Arc::new(SessionStore::new(config.game.session_ttl()));
    let state = AppState::new(Arc::new(builder), sessions);

    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);
    let listener = TcpListener::bind((host.as_str(), port))
        .await
        .map_err(|e| eyre!("cannot bind {host}:{port}: {e}"))?;

    println!("Word search API running on http://{host}:{port}");
    wordsearch_api::serve(listener, state, shutdown_signal()).await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "could not listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

async fn cmd_play() -> Result<()> {
    let config = load_config()?;
    let builder = puzzle_builder(&config)?;
    // A terminal game owns its only session; it never expires mid-round.
    let sessions = SessionStore::new(None);

    let mut input = BufReader::new(tokio::io::stdin());
    let mut out = std::io::stdout();
    play::run(&builder, &sessions, &mut input, &mut out).await
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
