//! Application configuration for the word search service.
//!
//! User config lives at `~/.wordsearch/wordsearch.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, WordSearchError};
use crate::types::DEFAULT_GRID_SIZE;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "wordsearch.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".wordsearch";

// ---------------------------------------------------------------------------
// Config structs (matching wordsearch.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP listener settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// OpenRouter settings.
    #[serde(default)]
    pub openrouter: OpenRouterConfig,

    /// Content lookup (MediaWiki) settings.
    #[serde(default)]
    pub lookup: LookupConfig,

    /// Puzzle and session settings.
    #[serde(default)]
    pub game: GameConfig,
}

/// `[server]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8000
}

/// `[openrouter]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenRouterConfig {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Model used for every generation call.
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Base URL of the OpenAI-compatible API.
    #[serde(default = "default_openrouter_url")]
    pub base_url: String,

    /// Sampling temperature for research, extraction and descriptions.
    #[serde(default = "default_research_temperature")]
    pub research_temperature: f32,

    /// Sampling temperature for grid layout.
    #[serde(default = "default_grid_temperature")]
    pub grid_temperature: f32,

    /// Completion token ceiling per request.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for OpenRouterConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            default_model: default_model(),
            base_url: default_openrouter_url(),
            research_temperature: default_research_temperature(),
            grid_temperature: default_grid_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

fn default_api_key_env() -> String {
    "OPENROUTER_API_KEY".into()
}
fn default_model() -> String {
    "anthropic/claude-3.5-sonnet".into()
}
fn default_openrouter_url() -> String {
    "https://openrouter.ai/api/v1".into()
}
fn default_research_temperature() -> f32 {
    0.7
}
fn default_grid_temperature() -> f32 {
    0.3
}
fn default_max_tokens() -> u32 {
    2048
}

/// `[lookup]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupConfig {
    /// MediaWiki action API endpoint.
    #[serde(default = "default_lookup_url")]
    pub api_url: String,

    /// HTTP timeout for each lookup request.
    #[serde(default = "default_lookup_timeout")]
    pub timeout_secs: u64,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            api_url: default_lookup_url(),
            timeout_secs: default_lookup_timeout(),
        }
    }
}

fn default_lookup_url() -> String {
    "https://en.wikipedia.org/w/api.php".into()
}
fn default_lookup_timeout() -> u64 {
    10
}

/// `[game]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Side length of generated grids.
    #[serde(default = "default_grid_size")]
    pub grid_size: usize,

    /// Upper bound on any single external call made by the pipeline.
    #[serde(default = "default_call_timeout")]
    pub call_timeout_secs: u64,

    /// Sessions older than this are dropped. `0` keeps them until submitted.
    #[serde(default = "default_session_ttl")]
    pub session_ttl_secs: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            grid_size: default_grid_size(),
            call_timeout_secs: default_call_timeout(),
            session_ttl_secs: default_session_ttl(),
        }
    }
}

impl GameConfig {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    pub fn session_ttl(&self) -> Option<Duration> {
        (self.session_ttl_secs > 0).then(|| Duration::from_secs(self.session_ttl_secs))
    }
}

fn default_grid_size() -> usize {
    DEFAULT_GRID_SIZE
}
fn default_call_timeout() -> u64 {
    60
}
fn default_session_ttl() -> u64 {
    3600
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.wordsearch/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| WordSearchError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.wordsearch/wordsearch.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| WordSearchError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        WordSearchError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    validate_config(&config)?;
    Ok(config)
}

/// Reject values the pipeline cannot run with.
pub fn validate_config(config: &AppConfig) -> Result<()> {
    if config.game.grid_size == 0 {
        return Err(WordSearchError::config("game.grid_size must be at least 1"));
    }
    if config.game.call_timeout_secs == 0 {
        return Err(WordSearchError::config("game.call_timeout_secs must be at least 1"));
    }
    Ok(())
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| WordSearchError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| WordSearchError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| WordSearchError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Read the OpenRouter API key from the configured env var.
pub fn resolve_api_key(config: &AppConfig) -> Result<String> {
    let var_name = &config.openrouter.api_key_env;
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(val),
        _ => Err(WordSearchError::config(format!(
            "OpenRouter API key not found. Set the {var_name} environment variable.\n\
             Get a key at https://openrouter.ai/keys"
        ))),
    }
}
