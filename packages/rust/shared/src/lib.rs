//! Shared types, error model, and configuration for the word search service.
//!
//! This crate is the foundation depended on by all other workspace crates.
//! It provides:
//! - [`WordSearchError`], the unified error type
//! - Domain types ([`Grid`], [`SessionId`], [`Puzzle`], [`GameSession`], [`SubmissionResult`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, GameConfig, LookupConfig, OpenRouterConfig, ServerConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from, resolve_api_key,
    validate_config,
};
pub use error::{Result, WordSearchError};
pub use types::{
    DEFAULT_GRID_SIZE, DISTRACTOR_TERM_CAP, DescriptionMap, GameSession, Grid, Puzzle,
    SESSION_ID_LEN, SessionId, SubmissionResult, TARGET_TERM_CAP, TermList,
};
