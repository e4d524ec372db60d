//! Route handlers and their request/response shapes.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use wordsearch_core::{PuzzleBuilder, SilentProgress, score_session};
use wordsearch_sessions::SessionStore;
use wordsearch_shared::{DescriptionMap, Grid, SessionId, SubmissionResult};

use crate::error::ApiError;

/// Shared state behind every route.
#[derive(Clone)]
pub struct AppState {
    pub builder: Arc<PuzzleBuilder>,
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    pub fn new(builder: Arc<PuzzleBuilder>, sessions: Arc<SessionStore>) -> Self {
        Self { builder, sessions }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateGameRequest {
    #[serde(default)]
    pub topic: Option<String>,
}

/// What the client sees of a new game. Terms and descriptions stay server-side.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGameResponse {
    pub game_id: SessionId,
    pub topic: String,
    pub grid: Grid,
    pub total_target_words: usize,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitGameRequest {
    #[serde(default)]
    pub game_id: Option<String>,
    #[serde(default)]
    pub found_words: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitGameResponse {
    #[serde(flatten)]
    pub result: SubmissionResult,
    /// Target term to description, revealed once the game is over.
    pub descriptions: DescriptionMap,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ActiveGamesResponse {
    pub active_games: usize,
    pub games: Vec<SessionId>,
}

/// Decode a JSON body leniently: an empty body is treated as `{}` so that a
/// missing field surfaces as a 400 from the handler rather than a parse error.
fn decode<T: DeserializeOwned + Default>(body: &[u8]) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {e}")))
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        message: "Biology Game API is running".to_string(),
    })
}

#[instrument(skip_all)]
pub async fn create_game(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<CreateGameResponse>, ApiError> {
    let request: CreateGameRequest = decode(&body)?;
    let topic = request
        .topic
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Topic is required".to_string()))?;

    info!(%topic, "creating game");
    let puzzle = state
        .builder
        .build(&topic, &SilentProgress)
        .await
        .map_err(|e| ApiError::failed("Failed to create game", e))?;

    let topic = puzzle.topic.clone();
    let grid = puzzle.grid.clone();
    let total_target_words = puzzle.target_terms.len();
    let game_id = state.sessions.create(puzzle).await;
    info!(%game_id, "game stored");

    Ok(Json(CreateGameResponse {
        game_id,
        topic,
        grid,
        total_target_words,
    }))
}

#[instrument(skip_all)]
pub async fn submit_game(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SubmitGameResponse>, ApiError> {
    let request: SubmitGameRequest = decode(&body)?;
    let game_id = request
        .game_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Game ID is required".to_string()))?;

    let session = state.sessions.consume(&SessionId::from(game_id)).await?;
    let result = score_session(&session, &request.found_words);
    info!(
        game_id = %session.id,
        found = result.found_words.len(),
        total = result.total_words,
        score = result.score,
        "game scored"
    );

    Ok(Json(SubmitGameResponse {
        result,
        descriptions: session.target_descriptions,
    }))
}

pub async fn active_games(State(state): State<AppState>) -> Json<ActiveGamesResponse> {
    let games = state.sessions.list_ids().await;
    Json(ActiveGamesResponse {
        active_games: games.len(),
        games,
    })
}
