//! Router assembly and the serve loop.

use std::future::Future;

use axum::Router;
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use wordsearch_shared::{Result, WordSearchError};

use crate::error::panic_response;
use crate::handlers::{AppState, active_games, create_game, health, submit_game};

/// Build the game API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/game/create", post(create_game))
        .route("/api/game/submit", post(submit_game))
        .route("/api/games/active", get(active_games))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Serve the API on `listener` until `shutdown` resolves, then drop every
/// remaining session.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener
        .local_addr()
        .map_err(|e| WordSearchError::Network(format!("listener address: {e}")))?;
    info!(%addr, "word search API listening");

    let sessions = state.sessions.clone();
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| WordSearchError::Network(format!("server error: {e}")))?;

    let dropped = sessions.shutdown().await;
    info!(dropped, "word search API stopped");
    Ok(())
}
