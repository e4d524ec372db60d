//! HTTP surface of the word search service: create a game, submit findings,
//! and inspect live sessions.

pub mod error;
pub mod handlers;
pub mod server;

pub use error::ApiError;
pub use handlers::AppState;
pub use server::{router, serve};
