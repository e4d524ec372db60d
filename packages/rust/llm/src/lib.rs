//! Text-generation capability: prompt in, text out.
//!
//! The pipeline depends only on the [`TextGenerator`] trait. [`OpenRouterClient`]
//! is the production implementation; [`sanitize`] normalizes model output that
//! is expected to carry structured data.

mod openrouter;
pub mod sanitize;

use async_trait::async_trait;
use wordsearch_shared::Result;

pub use openrouter::{OpenRouterClient, OpenRouterOptions};

/// A single-shot completion service. No streaming, no conversation state.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Send `prompt` and return the model's full text response.
    async fn complete(&self, prompt: &str) -> Result<String>;
}
