//! Content lookup service: topic search, page fetch, disambiguation.
//!
//! The research stages consume the [`ContentLookup`] contract only.
//! [`WikipediaClient`] implements it over the MediaWiki action API, returning
//! plain-text page extracts.

mod wikipedia;

use async_trait::async_trait;
use wordsearch_shared::Result;

pub use wikipedia::{WikipediaClient, WikipediaOptions};

// ---------------------------------------------------------------------------
// PageFetch
// ---------------------------------------------------------------------------

/// Outcome of fetching a single page by title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageFetch {
    /// The page exists and has text content.
    Content(String),
    /// The title is ambiguous; `options` are candidate titles in the order the page lists them.
    Disambiguation { options: Vec<String> },
    /// No page with this title.
    NotFound,
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Search and fetch access to an encyclopedic content source.
#[async_trait]
pub trait ContentLookup: Send + Sync {
    /// Return up to `limit` candidate page titles for `query`, best first.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>>;

    /// Fetch the page named `title`.
    async fn fetch(&self, title: &str) -> Result<PageFetch>;
}
