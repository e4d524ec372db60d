//! Topic research: normalize the topic, find a page through several search
//! attempts, and extract target terms from its content.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use wordsearch_llm::TextGenerator;
use wordsearch_lookup::{ContentLookup, PageFetch};
use wordsearch_shared::{Result, TARGET_TERM_CAP, TermList, WordSearchError};

use crate::outcome::{StageOutcome, bounded};
use crate::terms::filter_terms;

/// Limits for one research run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResearchLimits {
    /// Characters of page content handed to extraction.
    pub content_cap: usize,
    /// Candidate pages requested per search.
    pub search_limit: usize,
}

impl ResearchLimits {
    pub const TARGET: Self = Self {
        content_cap: 2000,
        search_limit: 5,
    };

    pub const DISTRACTOR: Self = Self {
        content_cap: 1500,
        search_limit: 2,
    };
}

/// Ordered search attempts for a topic. Duplicates are kept and simply retried.
pub fn search_attempts(raw_topic: &str, normalized: &str) -> Vec<String> {
    let anatomy = if raw_topic.contains("part") {
        " anatomy"
    } else {
        ""
    };

    vec![
        normalized.to_string(),
        raw_topic.to_string(),
        format!("{normalized} biology"),
        format!("{normalized}{anatomy}"),
    ]
}

/// Drives the lookup service and the text generator to turn a topic into terms.
pub struct ContentResearcher {
    llm: Arc<dyn TextGenerator>,
    lookup: Arc<dyn ContentLookup>,
    call_timeout: Duration,
}

impl ContentResearcher {
    pub fn new(
        llm: Arc<dyn TextGenerator>,
        lookup: Arc<dyn ContentLookup>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            llm,
            lookup,
            call_timeout,
        }
    }

    /// Research `topic` into at most ten target terms.
    ///
    /// Every failure degrades to an empty list tagged with its cause; deciding
    /// whether an empty list is fatal is left to the orchestrator.
    #[instrument(skip_all, fields(topic = %topic))]
    pub async fn research(&self, topic: &str) -> StageOutcome<TermList> {
        match self.try_research(topic).await {
            Ok(terms) => {
                info!(terms = terms.len(), "target terms extracted");
                StageOutcome::Produced(terms)
            }
            Err(cause) => {
                warn!(error = %cause, "topic research failed");
                StageOutcome::Fallback {
                    value: Vec::new(),
                    cause,
                }
            }
        }
    }

    async fn try_research(&self, topic: &str) -> Result<TermList> {
        let normalized = self.normalize_topic(topic).await?;
        debug!(%normalized, "topic normalized");

        let attempts = search_attempts(topic, &normalized);
        let content = self.find_content(&attempts, ResearchLimits::TARGET).await?;

        let prompt = format!(
            "Analyze this encyclopedia content about \"{topic}\" and extract 8-12 specific \
             biological terms, concepts, or parts related to this topic.\n\
             Focus on technical terms that would work well in a word search game.\n\n\
             Content: {content}\n\n\
             Return only a comma-separated list of terms, no explanations:"
        );

        self.extract_terms(&prompt, TARGET_TERM_CAP).await
    }

    /// Ask the generator for the core biological entity behind `topic`.
    async fn normalize_topic(&self, topic: &str) -> Result<String> {
        let prompt = format!(
            "Identify the core biological entity in the topic \"{topic}\".\n\
             Reply with a single short term (one to three words) and nothing else."
        );

        let response = bounded(
            self.call_timeout,
            "topic normalization",
            self.llm.complete(&prompt),
        )
        .await?;

        let term = response
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or_default()
            .trim_matches(|c: char| c == '"' || c == '\'' || c == '.' || c == '*')
            .trim();

        if term.is_empty() {
            Ok(topic.to_string())
        } else {
            Ok(term.to_string())
        }
    }

    /// Run `queries` in order and return the first page content found,
    /// truncated to `limits.content_cap` characters.
    ///
    /// A failing search moves on to the next query; a failing or missing page
    /// moves on to the next candidate. Ambiguous pages are retried once with
    /// the first suggested option.
    pub(crate) async fn find_content(
        &self,
        queries: &[String],
        limits: ResearchLimits,
    ) -> Result<String> {
        for query in queries {
            let candidates = match bounded(
                self.call_timeout,
                "content search",
                self.lookup.search(query, limits.search_limit),
            )
            .await
            {
                Ok(candidates) => candidates,
                Err(e) => {
                    warn!(%query, error = %e, "search attempt failed");
                    continue;
                }
            };
            debug!(%query, candidates = candidates.len(), "search attempt");

            for title in &candidates {
                if let Some(content) = self.fetch_candidate(title).await {
                    info!(%query, %title, chars = content.chars().count(), "content found");
                    return Ok(truncate_chars(&content, limits.content_cap));
                }
            }
        }

        Err(WordSearchError::ContentNotFound {
            query: queries.first().cloned().unwrap_or_default(),
        })
    }

    async fn fetch_candidate(&self, title: &str) -> Option<String> {
        match self.fetch_page(title).await? {
            PageFetch::Content(text) => Some(text),
            PageFetch::NotFound => {
                debug!(%title, "page not found, trying next candidate");
                None
            }
            PageFetch::Disambiguation { options } => {
                let choice = options.first()?;
                debug!(%title, %choice, "disambiguation, using first option");
                match self.fetch_page(choice).await? {
                    PageFetch::Content(text) => Some(text),
                    _ => None,
                }
            }
        }
    }

    async fn fetch_page(&self, title: &str) -> Option<PageFetch> {
        match bounded(self.call_timeout, "page fetch", self.lookup.fetch(title)).await {
            Ok(page) => Some(page),
            Err(e) => {
                warn!(%title, error = %e, "page fetch failed");
                None
            }
        }
    }

    /// Send an extraction prompt and filter the reply down to `cap` terms.
    pub(crate) async fn extract_terms(&self, prompt: &str, cap: usize) -> Result<TermList> {
        let response = bounded(
            self.call_timeout,
            "term extraction",
            self.llm.complete(prompt),
        )
        .await?;
        debug!(response = %response, "extraction response");
        Ok(filter_terms(&response, cap))
    }
}

/// First `cap` characters of `text`.
fn truncate_chars(text: &str, cap: usize) -> String {
    text.chars().take(cap).collect()
}
