//! Scripted in-memory collaborators for stage tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use wordsearch_llm::TextGenerator;
use wordsearch_lookup::{ContentLookup, PageFetch};
use wordsearch_shared::{Result, WordSearchError};

/// Replies chosen by the first rule whose needle occurs in the prompt.
#[derive(Default)]
pub(crate) struct ScriptedGenerator {
    rules: Vec<(String, Option<String>)>,
    delay: Option<Duration>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Answer prompts containing `needle` with `reply`.
    pub(crate) fn reply(mut self, needle: &str, reply: &str) -> Self {
        let rule = (needle.to_string(), Some(reply.to_string()));
        self.rules.push(rule);
        self
    }

    /// Fail prompts containing `needle`.
    pub(crate) fn fail(mut self, needle: &str) -> Self {
        self.rules.push((needle.to_string(), None));
        self
    }

    /// Sleep before answering.
    pub(crate) fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        for (needle, reply) in &self.rules {
            if prompt.contains(needle.as_str()) {
                return reply.clone().ok_or_else(|| {
                    WordSearchError::Generation(format!("scripted failure: {needle}"))
                });
            }
        }
        Err(WordSearchError::Generation("no scripted reply".into()))
    }
}

/// Lookup service backed by fixed search hits and pages.
#[derive(Default)]
pub(crate) struct FakeLookup {
    hits: HashMap<String, Vec<String>>,
    pages: HashMap<String, PageFetch>,
    failing_searches: Vec<String>,
    searches: Mutex<Vec<(String, usize)>>,
    fetches: Mutex<Vec<String>>,
}

impl FakeLookup {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn hits(mut self, query: &str, titles: &[&str]) -> Self {
        let titles = titles.iter().map(|t| t.to_string()).collect();
        self.hits.insert(query.to_string(), titles);
        self
    }

    pub(crate) fn page(mut self, title: &str, page: PageFetch) -> Self {
        self.pages.insert(title.to_string(), page);
        self
    }

    pub(crate) fn content(self, title: &str, text: &str) -> Self {
        self.page(title, PageFetch::Content(text.to_string()))
    }

    pub(crate) fn failing_search(mut self, query: &str) -> Self {
        self.failing_searches.push(query.to_string());
        self
    }

    pub(crate) fn searches(&self) -> Vec<(String, usize)> {
        self.searches.lock().unwrap().clone()
    }

    pub(crate) fn fetches(&self) -> Vec<String> {
        self.fetches.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContentLookup for FakeLookup {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>> {
        self.searches.lock().unwrap().push((query.into(), limit));
        if self.failing_searches.iter().any(|q| q == query) {
            return Err(WordSearchError::Network(format!("search failed: {query}")));
        }
        let mut titles = self.hits.get(query).cloned().unwrap_or_default();
        titles.truncate(limit);
        Ok(titles)
    }

    async fn fetch(&self, title: &str) -> Result<PageFetch> {
        self.fetches.lock().unwrap().push(title.to_string());
        let page = self.pages.get(title).cloned();
        Ok(page.unwrap_or(PageFetch::NotFound))
    }
}
