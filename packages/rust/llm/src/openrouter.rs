//! OpenRouter chat-completions client.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use wordsearch_shared::{OpenRouterConfig, Result, WordSearchError};

use crate::TextGenerator;

/// User-Agent string for completion requests.
const USER_AGENT: &str = concat!("wordsearch/", env!("CARGO_PKG_VERSION"));

/// Default HTTP timeout for a single completion.
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Per-client request settings.
#[derive(Debug, Clone)]
pub struct OpenRouterOptions {
    /// API base, e.g. `https://openrouter.ai/api/v1`.
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl OpenRouterOptions {
    /// Options from the `[openrouter]` config section with the given temperature.
    pub fn from_config(config: &OpenRouterConfig, temperature: f32) -> Self {
        Self {
            base_url: config.base_url.clone(),
            model: config.default_model.clone(),
            temperature,
            max_tokens: config.max_tokens,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// [`TextGenerator`] backed by an OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenRouterClient {
    client: Client,
    api_key: String,
    options: OpenRouterOptions,
}

impl OpenRouterClient {
    pub fn new(api_key: impl Into<String>, options: OpenRouterOptions) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(options.timeout_secs))
            .build()
            .map_err(|e| WordSearchError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            options,
        })
    }

    pub fn model(&self) -> &str {
        &self.options.model
    }
}

#[async_trait]
impl TextGenerator for OpenRouterClient {
    #[instrument(skip_all, fields(model = %self.options.model, prompt_len = prompt.len()))]
    async fn complete(&self, prompt: &str) -> Result<String> {
        let url = format!(
            "{}/chat/completions",
            self.options.base_url.trim_end_matches('/')
        );

        let body = serde_json::json!({
            "model": self.options.model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": self.options.temperature,
            "max_tokens": self.options.max_tokens,
        });

        let start = Instant::now();
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| WordSearchError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let snippet: String = text.chars().take(200).collect();
            return Err(WordSearchError::Generation(format!("HTTP {status}: {snippet}")));
        }

        let parsed: CompletionResponse = response.json().await.map_err(|e| {
            WordSearchError::parse(format!("invalid completion response: {e}"))
        })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| WordSearchError::Generation("completion had no content".into()))?;

        debug!(
            latency_ms = start.elapsed().as_millis() as u64,
            response_len = content.len(),
            "completion received"
        );

        Ok(content)
    }
}
