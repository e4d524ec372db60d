//! Description annotation for target and distractor terms.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, instrument, warn};

use wordsearch_llm::TextGenerator;
use wordsearch_llm::sanitize::structured_payload;
use wordsearch_shared::{DescriptionMap, Result, WordSearchError};

use crate::outcome::{StageOutcome, bounded};

/// Which term list a branch annotates; selects the fallback template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermRole {
    Target,
    Distractor,
}

impl TermRole {
    fn template(self, topic: &str) -> String {
        match self {
            Self::Target => format!("A biological term related to {topic}"),
            Self::Distractor => "A biological term from a different topic area".to_string(),
        }
    }
}

/// Descriptions for both term lists.
#[derive(Debug)]
pub struct Annotations {
    pub targets: StageOutcome<DescriptionMap>,
    pub distractors: StageOutcome<DescriptionMap>,
}

#[derive(Clone)]
pub struct DescriptionAnnotator {
    llm: Arc<dyn TextGenerator>,
    call_timeout: Duration,
}

impl DescriptionAnnotator {
    pub fn new(llm: Arc<dyn TextGenerator>, call_timeout: Duration) -> Self {
        Self { llm, call_timeout }
    }

    /// Annotate both lists concurrently. Each branch falls back on its own;
    /// the join waits for both.
    #[instrument(skip_all, fields(topic = %topic, targets = targets.len()))]
    pub async fn annotate_all(
        &self,
        topic: &str,
        targets: &[String],
        distractors: &[String],
    ) -> Annotations {
        let target_task = self.spawn_branch(topic, targets, TermRole::Target);
        let distractor_task = self.spawn_branch(topic, distractors, TermRole::Distractor);

        let (targets_joined, distractors_joined) = tokio::join!(target_task, distractor_task);

        Annotations {
            targets: joined(targets_joined, topic, targets, TermRole::Target),
            distractors: joined(distractors_joined, topic, distractors, TermRole::Distractor),
        }
    }

    fn spawn_branch(
        &self,
        topic: &str,
        terms: &[String],
        role: TermRole,
    ) -> tokio::task::JoinHandle<StageOutcome<DescriptionMap>> {
        let annotator = self.clone();
        let topic = topic.to_string();
        let terms = terms.to_vec();
        tokio::spawn(async move { annotator.annotate(&topic, &terms, role).await })
    }

    /// Describe every term in `terms`, substituting the role's template for
    /// the whole list on failure and for individual terms the model skipped.
    pub async fn annotate(
        &self,
        topic: &str,
        terms: &[String],
        role: TermRole,
    ) -> StageOutcome<DescriptionMap> {
        if terms.is_empty() {
            return StageOutcome::Produced(DescriptionMap::new());
        }

        match self.request(topic, terms, role).await {
            Ok(parsed) => StageOutcome::Produced(complete_map(parsed, topic, terms, role)),
            Err(cause) => {
                warn!(?role, error = %cause, "using templated descriptions");
                StageOutcome::Fallback {
                    value: templated(topic, terms, role),
                    cause,
                }
            }
        }
    }

    async fn request(
        &self,
        topic: &str,
        terms: &[String],
        role: TermRole,
    ) -> Result<HashMap<String, String>> {
        let context = match role {
            TermRole::Target => format!("the topic \"{topic}\""),
            TermRole::Distractor => "general biology".to_string(),
        };
        let prompt = format!(
            "Write a short description (one or two sentences) for each of these biological \
             terms, in the context of {context}.\n\n\
             Terms: {}\n\n\
             Return only a JSON object mapping each term exactly as written to its description.",
            terms.join(", ")
        );

        let response = bounded(
            self.call_timeout,
            "description generation",
            self.llm.complete(&prompt),
        )
        .await?;
        parse_descriptions(&response)
    }
}

/// Parse a JSON object of term to description out of a model reply.
/// Non-string values are kept in their JSON rendering.
pub fn parse_descriptions(response: &str) -> Result<HashMap<String, String>> {
    let payload = structured_payload(response);
    let raw: HashMap<String, serde_json::Value> = serde_json::from_str(&payload)
        .map_err(|e| WordSearchError::parse(format!("description mapping: {e}")))?;

    Ok(raw
        .into_iter()
        .map(|(term, value)| {
            let text = match value {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            (term, text)
        })
        .collect())
}

/// Key the parsed descriptions by the exact extracted terms. Exact keys win,
/// then case-insensitive ones; anything still missing gets the template.
fn complete_map(
    mut parsed: HashMap<String, String>,
    topic: &str,
    terms: &[String],
    role: TermRole,
) -> DescriptionMap {
    let mut map = DescriptionMap::with_capacity(terms.len());
    for term in terms {
        let found = parsed.remove(term).or_else(|| {
            let key = parsed
                .keys()
                .find(|key| key.eq_ignore_ascii_case(term))
                .cloned()?;
            parsed.remove(&key)
        });

        let description = found.unwrap_or_else(|| {
            debug!(%term, "no description returned, using template");
            role.template(topic)
        });
        map.entry(term.clone()).or_insert(description);
    }
    map
}

fn templated(topic: &str, terms: &[String], role: TermRole) -> DescriptionMap {
    terms
        .iter()
        .map(|term| (term.clone(), role.template(topic)))
        .collect()
}

fn joined(
    result: std::result::Result<StageOutcome<DescriptionMap>, tokio::task::JoinError>,
    topic: &str,
    terms: &[String],
    role: TermRole,
) -> StageOutcome<DescriptionMap> {
    result.unwrap_or_else(|e| {
        warn!(?role, error = %e, "annotation task aborted");
        StageOutcome::Fallback {
            value: templated(topic, terms, role),
            cause: WordSearchError::Generation(format!("annotation task aborted: {e}")),
        }
    })
}
