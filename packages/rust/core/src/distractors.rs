//! Distractor selection: pick an unrelated biology area and pull terms from it.

use std::collections::HashSet;
use std::sync::Arc;

use rand::Rng;
use rand::seq::SliceRandom;
use tracing::{info, instrument, warn};

use wordsearch_shared::{DISTRACTOR_TERM_CAP, Result, TermList, WordSearchError};

use crate::outcome::StageOutcome;
use crate::research::{ContentResearcher, ResearchLimits};

/// Candidate distractor topics, in preference order.
pub const DISTRACTOR_CATALOGUE: [&str; 10] = [
    "plant photosynthesis",
    "bacterial reproduction",
    "insect anatomy",
    "marine biology",
    "cellular respiration",
    "genetic mutation",
    "viral structure",
    "fungal growth",
    "bird migration",
    "reptile metabolism",
];

/// Substituted whenever distractor research fails.
pub const FALLBACK_DISTRACTORS: [&str; 6] = [
    "chloroplast",
    "ribosome",
    "mitochondria",
    "enzyme",
    "protein",
    "molecule",
];

/// The random choice only ever looks at this many surviving candidates.
const CHOICE_WINDOW: usize = 3;

pub fn fallback_distractors() -> TermList {
    FALLBACK_DISTRACTORS.iter().map(|t| t.to_string()).collect()
}

fn tokens(text: &str) -> HashSet<String> {
    text.split_whitespace().map(str::to_lowercase).collect()
}

/// Catalogue entries sharing no lowercase whitespace token with `topic`,
/// in catalogue order.
pub fn eligible_topics(topic: &str) -> Vec<&'static str> {
    let topic_tokens = tokens(topic);
    DISTRACTOR_CATALOGUE
        .iter()
        .copied()
        .filter(|candidate| tokens(candidate).is_disjoint(&topic_tokens))
        .collect()
}

/// Uniform pick among the first three eligible topics.
pub fn choose_topic<R: Rng + ?Sized>(topic: &str, rng: &mut R) -> Option<&'static str> {
    let eligible = eligible_topics(topic);
    let window = &eligible[..eligible.len().min(CHOICE_WINDOW)];
    window.choose(rng).copied()
}

pub struct DistractorSelector {
    researcher: Arc<ContentResearcher>,
}

impl DistractorSelector {
    pub fn new(researcher: Arc<ContentResearcher>) -> Self {
        Self { researcher }
    }

    /// Produce up to eight distractor terms for `topic`. Never fails: any
    /// problem yields the fixed fallback list.
    #[instrument(skip_all, fields(topic = %topic))]
    pub async fn select(&self, topic: &str) -> StageOutcome<TermList> {
        let chosen = {
            let mut rng = rand::thread_rng();
            choose_topic(topic, &mut rng)
        };

        let result = match chosen {
            Some(distractor_topic) => {
                info!(%distractor_topic, "distractor topic selected");
                self.research(topic, distractor_topic).await
            }
            None => Err(WordSearchError::ContentNotFound {
                query: format!("distractor topic disjoint from '{topic}'"),
            }),
        };

        match result {
            Ok(terms) => {
                info!(terms = terms.len(), "distractor terms extracted");
                StageOutcome::Produced(terms)
            }
            Err(cause) => {
                warn!(error = %cause, "using fallback distractor terms");
                StageOutcome::Fallback {
                    value: fallback_distractors(),
                    cause,
                }
            }
        }
    }

    async fn research(&self, topic: &str, distractor_topic: &str) -> Result<TermList> {
        let content = self
            .researcher
            .find_content(&[distractor_topic.to_string()], ResearchLimits::DISTRACTOR)
            .await?;

        let prompt = format!(
            "Extract 6-8 biological terms from this content about \"{distractor_topic}\".\n\
             These should be distinctly different from terms related to \"{topic}\".\n\n\
             Content: {content}\n\n\
             Return only a comma-separated list of terms:"
        );

        self.researcher
            .extract_terms(&prompt, DISTRACTOR_TERM_CAP)
            .await
    }
}
