//! Research orchestration: topic → target terms → distractors → descriptions.

use std::fmt;
use std::sync::Arc;

use tracing::{info, instrument, warn};

use wordsearch_shared::{DescriptionMap, Grid, Puzzle, Result, TermList, WordSearchError};

use crate::annotate::{Annotations, DescriptionAnnotator};
use crate::distractors::DistractorSelector;
use crate::outcome::StageOutcome;
use crate::research::ContentResearcher;

/// Where a research run currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResearchPhase {
    Init,
    Researching,
    SelectingDistractors,
    Annotating,
    Finalizing,
    Complete,
    Failed,
}

impl fmt::Display for ResearchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Init => "Starting",
            Self::Researching => "Researching topic",
            Self::SelectingDistractors => "Selecting distractors",
            Self::Annotating => "Writing descriptions",
            Self::Finalizing => "Finalizing research",
            Self::Complete => "Research complete",
            Self::Failed => "Research failed",
        };
        f.write_str(label)
    }
}

/// Accumulated research for one topic. Each transition consumes the state
/// and returns the next one.
#[derive(Debug, Clone, PartialEq)]
pub struct ResearchState {
    pub topic: String,
    pub phase: ResearchPhase,
    pub target_terms: TermList,
    pub distractor_terms: TermList,
    pub target_descriptions: DescriptionMap,
    pub distractor_descriptions: DescriptionMap,
    /// Stages that substituted a fallback value, in the order they ran.
    pub fallbacks: Vec<&'static str>,
}

impl ResearchState {
    pub fn new(topic: &str) -> Self {
        Self {
            topic: topic.to_string(),
            phase: ResearchPhase::Init,
            target_terms: Vec::new(),
            distractor_terms: Vec::new(),
            target_descriptions: DescriptionMap::new(),
            distractor_descriptions: DescriptionMap::new(),
            fallbacks: Vec::new(),
        }
    }

    pub fn enter(self, phase: ResearchPhase) -> Self {
        Self { phase, ..self }
    }

    pub fn with_targets(self, target_terms: TermList) -> Self {
        Self {
            target_terms,
            ..self
        }
    }

    pub fn with_distractors(self, distractor_terms: TermList) -> Self {
        Self {
            distractor_terms,
            ..self
        }
    }

    pub fn with_descriptions(self, targets: DescriptionMap, distractors: DescriptionMap) -> Self {
        Self {
            target_descriptions: targets,
            distractor_descriptions: distractors,
            ..self
        }
    }

    /// Note `stage` if its outcome was a fallback.
    fn record<T>(mut self, stage: &'static str, outcome: &StageOutcome<T>) -> Self {
        if outcome.is_fallback() {
            self.fallbacks.push(stage);
        }
        self
    }

    pub fn is_complete(&self) -> bool {
        self.phase == ResearchPhase::Complete
    }

    /// Every term that goes into the grid, targets first.
    pub fn all_terms(&self) -> TermList {
        self.target_terms
            .iter()
            .chain(&self.distractor_terms)
            .cloned()
            .collect()
    }

    /// Pair the research with its grid.
    pub fn into_puzzle(self, grid: Grid) -> Puzzle {
        Puzzle {
            topic: self.topic,
            target_terms: self.target_terms,
            distractor_terms: self.distractor_terms,
            target_descriptions: self.target_descriptions,
            distractor_descriptions: self.distractor_descriptions,
            grid,
        }
    }
}

/// Progress callback for reporting puzzle generation status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called once the puzzle is ready.
    fn done(&self, puzzle: &Puzzle);
}

/// No-op progress reporter for server and test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn done(&self, _puzzle: &Puzzle) {}
}

/// Sequences the research stages. Only an empty target list is fatal.
pub struct PipelineOrchestrator {
    researcher: Arc<ContentResearcher>,
    distractors: DistractorSelector,
    annotator: DescriptionAnnotator,
}

impl PipelineOrchestrator {
    pub fn new(researcher: Arc<ContentResearcher>, annotator: DescriptionAnnotator) -> Self {
        Self {
            distractors: DistractorSelector::new(researcher.clone()),
            researcher,
            annotator,
        }
    }

    /// Run research for `topic` through to [`ResearchPhase::Complete`].
    ///
    /// Returns [`WordSearchError::NoTermsFound`] when no target term survives;
    /// later stages are not run in that case.
    #[instrument(skip_all, fields(topic = %topic))]
    pub async fn run(&self, topic: &str, progress: &dyn ProgressReporter) -> Result<ResearchState> {
        let state = ResearchState::new(topic);

        let state = state.enter(ResearchPhase::Researching);
        progress.phase(&state.phase.to_string());
        let targets = self.researcher.research(topic).await;
        let state = state.record("research", &targets);

        let target_terms = targets.into_value();
        if target_terms.is_empty() {
            let state = state.enter(ResearchPhase::Failed);
            warn!(phase = ?state.phase, "no target terms, aborting");
            return Err(WordSearchError::NoTermsFound {
                topic: topic.to_string(),
            });
        }
        let state = state.with_targets(target_terms);

        let state = state.enter(ResearchPhase::SelectingDistractors);
        progress.phase(&state.phase.to_string());
        let distractors = self.distractors.select(topic).await;
        let state = state
            .record("distractors", &distractors)
            .with_distractors(distractors.into_value());

        let state = state.enter(ResearchPhase::Annotating);
        progress.phase(&state.phase.to_string());
        let Annotations {
            targets,
            distractors,
        } = self
            .annotator
            .annotate_all(topic, &state.target_terms, &state.distractor_terms)
            .await;
        let state = state
            .record("target descriptions", &targets)
            .record("distractor descriptions", &distractors)
            .with_descriptions(targets.into_value(), distractors.into_value());

        let state = state
            .enter(ResearchPhase::Finalizing)
            .enter(ResearchPhase::Complete);

        info!(
            targets = state.target_terms.len(),
            distractors = state.distractor_terms.len(),
            fallbacks = ?state.fallbacks,
            "research complete"
        );
        Ok(state)
    }
}
