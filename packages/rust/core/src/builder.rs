//! End-to-end puzzle generation: research, then grid layout.

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, instrument};

use wordsearch_llm::{OpenRouterClient, OpenRouterOptions, TextGenerator};
use wordsearch_lookup::{ContentLookup, WikipediaClient, WikipediaOptions};
use wordsearch_shared::{AppConfig, GameConfig, Puzzle, Result};

use crate::annotate::DescriptionAnnotator;
use crate::grid::GridSynthesizer;
use crate::pipeline::{PipelineOrchestrator, ProgressReporter};
use crate::research::ContentResearcher;

/// The external capabilities a builder drives.
#[derive(Clone)]
pub struct Collaborators {
    /// Used for normalization, extraction and descriptions.
    pub research_llm: Arc<dyn TextGenerator>,
    /// Used for grid layout.
    pub grid_llm: Arc<dyn TextGenerator>,
    pub lookup: Arc<dyn ContentLookup>,
}

/// Turns a topic into a finished [`Puzzle`].
pub struct PuzzleBuilder {
    orchestrator: PipelineOrchestrator,
    grid: GridSynthesizer,
}

impl PuzzleBuilder {
    pub fn new(collaborators: Collaborators, game: &GameConfig) -> Self {
        let timeout = game.call_timeout();
        let researcher = Arc::new(ContentResearcher::new(
            collaborators.research_llm.clone(),
            collaborators.lookup,
            timeout,
        ));
        let annotator = DescriptionAnnotator::new(collaborators.research_llm, timeout);

        Self {
            orchestrator: PipelineOrchestrator::new(researcher, annotator),
            grid: GridSynthesizer::new(collaborators.grid_llm, game.grid_size, timeout),
        }
    }

    /// Wire OpenRouter and Wikipedia clients from configuration.
    pub fn from_config(config: &AppConfig, api_key: &str) -> Result<Self> {
        let openrouter = &config.openrouter;
        let research_llm = OpenRouterClient::new(
            api_key,
            OpenRouterOptions::from_config(openrouter, openrouter.research_temperature),
        )?;
        let grid_llm = OpenRouterClient::new(
            api_key,
            OpenRouterOptions::from_config(openrouter, openrouter.grid_temperature),
        )?;
        let lookup = WikipediaClient::new(&WikipediaOptions::from(&config.lookup))?;

        info!(
            model = %research_llm.model(),
            grid_size = config.game.grid_size,
            "puzzle builder ready"
        );

        Ok(Self::new(
            Collaborators {
                research_llm: Arc::new(research_llm),
                grid_llm: Arc::new(grid_llm),
                lookup: Arc::new(lookup),
            },
            &config.game,
        ))
    }

    pub fn grid_size(&self) -> usize {
        self.grid.size()
    }

    /// Research `topic` and lay out its grid.
    ///
    /// Fails only with [`wordsearch_shared::WordSearchError::NoTermsFound`];
    /// every other stage degrades to a fallback.
    #[instrument(skip_all, fields(topic = %topic))]
    pub async fn build(&self, topic: &str, progress: &dyn ProgressReporter) -> Result<Puzzle> {
        let start = Instant::now();

        let research = self.orchestrator.run(topic, progress).await?;

        progress.phase("Generating grid");
        let grid = self.grid.synthesize(&research.all_terms()).await;
        let puzzle = research.into_puzzle(grid.into_value());

        info!(
            targets = puzzle.target_terms.len(),
            distractors = puzzle.distractor_terms.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "puzzle built"
        );
        progress.done(&puzzle);
        Ok(puzzle)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::distractors::DISTRACTOR_CATALOGUE;
    use crate::pipeline::SilentProgress;
    use crate::testing::{FakeLookup, ScriptedGenerator};
    use wordsearch_shared::WordSearchError;

    fn game(grid_size: usize) -> GameConfig {
        GameConfig {
            grid_size,
            ..GameConfig::default()
        }
    }

    fn lookup() -> Arc<FakeLookup> {
        Arc::new(DISTRACTOR_CATALOGUE.into_iter().fold(
            FakeLookup::new()
                .hits("Lung", &["Lung"])
                .content("Lung", "Lungs exchange gases."),
            |lookup, topic| {
                lookup
                    .hits(topic, &[topic])
                    .content(topic, "Other biology.")
            },
        ))
    }

    fn research_llm() -> ScriptedGenerator {
        ScriptedGenerator::new()
            .reply("core biological entity", "Lung")
            .reply("extract 8-12", "Alveoli, Bronchi, Trachea")
            .reply("Extract 6-8", "Spore, Hypha")
            .reply("short description", "{}")
    }

    #[tokio::test]
    async fn builds_complete_puzzle() {
        let grid_llm =
            Arc::new(ScriptedGenerator::new().reply("word search grid", "ALVEOLI\nBRONCHI"));
        let builder = PuzzleBuilder::new(
            Collaborators {
                research_llm: Arc::new(research_llm()),
                grid_llm: grid_llm.clone(),
                lookup: lookup(),
            },
            &game(7),
        );

        let puzzle = builder.build("lungs", &SilentProgress).await.unwrap();

        assert_eq!(puzzle.topic, "lungs");
        assert_eq!(puzzle.target_terms, vec!["Alveoli", "Bronchi", "Trachea"]);
        assert_eq!(puzzle.distractor_terms, vec!["Spore", "Hypha"]);
        assert_eq!(puzzle.target_descriptions.len(), 3);
        assert!(puzzle.grid.is_square_of(7));
        assert_eq!(puzzle.grid.rows()[0].iter().collect::<String>(), "ALVEOLI");

        let prompt = &grid_llm.prompts()[0];
        assert!(prompt.contains("Alveoli, Bronchi, Trachea, Spore, Hypha"));
    }

    #[tokio::test]
    async fn fatal_research_skips_the_grid() {
        let grid_llm = Arc::new(ScriptedGenerator::new());
        let builder = PuzzleBuilder::new(
            Collaborators {
                research_llm: Arc::new(ScriptedGenerator::new().fail("core biological entity")),
                grid_llm: grid_llm.clone(),
                lookup: lookup(),
            },
            &game(15),
        );

        let err = builder.build("lungs", &SilentProgress).await.unwrap_err();
        assert!(matches!(err, WordSearchError::NoTermsFound { .. }));
        assert!(grid_llm.prompts().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_grid_model_still_yields_a_grid() {
        let grid_llm = ScriptedGenerator::new()
            .reply("word search grid", "ABCDE")
            .delayed(Duration::from_secs(600));
        let builder = PuzzleBuilder::new(
            Collaborators {
                research_llm: Arc::new(research_llm()),
                grid_llm: Arc::new(grid_llm),
                lookup: lookup(),
            },
            &game(5),
        );

        let puzzle = builder.build("lungs", &SilentProgress).await.unwrap();
        assert!(puzzle.grid.is_square_of(5));
    }
}
