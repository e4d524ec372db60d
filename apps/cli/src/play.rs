//! Interactive terminal game: topic in, grid out, found words scored.

use std::collections::HashSet;
use std::io::Write;

use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::warn;

use wordsearch_core::{ProgressReporter, PuzzleBuilder, score_session};
use wordsearch_sessions::SessionStore;
use wordsearch_shared::{Grid, Puzzle, SubmissionResult};

/// Spinner shown while a puzzle is being built.
pub(crate) struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    pub(crate) fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.green} {msg}") {
            spinner.set_style(
                style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
            );
        }
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }

    fn clear(&self) {
        self.spinner.finish_and_clear();
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(format!("{name}..."));
    }

    fn done(&self, _puzzle: &Puzzle) {
        self.spinner.finish_and_clear();
    }
}

/// Next line from `input`, or `None` at end of input.
async fn read_line<R: AsyncBufRead + Unpin>(input: &mut R) -> Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line).await? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn prompt<W: Write>(out: &mut W, text: &str) -> Result<()> {
    write!(out, "{text}")?;
    out.flush()?;
    Ok(())
}

/// Grid with column indices across the top and row indices down the side.
pub(crate) fn render_grid(grid: &Grid) -> String {
    let mut text = String::from("    ");
    for col in 0..grid.size() {
        text.push_str(&format!("{col:>2} "));
    }
    text.push('\n');

    for (index, row) in grid.rows().iter().enumerate() {
        text.push_str(&format!("{index:>2}  "));
        for cell in row {
            text.push_str(&format!(" {cell} "));
        }
        text.push('\n');
    }
    text
}

/// Numbered, upper-cased list of the words to find.
pub(crate) fn render_targets(terms: &[String]) -> String {
    terms
        .iter()
        .enumerate()
        .map(|(i, term)| format!("  {:>2}. {}\n", i + 1, term.to_uppercase()))
        .collect()
}

pub(crate) fn render_result(result: &SubmissionResult) -> String {
    let mut text = format!(
        "\nYou found {}/{} words. Score: {:.1}%\n",
        result.found_words.len(), result.total_words, result.score
    );
    if !result.found_words.is_empty() {
        text.push_str(&format!("Correct: {}\n", result.found_words.join(", ")));
    }
    if !result.missed_words.is_empty() {
        text.push_str(&format!("Missed: {}\n", result.missed_words.join(", ")));
    }
    text
}

/// Read found words, one per line, until `done` or end of input.
/// Words are trimmed, upper-cased, and deduplicated in entry order.
pub(crate) async fn read_found_words<R, W>(input: &mut R, out: &mut W) -> Result<Vec<String>>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut seen = HashSet::new();
    let mut words = Vec::new();
    loop {
        prompt(out, "Found word (or 'done'): ")?;
        let Some(line) = read_line(input).await? else {
            break;
        };
        if line.eq_ignore_ascii_case("done") {
            break;
        }
        let word = line.to_uppercase();
        if !word.is_empty() && seen.insert(word.clone()) {
            words.push(word);
        }
    }
    Ok(words)
}

/// One puzzle from build to score. Build failures and lost sessions are
/// reported to the player; only I/O errors propagate.
async fn play_round<R, W>(
    builder: &PuzzleBuilder,
    sessions: &SessionStore,
    topic: &str,
    input: &mut R,
    out: &mut W,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let progress = CliProgress::new();
    let puzzle = match builder.build(topic, &progress).await {
        Ok(puzzle) => puzzle,
        Err(e) => {
            progress.clear();
            warn!(error = %e, "puzzle generation failed");
            writeln!(out, "Could not build a puzzle for '{topic}': {e}")?;
            return Ok(());
        }
    };

    writeln!(out, "\nTopic: {}\n", puzzle.topic)?;
    write!(out, "{}", render_grid(&puzzle.grid))?;
    writeln!(out, "\nFind these {} words:", puzzle.target_terms.len())?;
    write!(out, "{}", render_targets(&puzzle.target_terms))?;
    writeln!(out)?;

    let id = sessions.create(puzzle).await;
    let found = read_found_words(input, out).await?;
    match sessions.consume(&id).await {
        Ok(session) => {
            let result = score_session(&session, &found);
            write!(out, "{}", render_result(&result))?;
        }
        Err(e) => {
            warn!(error = %e, "game session gone before scoring");
            writeln!(
                out,
                "\nThis game expired before it was scored; {} entered words were discarded.",
                found.len()
            )?;
        }
    }
    Ok(())
}

/// Run the game loop until the player quits or input ends.
pub(crate) async fn run<R, W>(
    builder: &PuzzleBuilder,
    sessions: &SessionStore,
    input: &mut R,
    out: &mut W,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    writeln!(
        out,
        "Word search: find the hidden terms for any biology topic.\n"
    )?;

    loop {
        prompt(out, "Enter a biology topic (or 'quit' to exit): ")?;
        let Some(topic) = read_line(input).await? else {
            break;
        };
        if topic.eq_ignore_ascii_case("quit") {
            break;
        }
        if topic.is_empty() {
            continue;
        }

        play_round(builder, sessions, &topic, input, out).await?;

        prompt(out, "\nPlay again? (y/n): ")?;
        match read_line(input).await? {
            Some(answer) if answer.eq_ignore_ascii_case("y") => writeln!(out)?,
            _ => break,
        }
    }

    sessions.shutdown().await;
    writeln!(out, "Thanks for playing!")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;

    use wordsearch_core::Collaborators;
    use wordsearch_llm::TextGenerator;
    use wordsearch_lookup::{ContentLookup, PageFetch};
    use wordsearch_shared::{GameConfig, Result, WordSearchError};

    use super::*;

    /// Replies by the first matching prompt fragment.
    struct CannedGenerator(Vec<(&'static str, &'static str)>);

    #[async_trait]
    impl TextGenerator for CannedGenerator {
        async fn complete(&self, prompt: &str) -> Result<String> {
            self.0
                .iter()
                .find(|(needle, _)| prompt.contains(needle))
                .map(|(_, reply)| reply.to_string())
                .ok_or_else(|| WordSearchError::Generation("no canned reply".into()))
        }
    }

    struct CannedLookup;

    #[async_trait]
    impl ContentLookup for CannedLookup {
        async fn search(&self, query: &str, _limit: usize) -> Result<Vec<String>> {
            Ok(vec![query.to_string()])
        }

        async fn fetch(&self, _title: &str) -> Result<PageFetch> {
            Ok(PageFetch::Content("Plenty of biology text.".into()))
        }
    }

    fn heart_builder() -> PuzzleBuilder {
        builder(vec![
            ("core biological entity", "Heart"),
            ("extract 8-12", "Atrium, Aorta"),
            ("Extract 6-8", "Spore, Hypha"),
            ("short description", "{}"),
        ])
    }

    fn builder(research: Vec<(&'static str, &'static str)>) -> PuzzleBuilder {
        PuzzleBuilder::new(
            Collaborators {
                research_llm: Arc::new(CannedGenerator(research)),
                grid_llm: Arc::new(CannedGenerator(vec![("word search grid", "ATRIUM")])),
                lookup: Arc::new(CannedLookup),
            },
            &GameConfig {
                grid_size: 6,
                ..GameConfig::default()
            },
        )
    }

    async fn play(builder: &PuzzleBuilder, sessions: &SessionStore, input: &[u8]) -> String {
        let mut input = input;
        let mut out = Vec::new();
        run(builder, sessions, &mut input, &mut out).await.unwrap();
        String::from_utf8(out).unwrap()
    }

    #[tokio::test]
    async fn found_words_are_normalized_and_deduplicated() {
        let mut input: &[u8] = b"  atrium \nAORTA\n\natrium\nDone\nignored\n";
        let mut out = Vec::new();
        let words = read_found_words(&mut input, &mut out).await.unwrap();
        assert_eq!(words, vec!["ATRIUM", "AORTA"]);
    }

    #[tokio::test]
    async fn found_words_stop_at_end_of_input() {
        let mut input: &[u8] = b"spore";
        let mut out = Vec::new();
        let words = read_found_words(&mut input, &mut out).await.unwrap();
        assert_eq!(words, vec!["SPORE"]);
    }

    #[test]
    fn grid_has_indices() {
        let grid = Grid::from_rows(vec![vec!['A', 'B'], vec!['C', 'D']]);
        let text = render_grid(&grid);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains(" 0") && lines[0].contains(" 1"));
        assert!(lines[1].starts_with(" 0") && lines[1].contains(" A "));
        assert!(lines[1].contains(" B "));
        assert!(lines[2].starts_with(" 1") && lines[2].contains(" D "));
    }

    #[test]
    fn targets_are_numbered_in_uppercase() {
        let text = render_targets(&["Atrium".to_string(), "Aorta".to_string()]);
        assert_eq!(text, "   1. ATRIUM\n   2. AORTA\n");
    }

    #[test]
    fn result_summary() {
        let result = SubmissionResult {
            topic: "heart".into(),
            target_words: vec!["Atrium".into(), "Aorta".into(), "Septum".into()],
            found_words: vec!["ATRIUM".into()],
            missed_words: vec!["Aorta".into(), "Septum".into()],
            score: 33.3,
            total_words: 3,
        };
        let text = render_result(&result);
        assert!(text.contains("You found 1/3 words. Score: 33.3%"));
        assert!(text.contains("Correct: ATRIUM"));
        assert!(text.contains("Missed: Aorta, Septum"));
    }

    #[tokio::test]
    async fn round_is_scored_and_session_released() {
        let sessions = SessionStore::default();
        let text = play(&heart_builder(), &sessions, b"heart\natrium\ndone\nn\n").await;

        assert!(text.contains("Find these 2 words:"));
        assert!(text.contains("You found 1/2 words. Score: 50.0%"));
        assert!(text.ends_with("Thanks for playing!\n"));
        assert_eq!(sessions.count().await, 0);
    }

    #[tokio::test]
    async fn expired_session_is_reported_and_play_continues() {
        let sessions = SessionStore::new(Some(Duration::ZERO));
        let input = b"heart\natrium\ndone\ny\nheart\ndone\nn\n";
        let text = play(&heart_builder(), &sessions, input).await;

        assert!(text.contains("expired before it was scored; 1 entered words were discarded"));
        assert!(!text.contains("Score:"));
        assert_eq!(text.matches("Find these 2 words:").count(), 2);
        assert!(text.ends_with("Thanks for playing!\n"));
    }

    #[tokio::test]
    async fn failed_build_offers_another_round() {
        let sessions = SessionStore::default();
        let text = play(&builder(Vec::new()), &sessions, b"zzz\ny\nquit\n").await;

        assert!(text.contains("Could not build a puzzle for 'zzz'"));
        assert!(text.contains("Play again? (y/n)"));
        assert_eq!(text.matches("Enter a biology topic").count(), 2);
        assert!(text.ends_with("Thanks for playing!\n"));
    }
}
