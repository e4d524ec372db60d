//! Grid synthesis: ask the model for a letter grid, then force it into shape.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tracing::{debug, instrument, warn};

use wordsearch_llm::TextGenerator;
use wordsearch_shared::Grid;

use crate::outcome::{StageOutcome, bounded};

fn random_letter<R: Rng + ?Sized>(rng: &mut R) -> char {
    char::from(rng.gen_range(b'A'..=b'Z'))
}

fn random_row<R: Rng + ?Sized>(size: usize, rng: &mut R) -> Vec<char> {
    (0..size).map(|_| random_letter(rng)).collect()
}

/// Turn arbitrary model output into an exact `size`×`size` grid of `A`–`Z`.
///
/// Lines are read in order; each keeps only its alphabetic ASCII characters,
/// upper-cased. Lines with fewer than `size` letters are dropped, longer ones
/// are cut to `size`. Reading stops after `size` rows, and any shortfall is
/// filled with random rows appended after the parsed ones.
pub fn repair_grid<R: Rng + ?Sized>(response: &str, size: usize, rng: &mut R) -> Grid {
    let mut rows: Vec<Vec<char>> = response
        .lines()
        .map(|line| {
            line.chars()
                .filter(char::is_ascii_alphabetic)
                .map(|c| c.to_ascii_uppercase())
                .collect::<Vec<_>>()
        })
        .filter(|letters| letters.len() >= size)
        .take(size)
        .map(|mut letters| {
            letters.truncate(size);
            letters
        })
        .collect();

    let parsed = rows.len();
    while rows.len() < size {
        rows.push(random_row(size, rng));
    }

    for row in &mut rows {
        while row.len() < size {
            row.push(random_letter(rng));
        }
        row.truncate(size);
    }

    debug!(parsed, padded = size - parsed, "grid repaired");
    Grid::from_rows(rows)
}

pub struct GridSynthesizer {
    llm: Arc<dyn TextGenerator>,
    size: usize,
    call_timeout: Duration,
}

impl GridSynthesizer {
    pub fn new(llm: Arc<dyn TextGenerator>, size: usize, call_timeout: Duration) -> Self {
        Self {
            llm,
            size,
            call_timeout,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Lay `words` out into a grid. A failed model call yields a fully random
    /// grid; the result is always well formed.
    #[instrument(skip_all, fields(words = words.len(), size = self.size))]
    pub async fn synthesize(&self, words: &[String]) -> StageOutcome<Grid> {
        let size = self.size;
        let word_list = words.join(", ");
        let prompt = format!(
            "Create a {size}x{size} word search grid containing these words: {word_list}\n\n\
             Rules:\n\
             1. Place words horizontally (left-to-right), vertically (top-to-bottom), \
             or diagonally\n\
             2. Words can overlap at common letters\n\
             3. Fill empty spaces with random letters\n\
             4. Return the grid as {size} lines, each with {size} letters separated by spaces\n\
             5. Use only uppercase letters\n\n\
             Words to place: {word_list}\n\n\
             Return only the grid, no explanations:"
        );

        let reply = bounded(
            self.call_timeout,
            "grid generation",
            self.llm.complete(&prompt),
        )
        .await;

        let mut rng = rand::thread_rng();
        match reply {
            Ok(text) => StageOutcome::Produced(repair_grid(&text, size, &mut rng)),
            Err(cause) => {
                warn!(error = %cause, "grid generation failed, using random grid");
                StageOutcome::Fallback {
                    value: repair_grid("", size, &mut rng),
                    cause,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::testing::ScriptedGenerator;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(99)
    }

    fn row_text(grid: &Grid, index: usize) -> String {
        grid.rows()[index].iter().collect()
    }

    #[test]
    fn three_valid_lines_then_random_padding() {
        let reply = "Here is your grid:\n\
                     A B C D E F G H I J K L M N O\n\
                     too short\n\
                     pqrstuvwxyzabcd\n\
                     Q-R-S-T-U-V-W-X-Y-Z-A-B-C-D-E-F-G\n\
                     Hope this helps!";
        let grid = repair_grid(reply, 15, &mut rng());

        assert!(grid.is_square_of(15));
        assert_eq!(row_text(&grid, 0), "ABCDEFGHIJKLMNO");
        assert_eq!(row_text(&grid, 1), "PQRSTUVWXYZABCD");
        assert_eq!(row_text(&grid, 2), "QRSTUVWXYZABCDE");
    }

    #[test]
    fn stops_after_size_rows() {
        let reply = ["ABCD"; 4]
            .into_iter()
            .chain(["WXYZ"; 4])
            .collect::<Vec<_>>()
            .join("\n");
        let grid = repair_grid(&reply, 4, &mut rng());
        assert!(grid.is_square_of(4));
        for row in grid.rows() {
            assert_eq!(row.iter().collect::<String>(), "ABCD");
        }
    }

    #[test]
    fn malformed_input_still_yields_square_grid() {
        let inputs = [
            "",
            "\n\n\n",
            "!!!! #### 1234 ????",
            "abc\ndef",
            "ÀÉÎÕÜ àéîõü ÀÉÎÕÜ àéîõü",
            &"Z".repeat(400),
            &"QWERTYUIOPASDFG\n".repeat(40),
        ];
        let mut rng = rng();
        for input in inputs {
            for size in [1, 5, 15] {
                let grid = repair_grid(input, size, &mut rng);
                assert!(grid.is_square_of(size), "size {size} for {input:?}");
            }
        }
    }

    #[test]
    fn empty_reply_is_all_random() {
        let grid = repair_grid("", 15, &mut rng());
        assert_eq!(grid.size(), 15);
        assert!(grid.is_square_of(15));
    }

    #[tokio::test]
    async fn synthesize_repairs_model_output() {
        let llm = Arc::new(ScriptedGenerator::new().reply("word search grid", "ABCDE\nFGHIJ\nxx"));
        let synthesizer = GridSynthesizer::new(llm.clone(), 5, Duration::from_secs(5));

        let words = vec!["Atrium".to_string(), "Spore".to_string()];
        let outcome = synthesizer.synthesize(&words).await;

        assert!(!outcome.is_fallback());
        let grid = outcome.into_value();
        assert!(grid.is_square_of(5));
        assert_eq!(row_text(&grid, 1), "FGHIJ");

        let prompt = &llm.prompts()[0];
        assert!(prompt.contains("5x5"));
        assert!(prompt.contains("Atrium, Spore"));
    }

    #[tokio::test]
    async fn failed_generation_falls_back_to_random_grid() {
        let llm = Arc::new(ScriptedGenerator::new().fail("word search grid"));
        let synthesizer = GridSynthesizer::new(llm, 15, Duration::from_secs(5));

        let outcome = synthesizer.synthesize(&["Atrium".to_string()]).await;
        assert!(outcome.is_fallback());
        assert!(outcome.value().is_square_of(15));
    }
}
