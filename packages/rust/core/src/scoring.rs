//! Submission scoring.

use std::collections::HashSet;

use wordsearch_shared::{GameSession, SubmissionResult, TermList};

/// Score `found` against `targets`, comparing case-insensitively.
///
/// Matching submissions keep their submitted order, case, and duplicates.
/// The score is the matched percentage rounded to one decimal, or zero when
/// there are no targets.
pub fn score(topic: &str, targets: &[String], found: &[String]) -> SubmissionResult {
    let targets_upper: HashSet<String> = targets.iter().map(|t| t.to_uppercase()).collect();
    let found_upper: HashSet<String> = found.iter().map(|f| f.to_uppercase()).collect();

    let correct: TermList = found
        .iter()
        .filter(|f| targets_upper.contains(&f.to_uppercase()))
        .cloned()
        .collect();

    let missed: TermList = targets
        .iter()
        .filter(|t| !found_upper.contains(&t.to_uppercase()))
        .cloned()
        .collect();

    let score = if targets.is_empty() {
        0.0
    } else {
        round_one_decimal(correct.len() as f64 / targets.len() as f64 * 100.0)
    };

    SubmissionResult {
        topic: topic.to_string(),
        target_words: targets.to_vec(),
        found_words: correct,
        missed_words: missed,
        score,
        total_words: targets.len(),
    }
}

/// Score a consumed session.
pub fn score_session(session: &GameSession, found: &[String]) -> SubmissionResult {
    score(&session.topic, &session.target_terms, found)
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
