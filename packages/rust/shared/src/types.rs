//! Core domain types for word search puzzles and play sessions.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Default side length of a generated grid.
pub const DEFAULT_GRID_SIZE: usize = 15;

/// Maximum number of target terms kept from an extraction.
pub const TARGET_TERM_CAP: usize = 10;

/// Maximum number of distractor terms kept from an extraction.
pub const DISTRACTOR_TERM_CAP: usize = 8;

/// Length of a generated session id.
pub const SESSION_ID_LEN: usize = 12;

const SESSION_ID_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Ordered list of vocabulary terms, case preserved as extracted.
pub type TermList = Vec<String>;

/// Term (exact case) to a one-to-two-sentence description.
pub type DescriptionMap = HashMap<String, String>;

// ---------------------------------------------------------------------------
// SessionId
// ---------------------------------------------------------------------------

/// Opaque lowercase-alphanumeric token identifying a game session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Generate a fresh random id from the thread-local CSPRNG.
    pub fn generate() -> Self {
        Self::generate_with(&mut rand::thread_rng())
    }

    /// Generate an id from the supplied random source.
    pub fn generate_with<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let id = (0..SESSION_ID_LEN)
            .map(|_| SESSION_ID_ALPHABET[rng.gen_range(0..SESSION_ID_ALPHABET.len())] as char)
            .collect();
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Grid
// ---------------------------------------------------------------------------

/// Square letter matrix. Serializes as an array of rows of one-letter strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Grid(Vec<Vec<char>>);

impl Grid {
    /// Wrap already-shaped rows.
    pub fn from_rows(rows: Vec<Vec<char>>) -> Self {
        Self(rows)
    }

    pub fn rows(&self) -> &[Vec<char>] {
        &self.0
    }

    /// Number of rows.
    pub fn size(&self) -> usize {
        self.0.len()
    }

    /// True when the grid is exactly `n`×`n` and every cell is `A`–`Z`.
    pub fn is_square_of(&self, n: usize) -> bool {
        self.0.len() == n
            && self
                .0
                .iter()
                .all(|row| row.len() == n && row.iter().all(|c| c.is_ascii_uppercase()))
    }

    /// Render rows as space-separated letters, one row per line.
    pub fn to_text(&self) -> String {
        self.0
            .iter()
            .map(|row| {
                row.iter()
                    .map(|c| c.to_string())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

// ---------------------------------------------------------------------------
// Puzzle & session
// ---------------------------------------------------------------------------

/// A fully generated puzzle that has not been handed to the session store yet.
#[derive(Debug, Clone)]
pub struct Puzzle {
    pub topic: String,
    pub target_terms: TermList,
    pub distractor_terms: TermList,
    pub target_descriptions: DescriptionMap,
    pub distractor_descriptions: DescriptionMap,
    pub grid: Grid,
}

/// Server-held record binding a puzzle to an opaque id until first submission.
#[derive(Debug, Clone)]
pub struct GameSession {
    pub id: SessionId,
    pub topic: String,
    pub target_terms: TermList,
    pub distractor_terms: TermList,
    pub target_descriptions: DescriptionMap,
    pub distractor_descriptions: DescriptionMap,
    pub grid: Grid,
    pub created_at: DateTime<Utc>,
}

impl GameSession {
    /// Bind a puzzle to an id, stamping the creation time.
    pub fn new(id: SessionId, puzzle: Puzzle) -> Self {
        Self {
            id,
            topic: puzzle.topic,
            target_terms: puzzle.target_terms,
            distractor_terms: puzzle.distractor_terms,
            target_descriptions: puzzle.target_descriptions,
            distractor_descriptions: puzzle.distractor_descriptions,
            grid: puzzle.grid,
            created_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// SubmissionResult
// ---------------------------------------------------------------------------

/// Outcome of scoring a submission. Derived, never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResult {
    pub topic: String,
    pub target_words: TermList,
    /// Submitted words that match a target, in submission order and case.
    pub found_words: TermList,
    /// Targets (original case) the player did not submit.
    pub missed_words: TermList,
    /// Percentage rounded to one decimal place.
    pub score: f64,
    pub total_words: usize,
}
