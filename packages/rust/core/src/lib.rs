//! Puzzle generation pipeline for the word search service.
//!
//! This crate ties together topic research, distractor selection, description
//! annotation and grid synthesis into [`PuzzleBuilder::build`], and scores
//! submissions against a finished puzzle.

pub mod annotate;
pub mod builder;
pub mod distractors;
pub mod grid;
pub mod outcome;
pub mod pipeline;
pub mod research;
pub mod scoring;
pub mod terms;

#[cfg(test)]
mod testing;

pub use builder::{Collaborators, PuzzleBuilder};
pub use outcome::StageOutcome;
pub use pipeline::{ProgressReporter, ResearchPhase, ResearchState, SilentProgress};
pub use scoring::{score, score_session};
