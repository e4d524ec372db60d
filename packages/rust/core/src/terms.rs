//! Term extraction filter: comma-separated model output to a bounded term list.

use wordsearch_shared::TermList;

/// Terms must be strictly longer than this many characters.
const MIN_EXCLUSIVE_LEN: usize = 3;

/// Terms must be strictly shorter than this many characters.
const MAX_EXCLUSIVE_LEN: usize = 15;

/// Split `response` on commas, trim each piece, keep pieces of 4..=14
/// characters, and truncate to `cap`. Case is left untouched.
pub fn filter_terms(response: &str, cap: usize) -> TermList {
    response
        .split(',')
        .map(str::trim)
        .filter(|term| {
            let len = term.chars().count();
            len > MIN_EXCLUSIVE_LEN && len < MAX_EXCLUSIVE_LEN
        })
        .take(cap)
        .map(String::from)
        .collect()
}
