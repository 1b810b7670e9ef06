//! "Did you mean" suggestions for near-miss field and operator names.
//!
//! Every call site (tokenizer, field validation, operator validation) goes
//! through [`suggest`], so the same input always yields the same hint.

use strsim::normalized_damerau_levenshtein;

/// Minimum score a fuzzy candidate needs before it is offered.
pub const SIMILARITY_THRESHOLD: f64 = 0.6;

/// Prefix and substring matches on very short words are mostly noise.
const MIN_PARTIAL_LEN: usize = 3;

/// Case-insensitive edit-distance similarity in `0.0..=1.0`.
pub fn similarity(a: &str, b: &str) -> f64 {
    normalized_damerau_levenshtein(&a.to_lowercase(), &b.to_lowercase())
}

/// Pick the nearest candidate for `word`.
///
/// Tried in order, first hit wins: exact case-insensitive match, prefix
/// match, a candidate containing the word, then the best similarity score above
/// [`SIMILARITY_THRESHOLD`]. Ties keep the earliest candidate.
pub fn suggest<S: AsRef<str>>(word: &str, candidates: &[S]) -> Option<String> {
    let needle = word.to_lowercase();
    if needle.is_empty() {
        return None;
    }

    let lowered: Vec<(String, &str)> = candidates
        .iter()
        .map(|c| (c.as_ref().to_lowercase(), c.as_ref()))
        .filter(|(lower, _)| !lower.is_empty())
        .collect();

    if let Some((_, original)) = lowered.iter().find(|(lower, _)| *lower == needle) {
        return Some(original.to_string());
    }

    if needle.chars().count() >= MIN_PARTIAL_LEN {
        if let Some((_, original)) = lowered.iter().find(|(lower, _)| lower.starts_with(&needle)) {
            return Some(original.to_string());
        }

        // One direction only: a word that merely contains a short keyword
        // ("bandwidth", "notes") is not a misspelling of it
        if let Some((_, original)) = lowered.iter().find(|(lower, _)| lower.contains(&needle)) {
            return Some(original.to_string());
        }
    }

    let mut best: Option<(f64, &str)> = None;
    for (lower, original) in &lowered {
        let score = normalized_damerau_levenshtein(&needle, lower);
        if best.is_none_or(|(best_score, _)| score > best_score) {
            best = Some((score, original));
        }
    }

    best.filter(|(score, _)| *score > SIMILARITY_THRESHOLD)
        .map(|(_, original)| original.to_string())
}
