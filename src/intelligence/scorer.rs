/// Similarity scoring between an utterance and a catalog phrase
///
/// Blends token overlap with edit distance. Scores are a ranking signal,
/// not probabilities: the containment bonus can push them past 1.0.

use std::collections::HashSet;

const OVERLAP_WEIGHT: f64 = 0.6;
const EDIT_WEIGHT: f64 = 0.3;
const CONTAINMENT_BONUS: f64 = 0.2;

/// Scorer for comparing two strings
pub struct Scorer;

impl Scorer {
    /// Levenshtein distance, counted in chars rather than bytes
    pub fn edit_distance(a: &str, b: &str) -> usize {
        strsim::levenshtein(a, b)
    }

    /// Jaccard index over whitespace tokens
    ///
    /// # Returns
    /// * 0.0 when both strings have no tokens
    pub fn word_overlap(a: &str, b: &str) -> f64 {
        let words_a: HashSet<&str> = a.split_whitespace().collect();
        let words_b: HashSet<&str> = b.split_whitespace().collect();

        let union = words_a.union(&words_b).count();
        if union == 0 {
            return 0.0;
        }

        words_a.intersection(&words_b).count() as f64 / union as f64
    }

    /// `1 - distance / longer length`, 0.0 when both are empty
    pub fn edit_similarity(a: &str, b: &str) -> f64 {
        let max_len = a.chars().count().max(b.chars().count());
        if max_len == 0 {
            return 0.0;
        }

        1.0 - Self::edit_distance(a, b) as f64 / max_len as f64
    }

    /// Weighted blend of overlap, edit similarity and containment
    ///
    /// Inputs are expected to be normalized already. Not clamped.
    pub fn similarity(a: &str, b: &str) -> f64 {
        let contains = !a.is_empty() && !b.is_empty() && (a.contains(b) || b.contains(a));
        let bonus = if contains { CONTAINMENT_BONUS } else { 0.0 };

        Self::word_overlap(a, b) * OVERLAP_WEIGHT + Self::edit_similarity(a, b) * EDIT_WEIGHT + bonus
    }
}
