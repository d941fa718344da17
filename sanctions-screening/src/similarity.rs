//! Bigram similarity scoring
//!
//! Two notions are kept apart:
//! - [`dice_score`] compares two whole strings by their character bigrams.
//! - [`name_score`] compares a query name with a candidate's text word-pair
//!   by word-pair and is the only score used for classification.

use crate::normalize::{char_bigrams, name_pairs, Bigram};

/// Default match threshold
pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.75;

/// A phrase with its bigrams precomputed and sorted for multiset intersection
#[derive(Debug, Clone, PartialEq)]
pub struct Phrase {
    text: String,
    bigrams: Vec<Bigram>,
}

impl Phrase {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let mut bigrams = char_bigrams(&text);
        bigrams.sort_unstable();
        Self { text, bigrams }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Word-pair phrases of a free-text name
    pub fn pairs_of(name: &str) -> Vec<Phrase> {
        name_pairs(name).into_iter().map(Phrase::new).collect()
    }

    /// Dice coefficient between two precomputed phrases
    pub fn dice(&self, other: &Phrase) -> f64 {
        if self.text.is_empty() || other.text.is_empty() {
            return 0.0;
        }
        if self.text == other.text {
            return 1.0;
        }

        let total = self.bigrams.len() + other.bigrams.len();
        if total == 0 {
            return 0.0;
        }

        2.0 * shared_count(&self.bigrams, &other.bigrams) as f64 / total as f64
    }
}

// Multiset intersection size of two sorted bigram lists
fn shared_count(a: &[Bigram], b: &[Bigram]) -> usize {
    let (mut i, mut j, mut shared) = (0, 0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                shared += 1;
                i += 1;
                j += 1;
            }
        }
    }
    shared
}

/// Dice coefficient on the character-bigram multisets of `a` and `b`.
pub fn dice_score(a: &str, b: &str) -> f64 {
    Phrase::new(a).dice(&Phrase::new(b))
}

/// Name-level score of `query` against a candidate's "all text".
///
/// Each query word-pair takes its best Dice score over the candidate's
/// word-pairs. Only pairs whose best score reaches `threshold` contribute and
/// the result is their mean; with no contributing pair the score is 0 no
/// matter how much sub-threshold overlap there was.
pub fn name_score(query: &str, candidate: &str, threshold: f64) -> f64 {
    score_pairs(&Phrase::pairs_of(query), &Phrase::pairs_of(candidate), threshold)
}

pub(crate) fn score_pairs(query: &[Phrase], candidate: &[Phrase], threshold: f64) -> f64 {
    let mut total = 0.0;
    let mut contributing = 0usize;

    for query_pair in query {
        let best = candidate
            .iter()
            .map(|candidate_pair| query_pair.dice(candidate_pair))
            .fold(0.0, f64::max);

        if best >= threshold {
            total += best;
            contributing += 1;
        }
    }

    if contributing == 0 {
        0.0
    } else {
        total / contributing as f64
    }
}

/// Scores query names against watchlist entries with a fixed threshold
#[derive(Debug, Clone, Copy)]
pub struct SimilarityScorer {
    threshold: f64,
}

impl Default for SimilarityScorer {
    fn default() -> Self {
        Self::new(DEFAULT_MATCH_THRESHOLD)
    }
}

impl SimilarityScorer {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn is_match(&self, score: f64) -> bool {
        score >= self.threshold
    }

    /// See [`name_score`]
    pub fn name_score(&self, query: &str, candidate: &str) -> f64 {
        name_score(query, candidate, self.threshold)
    }

    /// Score precomputed query pairs against an entry's precomputed pairs
    pub fn score_phrases(&self, query: &[Phrase], candidate: &[Phrase]) -> f64 {
        score_pairs(query, candidate, self.threshold)
    }
}
