//! Word-overlap title matching.
//!
//! Plain substring counting over lowercased words.

use regex::Regex;
use std::sync::OnceLock;

/// Lowercased significant words of a query, punctuation removed.
#[must_use]
pub fn query_words(query: &str) -> Vec<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"[^\w\s]").expect("Invalid regex pattern defined in code"));
    re.replace_all(query, "")
        .to_lowercase()
        .split_whitespace()
        .map(ToString::to_string)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuzzyTitleMatcher {
    words: Vec<String>,
}

impl FuzzyTitleMatcher {
    #[must_use]
    pub fn new(query: &str) -> Self {
        Self {
            words: query_words(query),
        }
    }

    /// At least half the query words (never fewer than one) must appear.
    #[must_use]
    pub fn threshold(&self) -> usize {
        (self.words.len() / 2).max(1)
    }

    /// Number of query words found as case-insensitive substrings of `candidate`.
    #[must_use]
    pub fn score(&self, candidate: &str) -> usize {
        let candidate = candidate.to_lowercase();
        self.words
            .iter()
            .filter(|word| candidate.contains(word.as_str()))
            .count()
    }

    #[must_use]
    pub fn matches(&self, candidate: &str) -> bool {
        self.score(candidate) >= self.threshold()
    }

    /// Highest-scoring accepted candidate; ties go to the earliest one.
    pub fn best_match<'a, T, F>(&self, candidates: &'a [T], title_of: F) -> Option<&'a T>
    where
        F: Fn(&T) -> &str,
    {
        let mut best: Option<(usize, &T)> = None;
        for candidate in candidates {
            let score = self.score(title_of(candidate));
            if score < self.threshold() {
                continue;
            }
            if best.is_none_or(|(top, _)| score > top) {
                best = Some((score, candidate));
            }
        }
        best.map(|(_, candidate)| candidate)
    }
}
