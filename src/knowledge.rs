// Static Q&A document used by `!info`.
//
// The document is a JSON array of `{"question", "answer"}` objects loaded
// once at startup. Lookup picks the question with the highest Sørensen–Dice
// coefficient over character bigrams (whitespace removed, case folded) and
// accepts it only at or above MATCH_THRESHOLD.
//
//   dice(a, b) = 2 * |bigrams(a) ∩ bigrams(b)| / (|bigrams(a)| + |bigrams(b)|)
//
// The intersection is a multiset intersection: a bigram that occurs twice in
// both strings counts twice.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Minimum similarity for a document entry to count as a match.
pub const MATCH_THRESHOLD: f64 = 0.55;

/// Reply used whenever the document has no answer.
pub const NOT_FOUND_REPLY: &str = "I couldn’t find that information in the provided document.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaPair {
    pub question: String,
    pub answer: String,
}

/// A document entry together with how closely it matched the query.
#[derive(Debug, Clone, PartialEq)]
pub struct QaMatch<'a> {
    pub pair: &'a QaPair,
    pub rating: f64,
}

#[derive(Debug, Clone, Default)]
pub struct QaDocument {
    pairs: Vec<QaPair>,
}

impl QaDocument {
    pub fn new(pairs: Vec<QaPair>) -> Self {
        Self { pairs }
    }

    /// Load the document from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read Q&A document at {}", path.display()))?;
        let pairs: Vec<QaPair> = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse Q&A document at {}", path.display()))?;
        info!(pairs = pairs.len(), path = %path.display(), "Loaded Q&A document");
        Ok(Self { pairs })
    }

    /// Load the document, or fall back to an empty one (which disables `!info`
    /// answers) if the file is missing or malformed.
    pub fn load_or_empty(path: &Path) -> Self {
        match Self::load(path) {
            Ok(doc) => doc,
            Err(e) => {
                warn!(error = %e, "Q&A document unavailable, !info will always report not found");
                Self::default()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// The highest-rated entry, regardless of threshold. Ties keep the earliest entry.
    pub fn best_candidate(&self, query: &str) -> Option<QaMatch<'_>> {
        let mut best: Option<QaMatch<'_>> = None;
        for pair in &self.pairs {
            let rating = dice_similarity(query, &pair.question);
            if best.as_ref().map_or(true, |b| rating > b.rating) {
                best = Some(QaMatch { pair, rating });
            }
        }
        best
    }

    /// The best entry if it rates at least MATCH_THRESHOLD.
    pub fn find_best_match(&self, query: &str) -> Option<QaMatch<'_>> {
        self.best_candidate(query)
            .filter(|m| m.rating >= MATCH_THRESHOLD)
    }
}

/// Sørensen–Dice similarity over character bigrams, 0.0 to 1.0.
///
/// Whitespace is ignored and comparison is case-insensitive. Identical
/// strings score 1.0; strings shorter than two characters (after
/// normalization) score 0.0 unless identical.
pub fn dice_similarity(a: &str, b: &str) -> f64 {
    let a = normalize(a);
    let b = normalize(b);

    if a == b {
        return 1.0;
    }
    if a.len() < 2 || b.len() < 2 {
        return 0.0;
    }

    let mut bigrams: HashMap<(char, char), usize> = HashMap::new();
    for pair in a.windows(2) {
        *bigrams.entry((pair[0], pair[1])).or_insert(0) += 1;
    }

    let mut intersection = 0usize;
    for pair in b.windows(2) {
        if let Some(count) = bigrams.get_mut(&(pair[0], pair[1])) {
            if *count > 0 {
                *count -= 1;
                intersection += 1;
            }
        }
    }

    (2 * intersection) as f64 / (a.len() + b.len() - 2) as f64
}

fn normalize(s: &str) -> Vec<char> {
    s.chars()
        .filter(|c| !c.is_whitespace())
        // Case folded so "Fee" and "fee" score as the same bigram.
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_strings_score_one() {
        assert_eq!(dice_similarity("hello world", "helloworld"), 1.0);
        assert_eq!(dice_similarity("a", "a"), 1.0);
    }

    #[test]
    fn test_short_strings_score_zero() {
        assert_eq!(dice_similarity("a", "ab"), 0.0);
        assert_eq!(dice_similarity("", "abc"), 0.0);
    }

    #[test]
    fn test_known_value() {
        // "night" vs "nacht": bigrams ni ig gh ht / na ac ch ht → 1 shared
        let score = dice_similarity("night", "nacht");
        assert!((score - 0.25).abs() < 1e-9, "got {score}");
    }

    #[test]
    fn test_repeated_bigrams_count_once_per_occurrence() {
        // "aaaa" has aa x3, "aa" has aa x1 → 2*1 / (3+1)
        let score = dice_similarity("aaaa", "aa");
        assert!((score - 0.5).abs() < 1e-9, "got {score}");
    }

    #[test]
    fn test_case_is_ignored() {
        assert_eq!(dice_similarity("Fee Structure", "fee structure"), 1.0);
    }

    #[test]
    fn test_best_candidate_prefers_first_on_tie() {
        let doc = QaDocument::new(vec![
            QaPair {
                question: "same".to_string(),
                answer: "first".to_string(),
            },
            QaPair {
                question: "same".to_string(),
                answer: "second".to_string(),
            },
        ]);
        assert_eq!(doc.best_candidate("same").unwrap().pair.answer, "first");
    }

    #[test]
    fn test_empty_document_has_no_match() {
        assert!(QaDocument::default().find_best_match("anything").is_none());
    }
}
