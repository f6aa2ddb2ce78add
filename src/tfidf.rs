//! TF-IDF vectorizer fitted once per document at index-build time.
//!
//! Mirrors the classic sklearn-style vectorizer semantics: lowercase
//! alphanumeric tokens of length >= 2, English stop words removed, a
//! vocabulary capped at `max_features` terms selected by corpus
//! frequency, smoothed idf `ln((1+n)/(1+df)) + 1`, and L2-normalized
//! tf-idf vectors. The fitted model serializes into the index blob so a
//! future query transforms into exactly the same space.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Default vocabulary cap.
pub const DEFAULT_MAX_FEATURES: usize = 1000;

/// English stop words excluded from the vocabulary.
const STOP_WORDS: &[&str] = &[
    "about", "above", "after", "again", "against", "all", "also", "am", "an",
    "and", "any", "are", "as", "at", "be", "because", "been", "before",
    "being", "below", "between", "both", "but", "by", "can", "cannot",
    "could", "did", "do", "does", "doing", "down", "during", "each", "else",
    "few", "for", "from", "further", "had", "has", "have", "having", "he",
    "her", "here", "hers", "herself", "him", "himself", "his", "how", "if",
    "in", "into", "is", "it", "its", "itself", "just", "me", "more", "most",
    "my", "myself", "no", "nor", "not", "now", "of", "off", "on", "once",
    "only", "or", "other", "our", "ours", "ourselves", "out", "over", "own",
    "same", "she", "should", "so", "some", "such", "than", "that", "the",
    "their", "theirs", "them", "themselves", "then", "there", "these",
    "they", "this", "those", "through", "to", "too", "under", "until", "up",
    "very", "was", "we", "were", "what", "when", "where", "which", "while",
    "who", "whom", "why", "will", "with", "would", "you", "your", "yours",
    "yourself", "yourselves",
];

fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.binary_search(&word).is_ok()
}

/// Lowercased alphanumeric tokens of length >= 2, stop words removed.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut word = String::new();
    for ch in text.chars() {
        if ch.is_alphanumeric() || ch == '_' {
            for lower in ch.to_lowercase() {
                word.push(lower);
            }
        } else if !word.is_empty() {
            if word.chars().count() >= 2 && !is_stop_word(&word) {
                tokens.push(std::mem::take(&mut word));
            } else {
                word.clear();
            }
        }
    }
    if word.chars().count() >= 2 && !is_stop_word(&word) {
        tokens.push(word);
    }
    tokens
}

/// A fitted TF-IDF vocabulary with per-term inverse document frequencies.
///
/// The vocabulary is alphabetically ordered, so vector component `i`
/// always corresponds to `vocabulary[i]` before and after persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TfidfModel {
    pub vocabulary: Vec<String>,
    pub idf: Vec<f32>,
}

impl TfidfModel {
    /// Fit a vocabulary over the corpus.
    ///
    /// Terms are ranked by total corpus frequency (ties broken
    /// alphabetically) and capped at `max_features`; the surviving terms
    /// are stored in alphabetical order.
    pub fn fit(texts: &[String], max_features: usize) -> Self {
        let n_docs = texts.len();
        let mut totals: HashMap<String, usize> = HashMap::new();
        let mut doc_freq: HashMap<String, usize> = HashMap::new();

        for text in texts {
            let tokens = tokenize(text);
            let mut seen: HashMap<&str, usize> = HashMap::new();
            for t in &tokens {
                *seen.entry(t.as_str()).or_insert(0) += 1;
            }
            for (term, count) in seen {
                *totals.entry(term.to_string()).or_insert(0) += count;
                *doc_freq.entry(term.to_string()).or_insert(0) += 1;
            }
        }

        let mut ranked: Vec<(String, usize)> = totals.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(max_features);

        let mut vocabulary: Vec<String> = ranked.into_iter().map(|(t, _)| t).collect();
        vocabulary.sort();

        let idf = vocabulary
            .iter()
            .map(|term| {
                let df = doc_freq.get(term).copied().unwrap_or(0);
                (((1 + n_docs) as f32) / ((1 + df) as f32)).ln() + 1.0
            })
            .collect();

        Self { vocabulary, idf }
    }

    /// Transform a text into an L2-normalized tf-idf vector over the
    /// fitted vocabulary. Out-of-vocabulary terms are ignored; a text
    /// with no vocabulary terms maps to the zero vector.
    pub fn transform(&self, text: &str) -> Vec<f32> {
        let mut vec = vec![0.0f32; self.vocabulary.len()];
        for token in tokenize(text) {
            if let Ok(i) = self.vocabulary.binary_search(&token) {
                vec[i] += 1.0;
            }
        }
        for (v, idf) in vec.iter_mut().zip(self.idf.iter()) {
            *v *= idf;
        }
        let norm: f32 = vec.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > f32::EPSILON {
            for v in vec.iter_mut() {
                *v /= norm;
            }
        }
        vec
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::cosine_similarity;

    fn corpus(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn stop_words_are_sorted_for_binary_search() {
        let mut sorted = STOP_WORDS.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, STOP_WORDS);
    }

    #[test]
    fn tokenize_lowercases_and_drops_short_and_stop_words() {
        let tokens = tokenize("The Cat, a cat — CATS! x it 42");
        assert_eq!(tokens, vec!["cat", "cat", "cats", "42"]);
    }

    #[test]
    fn vocabulary_is_alphabetical_and_capped() {
        let model = TfidfModel::fit(
            &corpus(&["zebra apple zebra", "apple mango zebra", "mango mango kiwi"]),
            3,
        );
        // zebra(3) apple(2) mango(3) kiwi(1) -> top 3 by count: mango, zebra, apple
        assert_eq!(model.vocabulary, vec!["apple", "mango", "zebra"]);
        assert_eq!(model.idf.len(), 3);
    }

    #[test]
    fn transform_is_l2_normalized() {
        let model = TfidfModel::fit(&corpus(&["dogs bark loudly", "cats purr softly"]), 100);
        let v = model.transform("dogs bark");
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn out_of_vocabulary_query_is_zero_vector() {
        let model = TfidfModel::fit(&corpus(&["dogs bark", "cats purr"]), 100);
        let v = model.transform("quantum chromodynamics");
        assert!(v.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn rarer_terms_score_closer_matches_higher() {
        let model = TfidfModel::fit(
            &corpus(&["cats are mammals", "dogs are loyal"]),
            100,
        );
        let query = model.transform("are dogs loyal");
        let cats = model.transform("cats are mammals");
        let dogs = model.transform("dogs are loyal");
        assert!(cosine_similarity(&query, &dogs) > cosine_similarity(&query, &cats));
    }

    #[test]
    fn fitted_model_round_trips_through_serde() {
        let model = TfidfModel::fit(&corpus(&["alpha beta", "beta gamma delta"]), 100);
        let bytes = serde_json::to_vec(&model).unwrap();
        let restored: TfidfModel = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(model, restored);
        assert_eq!(
            model.transform("beta gamma"),
            restored.transform("beta gamma")
        );
    }
}
