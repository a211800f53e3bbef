//! Heuristic building blocks for the component policy.
//!
//! Each family is a small trait so policies can be assembled from any mix of
//! generators, selectors and classifiers.

pub mod query;
pub mod relevance;
pub mod selector;

pub use query::{IntentQueryGenerator, QueryGenerator, VariationQueryGenerator};
pub use relevance::{CompositeRelevanceClassifier, KeywordRelevanceClassifier, RelevanceClassifier, VotingStrategy};
pub use selector::{
    ActionSelector, ClickTopResultSelector, CompositeSelector, RandomActionSelector, StopOnRelevanceSelector,
};

/// Lower-cased whitespace-separated words of an intent.
pub(crate) fn intent_words(intent: &str) -> Vec<String> {
    intent.to_lowercase().split_whitespace().map(str::to_string).collect()
}

/// Fraction of the distinct intent words that occur in `text`, in `[0, 1]`.
/// An empty intent scores 0.
pub fn keyword_score(intent: &str, text: &str) -> f64 {
    let mut words = intent_words(intent);
    words.sort();
    words.dedup();
    if words.is_empty() {
        return 0.0;
    }
    let text = text.to_lowercase();
    let matches = words.iter().filter(|w| text.contains(w.as_str())).count();
    matches as f64 / words.len() as f64
}
