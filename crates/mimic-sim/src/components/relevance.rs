use mimic_core::Observation;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use super::keyword_score;

/// Decides whether a page satisfies an intent.
pub trait RelevanceClassifier: Send + Sync {
    fn name(&self) -> &str;
    fn is_relevant(&self, observation: &Observation, intent: &str) -> bool;
}

/// Relevant when enough of the intent's distinct words appear on the page.
#[derive(Debug, Clone)]
pub struct KeywordRelevanceClassifier {
    pub threshold: f64,
}

impl KeywordRelevanceClassifier {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }
}

impl Default for KeywordRelevanceClassifier {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl RelevanceClassifier for KeywordRelevanceClassifier {
    fn name(&self) -> &str {
        "keyword"
    }

    fn is_relevant(&self, observation: &Observation, intent: &str) -> bool {
        let score = keyword_score(intent, &observation.page_content);
        let relevant = score >= self.threshold;
        debug!(score, threshold = self.threshold, relevant, "keyword relevance");
        relevant
    }
}

/// How a composite classifier combines its members' votes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VotingStrategy {
    /// More than half vote relevant.
    #[default]
    Majority,
    /// Every member votes relevant.
    Unanimous,
    /// At least one member votes relevant.
    Any,
}

impl VotingStrategy {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "majority" => Some(Self::Majority),
            "unanimous" => Some(Self::Unanimous),
            "any" => Some(Self::Any),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Majority => "majority",
            Self::Unanimous => "unanimous",
            Self::Any => "any",
        }
    }

    /// Combine individual votes.
    pub fn decide(&self, votes: &[bool]) -> bool {
        let yes = votes.iter().filter(|v| **v).count();
        match self {
            Self::Majority => yes * 2 > votes.len(),
            Self::Unanimous => yes == votes.len(),
            Self::Any => yes > 0,
        }
    }
}

impl fmt::Display for VotingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Combines several classifiers under a [`VotingStrategy`].
pub struct CompositeRelevanceClassifier {
    classifiers: Vec<Box<dyn RelevanceClassifier>>,
    strategy: VotingStrategy,
}

impl CompositeRelevanceClassifier {
    pub fn new(classifiers: Vec<Box<dyn RelevanceClassifier>>, strategy: VotingStrategy) -> Self {
        Self { classifiers, strategy }
    }

    pub fn strategy(&self) -> VotingStrategy {
        self.strategy
    }

    pub fn len(&self) -> usize {
        self.classifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classifiers.is_empty()
    }
}

impl RelevanceClassifier for CompositeRelevanceClassifier {
    fn name(&self) -> &str {
        "composite"
    }

    fn is_relevant(&self, observation: &Observation, intent: &str) -> bool {
        let votes: Vec<bool> = self
            .classifiers
            .iter()
            .map(|c| c.is_relevant(observation, intent))
            .collect();
        let relevant = self.strategy.decide(&votes);
        debug!(strategy = %self.strategy, ?votes, relevant, "composite relevance");
        relevant
    }
}
