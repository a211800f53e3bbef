use mimic_core::{Action, Observation, Persona};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use super::{intent_words, keyword_score};

/// Picks a concrete action for the current page.
pub trait ActionSelector: Send + Sync {
    fn name(&self) -> &str;

    /// The chosen action, or `None` when this selector has nothing to offer.
    fn select(&mut self, observation: &Observation, persona: &Persona) -> Option<Action>;
}

/// Clicks the clickable whose text best matches the intent, else the first one.
#[derive(Debug, Clone, Default)]
pub struct ClickTopResultSelector;

impl ClickTopResultSelector {
    pub fn choose(observation: &Observation, intent: &str) -> Option<Action> {
        let words = intent_words(intent);
        let mut best: Option<(usize, &str)> = None;
        for clickable in &observation.clickables {
            let haystack = format!(
                "{} {}",
                clickable.text.to_lowercase(),
                clickable.name.as_deref().unwrap_or_default().to_lowercase()
            );
            let score = words.iter().filter(|w| haystack.contains(w.as_str())).count();
            // Strictly greater keeps the earliest clickable on ties.
            if best.is_none_or(|(top, _)| score > top) {
                best = Some((score, clickable.target()));
            }
        }

        if let Some((score, target)) = best.filter(|(score, target)| *score > 0 && !target.is_empty()) {
            info!(element = target, score, "clicking best match");
            return Some(Action::Click {
                element_id: target.to_string(),
            });
        }

        let first = observation.clickables.first()?.target();
        if first.is_empty() {
            return None;
        }
        info!(element = first, "clicking first clickable");
        Some(Action::Click {
            element_id: first.to_string(),
        })
    }
}

impl ActionSelector for ClickTopResultSelector {
    fn name(&self) -> &str {
        "click_top"
    }

    fn select(&mut self, observation: &Observation, persona: &Persona) -> Option<Action> {
        Self::choose(observation, &persona.intent)
    }
}

/// Picks uniformly among every click and every text-input action on the page.
pub struct RandomActionSelector {
    rng: StdRng,
}

impl RandomActionSelector {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// A selector with a fixed seed, for reproducible runs.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// All actions this selector could choose on `observation`.
    pub fn candidates(observation: &Observation, persona: &Persona) -> Vec<Action> {
        let clicks = observation
            .clickables
            .iter()
            .map(|c| c.target())
            .filter(|t| !t.is_empty())
            .map(|t| Action::Click {
                element_id: t.to_string(),
            });
        let typing = observation
            .inputs
            .iter()
            .filter(|i| matches!(i.input_type.as_str(), "text" | "search"))
            .map(|i| i.target())
            .filter(|t| !t.is_empty())
            .map(|t| Action::Type {
                element_id: t.to_string(),
                text: persona.intent.clone(),
            });
        clicks.chain(typing).collect()
    }
}

impl Default for RandomActionSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionSelector for RandomActionSelector {
    fn name(&self) -> &str {
        "random"
    }

    fn select(&mut self, observation: &Observation, persona: &Persona) -> Option<Action> {
        let candidates = Self::candidates(observation, persona);
        let action = candidates.choose(&mut self.rng).cloned();
        if let Some(action) = &action {
            debug!(kind = %action.kind(), "random action");
        }
        action
    }
}

/// Stops once the page matches the intent well enough, else clicks the top result.
#[derive(Debug, Clone)]
pub struct StopOnRelevanceSelector {
    pub threshold: f64,
}

impl StopOnRelevanceSelector {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }
}

impl Default for StopOnRelevanceSelector {
    fn default() -> Self {
        Self::new(0.7)
    }
}

impl ActionSelector for StopOnRelevanceSelector {
    fn name(&self) -> &str {
        "stop_on_relevance"
    }

    fn select(&mut self, observation: &Observation, persona: &Persona) -> Option<Action> {
        let score = keyword_score(&persona.intent, &observation.page_content);
        if score >= self.threshold {
            info!(score, "page is relevant, stopping");
            return Some(Action::stop("Found relevant content"));
        }
        ClickTopResultSelector::choose(observation, &persona.intent)
    }
}

/// Asks each selector in order and takes the first action offered.
pub struct CompositeSelector {
    selectors: Vec<Box<dyn ActionSelector>>,
}

impl CompositeSelector {
    pub fn new(selectors: Vec<Box<dyn ActionSelector>>) -> Self {
        Self { selectors }
    }
}

impl ActionSelector for CompositeSelector {
    fn name(&self) -> &str {
        "composite"
    }

    fn select(&mut self, observation: &Observation, persona: &Persona) -> Option<Action> {
        for selector in &mut self.selectors {
            if let Some(action) = selector.select(observation, persona) {
                debug!(selector = selector.name(), "composite selector matched");
                return Some(action);
            }
        }
        warn!("no selector produced an action");
        None
    }
}
