use async_trait::async_trait;
use mimic_core::{Action, AgentSnapshot, Observation, Persona, Result};
use tracing::{info, warn};

use super::DecisionPolicy;
use crate::components::{
    ActionSelector, ClickTopResultSelector, IntentQueryGenerator, KeywordRelevanceClassifier, QueryGenerator,
    RelevanceClassifier,
};

#[derive(Debug, Clone, PartialEq)]
pub struct ComponentSettings {
    /// Decisions after which the policy stops on its own.
    pub max_steps: usize,
    pub use_relevance_check: bool,
}

impl Default for ComponentSettings {
    fn default() -> Self {
        Self {
            max_steps: 20,
            use_relevance_check: true,
        }
    }
}

/// A heuristic policy assembled from a query generator, an action selector
/// and an optional relevance classifier.
pub struct ComponentPolicy {
    persona: Persona,
    query_generator: Box<dyn QueryGenerator>,
    selector: Box<dyn ActionSelector>,
    relevance: Option<Box<dyn RelevanceClassifier>>,
    settings: ComponentSettings,
    steps_taken: usize,
}

impl ComponentPolicy {
    /// Intent queries, click-top selection and keyword relevance.
    pub fn new(persona: Persona) -> Self {
        Self {
            persona,
            query_generator: Box::new(IntentQueryGenerator),
            selector: Box::new(ClickTopResultSelector),
            relevance: Some(Box::new(KeywordRelevanceClassifier::default())),
            settings: ComponentSettings::default(),
            steps_taken: 0,
        }
    }

    pub fn with_query_generator(mut self, generator: Box<dyn QueryGenerator>) -> Self {
        self.query_generator = generator;
        self
    }

    pub fn with_selector(mut self, selector: Box<dyn ActionSelector>) -> Self {
        self.selector = selector;
        self
    }

    pub fn with_relevance(mut self, classifier: Option<Box<dyn RelevanceClassifier>>) -> Self {
        self.relevance = classifier;
        self
    }

    pub fn with_settings(mut self, settings: ComponentSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn steps_taken(&self) -> usize {
        self.steps_taken
    }
}

#[async_trait]
impl DecisionPolicy for ComponentPolicy {
    fn name(&self) -> &str {
        "component"
    }

    fn snapshot(&self) -> AgentSnapshot {
        AgentSnapshot {
            tick: self.steps_taken as u64,
            ..AgentSnapshot::for_persona(self.persona.clone())
        }
    }

    async fn decide(&mut self, observation: &Observation, _agent: &AgentSnapshot) -> Result<Action> {
        let started = self.steps_taken > 0;

        if started && self.settings.use_relevance_check {
            if let Some(classifier) = &self.relevance {
                if classifier.is_relevant(observation, &self.persona.intent) {
                    info!(classifier = classifier.name(), "found relevant content, stopping");
                    return Ok(Action::stop("Found relevant content"));
                }
            }
        }

        if self.steps_taken >= self.settings.max_steps {
            info!(max_steps = self.settings.max_steps, "policy step cap reached");
            return Ok(Action::stop("Maximum steps reached"));
        }

        if started && !observation.clickables.is_empty() {
            if let Some(action) = self.selector.select(observation, &self.persona) {
                self.steps_taken += 1;
                return Ok(action);
            }
        }

        if !started || observation.clickables.is_empty() {
            if let Some(query) = self.query_generator.generate(&self.persona) {
                self.steps_taken += 1;
                return Ok(Action::Search { query });
            }
        }

        warn!("no suitable action found, stopping");
        Ok(Action::stop("No suitable action available"))
    }
}
