use async_trait::async_trait;
use mimic_cognition::CognitiveController;
use mimic_core::{Action, AgentSnapshot, Observation, Result};
use tracing::{debug, info};

use super::DecisionPolicy;

pub const NO_VALID_ACTIONS: &str = "No valid actions available";

/// Runs one synchronous cognitive tick per decision, with inline reflection
/// every `reflection_frequency` ticks.
pub struct CognitiveLoopPolicy {
    controller: CognitiveController,
    reflection_frequency: u64,
}

impl CognitiveLoopPolicy {
    pub fn new(controller: CognitiveController, reflection_frequency: u64) -> Self {
        Self {
            controller,
            reflection_frequency,
        }
    }

    pub fn controller(&self) -> &CognitiveController {
        &self.controller
    }

    fn reflection_due(&self, tick: u64) -> bool {
        tick > 0 && self.reflection_frequency > 0 && tick % self.reflection_frequency == 0
    }
}

#[async_trait]
impl DecisionPolicy for CognitiveLoopPolicy {
    fn name(&self) -> &str {
        "cognitive_loop"
    }

    fn snapshot(&self) -> AgentSnapshot {
        self.controller.snapshot()
    }

    async fn decide(&mut self, observation: &Observation, _agent: &AgentSnapshot) -> Result<Action> {
        let tick = self.controller.tick();
        debug!(tick, url = %observation.url, "cognitive tick");

        self.controller.perceive(observation).await;
        if tick > 0 {
            self.controller.feedback(observation).await;
        }
        self.controller.plan().await;
        if self.reflection_due(tick) {
            let insights = self.controller.reflect().await;
            info!(tick, insights = insights.len(), "reflected");
        }
        let actions = self.controller.act(observation).await;

        let report = self.controller.store().sync_enrichment().await;
        debug!(?report, "end-of-tick enrichment");
        self.controller.finish_tick();

        Ok(actions
            .into_iter()
            .next()
            .unwrap_or_else(|| Action::stop(NO_VALID_ACTIONS)))
    }
}
