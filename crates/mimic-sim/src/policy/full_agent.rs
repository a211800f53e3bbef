use async_trait::async_trait;
use mimic_cognition::CognitiveController;
use mimic_core::{Action, AgentSnapshot, Observation, Result};
use tracing::{debug, warn};

use super::DecisionPolicy;
use crate::recorder::TraceRecorder;

pub const NO_AGENT_ACTION: &str = "No action from agent";

/// The full agent: a cognitive tick per decision, a background reflection
/// task started on the first decision, and optional per-tick persistence.
pub struct FullAgentPolicy {
    controller: CognitiveController,
    recorder: Option<TraceRecorder>,
}

impl FullAgentPolicy {
    pub fn new(controller: CognitiveController) -> Self {
        Self {
            controller,
            recorder: None,
        }
    }

    pub fn with_recorder(mut self, recorder: TraceRecorder) -> Self {
        self.recorder = Some(recorder);
        self
    }

    pub fn controller(&self) -> &CognitiveController {
        &self.controller
    }

    fn record(&self, observation: &Observation, action: &Action) {
        let Some(recorder) = &self.recorder else {
            return;
        };
        let tick = self.controller.tick();
        let snapshot = self.controller.snapshot();
        let trace = self.controller.store().trace_lines();
        if let Err(e) = recorder.record_tick(tick, &snapshot, &trace, observation, action) {
            warn!(error = %e, tick, "failed to persist tick state");
        }
    }
}

#[async_trait]
impl DecisionPolicy for FullAgentPolicy {
    fn name(&self) -> &str {
        "full_agent"
    }

    fn snapshot(&self) -> AgentSnapshot {
        self.controller.snapshot()
    }

    async fn decide(&mut self, observation: &Observation, _agent: &AgentSnapshot) -> Result<Action> {
        self.controller.start_background();

        let tick = self.controller.tick();
        debug!(tick, url = %observation.url, "agent tick");

        self.controller.perceive(observation).await;
        if tick > 0 {
            self.controller.feedback(observation).await;
        }
        self.controller.plan().await;
        let actions = self.controller.act(observation).await;

        let action = actions
            .into_iter()
            .next()
            .unwrap_or_else(|| Action::stop(NO_AGENT_ACTION));
        self.record(observation, &action);
        self.controller.finish_tick();
        Ok(action)
    }

    async fn shutdown(&mut self) {
        self.controller.shutdown().await;
    }
}
