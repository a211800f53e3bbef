use mimic_core::{Action, CognitiveState, Persona};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Mutable agent state owned by the controller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentContext {
    pub persona: Persona,
    pub current_plan: String,
    pub rationale: String,
    pub next_step: String,
    /// The first action emitted on the previous tick, for feedback.
    pub last_action: Option<Action>,
    pub state: CognitiveState,
}

impl AgentContext {
    pub fn new(persona: Persona) -> Self {
        Self {
            persona,
            ..Default::default()
        }
    }
}

/// Tunables for the cognitive loop.
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerSettings {
    /// Attempts at obtaining a complete plan before falling back.
    pub plan_attempts: u32,
    /// Memories recalled for planning.
    pub plan_memories: usize,
    /// Memories recalled for action selection.
    pub act_memories: usize,
    /// Upper bound on actions taken from one reply.
    pub max_actions: usize,
    pub page_excerpt_chars: usize,
    pub feedback_excerpt_chars: usize,
    /// Memories a reflection looks at.
    pub reflection_window: usize,
    /// Pause between background reflection rounds.
    pub reflection_interval: Duration,
    /// Pause after a round whose enrichment failed.
    pub reflection_backoff: Duration,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            plan_attempts: 3,
            plan_memories: 20,
            act_memories: 15,
            max_actions: 5,
            page_excerpt_chars: 2000,
            feedback_excerpt_chars: 1000,
            reflection_window: 10,
            reflection_interval: Duration::from_secs(1),
            reflection_backoff: Duration::from_secs(5),
        }
    }
}
