//! The decision policy family.
//!
//! Every policy answers the same question, `decide(observation, agent) ->
//! action`. The variants differ only in how much machinery sits behind it:
//! heuristics, the synchronous cognitive loop, or the full agent with a
//! background reflection task.

pub mod cognitive_loop;
pub mod component;
pub mod full_agent;

pub use cognitive_loop::CognitiveLoopPolicy;
pub use component::{ComponentPolicy, ComponentSettings};
pub use full_agent::FullAgentPolicy;

use async_trait::async_trait;
use mimic_core::{Action, AgentSnapshot, Observation, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Chooses the next action for an agent.
#[async_trait]
pub trait DecisionPolicy: Send {
    /// Short identifier, used in logs and reports.
    fn name(&self) -> &str;

    /// The agent state this policy is deciding for.
    fn snapshot(&self) -> AgentSnapshot;

    /// Decide the next action given the current observation.
    async fn decide(&mut self, observation: &Observation, agent: &AgentSnapshot) -> Result<Action>;

    /// Release background work. Called once when the run ends.
    async fn shutdown(&mut self) {}
}

/// Which policy variant to build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    Component,
    CognitiveLoop,
    #[default]
    FullAgent,
}

impl PolicyKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "component" => Some(Self::Component),
            "cognitive_loop" | "cognitive" => Some(Self::CognitiveLoop),
            "full_agent" | "agent" => Some(Self::FullAgent),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Component => "component",
            Self::CognitiveLoop => "cognitive_loop",
            Self::FullAgent => "full_agent",
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
