use futures::future::join_all;
use mimic_core::{ChatMessage, Persona};
use mimic_llm::{ModelSize, Reasoner, parse_json_reply};
use std::sync::Arc;
use tracing::debug;

use crate::entry::{DEFAULT_IMPORTANCE, MemoryEntry};

pub const IMPORTANCE_PROMPT: &str = "\
You are the importance scoring module of a simulated web shopper's memory.
Given the shopper's persona, their goal, their current plan (may be null),
and one memory, rate how much the memory matters for reaching the goal while
staying in character.

Scale: 1-3 routine, 4-6 relevant, 7-9 directly useful, 10 essential.

Reply with JSON only:
{\"score\": <integer 1-10>, \"reasoning\": \"<one sentence>\"}";

/// Scores memories for importance relative to a persona's goal.
#[derive(Clone)]
pub struct ImportanceScorer {
    reasoner: Arc<dyn Reasoner>,
    persona: Persona,
}

impl ImportanceScorer {
    pub fn new(reasoner: Arc<dyn Reasoner>, persona: Persona) -> Self {
        Self { reasoner, persona }
    }

    /// Score one entry in `[0, 1]` against the active plan, if any.
    /// Any failure yields [`DEFAULT_IMPORTANCE`].
    pub async fn score(&self, entry: &MemoryEntry, plan: Option<&str>) -> f32 {
        let payload = serde_json::json!({
            "persona": {
                "name": self.persona.name,
                "background": self.persona.background,
            },
            "intent": self.persona.intent,
            "plan": plan,
            "memory": {
                "kind": entry.kind.as_str(),
                "content": entry.content,
            },
        });
        let messages = [
            ChatMessage::system(IMPORTANCE_PROMPT),
            ChatMessage::user(payload.to_string()),
        ];

        let reply = match self.reasoner.chat(&messages, ModelSize::Small, true).await {
            Ok(reply) => reply,
            Err(e) => {
                debug!(error = %e, "importance scoring failed, using default");
                return DEFAULT_IMPORTANCE;
            }
        };

        match parse_json_reply(&reply).map(|v| v["score"].as_f64()) {
            Ok(Some(score)) if score.is_finite() => (score / 10.0).clamp(0.0, 1.0) as f32,
            _ => {
                debug!(reply = %reply, "importance reply has no usable score");
                DEFAULT_IMPORTANCE
            }
        }
    }

    /// Score a batch, one call per entry, issued concurrently.
    /// The output is order-aligned with `entries`.
    pub async fn score_all(&self, entries: &[MemoryEntry], plan: Option<&str>) -> Vec<f32> {
        join_all(entries.iter().map(|e| self.score(e, plan))).await
    }
}
