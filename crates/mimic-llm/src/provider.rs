use async_trait::async_trait;
use mimic_core::{ChatMessage, Result};
use serde::{Deserialize, Serialize};

/// Which class of model a call should run on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelSize {
    /// Cheap and fast: perception, feedback, importance scoring.
    Small,
    /// Slow and capable: planning and action selection.
    Large,
}

/// The reasoning capability consumed by memory and the cognitive loop.
///
/// Passed explicitly to whoever needs it; never looked up from global state.
#[async_trait]
pub trait Reasoner: Send + Sync {
    /// Human-readable name, e.g. "openai" or "mock".
    fn name(&self) -> &str;

    /// Complete a conversation. With `json_mode` the reply must be a JSON
    /// object; anything else is reported as `MalformedResponse`.
    async fn chat(&self, messages: &[ChatMessage], size: ModelSize, json_mode: bool) -> Result<String>;

    /// Embed a batch of texts. Vectors are order-aligned with the input.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}
