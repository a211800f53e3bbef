use async_trait::async_trait;
use mimic_core::{ChatMessage, MimicError, Result};
use serde_json::Value;
use tracing::debug;

use crate::json::parse_json_reply;
use crate::provider::{ModelSize, Reasoner};

/// OpenAI-compatible reasoner (works with OpenAI, Azure, vLLM, etc.)
///
/// Chat goes to `{base_url}/chat/completions`, embeddings to
/// `{base_url}/embeddings`. No retries happen here; wrap it in a
/// [`RetryingReasoner`](crate::RetryingReasoner) for that.
pub struct OpenAiReasoner {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    small_model: String,
    large_model: String,
    embedding_model: String,
    temperature: f32,
}

impl OpenAiReasoner {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: "https://api.openai.com/v1".into(),
            small_model: "gpt-4o-mini".into(),
            large_model: "gpt-4o".into(),
            embedding_model: "text-embedding-3-small".into(),
            temperature: 0.7,
        }
    }

    /// Use a custom base URL (for Azure, Together, vLLM, etc.)
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_models(
        mut self,
        small: impl Into<String>,
        large: impl Into<String>,
        embedding: impl Into<String>,
    ) -> Self {
        self.small_model = small.into();
        self.large_model = large.into();
        self.embedding_model = embedding.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// The concrete model name a size maps to.
    pub fn model_for(&self, size: ModelSize) -> &str {
        match size {
            ModelSize::Small => &self.small_model,
            ModelSize::Large => &self.large_model,
        }
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value> {
        let resp = self
            .client
            .post(format!("{}/{}", self.base_url, path))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(body)
            .send()
            .await
            .map_err(|e| MimicError::Reasoner(format!("request to {path} failed: {e}")))?;

        let status = resp.status();
        if status.as_u16() == 429 {
            let retry_after_secs = resp
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .unwrap_or(1);
            return Err(MimicError::RateLimited { retry_after_secs });
        }
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(MimicError::Reasoner(format!("HTTP {status}: {text}")));
        }

        resp.json()
            .await
            .map_err(|e| MimicError::Reasoner(format!("{path} parse error: {e}")))
    }
}

#[async_trait]
impl Reasoner for OpenAiReasoner {
    fn name(&self) -> &str {
        "openai"
    }

    async fn chat(&self, messages: &[ChatMessage], size: ModelSize, json_mode: bool) -> Result<String> {
        let model = self.model_for(size);
        let messages: Vec<Value> = messages
            .iter()
            .map(|m| serde_json::json!({ "role": m.role.as_str(), "content": m.content }))
            .collect();

        let mut body = serde_json::json!({
            "model": model,
            "messages": messages,
            "temperature": self.temperature,
        });
        if json_mode {
            body["response_format"] = serde_json::json!({ "type": "json_object" });
        }

        debug!(%model, json_mode, "sending chat request");
        let data = self.post("chat/completions", &body).await?;

        let content = data["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| MimicError::Reasoner("response has no message content".into()))?;

        if json_mode {
            // Normalise to the bare object so callers can parse it directly.
            let value = parse_json_reply(content)?;
            return Ok(value.to_string());
        }
        Ok(content.to_string())
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        debug!(model = %self.embedding_model, count = texts.len(), "generating embeddings");

        let body = serde_json::json!({
            "model": &self.embedding_model,
            "input": texts,
        });
        let data = self.post("embeddings", &body).await?;

        let items = data["data"]
            .as_array()
            .ok_or_else(|| MimicError::Reasoner("embedding response has no data".into()))?;

        // The API may return items out of order; `index` is authoritative.
        let mut slots: Vec<Option<Vec<f32>>> = vec![None; texts.len()];
        for (pos, item) in items.iter().enumerate() {
            let index = item["index"].as_u64().map(|i| i as usize).unwrap_or(pos);
            let vector = item["embedding"]
                .as_array()
                .map(|arr| arr.iter().filter_map(|v| v.as_f64().map(|f| f as f32)).collect());
            if let (Some(slot), Some(vector)) = (slots.get_mut(index), vector) {
                *slot = Some(vector);
            }
        }

        slots
            .into_iter()
            .enumerate()
            .map(|(i, v)| v.ok_or_else(|| MimicError::Reasoner(format!("missing embedding for input {i}"))))
            .collect()
    }
}
