//! Mock reasoner for deterministic testing.
//!
//! Returns pre-configured chat replies and hash-based embeddings without
//! making any HTTP calls.

use async_trait::async_trait;
use mimic_core::{ChatMessage, MimicError, Result};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use crate::json::parse_json_reply;
use crate::provider::{ModelSize, Reasoner};

/// A pre-configured chat reply.
#[derive(Debug, Clone, Default)]
pub struct MockResponse {
    pub text: String,
    /// If set, the reasoner will return this error instead.
    pub error: Option<String>,
}

impl MockResponse {
    pub fn text(text: &str) -> Self {
        Self {
            text: text.to_string(),
            error: None,
        }
    }

    pub fn json(value: serde_json::Value) -> Self {
        Self {
            text: value.to_string(),
            error: None,
        }
    }

    pub fn error(msg: &str) -> Self {
        Self {
            text: String::new(),
            error: Some(msg.to_string()),
        }
    }
}

/// A chat call the mock received.
#[derive(Debug, Clone)]
pub struct RecordedChat {
    pub messages: Vec<ChatMessage>,
    pub size: ModelSize,
    pub json_mode: bool,
}

impl RecordedChat {
    /// Whether any message in the call contains `needle`.
    pub fn mentions(&self, needle: &str) -> bool {
        self.messages.iter().any(|m| m.content.contains(needle))
    }
}

/// A mock reasoner.
///
/// Chat replies come from standing rules first (a rule fires whenever a
/// message of the call contains its needle, and is never consumed), then from
/// the FIFO queue. With nothing queued the reply is a plain-text placeholder,
/// which fails in JSON mode.
///
/// # Example
/// ```
/// use mimic_llm::mock::{MockReasoner, MockResponse};
/// let reasoner = MockReasoner::new()
///     .when_prompt_contains("importance", MockResponse::text(r#"{"score": 8}"#))
///     .with_response(r#"{"observations": []}"#);
/// ```
pub struct MockReasoner {
    name: String,
    responses: Mutex<VecDeque<MockResponse>>,
    rules: Mutex<Vec<(String, MockResponse)>>,
    requests: Arc<Mutex<Vec<RecordedChat>>>,
    embed_calls: AtomicUsize,
    embedded_texts: AtomicUsize,
    fail_embeddings: AtomicBool,
    embed_delay: Duration,
    dims: usize,
}

impl Default for MockReasoner {
    fn default() -> Self {
        Self::new()
    }
}

impl MockReasoner {
    pub fn new() -> Self {
        Self {
            name: "mock".into(),
            responses: Mutex::new(VecDeque::new()),
            rules: Mutex::new(vec![]),
            requests: Arc::new(Mutex::new(vec![])),
            embed_calls: AtomicUsize::new(0),
            embedded_texts: AtomicUsize::new(0),
            fail_embeddings: AtomicBool::new(false),
            embed_delay: Duration::ZERO,
            dims: 16,
        }
    }

    /// Queue a text reply.
    pub fn with_response(self, text: &str) -> Self {
        self.responses.lock().push_back(MockResponse::text(text));
        self
    }

    /// Queue an error reply.
    pub fn with_error(self, error: &str) -> Self {
        self.responses.lock().push_back(MockResponse::error(error));
        self
    }

    /// Add a standing rule keyed on prompt text.
    pub fn when_prompt_contains(self, needle: &str, response: MockResponse) -> Self {
        self.rules.lock().push((needle.to_string(), response));
        self
    }

    /// Make every embedding call fail.
    pub fn with_failing_embeddings(self) -> Self {
        self.fail_embeddings.store(true, Ordering::SeqCst);
        self
    }

    /// Make every embedding call take at least `delay`.
    pub fn with_embed_delay(mut self, delay: Duration) -> Self {
        self.embed_delay = delay;
        self
    }

    pub fn with_dimensions(mut self, dims: usize) -> Self {
        self.dims = dims.max(1);
        self
    }

    /// Queue a reply on a shared mock.
    pub fn queue_response(&self, resp: MockResponse) {
        self.responses.lock().push_back(resp);
    }

    pub fn set_embeddings_failing(&self, failing: bool) {
        self.fail_embeddings.store(failing, Ordering::SeqCst);
    }

    /// All chat calls received so far.
    pub fn recorded_requests(&self) -> Vec<RecordedChat> {
        self.requests.lock().clone()
    }

    /// Number of chat calls whose prompt mentions `needle`.
    pub fn calls_mentioning(&self, needle: &str) -> usize {
        self.requests.lock().iter().filter(|r| r.mentions(needle)).count()
    }

    pub fn chat_call_count(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn embed_call_count(&self) -> usize {
        self.embed_calls.load(Ordering::SeqCst)
    }

    /// Total number of texts embedded across all calls.
    pub fn embedded_text_count(&self) -> usize {
        self.embedded_texts.load(Ordering::SeqCst)
    }

    fn next_response(&self, messages: &[ChatMessage]) -> MockResponse {
        let rules = self.rules.lock();
        if let Some((_, resp)) = rules
            .iter()
            .find(|(needle, _)| messages.iter().any(|m| m.content.contains(needle.as_str())))
        {
            return resp.clone();
        }
        drop(rules);

        self.responses.lock().pop_front().unwrap_or_else(|| MockResponse {
            text: "(mock: no more queued responses)".to_string(),
            error: None,
        })
    }

    /// Deterministic bag-of-words embedding, L2-normalised.
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dims];
        for token in text.split_whitespace() {
            let token = token
                .trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase();
            if token.is_empty() {
                continue;
            }
            let bucket = (fnv1a(token.as_bytes()) % self.dims as u64) as usize;
            vector[bucket] += 1.0;
        }
        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for b in bytes {
        hash ^= u64::from(*b);
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

#[async_trait]
impl Reasoner for MockReasoner {
    fn name(&self) -> &str {
        &self.name
    }

    async fn chat(&self, messages: &[ChatMessage], size: ModelSize, json_mode: bool) -> Result<String> {
        self.requests.lock().push(RecordedChat {
            messages: messages.to_vec(),
            size,
            json_mode,
        });
        let mock = self.next_response(messages);

        if let Some(error) = mock.error {
            return Err(MimicError::Reasoner(error));
        }
        if json_mode {
            return Ok(parse_json_reply(&mock.text)?.to_string());
        }
        Ok(mock.text)
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.embed_calls.fetch_add(1, Ordering::SeqCst);
        if !self.embed_delay.is_zero() {
            tokio::time::sleep(self.embed_delay).await;
        }
        if self.fail_embeddings.load(Ordering::SeqCst) {
            return Err(MimicError::Reasoner("mock embedding failure".into()));
        }
        self.embedded_texts.fetch_add(texts.len(), Ordering::SeqCst);
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}
