//! # mimic-llm
//!
//! Abstraction layer over reasoning backends. A [`Reasoner`] offers chat
//! completion and batch embedding; [`RetryPolicy`] makes retry behaviour an
//! explicit, testable object instead of something buried in each client.

pub mod json;
pub mod mock;
pub mod openai;
pub mod provider;
pub mod retry;

pub use json::{extract_json_object, parse_json_reply};
pub use mock::{MockReasoner, MockResponse};
pub use openai::OpenAiReasoner;
pub use provider::{ModelSize, Reasoner};
pub use retry::{RetryPolicy, RetryingReasoner};
