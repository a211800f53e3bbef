//! # mimic-core
//!
//! Core types, traits, and primitives for the Mimic persona-driven shopper simulator.
//! This crate defines the shared vocabulary used by every other crate in the workspace.

pub mod environment;
pub mod error;
pub mod event;
pub mod message;
pub mod types;

pub use environment::Environment;
pub use error::{MimicError, Result};
pub use event::{Event, EventBus};
pub use message::{ChatMessage, Role};
pub use types::*;
