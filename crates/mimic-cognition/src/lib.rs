//! # mimic-cognition
//!
//! The cognitive loop that turns observations into actions for one persona.
//!
//! A tick runs `perceive -> feedback (after the first tick) -> plan -> act`.
//! Reflection is separate: it either runs inline every few ticks or in a
//! [`BackgroundReflection`] task that shares the memory store.
//!
//! No public operation here returns an error. Every failure degrades to a
//! documented fallback (empty list, fallback plan, no actions).

pub mod actions;
pub mod context;
pub mod controller;
pub mod planner;
pub mod prompts;
pub mod reflection;

pub use actions::{map_action, parse_actions};
pub use context::{AgentContext, ControllerSettings};
pub use controller::CognitiveController;
pub use planner::Plan;
pub use reflection::{BackgroundReflection, Reflector};
