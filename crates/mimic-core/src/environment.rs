use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Action, Observation};

/// The world an agent acts in, e.g. a browser session or a scripted mock.
///
/// Only the simulation driver talks to an environment; decision making never
/// calls it directly.
#[async_trait]
pub trait Environment: Send {
    /// Human-readable name, e.g. "mock" or "browser".
    fn name(&self) -> &str;

    /// Start over and return the initial observation.
    async fn reset(&mut self) -> Result<Observation>;

    /// Apply an action and return the resulting observation.
    async fn step(&mut self, action: &Action) -> Result<Observation>;

    /// Return the current observation without changing anything.
    async fn observe(&mut self) -> Result<Observation>;

    /// Release any held resources.
    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}
