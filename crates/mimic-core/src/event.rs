use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::types::{ActionKind, RunId, Tick};

/// Events emitted while a simulation runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Event {
    // ── Run lifecycle ──────────────────────────────────────────
    RunStarted {
        run_id: RunId,
        persona: String,
        policy: String,
    },
    StepRecorded {
        run_id: RunId,
        step: usize,
        action: Option<ActionKind>,
        error: Option<String>,
    },
    RunFinished {
        run_id: RunId,
        status: String,
        total_steps: usize,
    },

    // ── Agent lifecycle ────────────────────────────────────────
    TickCompleted {
        tick: Tick,
        memory_count: usize,
    },
    ReflectionCompleted {
        insights: usize,
    },
}

/// Run-wide pub/sub over a tokio broadcast channel. Clones share the channel.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<Event>,
}

impl EventBus {
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Deliver to current subscribers and return how many there were.
    /// With nobody listening the event is dropped.
    pub fn publish(&self, event: Event) -> usize {
        self.tx.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_capacity(1024)
    }
}
