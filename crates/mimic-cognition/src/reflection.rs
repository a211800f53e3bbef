use mimic_core::{ChatMessage, Event, EventBus, Persona};
use mimic_llm::{ModelSize, Reasoner, parse_json_reply};
use mimic_memory::{MemoryKind, MemoryStore, SyncReport};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::controller::string_list;
use crate::prompts::REFLECT_PROMPT;

/// Produces reflection memories from the latest entries in a store.
///
/// Cheap to clone; the main loop and the background task each hold one.
#[derive(Clone)]
pub struct Reflector {
    reasoner: Arc<dyn Reasoner>,
    store: Arc<MemoryStore>,
    persona: Persona,
    window: usize,
}

impl Reflector {
    pub fn new(reasoner: Arc<dyn Reasoner>, store: Arc<MemoryStore>, persona: Persona, window: usize) -> Self {
        Self {
            reasoner,
            store,
            persona,
            window,
        }
    }

    /// Reflect on the most recent memories and append the insights.
    /// Returns an empty list on any failure.
    pub async fn reflect(&self) -> Vec<String> {
        let recent = self.store.recent(self.window);
        if recent.is_empty() {
            return Vec::new();
        }

        let payload = serde_json::json!({
            "persona": {
                "name": self.persona.name,
                "background": self.persona.background,
                "intent": self.persona.intent,
            },
            "tick": self.store.tick(),
            "memories": recent.iter().map(|r| r.entry.render()).collect::<Vec<_>>(),
        });
        let messages = [
            ChatMessage::system(REFLECT_PROMPT),
            ChatMessage::user(payload.to_string()),
        ];

        let insights = match self.reasoner.chat(&messages, ModelSize::Small, true).await {
            Ok(reply) => match parse_json_reply(&reply) {
                Ok(value) => string_list(&value, "insights"),
                Err(e) => {
                    warn!(error = %e, "unreadable reflection reply");
                    return Vec::new();
                }
            },
            Err(e) => {
                warn!(error = %e, "reflection failed");
                return Vec::new();
            }
        };

        for insight in &insights {
            self.store.append(MemoryKind::Reflection, insight.clone());
        }
        debug!(count = insights.len(), "reflection appended insights");
        insights
    }
}

/// A background task that reflects and refreshes enrichment on its own cadence.
///
/// Cancelled through a watch signal; [`shutdown`](Self::shutdown) waits for the
/// task to exit. Interrupting an enrichment round never leaves the store's
/// derived arrays partially extended, since commits are synchronous.
pub struct BackgroundReflection {
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl BackgroundReflection {
    pub fn spawn(
        reflector: Reflector,
        store: Arc<MemoryStore>,
        interval: Duration,
        backoff: Duration,
        events: Option<EventBus>,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(reflection_loop(
            reflector,
            store,
            interval,
            backoff,
            events,
            shutdown_rx,
        ));
        info!(interval_ms = interval.as_millis() as u64, "background reflection started");
        Self { shutdown_tx, handle }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Signal the task to stop and wait for it to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.handle.await {
            warn!(error = %e, "background reflection task ended abnormally");
        }
        info!("background reflection stopped");
    }
}

async fn reflection_loop(
    reflector: Reflector,
    store: Arc<MemoryStore>,
    interval: Duration,
    backoff: Duration,
    events: Option<EventBus>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        let pause = tokio::select! {
            _ = shutdown_rx.changed() => break,
            pause = reflection_round(&reflector, &store, interval, backoff, events.as_ref()) => pause,
        };

        tokio::select! {
            _ = shutdown_rx.changed() => break,
            _ = tokio::time::sleep(pause) => {}
        }
    }
}

/// One reflect-then-sync round. Returns how long to pause afterwards.
async fn reflection_round(
    reflector: &Reflector,
    store: &MemoryStore,
    interval: Duration,
    backoff: Duration,
    events: Option<&EventBus>,
) -> Duration {
    let insights = reflector.reflect().await;
    if let Some(bus) = events {
        bus.publish(Event::ReflectionCompleted {
            insights: insights.len(),
        });
    }
    match store.sync_enrichment().await {
        SyncReport::Discarded(reason) => {
            warn!(%reason, backoff_ms = backoff.as_millis() as u64, "background enrichment failed, backing off");
            backoff
        }
        _ => interval,
    }
}
