use mimic_core::{Persona, Tick};
use mimic_llm::Reasoner;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::entry::{MemoryEntry, MemoryKind};
use crate::importance::ImportanceScorer;
use crate::retrieval::Recalled;

/// Outcome of one [`MemoryStore::sync_enrichment`] call.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncReport {
    /// Nothing new to enrich; no calls were made.
    UpToDate,
    /// This many entries were enriched and committed.
    Committed(usize),
    /// The batch was dropped (embedding failure); entries stay un-enriched.
    Discarded(String),
}

impl SyncReport {
    pub fn is_discarded(&self) -> bool {
        matches!(self, SyncReport::Discarded(_))
    }
}

struct StoreState {
    entries: Vec<MemoryEntry>,
    tick: Tick,
    embeddings: Vec<Vec<f32>>,
    importances: Vec<f32>,
    /// The agent's active plan, given to importance scoring.
    plan: Option<String>,
}

/// Point-in-time copy of what retrieval scores against.
pub(crate) struct ScoringView {
    pub entries: Vec<MemoryEntry>,
    pub embeddings: Vec<Vec<f32>>,
    pub importances: Vec<f32>,
    pub now: Tick,
}

/// Append-only memory log with lazily computed embeddings and importances.
///
/// Shared between the main decision path and the background reflection task
/// behind an `Arc`. Every mutation happens inside one short synchronous
/// critical section, so readers always see a consistent prefix state.
pub struct MemoryStore {
    state: Mutex<StoreState>,
    /// Serialises enrichment so two syncs never work on overlapping suffixes.
    sync_gate: tokio::sync::Mutex<()>,
    reasoner: Arc<dyn Reasoner>,
    scorer: ImportanceScorer,
}

impl MemoryStore {
    pub fn new(reasoner: Arc<dyn Reasoner>, persona: Persona) -> Self {
        Self {
            state: Mutex::new(StoreState {
                entries: Vec::new(),
                tick: 0,
                embeddings: Vec::new(),
                importances: Vec::new(),
                plan: None,
            }),
            sync_gate: tokio::sync::Mutex::new(()),
            scorer: ImportanceScorer::new(Arc::clone(&reasoner), persona),
            reasoner,
        }
    }

    /// Append an entry stamped with the current tick. Returns its index.
    pub fn append(&self, kind: MemoryKind, content: impl Into<String>) -> usize {
        let mut state = self.state.lock();
        let entry = MemoryEntry::new(kind, content, state.tick);
        state.entries.push(entry);
        state.entries.len() - 1
    }

    pub fn tick(&self) -> Tick {
        self.state.lock().tick
    }

    /// Move the clock forward by one and return the new tick.
    pub fn advance_tick(&self) -> Tick {
        let mut state = self.state.lock();
        state.tick += 1;
        state.tick
    }

    /// Record the plan that later importance scoring is judged against.
    pub fn set_plan(&self, plan: impl Into<String>) {
        self.state.lock().plan = Some(plan.into());
    }

    pub fn plan(&self) -> Option<String> {
        self.state.lock().plan.clone()
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<MemoryEntry> {
        self.state.lock().entries.get(index).cloned()
    }

    /// A copy of every entry in insertion order.
    pub fn entries(&self) -> Vec<MemoryEntry> {
        self.state.lock().entries.clone()
    }

    /// The `k` most recently appended entries, oldest first.
    pub fn recent(&self, k: usize) -> Vec<Recalled> {
        let state = self.state.lock();
        let start = state.entries.len().saturating_sub(k);
        state.entries[start..]
            .iter()
            .enumerate()
            .map(|(offset, entry)| Recalled {
                index: start + offset,
                entry: entry.clone(),
            })
            .collect()
    }

    /// Observations from the last `observation_window` ticks followed by
    /// actions from the last `action_window` ticks, each in insertion order.
    pub fn recent_seed(&self, observation_window: Tick, action_window: Tick) -> Vec<Recalled> {
        let state = self.state.lock();
        let now = state.tick;
        let pick = |kind: MemoryKind, window: Tick| {
            let floor = now.saturating_sub(window);
            state
                .entries
                .iter()
                .enumerate()
                .filter(move |(_, e)| e.kind == kind && e.timestamp >= floor)
                .map(|(index, e)| Recalled {
                    index,
                    entry: e.clone(),
                })
        };
        pick(MemoryKind::Observation, observation_window)
            .chain(pick(MemoryKind::Action, action_window))
            .collect()
    }

    /// Number of entries covered by the derived arrays.
    pub fn enriched_len(&self) -> usize {
        self.state.lock().embeddings.len()
    }

    pub fn embeddings(&self) -> Vec<Vec<f32>> {
        self.state.lock().embeddings.clone()
    }

    pub fn importances(&self) -> Vec<f32> {
        self.state.lock().importances.clone()
    }

    /// `"{timestamp}: {content}"` per entry, one per line.
    pub fn trace_lines(&self) -> String {
        self.state
            .lock()
            .entries
            .iter()
            .map(|e| format!("{}: {}", e.timestamp, e.content))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub(crate) fn scoring_view(&self) -> ScoringView {
        let state = self.state.lock();
        let m = state
            .embeddings
            .len()
            .min(state.importances.len())
            .min(state.entries.len());
        ScoringView {
            entries: state.entries[..m].to_vec(),
            embeddings: state.embeddings[..m].to_vec(),
            importances: state.importances[..m].to_vec(),
            now: state.tick,
        }
    }

    /// Enrich every entry past the current prefix.
    ///
    /// The batch embedding call and the per-entry importance calls run
    /// concurrently; results are committed together only once both finish.
    /// A failed embedding batch discards everything. A failed importance call
    /// degrades that entry to the default score. Dropping the returned future
    /// before it completes commits nothing.
    pub async fn sync_enrichment(&self) -> SyncReport {
        let _gate = self.sync_gate.lock().await;

        let (start, pending, plan) = {
            let state = self.state.lock();
            let start = state.embeddings.len();
            (start, state.entries[start..].to_vec(), state.plan.clone())
        };
        if pending.is_empty() {
            return SyncReport::UpToDate;
        }

        let texts: Vec<String> = pending.iter().map(|e| e.content.clone()).collect();
        let (embedded, scores) = tokio::join!(
            self.reasoner.embed(&texts),
            self.scorer.score_all(&pending, plan.as_deref())
        );

        let vectors = match embedded {
            Ok(vectors) if vectors.len() == pending.len() => vectors,
            Ok(vectors) => {
                let reason = format!(
                    "embedding count mismatch: sent {}, got {}",
                    pending.len(),
                    vectors.len()
                );
                warn!(%reason, "discarding enrichment batch");
                return SyncReport::Discarded(reason);
            }
            Err(e) => {
                warn!(error = %e, pending = pending.len(), "embedding batch failed, discarding enrichment");
                return SyncReport::Discarded(e.to_string());
            }
        };

        let mut guard = self.state.lock();
        let state = &mut *guard;
        if state.embeddings.len() != start || state.importances.len() != start {
            return SyncReport::Discarded("enrichment prefix moved during sync".into());
        }
        for (offset, (vector, importance)) in vectors.into_iter().zip(scores).enumerate() {
            let entry = &mut state.entries[start + offset];
            entry.embedding = Some(vector.clone());
            entry.importance = importance;
            state.embeddings.push(vector);
            state.importances.push(importance);
        }
        debug!(committed = pending.len(), total = state.embeddings.len(), "enrichment committed");
        SyncReport::Committed(pending.len())
    }
}
