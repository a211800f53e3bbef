use mimic_core::{MimicError, Result, Tick};
use mimic_llm::Reasoner;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::entry::{MemoryEntry, MemoryKind};
use crate::store::MemoryStore;

/// Observations this many ticks old or newer are always recalled.
pub const RECENT_OBSERVATION_WINDOW: Tick = 3;
/// Actions this many ticks old or newer are always recalled.
pub const RECENT_ACTION_WINDOW: Tick = 5;
/// How many of the latest entries to return when scoring fails.
pub const FALLBACK_RECENT: usize = 5;

/// What to recall and how to weigh it.
#[derive(Debug, Clone)]
pub struct RetrievalRequest {
    pub query: String,
    pub n: usize,
    pub include_recent: bool,
    /// Per-kind multiplier; kinds not listed weigh 1.
    pub kind_weights: HashMap<MemoryKind, f32>,
}

impl RetrievalRequest {
    /// A request for up to `n` memories, including the recency window.
    pub fn new(query: impl Into<String>, n: usize) -> Self {
        Self {
            query: query.into(),
            n,
            include_recent: true,
            kind_weights: HashMap::new(),
        }
    }

    pub fn include_recent(mut self, include: bool) -> Self {
        self.include_recent = include;
        self
    }

    pub fn weight(mut self, kind: MemoryKind, weight: f32) -> Self {
        self.kind_weights.insert(kind, weight.max(0.0));
        self
    }

    pub fn weight_for(&self, kind: MemoryKind) -> f32 {
        self.kind_weights.get(&kind).copied().unwrap_or(1.0)
    }
}

/// A recalled entry together with its position in the log.
#[derive(Debug, Clone, PartialEq)]
pub struct Recalled {
    pub index: usize,
    pub entry: MemoryEntry,
}

/// Recalled memories: recency-window entries first, then score-ranked fill.
/// Never holds the same entry twice.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetrievalResult {
    items: Vec<Recalled>,
}

impl RetrievalResult {
    fn from_items(items: Vec<Recalled>, n: usize) -> Self {
        let mut seen = HashSet::new();
        let mut items: Vec<Recalled> = items.into_iter().filter(|r| seen.insert(r.index)).collect();
        items.truncate(n);
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Recalled> {
        self.items.iter()
    }

    pub fn indices(&self) -> Vec<usize> {
        self.items.iter().map(|r| r.index).collect()
    }

    pub fn contents(&self) -> Vec<&str> {
        self.items.iter().map(|r| r.entry.content.as_str()).collect()
    }

    /// Entries rendered as `"[kind] content"`, for prompts.
    pub fn rendered(&self) -> Vec<String> {
        self.items.iter().map(|r| r.entry.render()).collect()
    }
}

/// Ranks memories by `(similarity + recency + importance) * kind_weight`.
#[derive(Clone)]
pub struct RetrievalEngine {
    store: Arc<MemoryStore>,
    reasoner: Arc<dyn Reasoner>,
}

impl RetrievalEngine {
    pub fn new(store: Arc<MemoryStore>, reasoner: Arc<dyn Reasoner>) -> Self {
        Self { store, reasoner }
    }

    pub fn store(&self) -> &Arc<MemoryStore> {
        &self.store
    }

    /// Recall the memories most relevant to `request`.
    ///
    /// Never fails: if scoring breaks, the latest few entries are returned.
    pub async fn retrieve(&self, request: &RetrievalRequest) -> RetrievalResult {
        let seed = if request.include_recent {
            self.store
                .recent_seed(RECENT_OBSERVATION_WINDOW, RECENT_ACTION_WINDOW)
        } else {
            Vec::new()
        };

        match self.rank(request, seed).await {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "retrieval failed, falling back to latest entries");
                RetrievalResult::from_items(self.store.recent(FALLBACK_RECENT), FALLBACK_RECENT)
            }
        }
    }

    async fn rank(&self, request: &RetrievalRequest, seed: Vec<Recalled>) -> Result<RetrievalResult> {
        let report = self.store.sync_enrichment().await;
        debug!(?report, "enrichment before retrieval");

        let view = self.store.scoring_view();
        if view.embeddings.is_empty() {
            return Ok(RetrievalResult::from_items(seed, request.n));
        }

        let query = self
            .reasoner
            .embed(std::slice::from_ref(&request.query))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| MimicError::Memory("query embedding missing".into()))?;

        let mut scored = Vec::with_capacity(view.entries.len());
        for (index, entry) in view.entries.iter().enumerate() {
            let embedding = &view.embeddings[index];
            if embedding.len() != query.len() {
                return Err(MimicError::Memory(format!(
                    "embedding dimension mismatch: {} vs {}",
                    embedding.len(),
                    query.len()
                )));
            }
            let similarity: f64 = embedding
                .iter()
                .zip(&query)
                .map(|(a, b)| f64::from(*a) * f64::from(*b))
                .sum();
            let recency = (entry.timestamp as f64 - view.now as f64).exp();
            let importance = f64::from(view.importances[index]);
            let weight = f64::from(request.weight_for(entry.kind));
            scored.push((index, (similarity + recency + importance) * weight));
        }

        // Highest score first; earlier insertion wins ties.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        scored.truncate(request.n);

        let ranked = scored.into_iter().map(|(index, _)| Recalled {
            index,
            entry: view.entries[index].clone(),
        });
        let items: Vec<Recalled> = seed.into_iter().chain(ranked).collect();
        Ok(RetrievalResult::from_items(items, request.n))
    }
}
