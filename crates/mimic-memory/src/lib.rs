//! # mimic-memory
//!
//! The agent's memory: an append-only log of typed entries whose embeddings
//! and importance scores are filled in lazily, plus a retrieval engine that
//! blends similarity, recency, importance and per-kind weights.
//!
//! ## Invariant
//!
//! The derived `embeddings` and `importances` arrays always have equal length
//! and cover a contiguous prefix of the entry log. Enrichment only ever
//! extends that prefix, in one synchronous commit.

pub mod entry;
pub mod importance;
pub mod retrieval;
pub mod store;

pub use entry::{DEFAULT_IMPORTANCE, MemoryEntry, MemoryKind};
pub use importance::ImportanceScorer;
pub use retrieval::{Recalled, RetrievalEngine, RetrievalRequest, RetrievalResult};
pub use store::{MemoryStore, SyncReport};
