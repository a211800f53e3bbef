use mimic_core::Tick;
use serde::{Deserialize, Serialize};

/// Importance assigned to entries that have not been scored (or whose scoring failed).
pub const DEFAULT_IMPORTANCE: f32 = 0.5;

/// The category of a memory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryKind {
    Observation,
    Action,
    Plan,
    Thought,
    Reflection,
}

impl MemoryKind {
    pub const ALL: [MemoryKind; 5] = [
        MemoryKind::Observation,
        MemoryKind::Action,
        MemoryKind::Plan,
        MemoryKind::Thought,
        MemoryKind::Reflection,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryKind::Observation => "observation",
            MemoryKind::Action => "action",
            MemoryKind::Plan => "plan",
            MemoryKind::Thought => "thought",
            MemoryKind::Reflection => "reflection",
        }
    }
}

impl std::fmt::Display for MemoryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One remembered item.
///
/// `importance` and `embedding` are filled in by enrichment; everything else
/// is fixed at append time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub content: String,
    pub kind: MemoryKind,
    pub timestamp: Tick,
    pub importance: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl MemoryEntry {
    pub fn new(kind: MemoryKind, content: impl Into<String>, timestamp: Tick) -> Self {
        Self {
            content: content.into(),
            kind,
            timestamp,
            importance: DEFAULT_IMPORTANCE,
            embedding: None,
        }
    }

    /// `"[kind] content"`, the form used in prompts.
    pub fn render(&self) -> String {
        format!("[{}] {}", self.kind, self.content)
    }
}
