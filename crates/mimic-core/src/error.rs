use thiserror::Error;

/// Unified error type for the entire Mimic simulator.
#[derive(Error, Debug)]
pub enum MimicError {
    // ── Reasoner errors ────────────────────────────────────────
    #[error("reasoner error: {0}")]
    Reasoner(String),

    #[error("reasoner rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("malformed reasoner output: {0}")]
    MalformedResponse(String),

    #[error("incomplete reasoner output: {0}")]
    IncompleteResponse(String),

    // ── Environment errors ─────────────────────────────────────
    #[error("environment error: {0}")]
    Environment(String),

    // ── Policy errors ──────────────────────────────────────────
    #[error("policy error: {0}")]
    Policy(String),

    // ── Memory errors ──────────────────────────────────────────
    #[error("memory error: {0}")]
    Memory(String),

    // ── Config errors ──────────────────────────────────────────
    #[error("config error: {0}")]
    Config(String),

    #[error("config validation failed: {field}: {reason}")]
    ConfigValidation { field: String, reason: String },

    // ── Generic wrappers ───────────────────────────────────────
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl MimicError {
    /// Whether a capability call that failed with this error is worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            MimicError::Reasoner(_)
                | MimicError::RateLimited { .. }
                | MimicError::MalformedResponse(_)
                | MimicError::IncompleteResponse(_)
                | MimicError::Io(_)
        )
    }

    /// Retry-after hint in seconds, if the provider supplied one.
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            MimicError::RateLimited { retry_after_secs } => Some(*retry_after_secs),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, MimicError>;
