use mimic_core::{MimicError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const FALLBACK_PLAN: &str = "Continue with current approach";
pub const FALLBACK_RATIONALE: &str = "Using fallback plan due to LLM errors";
pub const FALLBACK_NEXT_STEP: &str = "Try the next logical action";

/// The plan/rationale/next-step triple produced by the planning step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub plan: String,
    pub rationale: String,
    pub next_step: String,
}

impl Plan {
    /// The fixed plan installed once every planning attempt has failed.
    pub fn fallback() -> Self {
        Self {
            plan: FALLBACK_PLAN.into(),
            rationale: FALLBACK_RATIONALE.into(),
            next_step: FALLBACK_NEXT_STEP.into(),
        }
    }

    pub fn is_fallback(&self) -> bool {
        *self == Self::fallback()
    }

    /// Read a plan from a reply object. All three keys must be present as
    /// strings; anything less is an incomplete reply.
    pub fn from_reply(value: &Value) -> Result<Self> {
        let field = |key: &str| {
            value
                .get(key)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| MimicError::IncompleteResponse(format!("plan reply is missing `{key}`")))
        };
        Ok(Self {
            plan: field("plan")?,
            rationale: field("rationale")?,
            next_step: field("next_step")?,
        })
    }
}
