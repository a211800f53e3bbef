use mimic_core::Observation;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration, maps to `mimic.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MimicConfig {
    pub simulation: SimulationConfig,
    pub agent: AgentConfig,
    pub llm: LlmConfig,
    pub retry: RetryConfig,
    pub environment: EnvironmentConfig,
    pub component: ComponentConfig,
    pub logging: LoggingConfig,
}

// ── Simulation ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Upper bound on decisions in one run.
    pub max_steps: usize,
    /// "component", "cognitive_loop" or "full_agent".
    pub policy: String,
    /// Pause between steps, in milliseconds.
    pub step_delay_ms: u64,
    /// Where results and per-tick traces are written.
    pub output_dir: PathBuf,
    pub save_traces: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            max_steps: 50,
            policy: "full_agent".into(),
            step_delay_ms: 500,
            output_dir: PathBuf::from("output"),
            save_traces: true,
        }
    }
}

// ── Agent ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Attempts at a complete plan before the fallback plan is used.
    pub plan_attempts: u32,
    pub plan_memories: usize,
    pub act_memories: usize,
    /// Upper bound on actions taken from one reply.
    pub max_actions: usize,
    pub page_excerpt_chars: usize,
    pub feedback_excerpt_chars: usize,
    /// Memories a reflection looks at.
    pub reflection_window: usize,
    /// Inline reflection every N ticks (cognitive-loop policy only).
    pub reflection_frequency: u64,
    /// Background reflection cadence (full-agent policy only).
    pub reflection_interval_ms: u64,
    /// Pause after a background round whose enrichment failed.
    pub reflection_backoff_ms: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            plan_attempts: 3,
            plan_memories: 20,
            act_memories: 15,
            max_actions: 5,
            page_excerpt_chars: 2000,
            feedback_excerpt_chars: 1000,
            reflection_window: 10,
            reflection_frequency: 3,
            reflection_interval_ms: 1000,
            reflection_backoff_ms: 5000,
        }
    }
}

// ── LLM ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// "openai" or "mock".
    pub provider: String,
    /// OpenAI-compatible API root.
    pub base_url: String,
    /// Falls back to `OPENAI_API_KEY`.
    pub api_key: Option<String>,
    pub small_model: String,
    pub large_model: String,
    pub embedding_model: String,
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".into(),
            base_url: "https://api.openai.com/v1".into(),
            api_key: None,
            small_model: "gpt-4o-mini".into(),
            large_model: "gpt-4o".into(),
            embedding_model: "text-embedding-3-small".into(),
            temperature: 0.7,
        }
    }
}

// ── Retry ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Attempts per capability call, the first included.
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            initial_delay_ms: 1000,
            max_delay_ms: 5000,
            multiplier: 2.0,
        }
    }
}

// ── Environment ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    /// Only "mock" is built in.
    pub kind: String,
    /// Actions after which the mock environment flags every observation.
    pub max_steps: usize,
    /// Scripted pages for the mock environment. Empty uses the built-in demo.
    pub pages: Vec<Observation>,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            kind: "mock".into(),
            max_steps: 10,
            pages: Vec::new(),
        }
    }
}

// ── Component policy ───────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ComponentConfig {
    pub max_steps: usize,
    pub use_relevance_check: bool,
    pub relevance_threshold: f64,
    /// Rotate through query rewrites instead of repeating the intent.
    pub query_variations: bool,
}

impl Default for ComponentConfig {
    fn default() -> Self {
        Self {
            max_steps: 20,
            use_relevance_check: true,
            relevance_threshold: 0.5,
            query_variations: false,
        }
    }
}

// ── Logging ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// "pretty", "json" or "compact".
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "pretty".into(),
        }
    }
}

// ── Validation ─────────────────────────────────────────────────

/// A single config validation issue.
#[derive(Debug)]
pub struct ConfigWarning {
    pub field: String,
    pub message: String,
    pub severity: WarningSeverity,
    pub hint: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningSeverity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let icon = match self.severity {
            WarningSeverity::Error => "❌",
            WarningSeverity::Warning => "⚠️ ",
            WarningSeverity::Info => "💡",
        };
        write!(f, "{} {}: {}", icon, self.field, self.message)?;
        if let Some(ref h) = self.hint {
            write!(f, "\n   ↳ {}", h)?;
        }
        Ok(())
    }
}

pub const VALID_POLICIES: [&str; 3] = ["component", "cognitive_loop", "full_agent"];
pub const VALID_PROVIDERS: [&str; 2] = ["openai", "mock"];

impl MimicConfig {
    /// Validate the config and return a list of warnings.
    /// Returns `Err` with all messages joined if any severity is Error.
    pub fn validate(&self) -> Result<Vec<ConfigWarning>, String> {
        let mut warnings = Vec::new();

        // ── Simulation ───
        if self.simulation.max_steps == 0 {
            warnings.push(ConfigWarning {
                field: "simulation.max_steps".into(),
                message: "max_steps is 0, the run will end before any decision".into(),
                severity: WarningSeverity::Error,
                hint: Some("Set to e.g. 50".into()),
            });
        }
        if !VALID_POLICIES.contains(&self.simulation.policy.as_str()) {
            warnings.push(ConfigWarning {
                field: "simulation.policy".into(),
                message: format!("unknown policy '{}'", self.simulation.policy),
                severity: WarningSeverity::Error,
                hint: Some(format!("Valid values: {}", VALID_POLICIES.join(", "))),
            });
        }

        // ── Agent ───
        if self.agent.plan_attempts == 0 {
            warnings.push(ConfigWarning {
                field: "agent.plan_attempts".into(),
                message: "plan_attempts is 0, treated as a single attempt".into(),
                severity: WarningSeverity::Warning,
                hint: Some("The default is 3".into()),
            });
        }
        if self.agent.max_actions == 0 {
            warnings.push(ConfigWarning {
                field: "agent.max_actions".into(),
                message: "max_actions is 0, every tick will end in a stop".into(),
                severity: WarningSeverity::Error,
                hint: Some("Set to e.g. 5".into()),
            });
        }
        if self.agent.reflection_frequency == 0 && self.simulation.policy == "cognitive_loop" {
            warnings.push(ConfigWarning {
                field: "agent.reflection_frequency".into(),
                message: "reflection_frequency is 0, the cognitive loop will never reflect".into(),
                severity: WarningSeverity::Info,
                hint: None,
            });
        }

        // ── LLM ───
        if !VALID_PROVIDERS.contains(&self.llm.provider.as_str()) {
            warnings.push(ConfigWarning {
                field: "llm.provider".into(),
                message: format!("unknown provider '{}'", self.llm.provider),
                severity: WarningSeverity::Error,
                hint: Some(format!("Valid values: {}", VALID_PROVIDERS.join(", "))),
            });
        } else if self.llm.provider == "openai"
            && self.llm.api_key.as_deref().is_none_or(|k| k.trim().is_empty())
        {
            warnings.push(ConfigWarning {
                field: "llm.api_key".into(),
                message: "no API key configured for the openai provider".into(),
                severity: WarningSeverity::Warning,
                hint: Some("Set llm.api_key or OPENAI_API_KEY, or use provider = \"mock\"".into()),
            });
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            warnings.push(ConfigWarning {
                field: "llm.temperature".into(),
                message: format!("temperature {} is out of range", self.llm.temperature),
                severity: WarningSeverity::Error,
                hint: Some("Temperature must be between 0.0 and 2.0".into()),
            });
        }

        // ── Retry ───
        if self.retry.max_attempts == 0 {
            warnings.push(ConfigWarning {
                field: "retry.max_attempts".into(),
                message: "max_attempts is 0, treated as a single attempt".into(),
                severity: WarningSeverity::Warning,
                hint: None,
            });
        }
        if self.retry.multiplier < 1.0 {
            warnings.push(ConfigWarning {
                field: "retry.multiplier".into(),
                message: format!("multiplier {} shrinks the backoff", self.retry.multiplier),
                severity: WarningSeverity::Warning,
                hint: Some("Use 1.0 for a constant delay or 2.0 for doubling".into()),
            });
        }
        if self.retry.initial_delay_ms > self.retry.max_delay_ms {
            warnings.push(ConfigWarning {
                field: "retry.initial_delay_ms".into(),
                message: "initial delay exceeds max_delay_ms and will be capped".into(),
                severity: WarningSeverity::Info,
                hint: None,
            });
        }

        // ── Environment ───
        if self.environment.kind != "mock" {
            warnings.push(ConfigWarning {
                field: "environment.kind".into(),
                message: format!("unknown environment '{}'", self.environment.kind),
                severity: WarningSeverity::Error,
                hint: Some("Only \"mock\" is built in".into()),
            });
        }

        // ── Component policy ───
        if !(0.0..=1.0).contains(&self.component.relevance_threshold) {
            warnings.push(ConfigWarning {
                field: "component.relevance_threshold".into(),
                message: format!("threshold {} is out of range", self.component.relevance_threshold),
                severity: WarningSeverity::Error,
                hint: Some("Threshold must be between 0.0 and 1.0".into()),
            });
        }

        // ── Logging format ───
        let valid_formats = ["pretty", "json", "compact"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            warnings.push(ConfigWarning {
                field: "logging.format".into(),
                message: format!("unknown log format '{}'", self.logging.format),
                severity: WarningSeverity::Warning,
                hint: Some(format!("Valid values: {}", valid_formats.join(", "))),
            });
        }

        // ── Logging level ───
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            warnings.push(ConfigWarning {
                field: "logging.level".into(),
                message: format!("unknown log level '{}'", self.logging.level),
                severity: WarningSeverity::Warning,
                hint: Some(format!("Valid values: {}", valid_levels.join(", "))),
            });
        }

        let errors: Vec<String> = warnings
            .iter()
            .filter(|w| w.severity == WarningSeverity::Error)
            .map(|w| format!("{}: {}", w.field, w.message))
            .collect();

        if !errors.is_empty() {
            return Err(format!("Configuration errors:\n  • {}", errors.join("\n  • ")));
        }

        Ok(warnings)
    }
}
