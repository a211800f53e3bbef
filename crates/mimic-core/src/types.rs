use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::error::{MimicError, Result};

/// Unique identifier for a simulation run.
pub type RunId = uuid::Uuid;

/// Controller clock. One tick is one perceive-plan-act cycle.
pub type Tick = u64;

// ── Persona ────────────────────────────────────────────────────

/// A named profile that conditions every decision the agent makes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Persona {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub background: String,
    #[serde(default)]
    pub intent: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    /// Income bracket as `[low, high]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub income: Option<Vec<i64>>,
    /// Any other profile attributes (occupation, location, habits, ...).
    #[serde(flatten)]
    pub demographics: BTreeMap<String, Value>,
}

impl Persona {
    pub fn new(name: impl Into<String>, background: impl Into<String>, intent: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            background: background.into(),
            intent: intent.into(),
            ..Default::default()
        }
    }

    /// Build a persona from a JSON document.
    ///
    /// Accepts the flat form (`name`, `background`, `intent`, ...) and the
    /// legacy form where a free-text `persona` field holds the background and
    /// its first line, minus a `Persona: ` prefix, is the name.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut map) = value else {
            return Err(MimicError::Config("persona must be a JSON object".into()));
        };

        let Some(Value::String(text)) = map.remove("persona") else {
            let mut persona: Persona = serde_json::from_value(Value::Object(map))?;
            if persona.name.is_empty() {
                persona.name = "Unknown".into();
            }
            return Ok(persona);
        };

        let name = text
            .lines()
            .next()
            .map(|line| line.trim_start_matches("Persona: ").trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "Unknown".into());
        map.remove("name");
        map.remove("background");
        map.insert("name".into(), Value::String(name));
        map.insert("background".into(), Value::String(text));
        Ok(serde_json::from_value(Value::Object(map))?)
    }
}

// ── Actions ────────────────────────────────────────────────────

/// The category of an [`Action`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Search,
    Click,
    Type,
    Select,
    Back,
    Wait,
    Stop,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Search => "search",
            ActionKind::Click => "click",
            ActionKind::Type => "type",
            ActionKind::Select => "select",
            ActionKind::Back => "back",
            ActionKind::Wait => "wait",
            ActionKind::Stop => "stop",
        }
    }

    /// Parse a case-insensitive action name. Unknown names yield `None`.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "search" => Some(ActionKind::Search),
            "click" => Some(ActionKind::Click),
            "type" => Some(ActionKind::Type),
            "select" => Some(ActionKind::Select),
            "back" => Some(ActionKind::Back),
            "wait" => Some(ActionKind::Wait),
            "stop" => Some(ActionKind::Stop),
            _ => None,
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One interaction the agent wants to perform on the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    Search { query: String },
    Click { element_id: String },
    Type { element_id: String, text: String },
    Select { element_id: String, value: String },
    Back,
    Wait { seconds: f64 },
    Stop { reason: String },
}

impl Action {
    pub fn stop(reason: impl Into<String>) -> Self {
        Action::Stop {
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Search { .. } => ActionKind::Search,
            Action::Click { .. } => ActionKind::Click,
            Action::Type { .. } => ActionKind::Type,
            Action::Select { .. } => ActionKind::Select,
            Action::Back => ActionKind::Back,
            Action::Wait { .. } => ActionKind::Wait,
            Action::Stop { .. } => ActionKind::Stop,
        }
    }

    pub fn is_stop(&self) -> bool {
        matches!(self, Action::Stop { .. })
    }

    pub fn stop_reason(&self) -> Option<&str> {
        match self {
            Action::Stop { reason } => Some(reason),
            _ => None,
        }
    }

    /// The action's fields without the `type` tag.
    pub fn parameters(&self) -> Value {
        match serde_json::to_value(self) {
            Ok(Value::Object(mut map)) => {
                map.remove("type");
                Value::Object(map)
            }
            _ => Value::Object(Map::new()),
        }
    }
}

// ── Observations ───────────────────────────────────────────────

/// A clickable element on the page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Clickable {
    pub id: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Clickable {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            name: None,
        }
    }

    /// The identifier an action should target: `name` when present, else `id`.
    pub fn target(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => &self.id,
        }
    }
}

/// A text-like input field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputField {
    pub id: String,
    #[serde(rename = "type")]
    pub input_type: String,
    pub placeholder: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl InputField {
    pub fn target(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => &self.id,
        }
    }
}

/// A dropdown with its selectable options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectField {
    pub id: String,
    pub options: Vec<String>,
}

/// What the agent sees after each environment transition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Observation {
    pub page_content: String,
    pub url: String,
    pub clickables: Vec<Clickable>,
    pub inputs: Vec<InputField>,
    pub selects: Vec<SelectField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl Observation {
    pub fn page(url: impl Into<String>, page_content: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            page_content: page_content.into(),
            ..Default::default()
        }
    }

    pub fn with_clickables(mut self, clickables: Vec<Clickable>) -> Self {
        self.clickables = clickables;
        self
    }

    pub fn with_inputs(mut self, inputs: Vec<InputField>) -> Self {
        self.inputs = inputs;
        self
    }
}

// ── Agent state ────────────────────────────────────────────────

/// Where the controller is within its current tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CognitiveState {
    #[default]
    Idle,
    Perceiving,
    Feedback,
    Planning,
    Acting,
}

/// A read-only view of an agent, handed to policies and reporting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub persona: Persona,
    pub tick: Tick,
    pub memory_count: usize,
    pub current_plan: String,
    pub next_step: String,
    pub state: CognitiveState,
}

impl AgentSnapshot {
    pub fn for_persona(persona: Persona) -> Self {
        Self {
            persona,
            ..Default::default()
        }
    }
}
