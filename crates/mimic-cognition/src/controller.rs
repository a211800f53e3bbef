use mimic_core::{
    Action, AgentSnapshot, ChatMessage, CognitiveState, Event, EventBus, Observation, Persona, Result, Tick,
};
use mimic_llm::{ModelSize, Reasoner, RetryPolicy, parse_json_reply};
use mimic_memory::{MemoryKind, MemoryStore, RetrievalEngine, RetrievalRequest};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::actions::parse_actions;
use crate::context::{AgentContext, ControllerSettings};
use crate::planner::Plan;
use crate::prompts::{ACT_PROMPT, FEEDBACK_PROMPT, PERCEIVE_PROMPT, PLAN_PROMPT};
use crate::reflection::{BackgroundReflection, Reflector};

/// Read `key` from a reply object as a list of non-empty strings.
pub(crate) fn string_list(value: &Value, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.trim().to_string()),
                    Value::Null => None,
                    other => Some(other.to_string()),
                })
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

fn excerpt(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Drives one persona through perceive, feedback, plan and act.
///
/// Owns the agent's context and shares its [`MemoryStore`] with the retrieval
/// engine and, once started, the background reflection task.
pub struct CognitiveController {
    reasoner: Arc<dyn Reasoner>,
    store: Arc<MemoryStore>,
    retrieval: RetrievalEngine,
    reflector: Reflector,
    context: AgentContext,
    settings: ControllerSettings,
    plan_retry: RetryPolicy,
    background: Option<BackgroundReflection>,
    events: Option<EventBus>,
}

impl CognitiveController {
    pub fn new(persona: Persona, reasoner: Arc<dyn Reasoner>, settings: ControllerSettings) -> Self {
        let store = Arc::new(MemoryStore::new(reasoner.clone(), persona.clone()));
        let retrieval = RetrievalEngine::new(store.clone(), reasoner.clone());
        let reflector = Reflector::new(
            reasoner.clone(),
            store.clone(),
            persona.clone(),
            settings.reflection_window,
        );
        Self {
            plan_retry: RetryPolicy::immediate(settings.plan_attempts),
            reasoner,
            store,
            retrieval,
            reflector,
            context: AgentContext::new(persona),
            settings,
            background: None,
            events: None,
        }
    }

    /// Publish tick and reflection events on `bus`.
    pub fn with_events(mut self, bus: EventBus) -> Self {
        self.events = Some(bus);
        self
    }

    pub fn store(&self) -> &Arc<MemoryStore> {
        &self.store
    }

    pub fn context(&self) -> &AgentContext {
        &self.context
    }

    pub fn settings(&self) -> &ControllerSettings {
        &self.settings
    }

    pub fn tick(&self) -> Tick {
        self.store.tick()
    }

    pub fn snapshot(&self) -> AgentSnapshot {
        AgentSnapshot {
            persona: self.context.persona.clone(),
            tick: self.store.tick(),
            memory_count: self.store.len(),
            current_plan: self.context.current_plan.clone(),
            next_step: self.context.next_step.clone(),
            state: self.context.state,
        }
    }

    fn persona_json(&self) -> Value {
        let persona = &self.context.persona;
        json!({
            "name": persona.name,
            "background": persona.background,
            "intent": persona.intent,
            "age": persona.age,
            "gender": persona.gender,
            "income": persona.income,
        })
    }

    /// One JSON-mode chat call, parsed into an object.
    async fn ask(&self, system: &str, payload: &Value, size: ModelSize) -> Result<Value> {
        let messages = [ChatMessage::system(system), ChatMessage::user(payload.to_string())];
        let reply = self.reasoner.chat(&messages, size, true).await?;
        parse_json_reply(&reply)
    }

    // ── Perceive ───────────────────────────────────────────────

    /// Turn an observation into observation memories.
    pub async fn perceive(&mut self, observation: &Observation) -> Vec<String> {
        self.context.state = CognitiveState::Perceiving;

        let payload = json!({
            "url": observation.url,
            "page_content": observation.page_content,
            "clickables": observation.clickables.iter()
                .map(|c| json!({"id": c.id, "text": c.text}))
                .collect::<Vec<_>>(),
            "inputs": observation.inputs.iter()
                .map(|i| json!({"id": i.id, "type": i.input_type, "placeholder": i.placeholder}))
                .collect::<Vec<_>>(),
            "selects": observation.selects.iter()
                .map(|s| json!({"id": s.id, "options": s.options}))
                .collect::<Vec<_>>(),
        });

        let perceptions = match self.ask(PERCEIVE_PROMPT, &payload, ModelSize::Small).await {
            Ok(reply) => string_list(&reply, "observations"),
            Err(e) => {
                warn!(error = %e, tick = self.tick(), "perception failed");
                return Vec::new();
            }
        };
        for perception in &perceptions {
            self.store.append(MemoryKind::Observation, perception.clone());
        }
        debug!(count = perceptions.len(), "perceived");
        perceptions
    }

    // ── Feedback ───────────────────────────────────────────────

    /// Judge the outcome of the previous tick's action. Skipped on the first
    /// tick and whenever no action has been taken yet.
    pub async fn feedback(&mut self, observation: &Observation) -> Vec<String> {
        let Some(last_action) = self.context.last_action.clone() else {
            return Vec::new();
        };
        if self.tick() == 0 {
            return Vec::new();
        }
        self.context.state = CognitiveState::Feedback;

        let payload = json!({
            "persona": self.persona_json(),
            "last_action": {
                "type": last_action.kind().as_str(),
                "parameters": last_action.parameters(),
            },
            "last_plan": self.context.current_plan,
            "observation": {
                "url": observation.url,
                "page_content": excerpt(&observation.page_content, self.settings.feedback_excerpt_chars),
                "error_message": observation.error_message,
            },
        });

        let thoughts = match self.ask(FEEDBACK_PROMPT, &payload, ModelSize::Small).await {
            Ok(reply) => string_list(&reply, "thoughts"),
            Err(e) => {
                warn!(error = %e, tick = self.tick(), "feedback failed");
                return Vec::new();
            }
        };
        for thought in &thoughts {
            self.store.append(MemoryKind::Thought, thought.clone());
        }
        thoughts
    }

    // ── Plan ───────────────────────────────────────────────────

    async fn request_plan(&self, messages: &[ChatMessage]) -> Result<Plan> {
        let reply = self.reasoner.chat(messages, ModelSize::Large, true).await?;
        Plan::from_reply(&parse_json_reply(&reply)?)
    }

    /// Produce a plan, falling back to the fixed triple once every attempt
    /// has failed or come back incomplete.
    pub async fn plan(&mut self) -> Plan {
        self.context.state = CognitiveState::Planning;

        let query = format!("{} {}", self.context.persona.intent, self.context.current_plan);
        let request = RetrievalRequest::new(query.trim(), self.settings.plan_memories)
            .weight(MemoryKind::Observation, 0.0);
        let memories = self.retrieval.retrieve(&request).await;

        let payload = json!({
            "persona": self.persona_json(),
            "intent": self.context.persona.intent,
            "previous_plan": self.context.current_plan,
            "memories": memories.rendered(),
        });
        let messages = [
            ChatMessage::system(PLAN_PROMPT),
            ChatMessage::user(payload.to_string()),
        ];

        let retry = self.plan_retry.clone();
        let this = &*self;
        let messages = &messages;
        let plan = match retry.run("plan", || this.request_plan(messages)).await {
            Ok(plan) => plan,
            Err(e) => {
                warn!(error = %e, attempts = retry.max_attempts, "planning failed, using fallback plan");
                Plan::fallback()
            }
        };

        self.context.current_plan = plan.plan.clone();
        self.context.rationale = plan.rationale.clone();
        self.context.next_step = plan.next_step.clone();
        self.store.set_plan(plan.plan.clone());
        self.store.append(MemoryKind::Plan, format!("Plan: {}", plan.plan));
        if !plan.rationale.trim().is_empty() {
            self.store.append(MemoryKind::Thought, plan.rationale.clone());
        }
        debug!(plan = %plan.plan, next_step = %plan.next_step, "planned");
        plan
    }

    // ── Act ────────────────────────────────────────────────────

    /// Choose the concrete actions for this tick. Empty on any failure.
    pub async fn act(&mut self, observation: &Observation) -> Vec<Action> {
        self.context.state = CognitiveState::Acting;

        let query = format!("{} {}", self.context.next_step, self.context.persona.intent);
        let request = RetrievalRequest::new(query.trim(), self.settings.act_memories)
            .weight(MemoryKind::Observation, 0.0)
            .weight(MemoryKind::Action, 10.0)
            .weight(MemoryKind::Thought, 10.0);
        let memories = self.retrieval.retrieve(&request).await;

        let payload = json!({
            "persona": self.persona_json(),
            "plan": self.context.current_plan,
            "next_step": self.context.next_step,
            "page": {
                "url": observation.url,
                "page_content": excerpt(&observation.page_content, self.settings.page_excerpt_chars),
                "clickables": observation.clickables,
                "inputs": observation.inputs,
                "selects": observation.selects,
            },
            "memories": memories.rendered(),
        });

        let chosen = match self.ask(ACT_PROMPT, &payload, ModelSize::Large).await {
            Ok(reply) => parse_actions(&reply, self.settings.max_actions),
            Err(e) => {
                warn!(error = %e, tick = self.tick(), "action selection failed");
                return Vec::new();
            }
        };

        let mut actions = Vec::with_capacity(chosen.len());
        for (action, memo) in chosen {
            self.store.append(MemoryKind::Action, format!("Action: {memo}"));
            actions.push(action);
        }
        if let Some(first) = actions.first() {
            self.context.last_action = Some(first.clone());
        }
        debug!(count = actions.len(), "acted");
        actions
    }

    // ── Reflection ─────────────────────────────────────────────

    /// Reflect inline on the latest memories.
    pub async fn reflect(&self) -> Vec<String> {
        let insights = self.reflector.reflect().await;
        if let Some(bus) = &self.events {
            bus.publish(Event::ReflectionCompleted {
                insights: insights.len(),
            });
        }
        insights
    }

    /// Start the background reflection task. Does nothing if it is running.
    pub fn start_background(&mut self) {
        if self.background.is_some() {
            return;
        }
        self.background = Some(BackgroundReflection::spawn(
            self.reflector.clone(),
            self.store.clone(),
            self.settings.reflection_interval,
            self.settings.reflection_backoff,
            self.events.clone(),
        ));
    }

    pub fn background_running(&self) -> bool {
        self.background.as_ref().is_some_and(|bg| !bg.is_finished())
    }

    // ── Tick lifecycle ─────────────────────────────────────────

    /// Close the current tick: new memories get the next timestamp.
    pub fn finish_tick(&mut self) -> Tick {
        let tick = self.store.advance_tick();
        self.context.state = CognitiveState::Idle;
        if let Some(bus) = &self.events {
            bus.publish(Event::TickCompleted {
                tick,
                memory_count: self.store.len(),
            });
        }
        tick
    }

    /// Stop the background task, if any, and wait for it to exit.
    pub async fn shutdown(&mut self) {
        if let Some(background) = self.background.take() {
            background.shutdown().await;
            info!(memories = self.store.len(), "cognitive controller shut down");
        }
    }
}
