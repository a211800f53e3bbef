use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use mimic_cognition::{CognitiveController, ControllerSettings};
use mimic_config::schema::{AgentConfig, LlmConfig, RetryConfig};
use mimic_config::{ConfigLoader, MimicConfig, load_persona};
use mimic_core::{Event, EventBus, MimicError, Persona, Result};
use mimic_llm::{MockReasoner, MockResponse, OpenAiReasoner, Reasoner, RetryPolicy, RetryingReasoner};
use mimic_sim::{
    CognitiveLoopPolicy, ComponentPolicy, ComponentSettings, DecisionPolicy, DriverSettings, FullAgentPolicy,
    IntentQueryGenerator, KeywordRelevanceClassifier, MockEnvironment, PolicyKind, SimulationDriver,
    SimulationReport, TraceRecorder, VariationQueryGenerator,
};

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct RunOverrides {
    pub policy: Option<String>,
    pub max_steps: Option<usize>,
    pub output: Option<PathBuf>,
    pub no_traces: bool,
    pub mock: bool,
}

impl RunOverrides {
    pub fn apply(&self, config: &mut MimicConfig) {
        if let Some(policy) = &self.policy {
            config.simulation.policy = policy.clone();
        }
        if let Some(steps) = self.max_steps {
            config.simulation.max_steps = steps;
        }
        if let Some(output) = &self.output {
            config.simulation.output_dir = output.clone();
        }
        if self.no_traces {
            config.simulation.save_traces = false;
        }
        if self.mock {
            config.llm.provider = "mock".into();
        }
    }
}

/// A finished run and where its files went.
#[derive(Debug)]
pub struct RunOutcome {
    pub report: SimulationReport,
    /// `None` when traces were disabled.
    pub output: Option<PathBuf>,
}

pub(super) async fn cmd_run(mut config: MimicConfig, persona_path: &Path, overrides: RunOverrides) -> Result<()> {
    overrides.apply(&mut config);
    ConfigLoader::check(&config)?;
    let persona = load_persona(persona_path)?;

    println!("🛒 Mimic v{}", env!("CARGO_PKG_VERSION"));
    println!("   Persona: {}", persona.name);
    println!("   Intent: {}", persona.intent);
    println!("   Policy: {}", config.simulation.policy);
    println!("   Provider: {}", config.llm.provider);
    println!();

    let outcome = execute(&config, persona).await?;
    let report = &outcome.report;

    println!();
    println!("✅ Run {} finished", report.run_id);
    println!("   Status: {}", report.status);
    println!("   Steps: {}/{}", report.total_steps, report.max_steps);
    println!("   Duration: {:.1}s", report.duration().as_secs_f64());
    if let Some(reason) = report.steps.last().and_then(|s| s.stop_reason.as_deref()) {
        println!("   Stop reason: {reason}");
    }
    match &outcome.output {
        Some(dir) => println!("   Output: {}", dir.display()),
        None => println!("   Output: disabled"),
    }
    Ok(())
}

/// Build everything the config asks for, run the simulation, and save the
/// results when traces are enabled.
pub async fn execute(config: &MimicConfig, persona: Persona) -> Result<RunOutcome> {
    let kind = PolicyKind::parse(&config.simulation.policy)
        .ok_or_else(|| MimicError::Config(format!("unknown policy '{}'", config.simulation.policy)))?;
    let output = config
        .simulation
        .save_traces
        .then(|| config.simulation.output_dir.join(run_dir_name(&persona)));

    let events = EventBus::default();
    let logger = spawn_event_logger(&events);

    let policy = build_policy(kind, config, &persona, &events, output.as_deref())?;
    let env = environment(config);
    let settings = DriverSettings {
        max_steps: config.simulation.max_steps,
        step_delay: Duration::from_millis(config.simulation.step_delay_ms),
    };

    let mut driver = SimulationDriver::new(persona, Box::new(env), policy, settings).with_events(events);
    let report = driver.run().await;
    drop(driver);
    logger.abort();

    if let Some(dir) = &output {
        report.save(dir)?;
    }
    Ok(RunOutcome { report, output })
}

fn build_policy(
    kind: PolicyKind,
    config: &MimicConfig,
    persona: &Persona,
    events: &EventBus,
    output: Option<&Path>,
) -> Result<Box<dyn DecisionPolicy>> {
    match kind {
        PolicyKind::Component => Ok(Box::new(component_policy(config, persona))),
        PolicyKind::CognitiveLoop => Ok(Box::new(CognitiveLoopPolicy::new(
            controller(config, persona, events)?,
            config.agent.reflection_frequency,
        ))),
        PolicyKind::FullAgent => {
            let mut policy = FullAgentPolicy::new(controller(config, persona, events)?);
            if let Some(dir) = output {
                policy = policy.with_recorder(TraceRecorder::create(dir, persona)?);
            }
            Ok(Box::new(policy))
        }
    }
}

fn component_policy(config: &MimicConfig, persona: &Persona) -> ComponentPolicy {
    let c = &config.component;
    let policy = ComponentPolicy::new(persona.clone())
        .with_settings(ComponentSettings {
            max_steps: c.max_steps,
            use_relevance_check: c.use_relevance_check,
        })
        .with_relevance(Some(Box::new(KeywordRelevanceClassifier::new(c.relevance_threshold))));
    if c.query_variations {
        policy.with_query_generator(Box::new(VariationQueryGenerator::new(Box::new(IntentQueryGenerator))))
    } else {
        policy
    }
}

fn controller(config: &MimicConfig, persona: &Persona, events: &EventBus) -> Result<CognitiveController> {
    let reasoner = build_reasoner(&config.llm, &config.retry)?;
    Ok(
        CognitiveController::new(persona.clone(), reasoner, controller_settings(&config.agent))
            .with_events(events.clone()),
    )
}

fn environment(config: &MimicConfig) -> MockEnvironment {
    let env = &config.environment;
    if env.pages.is_empty() {
        MockEnvironment::demo(env.max_steps)
    } else {
        MockEnvironment::new(env.pages.clone(), env.max_steps)
    }
}

/// Create the configured reasoner. Remote providers are wrapped in the
/// configured retry policy.
fn build_reasoner(llm: &LlmConfig, retry: &RetryConfig) -> Result<Arc<dyn Reasoner>> {
    match llm.provider.as_str() {
        "mock" => Ok(Arc::new(demo_reasoner())),
        "openai" => {
            let api_key = llm
                .api_key
                .clone()
                .filter(|k| !k.trim().is_empty())
                .ok_or_else(|| MimicError::Config("llm.api_key is not set (or export OPENAI_API_KEY)".into()))?;
            let client = OpenAiReasoner::new(api_key)
                .with_base_url(&llm.base_url)
                .with_models(&llm.small_model, &llm.large_model, &llm.embedding_model)
                .with_temperature(llm.temperature);
            info!(base_url = %llm.base_url, model = %llm.large_model, "using openai reasoner");
            Ok(Arc::new(RetryingReasoner::new(Arc::new(client), retry_policy(retry))))
        }
        other => Err(MimicError::Config(format!("unknown provider '{other}'"))),
    }
}

fn retry_policy(retry: &RetryConfig) -> RetryPolicy {
    RetryPolicy::new(
        retry.max_attempts,
        Duration::from_millis(retry.initial_delay_ms),
        Duration::from_millis(retry.max_delay_ms),
        retry.multiplier,
    )
}

fn controller_settings(agent: &AgentConfig) -> ControllerSettings {
    ControllerSettings {
        plan_attempts: agent.plan_attempts.max(1),
        plan_memories: agent.plan_memories,
        act_memories: agent.act_memories,
        max_actions: agent.max_actions,
        page_excerpt_chars: agent.page_excerpt_chars,
        feedback_excerpt_chars: agent.feedback_excerpt_chars,
        reflection_window: agent.reflection_window,
        reflection_interval: Duration::from_millis(agent.reflection_interval_ms),
        reflection_backoff: Duration::from_millis(agent.reflection_backoff_ms),
    }
}

/// Offline reasoner with one canned reply per cognitive module.
fn demo_reasoner() -> MockReasoner {
    MockReasoner::new()
        .when_prompt_contains("importance scoring module", MockResponse::json(serde_json::json!({"score": 5})))
        .when_prompt_contains(
            "perception module",
            MockResponse::json(serde_json::json!({"observations": ["The page lists products and links"]})),
        )
        .when_prompt_contains(
            "feedback module",
            MockResponse::json(serde_json::json!({"thoughts": ["The last action moved me forward"]})),
        )
        .when_prompt_contains(
            "reflection module",
            MockResponse::json(serde_json::json!({"insights": ["Comparing a few options before buying pays off"]})),
        )
        .when_prompt_contains(
            "planning module",
            MockResponse::json(serde_json::json!({
                "plan": "Look through the results and open the best match",
                "rationale": "The first results usually match the search",
                "next_step": "Open the most relevant result"
            })),
        )
        .when_prompt_contains(
            "action module",
            MockResponse::json(serde_json::json!({"actions": [{
                "type": "click",
                "element_id": "result-1",
                "description": "Open the most relevant result"
            }]})),
        )
}

/// `{timestamp}_{persona}` with the name reduced to `[a-z0-9_]`.
fn run_dir_name(persona: &Persona) -> String {
    let slug: String = persona
        .name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    let slug = if slug.is_empty() { "persona".to_string() } else { slug };
    format!("{}_{}", Utc::now().format("%Y%m%d_%H%M%S"), slug)
}

fn spawn_event_logger(events: &EventBus) -> tokio::task::JoinHandle<()> {
    let mut rx = events.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(Event::StepRecorded {
                    step, action, error, ..
                }) => match error {
                    Some(error) => warn!(step, ?action, %error, "step recorded with error"),
                    None => debug!(step, ?action, "step recorded"),
                },
                Ok(Event::ReflectionCompleted { insights }) => debug!(insights, "reflection completed"),
                Ok(Event::TickCompleted { tick, memory_count }) => debug!(tick, memory_count, "tick completed"),
                Ok(_) => {}
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    warn!(skipped = n, "event logger lagged");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mimic_sim::RunStatus;

    fn persona() -> Persona {
        Persona::new("Ana Lima", "Budget-minded student", "refurbished laptop")
    }

    fn mock_config(policy: &str, output: &Path) -> MimicConfig {
        let mut config = MimicConfig::default();
        config.llm.provider = "mock".into();
        config.simulation.policy = policy.into();
        config.simulation.max_steps = 4;
        config.simulation.step_delay_ms = 0;
        config.simulation.output_dir = output.to_path_buf();
        config.agent.reflection_interval_ms = 10;
        config.agent.reflection_backoff_ms = 10;
        config
    }

    #[test]
    fn test_overrides_take_precedence() {
        let mut config = MimicConfig::default();
        RunOverrides {
            policy: Some("component".into()),
            max_steps: Some(3),
            output: Some(PathBuf::from("/tmp/out")),
            no_traces: true,
            mock: true,
        }
        .apply(&mut config);

        assert_eq!(config.simulation.policy, "component");
        assert_eq!(config.simulation.max_steps, 3);
        assert_eq!(config.simulation.output_dir, PathBuf::from("/tmp/out"));
        assert!(!config.simulation.save_traces);
        assert_eq!(config.llm.provider, "mock");
    }

    #[test]
    fn test_empty_overrides_change_nothing() {
        let mut config = MimicConfig::default();
        RunOverrides::default().apply(&mut config);
        assert_eq!(config.simulation.policy, "full_agent");
        assert!(config.simulation.save_traces);
        assert_eq!(config.llm.provider, "openai");
    }

    #[test]
    fn test_openai_without_key_is_config_error() {
        let mut llm = LlmConfig::default();
        llm.api_key = None;
        let err = build_reasoner(&llm, &RetryConfig::default()).err().unwrap();
        assert!(matches!(err, MimicError::Config(_)));
    }

    #[test]
    fn test_controller_settings_follow_agent_config() {
        let agent = AgentConfig {
            plan_attempts: 0,
            reflection_interval_ms: 250,
            ..Default::default()
        };
        let settings = controller_settings(&agent);
        assert_eq!(settings.plan_attempts, 1);
        assert_eq!(settings.reflection_interval, Duration::from_millis(250));
        assert_eq!(settings.max_actions, agent.max_actions);
    }

    #[test]
    fn test_retry_policy_from_config() {
        let policy = retry_policy(&RetryConfig::default());
        assert_eq!(policy.max_attempts, 10);
        assert_eq!(policy.delay_for(0), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(5), Duration::from_millis(5000));
    }

    #[test]
    fn test_run_dir_name_is_slugged() {
        let name = run_dir_name(&persona());
        assert!(name.ends_with("_ana_lima"));
        assert!(!name.contains(' '));
    }

    #[tokio::test]
    async fn test_component_run_stops_on_relevant_page() {
        let dir = tempfile::tempdir().unwrap();
        let config = mock_config("component", dir.path());
        let outcome = execute(&config, persona()).await.unwrap();

        assert_eq!(outcome.report.policy, "component");
        assert_eq!(outcome.report.status, RunStatus::CompletedByStop);
        let output = outcome.output.unwrap();
        assert!(output.join("simulation_results.json").exists());
        assert!(output.join("step_trace.json").exists());
    }

    #[tokio::test]
    async fn test_cognitive_loop_run_uses_budget() {
        let dir = tempfile::tempdir().unwrap();
        let config = mock_config("cognitive_loop", dir.path());
        let outcome = execute(&config, persona()).await.unwrap();

        assert_eq!(outcome.report.status, RunStatus::MaxStepsReached);
        assert_eq!(outcome.report.total_steps, 4);
        assert_eq!(outcome.report.steps.len(), 4);
        assert_eq!(outcome.report.final_snapshot.tick, 4);
    }

    #[tokio::test]
    async fn test_full_agent_run_writes_traces() {
        let dir = tempfile::tempdir().unwrap();
        let config = mock_config("full_agent", dir.path());
        let outcome = execute(&config, persona()).await.unwrap();

        assert_eq!(outcome.report.status, RunStatus::MaxStepsReached);
        let output = outcome.output.unwrap();
        assert!(output.join("persona.txt").exists());
        assert!(output.join("agent_0.json").exists());
        assert!(output.join("action_trace.txt").exists());
        assert!(output.join("simulation_results.json").exists());
    }

    #[tokio::test]
    async fn test_no_traces_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = mock_config("component", dir.path());
        config.simulation.save_traces = false;
        let outcome = execute(&config, persona()).await.unwrap();

        assert!(outcome.output.is_none());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_policy_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = mock_config("telepathy", dir.path());
        assert!(execute(&config, persona()).await.is_err());
    }
}
