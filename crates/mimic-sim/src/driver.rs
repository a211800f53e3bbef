use chrono::{DateTime, Utc};
use mimic_core::{Action, AgentSnapshot, Environment, Event, EventBus, Observation, Persona, Result, RunId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::policy::DecisionPolicy;

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// The policy chose to stop.
    CompletedByStop,
    /// The step budget ran out first.
    MaxStepsReached,
    /// A step failed and the run was abandoned.
    Error,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CompletedByStop => "completed_by_stop",
            Self::MaxStepsReached => "max_steps_reached",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    /// 1-based step index.
    pub step: usize,
    /// The observation the decision was made on.
    pub observation: Observation,
    /// `None` when the step failed before a decision was made.
    pub action: Option<Action>,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StepRecord {
    fn decided(step: usize, observation: Observation, action: Action) -> Self {
        Self {
            step,
            stop_reason: action.stop_reason().map(str::to_string),
            observation,
            action: Some(action),
            timestamp: Utc::now(),
            error: None,
        }
    }

    fn failed(step: usize, observation: Observation, error: impl Into<String>) -> Self {
        Self {
            step,
            observation,
            action: None,
            timestamp: Utc::now(),
            stop_reason: None,
            error: Some(error.into()),
        }
    }
}

/// Everything a finished run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationReport {
    pub run_id: RunId,
    pub persona: Persona,
    pub policy: String,
    pub status: RunStatus,
    /// Decisions made, the stopping decision included.
    pub total_steps: usize,
    pub max_steps: usize,
    pub steps: Vec<StepRecord>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub final_snapshot: AgentSnapshot,
}

impl SimulationReport {
    pub fn duration(&self) -> Duration {
        (self.finished_at - self.started_at).to_std().unwrap_or_default()
    }

    /// Write `simulation_results.json` and `step_trace.json` into `dir`.
    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let results = dir.join("simulation_results.json");
        std::fs::write(&results, serde_json::to_string_pretty(self)?)?;
        std::fs::write(
            dir.join("step_trace.json"),
            serde_json::to_string_pretty(&self.steps)?,
        )?;
        info!(path = %results.display(), "simulation results saved");
        Ok(results)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DriverSettings {
    pub max_steps: usize,
    /// Pause between consecutive steps.
    pub step_delay: Duration,
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self {
            max_steps: 50,
            step_delay: Duration::from_millis(500),
        }
    }
}

/// Owns the step loop: asks the policy for an action, applies it to the
/// environment, and keeps the audit trail.
pub struct SimulationDriver {
    run_id: RunId,
    persona: Persona,
    env: Box<dyn Environment>,
    policy: Box<dyn DecisionPolicy>,
    settings: DriverSettings,
    events: EventBus,
}

impl SimulationDriver {
    pub fn new(
        persona: Persona,
        env: Box<dyn Environment>,
        policy: Box<dyn DecisionPolicy>,
        settings: DriverSettings,
    ) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            persona,
            env,
            policy,
            settings,
            events: EventBus::default(),
        }
    }

    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Run to completion. Always produces a report; failures end the run
    /// with [`RunStatus::Error`] after being recorded in the trail.
    pub async fn run(&mut self) -> SimulationReport {
        let started_at = Utc::now();
        info!(
            run_id = %self.run_id,
            persona = %self.persona.name,
            policy = self.policy.name(),
            env = self.env.name(),
            max_steps = self.settings.max_steps,
            "simulation started"
        );
        self.events.publish(Event::RunStarted {
            run_id: self.run_id,
            persona: self.persona.name.clone(),
            policy: self.policy.name().to_string(),
        });

        let mut steps = Vec::new();
        let (status, total_steps) = self.step_loop(&mut steps).await;

        self.policy.shutdown().await;
        if let Err(e) = self.env.close().await {
            warn!(error = %e, "failed to close environment");
        }

        let report = SimulationReport {
            run_id: self.run_id,
            persona: self.persona.clone(),
            policy: self.policy.name().to_string(),
            status,
            total_steps,
            max_steps: self.settings.max_steps,
            steps,
            started_at,
            finished_at: Utc::now(),
            final_snapshot: self.policy.snapshot(),
        };
        self.events.publish(Event::RunFinished {
            run_id: self.run_id,
            status: status.to_string(),
            total_steps,
        });
        info!(
            run_id = %self.run_id,
            %status,
            total_steps,
            duration_ms = report.duration().as_millis() as u64,
            "simulation finished"
        );
        report
    }

    fn push(&self, steps: &mut Vec<StepRecord>, record: StepRecord) {
        self.events.publish(Event::StepRecorded {
            run_id: self.run_id,
            step: record.step,
            action: record.action.as_ref().map(Action::kind),
            error: record.error.clone(),
        });
        steps.push(record);
    }

    async fn step_loop(&mut self, steps: &mut Vec<StepRecord>) -> (RunStatus, usize) {
        let mut observation = match self.env.reset().await {
            Ok(observation) => observation,
            Err(e) => {
                error!(error = %e, "environment reset failed");
                self.push(steps, StepRecord::failed(1, Observation::default(), e.to_string()));
                return (RunStatus::Error, 0);
            }
        };
        info!(url = %observation.url, "environment ready");

        let mut total_steps = 0;
        while total_steps < self.settings.max_steps {
            let step = total_steps + 1;
            info!(step, "step");

            let agent = self.policy.snapshot();
            let action = match self.policy.decide(&observation, &agent).await {
                Ok(action) => action,
                Err(e) => {
                    error!(step, error = %e, "policy failed");
                    self.push(steps, StepRecord::failed(step, observation, e.to_string()));
                    return (RunStatus::Error, total_steps);
                }
            };
            total_steps = step;

            let mut record = StepRecord::decided(step, observation.clone(), action.clone());
            if let Some(reason) = action.stop_reason() {
                info!(step, reason, "policy chose to stop");
                self.push(steps, record);
                return (RunStatus::CompletedByStop, total_steps);
            }

            match self.env.step(&action).await {
                Ok(next) => {
                    if let Some(message) = &next.error_message {
                        warn!(step, error = %message, "environment reported an error");
                        record.error = Some(message.clone());
                    }
                    self.push(steps, record);
                    observation = next;
                }
                Err(e) => {
                    error!(step, error = %e, "environment step failed");
                    record.error = Some(e.to_string());
                    self.push(steps, record);
                    return (RunStatus::Error, total_steps);
                }
            }

            if total_steps < self.settings.max_steps && !self.settings.step_delay.is_zero() {
                tokio::time::sleep(self.settings.step_delay).await;
            }
        }

        (RunStatus::MaxStepsReached, total_steps)
    }
}
