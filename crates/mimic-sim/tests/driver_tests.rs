#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use mimic_core::{
        Action, AgentSnapshot, Clickable, Environment, Event, EventBus, MimicError, Observation, Persona, Result,
    };
    use mimic_sim::env::{END_CONTENT, END_URL, STEP_CAP_MESSAGE};
    use mimic_sim::*;
    use std::collections::VecDeque;
    use std::time::Duration;

    fn persona() -> Persona {
        Persona::new("Ana", "Budget-minded student", "buy a used laptop")
    }

    fn pages(n: usize) -> Vec<Observation> {
        (0..n)
            .map(|i| {
                Observation::page(format!("http://shop.test/{i}"), format!("page {i}"))
                    .with_clickables(vec![Clickable::new("next", "Next")])
            })
            .collect()
    }

    fn settings(max_steps: usize) -> DriverSettings {
        DriverSettings {
            max_steps,
            step_delay: Duration::ZERO,
        }
    }

    /// Replays a fixed list of decisions, then keeps clicking.
    struct Scripted {
        actions: VecDeque<Result<Action>>,
        decisions: usize,
        shut_down: bool,
    }

    impl Scripted {
        fn new(actions: Vec<Result<Action>>) -> Self {
            Self {
                actions: actions.into(),
                decisions: 0,
                shut_down: false,
            }
        }
    }

    #[async_trait]
    impl DecisionPolicy for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        fn snapshot(&self) -> AgentSnapshot {
            AgentSnapshot {
                tick: self.decisions as u64,
                ..AgentSnapshot::for_persona(persona())
            }
        }

        async fn decide(&mut self, _: &Observation, _: &AgentSnapshot) -> Result<Action> {
            self.decisions += 1;
            self.actions.pop_front().unwrap_or_else(|| {
                Ok(Action::Click {
                    element_id: "next".into(),
                })
            })
        }

        async fn shutdown(&mut self) {
            self.shut_down = true;
        }
    }

    /// An environment whose steps fail.
    struct Broken;

    #[async_trait]
    impl Environment for Broken {
        fn name(&self) -> &str {
            "broken"
        }
        async fn reset(&mut self) -> Result<Observation> {
            Ok(Observation::page("http://broken.test/", "home"))
        }
        async fn step(&mut self, _: &Action) -> Result<Observation> {
            Err(MimicError::Environment("connection reset".into()))
        }
        async fn observe(&mut self) -> Result<Observation> {
            Ok(Observation::default())
        }
    }

    fn driver(policy: Scripted, env: impl Environment + 'static, max_steps: usize) -> SimulationDriver {
        SimulationDriver::new(persona(), Box::new(env), Box::new(policy), settings(max_steps))
    }

    // ── Termination ────────────────────────────────────────────

    mod termination {
        use super::*;

        #[tokio::test]
        async fn test_immediate_stop_ends_after_one_entry() {
            let policy = Scripted::new(vec![Ok(Action::stop("done"))]);
            let report = driver(policy, MockEnvironment::new(pages(3), 10), 5).run().await;

            assert_eq!(report.status, RunStatus::CompletedByStop);
            assert_eq!(report.steps.len(), 1);
            assert_eq!(report.total_steps, 1);
            assert_eq!(report.steps[0].step, 1);
            assert_eq!(report.steps[0].stop_reason.as_deref(), Some("done"));
            assert_eq!(report.steps[0].observation.url, "http://shop.test/0");
        }

        #[tokio::test]
        async fn test_budget_exhaustion() {
            let report = driver(Scripted::new(vec![]), MockEnvironment::new(pages(10), 10), 4).run().await;

            assert_eq!(report.status, RunStatus::MaxStepsReached);
            assert_eq!(report.total_steps, 4);
            let indices: Vec<_> = report.steps.iter().map(|s| s.step).collect();
            assert_eq!(indices, vec![1, 2, 3, 4]);
            assert!(report.steps.iter().all(|s| s.error.is_none()));
            assert_eq!(report.final_snapshot.tick, 4);
        }

        #[tokio::test]
        async fn test_stop_after_some_steps() {
            let policy = Scripted::new(vec![
                Ok(Action::Search { query: "laptop".into() }),
                Ok(Action::stop("found it")),
            ]);
            let report = driver(policy, MockEnvironment::new(pages(3), 10), 5).run().await;

            assert_eq!(report.status, RunStatus::CompletedByStop);
            assert_eq!(report.total_steps, 2);
            assert_eq!(report.steps[1].observation.url, "http://shop.test/1");
        }

        #[tokio::test]
        async fn test_zero_budget_makes_no_decision() {
            let report = driver(Scripted::new(vec![]), MockEnvironment::new(pages(1), 10), 0).run().await;
            assert_eq!(report.status, RunStatus::MaxStepsReached);
            assert_eq!(report.total_steps, 0);
            assert!(report.steps.is_empty());
        }
    }

    // ── Failures ───────────────────────────────────────────────

    mod failures {
        use super::*;

        #[tokio::test]
        async fn test_environment_failure_ends_run_with_error() {
            let report = driver(Scripted::new(vec![]), Broken, 5).run().await;

            assert_eq!(report.status, RunStatus::Error);
            assert_eq!(report.steps.len(), 1);
            assert!(report.steps[0].action.is_some());
            assert!(report.steps[0].error.as_deref().unwrap().contains("connection reset"));
        }

        #[tokio::test]
        async fn test_policy_failure_is_recorded() {
            let policy = Scripted::new(vec![
                Ok(Action::Back),
                Err(MimicError::Policy("lost the plot".into())),
            ]);
            let report = driver(policy, MockEnvironment::new(pages(3), 10), 5).run().await;

            assert_eq!(report.status, RunStatus::Error);
            assert_eq!(report.total_steps, 1);
            assert_eq!(report.steps.len(), 2);
            assert!(report.steps[1].action.is_none());
            assert_eq!(report.steps[1].step, 2);
        }

        #[tokio::test]
        async fn test_observation_errors_do_not_end_the_run() {
            let report = driver(Scripted::new(vec![]), MockEnvironment::new(pages(10), 2), 4).run().await;

            assert_eq!(report.status, RunStatus::MaxStepsReached);
            let errors: Vec<_> = report.steps.iter().map(|s| s.error.as_deref()).collect();
            assert_eq!(errors, vec![None, None, Some(STEP_CAP_MESSAGE), Some(STEP_CAP_MESSAGE)]);
        }
    }

    // ── Events and persistence ─────────────────────────────────

    mod reporting {
        use super::*;

        #[tokio::test]
        async fn test_lifecycle_events() {
            let bus = EventBus::default();
            let mut rx = bus.subscribe();
            let policy = Scripted::new(vec![Ok(Action::Back), Ok(Action::stop("done"))]);
            let mut driver = driver(policy, MockEnvironment::new(pages(2), 10), 5).with_events(bus);
            let run_id = driver.run_id();
            driver.run().await;

            let mut events = Vec::new();
            while let Ok(event) = rx.try_recv() {
                events.push(event);
            }
            assert_eq!(events.len(), 4);
            assert!(matches!(&events[0], Event::RunStarted { policy, .. } if policy == "scripted"));
            assert!(matches!(&events[1], Event::StepRecorded { step: 1, .. }));
            assert!(matches!(&events[2], Event::StepRecorded { step: 2, .. }));
            match &events[3] {
                Event::RunFinished { run_id: id, status, total_steps } => {
                    assert_eq!(*id, run_id);
                    assert_eq!(status, "completed_by_stop");
                    assert_eq!(*total_steps, 2);
                }
                other => panic!("unexpected event {other:?}"),
            }
        }

        #[tokio::test]
        async fn test_report_save_writes_both_files() {
            let dir = tempfile::tempdir().unwrap();
            let policy = Scripted::new(vec![Ok(Action::stop("done"))]);
            let report = driver(policy, MockEnvironment::new(pages(1), 10), 5).run().await;
            let path = report.save(dir.path()).unwrap();

            let saved: SimulationReport =
                serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
            assert_eq!(saved.status, RunStatus::CompletedByStop);
            assert_eq!(saved.run_id, report.run_id);
            let trace: Vec<StepRecord> =
                serde_json::from_str(&std::fs::read_to_string(dir.path().join("step_trace.json")).unwrap()).unwrap();
            assert_eq!(trace.len(), 1);
        }
    }

    // ── Mock environment ───────────────────────────────────────

    mod mock_env {
        use super::*;

        #[tokio::test]
        async fn test_navigation_actions_advance() {
            let mut env = MockEnvironment::new(pages(2), 10);
            assert_eq!(env.reset().await.unwrap().url, "http://shop.test/0");
            assert_eq!(env.step(&Action::Wait { seconds: 1.0 }).await.unwrap().url, "http://shop.test/0");
            assert_eq!(env.step(&Action::Click { element_id: "next".into() }).await.unwrap().url, "http://shop.test/1");

            let end = env.step(&Action::Search { query: "q".into() }).await.unwrap();
            assert_eq!(end.url, END_URL);
            assert_eq!(end.page_content, END_CONTENT);
            assert!(end.clickables.is_empty());

            env.reset().await.unwrap();
            assert_eq!(env.step_count(), 0);
            assert_eq!(env.page_index(), 0);
        }

        #[tokio::test]
        async fn test_demo_pages_are_navigable() {
            let mut env = MockEnvironment::demo(10);
            let home = env.reset().await.unwrap();
            assert!(!home.clickables.is_empty());
            assert!(!home.inputs.is_empty());
        }
    }
}
