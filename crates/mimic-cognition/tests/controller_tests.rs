#[cfg(test)]
mod tests {
    use mimic_cognition::planner::{FALLBACK_NEXT_STEP, FALLBACK_PLAN, FALLBACK_RATIONALE};
    use mimic_cognition::*;
    use mimic_core::{Action, Clickable, CognitiveState, Observation, Persona};
    use mimic_llm::mock::{MockReasoner, MockResponse};
    use mimic_memory::MemoryKind;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn persona() -> Persona {
        Persona::new("Ana", "Budget-minded student", "buy a used laptop")
    }

    /// A mock that answers importance scoring, so queued replies are only
    /// consumed by the step under test.
    fn base_mock() -> MockReasoner {
        MockReasoner::new().when_prompt_contains("importance scoring module", MockResponse::json(json!({"score": 5})))
    }

    fn controller(mock: MockReasoner) -> (Arc<MockReasoner>, CognitiveController) {
        let mock = Arc::new(mock);
        let ctl = CognitiveController::new(persona(), mock.clone(), ControllerSettings::default());
        (mock, ctl)
    }

    fn laptop_page() -> Observation {
        Observation::page("http://shop.test/search?q=laptop", "Results for laptop")
            .with_clickables(vec![Clickable::new("r1", "ThinkPad T480 refurbished")])
    }

    fn kinds(ctl: &CognitiveController) -> Vec<MemoryKind> {
        ctl.store().entries().iter().map(|e| e.kind).collect()
    }

    // ── Perceive ───────────────────────────────────────────────

    mod perceive {
        use super::*;

        #[tokio::test]
        async fn test_perceive_appends_observation_memories() {
            let mock = base_mock().when_prompt_contains(
                "perception module",
                MockResponse::json(json!({"observations": ["I see a search results page", "I see a ThinkPad listing"]})),
            );
            let (mock, mut ctl) = controller(mock);
            let perceptions = ctl.perceive(&laptop_page()).await;

            assert_eq!(perceptions.len(), 2);
            assert_eq!(kinds(&ctl), vec![MemoryKind::Observation, MemoryKind::Observation]);
            assert_eq!(ctl.context().state, CognitiveState::Perceiving);
            let call = &mock.recorded_requests()[0];
            assert!(call.json_mode);
            assert!(call.mentions("ThinkPad T480 refurbished"));
        }

        #[tokio::test]
        async fn test_perceive_failure_is_empty() {
            let mock = base_mock().when_prompt_contains("perception module", MockResponse::error("boom"));
            let (_, mut ctl) = controller(mock);
            assert!(ctl.perceive(&laptop_page()).await.is_empty());
            assert!(ctl.store().is_empty());
        }
    }

    // ── Feedback ───────────────────────────────────────────────

    mod feedback {
        use super::*;

        #[tokio::test]
        async fn test_feedback_skipped_without_prior_action() {
            let (mock, mut ctl) = controller(base_mock());
            assert!(ctl.feedback(&laptop_page()).await.is_empty());
            assert_eq!(mock.chat_call_count(), 0);
        }

        #[tokio::test]
        async fn test_feedback_after_action_appends_thoughts() {
            let mock = base_mock()
                .when_prompt_contains(
                    "action module",
                    MockResponse::json(json!({"actions": [{"type": "click", "element_id": "r1"}]})),
                )
                .when_prompt_contains("planning module", MockResponse::json(json!({
                    "plan": "p", "rationale": "", "next_step": "n"
                })))
                .when_prompt_contains(
                    "feedback module",
                    MockResponse::json(json!({"thoughts": ["The click opened the listing"]})),
                );
            let (mock, mut ctl) = controller(mock);
            ctl.act(&laptop_page()).await;
            ctl.finish_tick();

            let thoughts = ctl.feedback(&laptop_page()).await;
            assert_eq!(thoughts, vec!["The click opened the listing".to_string()]);
            assert_eq!(kinds(&ctl).last(), Some(&MemoryKind::Thought));
            let call = mock
                .recorded_requests()
                .into_iter()
                .find(|c| c.mentions("feedback module"))
                .unwrap();
            assert!(call.mentions("\"type\":\"click\""));
        }
    }

    // ── Plan ───────────────────────────────────────────────────

    mod plan {
        use super::*;

        #[tokio::test]
        async fn test_plan_updates_context_and_memory() {
            let mock = base_mock().when_prompt_contains("planning module", MockResponse::json(json!({
                "plan": "Compare refurbished ThinkPads",
                "rationale": "They are cheap and sturdy",
                "next_step": "Search for ThinkPad T480"
            })));
            let (_, mut ctl) = controller(mock);
            let plan = ctl.plan().await;

            assert!(!plan.is_fallback());
            assert_eq!(ctl.context().current_plan, "Compare refurbished ThinkPads");
            assert_eq!(ctl.context().next_step, "Search for ThinkPad T480");
            let entries = ctl.store().entries();
            assert_eq!(entries[0].kind, MemoryKind::Plan);
            assert_eq!(entries[0].content, "Plan: Compare refurbished ThinkPads");
            assert_eq!(entries[1].kind, MemoryKind::Thought);
            assert_eq!(entries[1].content, "They are cheap and sturdy");
        }

        #[tokio::test]
        async fn test_plan_falls_back_after_three_failures() {
            let mock = base_mock().when_prompt_contains("planning module", MockResponse::error("HTTP 500"));
            let (mock, mut ctl) = controller(mock);
            let plan = ctl.plan().await;

            assert_eq!(mock.calls_mentioning("planning module"), 3);
            assert_eq!(plan.plan, FALLBACK_PLAN);
            assert_eq!(plan.rationale, FALLBACK_RATIONALE);
            assert_eq!(plan.next_step, FALLBACK_NEXT_STEP);
            assert_eq!(ctl.context().current_plan, FALLBACK_PLAN);
            assert_eq!(ctl.store().entries()[0].content, format!("Plan: {FALLBACK_PLAN}"));
        }

        #[tokio::test]
        async fn test_incomplete_plan_is_retried() {
            let mock = base_mock().when_prompt_contains(
                "planning module",
                MockResponse::json(json!({"plan": "only a plan"})),
            );
            let (mock, mut ctl) = controller(mock);
            let plan = ctl.plan().await;

            assert_eq!(mock.calls_mentioning("planning module"), 3);
            assert!(plan.is_fallback());
        }

        #[tokio::test]
        async fn test_plan_recovers_on_second_attempt() {
            let (mock, mut ctl) = controller(base_mock());
            mock.queue_response(MockResponse::text("not json at all"));
            mock.queue_response(MockResponse::json(json!({
                "plan": "p", "rationale": "r", "next_step": "n"
            })));
            let plan = ctl.plan().await;

            assert_eq!(plan.plan, "p");
            assert_eq!(mock.calls_mentioning("planning module"), 2);
        }

        #[tokio::test]
        async fn test_plan_ranks_observations_last() {
            let mock = base_mock().when_prompt_contains("planning module", MockResponse::json(json!({
                "plan": "p", "rationale": "", "next_step": "n"
            })));
            let (mock, mut ctl) = controller(mock);
            ctl.store().append(MemoryKind::Thought, "older thought on a used laptop");
            ctl.finish_tick();
            ctl.store().append(MemoryKind::Observation, "newer observation of a used laptop");
            for _ in 0..4 {
                ctl.finish_tick();
            }
            ctl.plan().await;

            let call = mock
                .recorded_requests()
                .into_iter()
                .find(|c| c.mentions("planning module"))
                .unwrap();
            let payload = &call.messages[1].content;
            let thought = payload.find("older thought").unwrap();
            let observation = payload.find("newer observation").unwrap();
            assert!(thought < observation);
        }

        #[tokio::test]
        async fn test_plan_uses_large_model() {
            let mock = base_mock().when_prompt_contains("planning module", MockResponse::json(json!({
                "plan": "p", "rationale": "r", "next_step": "n"
            })));
            let (mock, mut ctl) = controller(mock);
            ctl.plan().await;
            let call = mock
                .recorded_requests()
                .into_iter()
                .find(|c| c.mentions("planning module"))
                .unwrap();
            assert_eq!(call.size, mimic_llm::ModelSize::Large);
        }
    }

    // ── Act ────────────────────────────────────────────────────

    mod act {
        use super::*;

        #[tokio::test]
        async fn test_act_maps_and_records_actions() {
            let mock = base_mock().when_prompt_contains("action module", MockResponse::json(json!({"actions": [
                {"type": "click", "element_id": "r1", "description": "Open the ThinkPad listing"},
                {"type": "teleport"}
            ]})));
            let (_, mut ctl) = controller(mock);
            let actions = ctl.act(&laptop_page()).await;

            assert_eq!(actions[0], Action::Click { element_id: "r1".into() });
            assert!(actions[1].is_stop());
            assert_eq!(ctl.context().last_action, Some(actions[0].clone()));
            let entries = ctl.store().entries();
            assert_eq!(entries.len(), 2);
            assert!(entries.iter().all(|e| e.kind == MemoryKind::Action));
            assert_eq!(entries[0].content, "Action: Open the ThinkPad listing");
        }

        #[tokio::test]
        async fn test_act_failure_is_empty() {
            let mock = base_mock().when_prompt_contains("action module", MockResponse::error("down"));
            let (_, mut ctl) = controller(mock);
            assert!(ctl.act(&laptop_page()).await.is_empty());
            assert!(ctl.context().last_action.is_none());
        }

        #[tokio::test]
        async fn test_act_bounds_action_count() {
            let many: Vec<_> = (0..8).map(|i| json!({"type": "click", "element_id": format!("e{i}")})).collect();
            let mock = base_mock().when_prompt_contains("action module", MockResponse::json(json!({"actions": many})));
            let (_, mut ctl) = controller(mock);
            assert_eq!(ctl.act(&laptop_page()).await.len(), ControllerSettings::default().max_actions);
        }
    }

    // ── Ticks and reflection ───────────────────────────────────

    mod lifecycle {
        use super::*;

        #[tokio::test]
        async fn test_memories_carry_tick_timestamps() {
            let mock = base_mock().when_prompt_contains(
                "perception module",
                MockResponse::json(json!({"observations": ["a page"]})),
            );
            let (_, mut ctl) = controller(mock);
            ctl.perceive(&laptop_page()).await;
            assert_eq!(ctl.finish_tick(), 1);
            ctl.perceive(&laptop_page()).await;

            let stamps: Vec<_> = ctl.store().entries().iter().map(|e| e.timestamp).collect();
            assert_eq!(stamps, vec![0, 1]);
            assert_eq!(ctl.snapshot().tick, 1);
            assert_eq!(ctl.snapshot().memory_count, 2);
            assert_eq!(ctl.context().state, CognitiveState::Perceiving);
        }

        #[tokio::test]
        async fn test_reflect_appends_insights() {
            let mock = base_mock()
                .when_prompt_contains("reflection module", MockResponse::json(json!({"insights": ["Prices vary a lot"]})));
            let (_, ctl) = controller(mock);
            ctl.store().append(MemoryKind::Observation, "a laptop for $300");
            let insights = ctl.reflect().await;

            assert_eq!(insights, vec!["Prices vary a lot".to_string()]);
            assert_eq!(ctl.store().entries()[1].kind, MemoryKind::Reflection);
        }

        #[tokio::test]
        async fn test_reflect_on_empty_store_makes_no_call() {
            let (mock, ctl) = controller(base_mock());
            assert!(ctl.reflect().await.is_empty());
            assert_eq!(mock.chat_call_count(), 0);
        }

        #[tokio::test]
        async fn test_background_reflection_runs_and_shuts_down() {
            let mock = base_mock()
                .when_prompt_contains("reflection module", MockResponse::json(json!({"insights": ["keep comparing"]})));
            let mock = Arc::new(mock);
            let settings = ControllerSettings {
                reflection_interval: Duration::from_millis(10),
                reflection_backoff: Duration::from_millis(10),
                ..Default::default()
            };
            let mut ctl = CognitiveController::new(persona(), mock.clone(), settings);
            ctl.store().append(MemoryKind::Observation, "a laptop for $300");

            ctl.start_background();
            ctl.start_background();
            assert!(ctl.background_running());

            tokio::time::sleep(Duration::from_millis(60)).await;
            ctl.shutdown().await;
            assert!(!ctl.background_running());

            let store = ctl.store();
            assert!(mock.calls_mentioning("reflection module") >= 1);
            assert!(store.entries().iter().any(|e| e.kind == MemoryKind::Reflection));
            assert_eq!(store.embeddings().len(), store.importances().len());
            assert!(store.enriched_len() <= store.len());
        }

        #[tokio::test]
        async fn test_shutdown_during_slow_sync_commits_nothing() {
            let mock = base_mock()
                .when_prompt_contains("reflection module", MockResponse::json(json!({"insights": ["keep comparing"]})))
                .with_embed_delay(Duration::from_millis(300));
            let mock = Arc::new(mock);
            let settings = ControllerSettings {
                reflection_interval: Duration::from_millis(10),
                reflection_backoff: Duration::from_millis(10),
                ..Default::default()
            };
            let mut ctl = CognitiveController::new(persona(), mock.clone(), settings);
            ctl.store().append(MemoryKind::Observation, "a laptop for $300");

            ctl.start_background();
            // First round has reflected and is now waiting on embeddings.
            tokio::time::sleep(Duration::from_millis(50)).await;
            assert_eq!(mock.embed_call_count(), 1);

            tokio::time::timeout(Duration::from_millis(200), ctl.shutdown())
                .await
                .expect("shutdown should not wait for the sync to finish");
            assert!(!ctl.background_running());

            let store = ctl.store().clone();
            assert_eq!(store.enriched_len(), 0);
            assert_eq!(store.embeddings().len(), store.importances().len());
            assert_eq!(store.len(), 2);
            assert_eq!(store.sync_enrichment().await, mimic_memory::SyncReport::Committed(2));
        }
    }
}
