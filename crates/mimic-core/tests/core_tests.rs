#[cfg(test)]
mod tests {
    use mimic_core::*;
    use serde_json::json;

    // ── Persona tests ──────────────────────────────────────────

    #[test]
    fn test_persona_flat_form() {
        let persona = Persona::from_value(json!({
            "name": "Dana",
            "background": "Nurse, works nights",
            "intent": "buy compression socks",
            "age": 41,
            "gender": "female",
            "income": [40000, 60000],
            "occupation": "nurse"
        }))
        .unwrap();
        assert_eq!(persona.name, "Dana");
        assert_eq!(persona.intent, "buy compression socks");
        assert_eq!(persona.age, Some(41));
        assert_eq!(persona.income, Some(vec![40000, 60000]));
        assert_eq!(persona.demographics.get("occupation"), Some(&json!("nurse")));
    }

    #[test]
    fn test_persona_legacy_form() {
        let persona = Persona::from_value(json!({
            "persona": "Persona: Marco\nBackground: retired nurse who gardens",
            "intent": "find a pair of pruning shears"
        }))
        .unwrap();
        assert_eq!(persona.name, "Marco");
        assert!(persona.background.contains("retired nurse"));
        assert_eq!(persona.intent, "find a pair of pruning shears");
        assert!(persona.demographics.is_empty());
    }

    #[test]
    fn test_persona_missing_name_is_unknown() {
        let persona = Persona::from_value(json!({ "intent": "buy a kettle" })).unwrap();
        assert_eq!(persona.name, "Unknown");
    }

    #[test]
    fn test_persona_rejects_non_object() {
        assert!(Persona::from_value(json!(["not", "an", "object"])).is_err());
    }

    // ── Action tests ───────────────────────────────────────────

    #[test]
    fn test_action_kind_parse() {
        assert_eq!(ActionKind::parse("CLICK"), Some(ActionKind::Click));
        assert_eq!(ActionKind::parse(" wait "), Some(ActionKind::Wait));
        assert_eq!(ActionKind::parse("teleport"), None);
    }

    #[test]
    fn test_action_serde_tagged() {
        let action = Action::Type {
            element_id: "q".into(),
            text: "running shoes".into(),
        };
        let value = serde_json::to_value(&action).unwrap();
        assert_eq!(value["type"], "type");
        assert_eq!(value["element_id"], "q");
        let restored: Action = serde_json::from_value(value).unwrap();
        assert_eq!(restored, action);
    }

    #[test]
    fn test_action_parameters_drop_tag() {
        let action = Action::Click {
            element_id: "buy".into(),
        };
        assert_eq!(action.parameters(), json!({ "element_id": "buy" }));
        assert_eq!(Action::Back.parameters(), json!({}));
    }

    #[test]
    fn test_stop_action_helpers() {
        let stop = Action::stop("done shopping");
        assert!(stop.is_stop());
        assert_eq!(stop.kind(), ActionKind::Stop);
        assert_eq!(stop.stop_reason(), Some("done shopping"));
        assert_eq!(Action::Back.stop_reason(), None);
    }

    // ── Observation tests ──────────────────────────────────────

    #[test]
    fn test_observation_defaults_from_partial_json() {
        let obs: Observation = serde_json::from_value(json!({
            "url": "http://shop.test",
            "clickables": [{ "id": "a1", "text": "Socks" }]
        }))
        .unwrap();
        assert_eq!(obs.url, "http://shop.test");
        assert!(obs.page_content.is_empty());
        assert_eq!(obs.clickables[0].target(), "a1");
        assert!(obs.error_message.is_none());
    }

    #[test]
    fn test_clickable_target_prefers_name() {
        let mut c = Clickable::new("id-1", "Add to cart");
        c.name = Some("add_to_cart".into());
        assert_eq!(c.target(), "add_to_cart");
        c.name = Some(String::new());
        assert_eq!(c.target(), "id-1");
    }

    // ── Message tests ──────────────────────────────────────────

    #[test]
    fn test_chat_message_constructors() {
        assert_eq!(ChatMessage::system("s").role, Role::System);
        assert_eq!(ChatMessage::user("u").content, "u");
        assert_eq!(Role::Assistant.as_str(), "assistant");
    }

    // ── Error tests ────────────────────────────────────────────

    #[test]
    fn test_error_retryable_classification() {
        assert!(MimicError::Reasoner("boom".into()).is_retryable());
        assert!(MimicError::MalformedResponse("x".into()).is_retryable());
        assert!(!MimicError::Config("bad".into()).is_retryable());
        assert!(!MimicError::Environment("gone".into()).is_retryable());
        let limited = MimicError::RateLimited { retry_after_secs: 7 };
        assert_eq!(limited.retry_after_secs(), Some(7));
    }

    // ── Event bus tests ────────────────────────────────────────

    #[tokio::test]
    async fn test_event_bus_delivers_to_subscribers() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();
        bus.publish(Event::TickCompleted {
            tick: 3,
            memory_count: 12,
        });
        match rx.recv().await.unwrap() {
            Event::TickCompleted { tick, memory_count } => {
                assert_eq!(tick, 3);
                assert_eq!(memory_count, 12);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_event_bus_publish_without_subscribers() {
        let bus = EventBus::with_capacity(4);
        assert_eq!(bus.subscriber_count(), 0);
        assert_eq!(bus.publish(Event::ReflectionCompleted { insights: 1 }), 0);
        let _rx = bus.subscribe();
        assert_eq!(bus.publish(Event::ReflectionCompleted { insights: 2 }), 1);
    }
}
