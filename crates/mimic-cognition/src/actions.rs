//! Mapping from loosely structured action replies to typed [`Action`]s.

use mimic_core::{Action, ActionKind};
use serde_json::Value;

pub const DEFAULT_STOP_REASON: &str = "Agent decided to stop";
const DEFAULT_WAIT_SECONDS: f64 = 1.0;

/// First non-empty string among `keys`.
fn text_field(item: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| item.get(*k))
        .find_map(|v| match v {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}

fn seconds_field(item: &Value) -> f64 {
    ["time", "seconds"]
        .iter()
        .filter_map(|k| item.get(*k))
        .find_map(|v| match v {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        })
        .filter(|s| s.is_finite() && *s >= 0.0)
        .unwrap_or(DEFAULT_WAIT_SECONDS)
}

/// Map one reply item to an action. A missing or unknown `type` maps to stop.
pub fn map_action(item: &Value) -> Action {
    let kind = item
        .get("type")
        .and_then(Value::as_str)
        .and_then(ActionKind::parse)
        .unwrap_or(ActionKind::Stop);
    let element = || text_field(item, &["element_id", "selector"]).unwrap_or_default();

    match kind {
        ActionKind::Search => Action::Search {
            query: text_field(item, &["query", "text"]).unwrap_or_default(),
        },
        ActionKind::Click => Action::Click {
            element_id: element(),
        },
        ActionKind::Type => Action::Type {
            element_id: element(),
            text: text_field(item, &["text", "value"]).unwrap_or_default(),
        },
        ActionKind::Select => Action::Select {
            element_id: element(),
            value: text_field(item, &["value"]).unwrap_or_default(),
        },
        ActionKind::Back => Action::Back,
        ActionKind::Wait => Action::Wait {
            seconds: seconds_field(item),
        },
        ActionKind::Stop => Action::Stop {
            reason: text_field(item, &["reason", "description"])
                .unwrap_or_else(|| DEFAULT_STOP_REASON.to_string()),
        },
    }
}

/// Read at most `max` actions from a reply's `actions` array, each paired
/// with the text to remember it by.
pub fn parse_actions(reply: &Value, max: usize) -> Vec<(Action, String)> {
    let Some(items) = reply.get("actions").and_then(Value::as_array) else {
        return Vec::new();
    };
    items
        .iter()
        .take(max)
        .map(|item| {
            let memo = text_field(item, &["description"]).unwrap_or_else(|| item.to_string());
            (map_action(item), memo)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_click_maps_element() {
        let actions = parse_actions(&json!({"actions": [{"type": "click", "element_id": "x"}]}), 5);
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].0, Action::Click { element_id: "x".into() });
    }

    #[test]
    fn test_unknown_type_is_stop_with_default_reason() {
        let action = map_action(&json!({"type": "teleport"}));
        assert_eq!(action, Action::stop(DEFAULT_STOP_REASON));
        assert_eq!(map_action(&json!({})), Action::stop(DEFAULT_STOP_REASON));
    }

    #[test]
    fn test_field_fallbacks() {
        assert_eq!(
            map_action(&json!({"type": "search", "text": "usb hub"})),
            Action::Search { query: "usb hub".into() }
        );
        assert_eq!(
            map_action(&json!({"type": "click", "selector": "#buy"})),
            Action::Click { element_id: "#buy".into() }
        );
        assert_eq!(
            map_action(&json!({"type": "type", "element_id": "q", "value": "mouse"})),
            Action::Type { element_id: "q".into(), text: "mouse".into() }
        );
        assert_eq!(
            map_action(&json!({"type": "stop", "description": "found it"})),
            Action::stop("found it")
        );
    }

    #[test]
    fn test_wait_seconds() {
        assert_eq!(map_action(&json!({"type": "wait", "time": "2.5"})), Action::Wait { seconds: 2.5 });
        assert_eq!(map_action(&json!({"type": "wait"})), Action::Wait { seconds: 1.0 });
    }

    #[test]
    fn test_actions_are_bounded_and_memo_falls_back_to_json() {
        let reply = json!({"actions": [
            {"type": "back"},
            {"type": "click", "element_id": "a", "description": "open listing"},
            {"type": "click", "element_id": "b"}
        ]});
        let actions = parse_actions(&reply, 2);
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0].1, "{\"type\":\"back\"}");
        assert_eq!(actions[1].1, "open listing");
    }

    #[test]
    fn test_missing_actions_key_is_empty() {
        assert!(parse_actions(&json!({"plan": "x"}), 5).is_empty());
    }
}
