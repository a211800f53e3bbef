//! Helpers for pulling a JSON object out of a model reply.

use mimic_core::{MimicError, Result};
use serde_json::Value;

/// Return the outermost `{ ... }` slice of `text`, if any.
///
/// Models sometimes wrap JSON in code fences or prose; this strips that.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Parse a reply into a JSON object.
pub fn parse_json_reply(text: &str) -> Result<Value> {
    let candidate = extract_json_object(text)
        .ok_or_else(|| MimicError::MalformedResponse(format!("no JSON object in reply: {}", preview(text))))?;
    let value: Value = serde_json::from_str(candidate)
        .map_err(|e| MimicError::MalformedResponse(format!("invalid JSON ({e}): {}", preview(text))))?;
    if !value.is_object() {
        return Err(MimicError::MalformedResponse("reply is not a JSON object".into()));
    }
    Ok(value)
}

fn preview(text: &str) -> String {
    text.chars().take(120).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_from_code_fence() {
        let reply = "```json\n{\"plan\": \"x\"}\n```";
        assert_eq!(extract_json_object(reply), Some("{\"plan\": \"x\"}"));
    }

    #[test]
    fn test_extract_none_without_braces() {
        assert_eq!(extract_json_object("no json here"), None);
        assert_eq!(extract_json_object("} backwards {"), None);
    }

    #[test]
    fn test_parse_nested_object() {
        let value = parse_json_reply("sure: {\"a\": {\"b\": 1}} done").unwrap();
        assert_eq!(value["a"]["b"], 1);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = parse_json_reply("{not json}").unwrap_err();
        assert!(matches!(err, MimicError::MalformedResponse(_)));
    }
}
