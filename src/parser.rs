//! Extracts a single JSON object from raw completion text.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

lazy_static! {
    // Greedy: first '{' through the last '}' in the text.
    static ref OBJECT_SPAN: Regex = Regex::new(r"\{[\s\S]*\}").unwrap();
}

/// Decode the completion text into a JSON object.
///
/// The whole (trimmed) text is decoded first. When that fails, the span from
/// the first `{` to the last `}` is decoded instead, which tolerates prose or
/// code fences around the object. If several objects appear the span covers
/// all of them and usually fails to decode. Every failure yields an empty map.
pub fn parse_json_object(text: &str) -> Map<String, Value> {
    let text = text.trim();

    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => return map,
        Ok(other) => {
            debug!("Completion decoded to a non-object ({}), ignoring", type_name(&other));
            return Map::new();
        }
        Err(_) => {}
    }

    let Some(span) = OBJECT_SPAN.find(text) else {
        debug!("No JSON object found in completion text");
        return Map::new();
    };

    match serde_json::from_str::<Value>(span.as_str()) {
        Ok(Value::Object(map)) => map,
        Ok(_) => Map::new(),
        Err(e) => {
            debug!("Extracted span is not valid JSON: {}", e);
            Map::new()
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
