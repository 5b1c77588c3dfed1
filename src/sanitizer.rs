//! Turns a decoded completion object into a validated `ParamMap`.

use crate::params::{state_alpha_for, Multiplicity, ParamKey, ParamMap, ParamValue, ValueRule};
use itertools::Itertools;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

lazy_static! {
    static ref FOUR_DIGIT_YEAR: Regex = Regex::new(r"^[0-9]{4}$").unwrap();
}

/// Validate and normalize a decoded object against the allow-list.
///
/// Fields that fail the allow-list, normalization, or format checks are
/// dropped one by one; the rest of the object is still sanitized. A
/// translated `state_name` always replaces a directly supplied `state_alpha`.
pub fn sanitize(raw: &Value) -> ParamMap {
    let mut clean = ParamMap::new();
    let Value::Object(entries) = raw else {
        debug!("Sanitizer input is not an object");
        return clean;
    };

    let mut translated_states: Option<ParamValue> = None;

    for (name, value) in entries {
        let Some(key) = ParamKey::from_name(name) else {
            debug!("Dropping parameter outside the allow-list: {}", name);
            continue;
        };
        let spec = key.spec();

        let normalized = match spec.multiplicity {
            Multiplicity::Collection => ParamValue::collapse(normalize_list(spec.rule, value)),
            Multiplicity::Scalar => normalize_scalar(spec.rule, value).map(ParamValue::Single),
        };

        let Some(normalized) = normalized else {
            debug!("Dropping empty or invalid value for {}", key);
            continue;
        };

        if spec.rule == ValueRule::StateName {
            translated_states = Some(normalized);
        } else {
            clean.insert(key, normalized);
        }
    }

    if let Some(codes) = translated_states {
        clean.insert(ParamKey::StateAlpha, codes);
    }

    clean
}

/// Scalar-only keys keep the first element that survives normalization when
/// handed a list.
fn normalize_scalar(rule: ValueRule, value: &Value) -> Option<String> {
    match value {
        Value::Array(items) => items.iter().find_map(|item| normalize_value(rule, item)),
        other => normalize_value(rule, other),
    }
}

fn normalize_list(rule: ValueRule, value: &Value) -> Vec<String> {
    let items: Vec<String> = match value {
        Value::Array(items) => items.iter().filter_map(|v| normalize_value(rule, v)).collect(),
        other => normalize_value(rule, other).into_iter().collect(),
    };

    match rule {
        ValueRule::Year => items.into_iter().sorted().dedup().collect(),
        _ => items.into_iter().unique().collect(),
    }
}

fn normalize_value(rule: ValueRule, value: &Value) -> Option<String> {
    let text = stringify(value)?;
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    match rule {
        ValueRule::Text => Some(text.to_string()),
        ValueRule::Upper => Some(text.to_uppercase()),
        ValueRule::Year => FOUR_DIGIT_YEAR.is_match(text).then(|| text.to_string()),
        ValueRule::StateName => state_alpha_for(&text.to_uppercase()).map(str::to_string),
    }
}

fn stringify(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
