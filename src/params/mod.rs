//! Parameter map handed to the Quick Stats fetch step.

pub mod allow_list;

pub use allow_list::{allowed_key_names, state_alpha_for, KeySpec, Multiplicity, ParamKey, ValueRule, ALLOW_LIST};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One normalized value, or an ordered, deduplicated list of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Single(String),
    Many(Vec<String>),
}

impl ParamValue {
    /// Collapse a list of normalized values: none → `None`, one → `Single`.
    pub fn collapse(mut values: Vec<String>) -> Option<ParamValue> {
        match values.len() {
            0 => None,
            1 => values.pop().map(ParamValue::Single),
            _ => Some(ParamValue::Many(values)),
        }
    }

    pub fn values(&self) -> Vec<&str> {
        match self {
            ParamValue::Single(v) => vec![v.as_str()],
            ParamValue::Many(vs) => vs.iter().map(String::as_str).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParamMap(BTreeMap<ParamKey, ParamValue>);

impl ParamMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: ParamKey, value: ParamValue) -> Option<ParamValue> {
        self.0.insert(key, value)
    }

    pub fn get(&self, key: ParamKey) -> Option<&ParamValue> {
        self.0.get(&key)
    }

    pub fn contains_key(&self, key: ParamKey) -> bool {
        self.0.contains_key(&key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ParamKey, &ParamValue)> {
        self.0.iter()
    }

    /// Flatten into query-string pairs; list values repeat their key.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        self.0
            .iter()
            .flat_map(|(key, value)| {
                value
                    .values()
                    .into_iter()
                    .map(move |v| (key.as_str(), v.to_string()))
            })
            .collect()
    }

    pub fn to_value(&self) -> serde_json::Value {
        let map = self
            .0
            .iter()
            .map(|(k, v)| {
                let value = match v {
                    ParamValue::Single(s) => serde_json::Value::String(s.clone()),
                    ParamValue::Many(vs) => serde_json::Value::Array(
                        vs.iter().cloned().map(serde_json::Value::String).collect(),
                    ),
                };
                (k.as_str().to_string(), value)
            })
            .collect();
        serde_json::Value::Object(map)
    }
}
