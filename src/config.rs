//! Runtime configuration read from the environment (and `.env`).

use crate::answer_agent::AnswerAgentSettings;
use crate::error::{AgentError, Result};
use crate::llm::DEFAULT_BASE_URL;
use crate::param_agent::ParamAgentSettings;
use crate::usda_client::USDA_BASE_URL;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TEMPERATURE: f32 = 0.1;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const PARAM_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_PREVIEW_ROWS: usize = 1000;

#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub model: String,
    pub temperature: f32,
    pub usda_api_key: Option<String>,
    pub usda_base_url: String,
    /// Timeout for Quick Stats requests and answer generation.
    pub request_timeout: Duration,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            usda_api_key: None,
            usda_base_url: USDA_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl AgentConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source; unset or blank variables keep defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let temperature = match get("OPENAI_TEMPERATURE").map(|v| v.parse::<f32>()) {
            Some(Ok(t)) if (0.0..=1.0).contains(&t) => t,
            Some(Ok(t)) => {
                warn!("Ignoring OPENAI_TEMPERATURE {}: must be between 0.0 and 1.0", t);
                defaults.temperature
            }
            Some(Err(e)) => {
                warn!("Ignoring OPENAI_TEMPERATURE: {}", e);
                defaults.temperature
            }
            None => defaults.temperature,
        };
        let request_timeout = match get("REQUEST_TIMEOUT_SECS").map(|v| v.parse::<u64>()) {
            Some(Ok(secs)) => Duration::from_secs(secs),
            Some(Err(e)) => {
                warn!("Ignoring REQUEST_TIMEOUT_SECS: {}", e);
                defaults.request_timeout
            }
            None => defaults.request_timeout,
        };

        Self {
            openai_api_key: get("OPENAI_API_KEY"),
            openai_base_url: get("OPENAI_BASE_URL").unwrap_or(defaults.openai_base_url),
            model: get("OPENAI_MODEL").unwrap_or(defaults.model),
            temperature,
            usda_api_key: get("USDA_API_KEY"),
            usda_base_url: get("USDA_BASE_URL").unwrap_or(defaults.usda_base_url),
            request_timeout,
        }
    }

    pub fn require_openai_key(&self) -> Result<&str> {
        self.openai_api_key.as_deref().ok_or_else(|| {
            AgentError::Configuration(
                "No OpenAI API key provided. Set OPENAI_API_KEY in the environment or .env".to_string(),
            )
        })
    }

    pub fn require_usda_key(&self) -> Result<&str> {
        self.usda_api_key.as_deref().ok_or_else(|| {
            AgentError::Configuration(
                "No USDA API key provided. Set USDA_API_KEY in the environment or .env".to_string(),
            )
        })
    }

    pub fn param_agent_settings(&self) -> ParamAgentSettings {
        ParamAgentSettings {
            model: self.model.clone(),
            temperature: self.temperature,
            timeout: Duration::from_secs(PARAM_TIMEOUT_SECS),
            base_url: self.openai_base_url.clone(),
        }
    }

    /// The answer step shares the model and temperature picked for parameters.
    pub fn answer_agent_settings(&self) -> AnswerAgentSettings {
        AnswerAgentSettings {
            model: self.model.clone(),
            temperature: self.temperature,
            timeout: self.request_timeout,
            base_url: self.openai_base_url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = AgentConfig::from_lookup(lookup(&[]));
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.openai_base_url, DEFAULT_BASE_URL);
        assert_eq!(config.request_timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert!(config.require_openai_key().is_err());
        assert!(config.require_usda_key().is_err());
    }

    #[test]
    fn reads_variables() {
        let config = AgentConfig::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_MODEL", "gpt-4o"),
            ("OPENAI_TEMPERATURE", "0.5"),
            ("USDA_API_KEY", " usda "),
            ("REQUEST_TIMEOUT_SECS", "15"),
        ]));
        assert_eq!(config.require_openai_key().unwrap(), "sk-test");
        assert_eq!(config.require_usda_key().unwrap(), "usda");
        assert_eq!(config.model, "gpt-4o");
        assert!((config.temperature - 0.5).abs() < f32::EPSILON);
        assert_eq!(config.answer_agent_settings().timeout, Duration::from_secs(15));
        assert_eq!(config.param_agent_settings().timeout, Duration::from_secs(PARAM_TIMEOUT_SECS));
    }

    #[test]
    fn blank_and_malformed_values_fall_back() {
        let config = AgentConfig::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "   "),
            ("OPENAI_TEMPERATURE", "warm"),
            ("REQUEST_TIMEOUT_SECS", "-1"),
        ]));
        assert!(config.openai_api_key.is_none());
        assert!((config.temperature - DEFAULT_TEMPERATURE).abs() < f32::EPSILON);
        assert_eq!(config.request_timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn out_of_range_temperature_falls_back() {
        for raw in ["5.0", "-0.1", "1.01", "NaN"] {
            let config = AgentConfig::from_lookup(lookup(&[("OPENAI_TEMPERATURE", raw)]));
            assert!(
                (config.temperature - DEFAULT_TEMPERATURE).abs() < f32::EPSILON,
                "OPENAI_TEMPERATURE={}",
                raw
            );
        }
        for raw in ["0", "1.0"] {
            let config = AgentConfig::from_lookup(lookup(&[("OPENAI_TEMPERATURE", raw)]));
            assert_eq!(config.temperature, raw.parse::<f32>().unwrap());
        }
    }
}
