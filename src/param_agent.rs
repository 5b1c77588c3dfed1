//! LLM-backed mapper from a plain-English question to Quick Stats parameters.

use crate::error::Result;
use crate::llm::{CompletionRequest, CompletionService, LlmClient, DEFAULT_BASE_URL};
use crate::params::ParamMap;
use crate::parser::parse_json_object;
use crate::prompt::{user_prompt, SYSTEM_PROMPT};
use crate::sanitizer::sanitize;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct ParamAgentSettings {
    pub model: String,
    pub temperature: f32,
    pub timeout: Duration,
    pub base_url: String,
}

impl Default for ParamAgentSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.1,
            timeout: Duration::from_secs(30),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

pub struct ParamAgent {
    service: Arc<dyn CompletionService>,
    settings: ParamAgentSettings,
}

impl ParamAgent {
    /// Build an agent backed by the OpenAI-compatible client.
    /// Fails immediately when the credential is blank.
    pub fn new(api_key: impl Into<String>, settings: ParamAgentSettings) -> Result<Self> {
        let client = LlmClient::new(api_key, settings.base_url.clone())?;
        Ok(Self::with_service(Arc::new(client), settings))
    }

    pub fn with_service(service: Arc<dyn CompletionService>, settings: ParamAgentSettings) -> Self {
        Self { service, settings }
    }

    pub fn settings(&self) -> &ParamAgentSettings {
        &self.settings
    }

    /// Map a question to sanitized parameters.
    ///
    /// An empty map is the only failure signal: blank questions, completion
    /// errors, and unparsable output all end up here.
    pub async fn generate(&self, question: &str) -> ParamMap {
        if question.trim().is_empty() {
            debug!("Blank question, skipping completion call");
            return ParamMap::new();
        }

        let request_id = Uuid::new_v4();
        let started = Instant::now();
        info!(%request_id, model = %self.settings.model, "Generating Quick Stats parameters");

        let request = CompletionRequest {
            system: SYSTEM_PROMPT.clone(),
            user: user_prompt(question),
            model: self.settings.model.clone(),
            temperature: self.settings.temperature,
            timeout: self.settings.timeout,
        };

        let content = match self.service.complete(&request).await {
            Ok(content) => content,
            Err(e) => {
                warn!(%request_id, "Completion failed, returning no parameters: {}", e);
                return ParamMap::new();
            }
        };

        let raw = parse_json_object(&content);
        if raw.is_empty() {
            debug!(%request_id, "No JSON object in completion: {:?}", content);
        }
        let params = sanitize(&Value::Object(raw));

        info!(
            %request_id,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Generated {} parameter(s)",
            params.len()
        );
        params
    }
}
