//! Summarizes a Quick Stats result in plain language.

use crate::error::Result;
use crate::llm::{CompletionRequest, CompletionService, LlmClient, DEFAULT_BASE_URL};
use crate::params::ParamMap;
use crate::usda_client::QueryResult;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const SYSTEM_MESSAGE: &str = "You are an agricultural data analyst. Given a user question, the USDA Quick Stats parameters \
used, and a compact data excerpt+metrics, write a precise, concise answer in Markdown. \
Use only the provided data; do not invent values. Prefer one short paragraph and up to 4 bullets.";

pub const DEFAULT_SAMPLE_ROWS: usize = 12;

#[derive(Debug, Clone)]
pub struct AnswerAgentSettings {
    pub model: String,
    pub temperature: f32,
    pub timeout: Duration,
    pub base_url: String,
}

impl Default for AnswerAgentSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.2,
            timeout: Duration::from_secs(60),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct BriefMetrics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_mean: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub years_present: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub states_present: Option<Vec<String>>,
}

/// Compact view of a result sent along with the question.
#[derive(Debug, Clone, Serialize)]
pub struct DataBrief {
    pub rows: usize,
    pub cols: usize,
    pub columns: Vec<String>,
    pub params: ParamMap,
    pub sample: Vec<serde_json::Map<String, serde_json::Value>>,
    pub metrics: BriefMetrics,
}

#[derive(Serialize)]
struct AnswerPayload<'a> {
    question: &'a str,
    params: &'a ParamMap,
    data_brief: DataBrief,
}

pub fn build_data_brief(result: &QueryResult, params: &ParamMap, max_rows: usize) -> DataBrief {
    let mut metrics = BriefMetrics::default();

    let values: Vec<f64> = result
        .column_values("value")
        .into_iter()
        .flatten()
        .filter_map(|v| parse_reported_value(&v))
        .collect();
    if !values.is_empty() {
        metrics.value_min = values.iter().copied().reduce(f64::min);
        metrics.value_max = values.iter().copied().reduce(f64::max);
        metrics.value_mean = Some(values.iter().sum::<f64>() / values.len() as f64);
    }

    let columns = result.columns();
    if columns.iter().any(|c| c == "year") {
        metrics.years_present = Some(distinct(result.column_values("year")));
    }
    if columns.iter().any(|c| c == "state_alpha") {
        metrics.states_present = Some(distinct(result.column_values("state_alpha")));
    }

    DataBrief {
        rows: result.rows(),
        cols: result.cols(),
        columns,
        params: params.clone(),
        sample: result.records(max_rows),
        metrics,
    }
}

/// Quick Stats reports values like `"1,234"` or `"$5.20"`; suppressed cells
/// such as `"(D)"` do not parse.
fn parse_reported_value(raw: &str) -> Option<f64> {
    let cleaned: String = raw.chars().filter(|c| *c != ',' && *c != '$').collect();
    cleaned.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn distinct(values: Vec<Option<String>>) -> Vec<String> {
    values.into_iter().flatten().collect::<BTreeSet<_>>().into_iter().collect()
}

pub struct AnswerAgent {
    service: Arc<dyn CompletionService>,
    settings: AnswerAgentSettings,
}

impl AnswerAgent {
    pub fn new(api_key: impl Into<String>, settings: AnswerAgentSettings) -> Result<Self> {
        let client = LlmClient::new(api_key, settings.base_url.clone())?;
        Ok(Self::with_service(Arc::new(client), settings))
    }

    pub fn with_service(service: Arc<dyn CompletionService>, settings: AnswerAgentSettings) -> Self {
        Self { service, settings }
    }

    /// Markdown answer for the question. Failures come back as an error line
    /// rather than an `Err`, so the caller can always display something.
    pub async fn generate(&self, question: &str, params: &ParamMap, result: &QueryResult) -> String {
        let payload = AnswerPayload {
            question,
            params,
            data_brief: build_data_brief(result, params, DEFAULT_SAMPLE_ROWS),
        };
        let user = match serde_json::to_string(&payload) {
            Ok(user) => user,
            Err(e) => return format!("AI explanation error: {}", e),
        };

        let request = CompletionRequest {
            system: SYSTEM_MESSAGE.to_string(),
            user,
            model: self.settings.model.clone(),
            temperature: self.settings.temperature,
            timeout: self.settings.timeout,
        };

        match self.service.complete(&request).await {
            Ok(content) if content.trim().is_empty() => "(No content)".to_string(),
            Ok(content) => {
                info!("Answer generated ({} chars)", content.len());
                content
            }
            Err(e) => {
                warn!("Answer generation failed: {}", e);
                format!("AI explanation error: {}", e)
            }
        }
    }
}
