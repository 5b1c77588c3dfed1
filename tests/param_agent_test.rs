use async_trait::async_trait;
use quickstats_agent::error::{AgentError, Result};
use quickstats_agent::llm::{CompletionRequest, CompletionService};
use quickstats_agent::prompt::SYSTEM_PROMPT;
use quickstats_agent::{ParamAgent, ParamAgentSettings, ParamKey, ParamValue};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Completion double that replays a canned reply and records every request.
struct ScriptedCompletion {
    reply: std::result::Result<String, String>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedCompletion {
    fn replying(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(text.to_string()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(message.to_string()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionService for ScriptedCompletion {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        self.requests.lock().unwrap().push(request.clone());
        self.reply.clone().map_err(AgentError::Llm)
    }
}

fn agent(service: Arc<ScriptedCompletion>) -> ParamAgent {
    ParamAgent::with_service(service, ParamAgentSettings::default())
}

#[tokio::test]
async fn blank_question_never_calls_the_service() {
    let service = ScriptedCompletion::replying(r#"{"commodity_desc": "CORN"}"#);
    let agent = agent(service.clone());

    for question in ["", "   ", "\n\t"] {
        assert!(agent.generate(question).await.is_empty());
    }
    assert_eq!(service.calls(), 0);
}

#[tokio::test]
async fn request_carries_prompt_and_settings() {
    let service = ScriptedCompletion::replying(r#"{"commodity_desc": "CORN"}"#);
    let settings = ParamAgentSettings {
        model: "gpt-4o".to_string(),
        temperature: 0.3,
        timeout: Duration::from_secs(12),
        ..ParamAgentSettings::default()
    };
    let agent = ParamAgent::with_service(service.clone(), settings);

    agent.generate("Corn yield in Iowa for 2023").await;

    let requests = service.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.system, *SYSTEM_PROMPT);
    assert_eq!(request.user, "User question: Corn yield in Iowa for 2023\nReturn JSON only.");
    assert_eq!(request.model, "gpt-4o");
    assert_eq!(request.timeout, Duration::from_secs(12));
    assert!((request.temperature - 0.3).abs() < f32::EPSILON);
}

#[tokio::test]
async fn end_to_end_sanitizes_model_output() {
    let reply = r#"Here you go:
```json
{"commodity_desc": "corn", "state_name": "Iowa", "state_alpha": "NE",
 "year": ["2022", "2020", "2021"], "api_key": "leak", "statisticcat_desc": "yield"}
```"#;
    let service = ScriptedCompletion::replying(reply);
    let params = agent(service.clone()).generate("Corn yield in Iowa 2020 to 2022").await;

    assert_eq!(service.calls(), 1);
    assert_eq!(params.len(), 4);
    assert_eq!(params.get(ParamKey::CommodityDesc), Some(&ParamValue::Single("CORN".into())));
    assert_eq!(params.get(ParamKey::StatisticcatDesc), Some(&ParamValue::Single("YIELD".into())));
    assert_eq!(params.get(ParamKey::StateAlpha), Some(&ParamValue::Single("IA".into())));
    assert_eq!(
        params.get(ParamKey::Year),
        Some(&ParamValue::Many(vec!["2020".into(), "2021".into(), "2022".into()]))
    );
}

#[tokio::test]
async fn service_failure_yields_empty_map() {
    let service = ScriptedCompletion::failing("401 Unauthorized");
    let params = agent(service.clone()).generate("Corn yield in Iowa for 2023").await;

    assert_eq!(service.calls(), 1);
    assert!(params.is_empty());
}

#[tokio::test]
async fn unparsable_output_yields_empty_map() {
    for reply in [
        "",
        "I'm not sure what you mean.",
        r#"{"commodity_desc": "CORN"} and also {"year": "2023"}"#,
        r#"["commodity_desc", "CORN"]"#,
    ] {
        let service = ScriptedCompletion::replying(reply);
        assert!(agent(service).generate("Corn?").await.is_empty(), "reply: {}", reply);
    }
}

#[tokio::test]
async fn output_without_allowed_keys_yields_empty_map() {
    let service = ScriptedCompletion::replying(r#"{"crop": "CORN", "when": "2023"}"#);
    assert!(agent(service).generate("Corn in 2023").await.is_empty());
}

#[tokio::test]
async fn serialized_output_matches_query_shape() {
    let service = ScriptedCompletion::replying(
        r#"{"commodity_desc": "WHEAT", "statisticcat_desc": "PRICE RECEIVED",
            "freq_desc": "MONTHLY", "agg_level_desc": "NATIONAL", "year": 2019}"#,
    );
    let params = agent(service).generate("Monthly US wheat prices received 2019").await;

    let json = serde_json::to_value(&params).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "commodity_desc": "WHEAT",
            "statisticcat_desc": "PRICE RECEIVED",
            "freq_desc": "MONTHLY",
            "agg_level_desc": "NATIONAL",
            "year": "2019"
        })
    );
}

#[test]
fn missing_credential_is_fatal() {
    let result = ParamAgent::new("", ParamAgentSettings::default());
    assert!(matches!(result, Err(AgentError::Configuration(_))));
}
