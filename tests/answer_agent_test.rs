use async_trait::async_trait;
use quickstats_agent::answer_agent::{AnswerAgent, AnswerAgentSettings};
use quickstats_agent::error::{AgentError, Result};
use quickstats_agent::llm::{CompletionRequest, CompletionService};
use quickstats_agent::usda_client::QueryResult;
use quickstats_agent::{ParamKey, ParamMap, ParamValue};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

struct Recorder {
    reply: std::result::Result<String, String>,
    last_user: Mutex<Option<String>>,
}

#[async_trait]
impl CompletionService for Recorder {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        *self.last_user.lock().unwrap() = Some(request.user.clone());
        self.reply.clone().map_err(AgentError::Llm)
    }
}

fn recorder(reply: std::result::Result<&str, &str>) -> Arc<Recorder> {
    Arc::new(Recorder {
        reply: reply.map(str::to_string).map_err(str::to_string),
        last_user: Mutex::new(None),
    })
}

fn corn_params() -> ParamMap {
    let mut params = ParamMap::new();
    params.insert(ParamKey::CommodityDesc, ParamValue::Single("CORN".into()));
    params.insert(ParamKey::StateAlpha, ParamValue::Single("IA".into()));
    params
}

fn corn_result() -> QueryResult {
    QueryResult::from_records(&[
        json!({"year": 2023, "state_alpha": "IA", "value": "201", "reference_period_desc": "YEAR"}),
        json!({"year": 2023, "state_alpha": "IA", "value": "196", "reference_period_desc": "YEAR - AUG FORECAST"}),
    ])
    .unwrap()
}

#[tokio::test]
async fn sends_question_params_and_brief() {
    let service = recorder(Ok("Iowa corn yield was **201 BU / ACRE** in 2023."));
    let agent = AnswerAgent::with_service(service.clone(), AnswerAgentSettings::default());

    let answer = agent
        .generate("Corn yield in Iowa in 2023?", &corn_params(), &corn_result())
        .await;
    assert_eq!(answer, "Iowa corn yield was **201 BU / ACRE** in 2023.");

    let user = service.last_user.lock().unwrap().clone().unwrap();
    let payload: Value = serde_json::from_str(&user).unwrap();
    assert_eq!(payload["question"], "Corn yield in Iowa in 2023?");
    assert_eq!(payload["params"]["commodity_desc"], "CORN");
    assert_eq!(payload["data_brief"]["rows"], 2);
    assert_eq!(payload["data_brief"]["metrics"]["value_max"], 201.0);
    assert_eq!(payload["data_brief"]["metrics"]["years_present"], json!(["2023"]));
    assert_eq!(payload["data_brief"]["sample"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn failure_becomes_error_text() {
    let service = recorder(Err("timed out"));
    let agent = AnswerAgent::with_service(service, AnswerAgentSettings::default());

    let answer = agent.generate("q", &corn_params(), &corn_result()).await;
    assert_eq!(answer, "AI explanation error: LLM error: timed out");
}

#[tokio::test]
async fn empty_reply_is_marked() {
    let service = recorder(Ok("  "));
    let agent = AnswerAgent::with_service(service, AnswerAgentSettings::default());

    let answer = agent.generate("q", &corn_params(), &QueryResult::empty()).await;
    assert_eq!(answer, "(No content)");
}
