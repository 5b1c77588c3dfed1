use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("USDA API error: {0}")]
    Usda(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Polars error: {0}")]
    Polars(String),
}

impl From<polars::error::PolarsError> for AgentError {
    fn from(err: polars::error::PolarsError) -> Self {
        AgentError::Polars(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AgentError>;
