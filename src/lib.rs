pub mod answer_agent;
pub mod config;
pub mod error;
pub mod llm;
pub mod param_agent;
pub mod params;
pub mod parser;
pub mod prompt;
pub mod sanitizer;
pub mod usda_client;

pub use error::{AgentError, Result};
pub use param_agent::{ParamAgent, ParamAgentSettings};
pub use params::{ParamKey, ParamMap, ParamValue};
