use quickstats_agent::answer_agent::AnswerAgent;
use quickstats_agent::config::{AgentConfig, DEFAULT_MAX_PREVIEW_ROWS};
use quickstats_agent::param_agent::ParamAgent;
use quickstats_agent::usda_client::UsdaClient;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::info;

#[derive(Parser)]
#[command(name = "quickstats-agent")]
#[command(about = "Ask USDA Quick Stats questions in plain English")]
#[command(version)]
struct Args {
    /// OpenAI model (or set OPENAI_MODEL env var)
    #[arg(long, global = true)]
    model: Option<String>,

    /// Model temperature, 0.0 to 1.0 (or set OPENAI_TEMPERATURE env var)
    #[arg(long, global = true, value_parser = parse_temperature)]
    temperature: Option<f32>,

    /// Request timeout in seconds (or set REQUEST_TIMEOUT_SECS env var)
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(5..=120))]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the Quick Stats parameters generated for a question
    Params {
        /// The question in plain English
        question: String,
    },
    /// Build parameters, fetch the data, and explain it
    Ask {
        /// The question in plain English
        question: String,

        /// Save the full dataset as CSV
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Maximum rows to preview
        #[arg(long, default_value_t = DEFAULT_MAX_PREVIEW_ROWS,
              value_parser = parse_max_rows)]
        max_rows: usize,

        /// Skip the answer step
        #[arg(long)]
        no_answer: bool,
    },
    /// Check that the Quick Stats API is reachable with the configured key
    Check,
}

fn parse_temperature(raw: &str) -> std::result::Result<f32, String> {
    let t: f32 = raw.parse().map_err(|e| format!("{}", e))?;
    if (0.0..=1.0).contains(&t) {
        Ok(t)
    } else {
        Err("temperature must be between 0.0 and 1.0".to_string())
    }
}

fn parse_max_rows(raw: &str) -> std::result::Result<usize, String> {
    let n: usize = raw.parse().map_err(|e| format!("{}", e))?;
    if (50..=5000).contains(&n) {
        Ok(n)
    } else {
        Err("max rows must be between 50 and 5000".to_string())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();

    let mut config = AgentConfig::from_env();
    if let Some(model) = args.model {
        config.model = model;
    }
    if let Some(temperature) = args.temperature {
        config.temperature = temperature;
    }
    if let Some(timeout) = args.timeout {
        config.request_timeout = Duration::from_secs(timeout);
    }

    match args.command {
        Commands::Params { question } => print_params(&config, &question).await,
        Commands::Ask { question, output, max_rows, no_answer } => {
            ask(&config, &question, output, max_rows, no_answer).await
        }
        Commands::Check => check(&config).await,
    }
}

async fn print_params(config: &AgentConfig, question: &str) -> Result<()> {
    let agent = ParamAgent::new(config.require_openai_key()?, config.param_agent_settings())?;
    let params = agent.generate(question).await;
    if params.is_empty() {
        bail!("The agent returned no parameters. Try a more specific question.");
    }
    println!("{}", serde_json::to_string_pretty(&params)?);
    Ok(())
}

async fn ask(
    config: &AgentConfig,
    question: &str,
    output: Option<PathBuf>,
    max_rows: usize,
    no_answer: bool,
) -> Result<()> {
    let usda_key = config.require_usda_key()?;
    let openai_key = config.require_openai_key()?;
    if question.trim().is_empty() {
        bail!("Please enter a valid question.");
    }
    let overall = Instant::now();

    // Step 1: parameters
    let started = Instant::now();
    let agent = ParamAgent::new(openai_key, config.param_agent_settings())?;
    let params = agent.generate(question).await;
    if params.is_empty() {
        bail!("The agent returned no parameters. Try a more specific question.");
    }
    println!("\n Step 1 · Parameter Agent completed in {} ms", started.elapsed().as_millis());
    println!("{}", serde_json::to_string_pretty(&params)?);

    // Step 2: fetch
    let started = Instant::now();
    let client = UsdaClient::new(usda_key, config.request_timeout)?
        .with_base_url(config.usda_base_url.clone());
    let result = client.fetch(&params).await?;
    println!(
        "\n Step 2 · USDA query completed in {} ms. Rows returned: {}",
        started.elapsed().as_millis(),
        result.rows()
    );

    if result.rows() == 0 {
        println!("\n No results were returned for these parameters.");
    } else {
        println!("\n{}", result.preview(max_rows)?);
    }
    if let Some(path) = output {
        if result.save_csv(&path)? {
            println!(" Full dataset saved to {}", path.display());
        } else {
            println!(" No rows to save; {} was not written.", path.display());
        }
    }

    // Step 3: answer
    if !no_answer {
        let started = Instant::now();
        let answer_agent = AnswerAgent::new(openai_key, config.answer_agent_settings())?;
        let answer = answer_agent.generate(question, &params, &result).await;
        println!("\n Step 3 · Answer Agent completed in {} ms", started.elapsed().as_millis());
        println!("\n{}", "=".repeat(80));
        println!("{}", answer);
        println!("{}", "=".repeat(80));
    }

    info!("Process complete in {} ms", overall.elapsed().as_millis());
    Ok(())
}

async fn check(config: &AgentConfig) -> Result<()> {
    let client = UsdaClient::new(config.require_usda_key()?, config.request_timeout)?
        .with_base_url(config.usda_base_url.clone());
    if client.check_connection().await {
        println!("USDA Quick Stats API is reachable.");
        Ok(())
    } else {
        bail!("Could not reach the USDA Quick Stats API.")
    }
}
