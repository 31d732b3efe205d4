mod article;
mod config;
mod console;
mod error;
mod fanout;
mod panel;
mod plan;
mod repair;
mod review;
mod search;
mod section;
mod shell;
#[cfg(test)]
mod testing;

pub use error::{Error, Result};

use agent::tools::{TavilySearch, Tool};
use clap::Parser;
use config::Config;
use console::{Console, TerminalConsole};
use plan::PlanGenerator;
use search::{AgentSearch, ConsoleApprover, SearchCapability};
use section::{RetryPolicy, SearchingSectionWriter};
use shell::{Outcome, Shell};
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::info;
use tracing_subscriber::EnvFilter;

const SEARCH_RESULTS_PER_QUERY: usize = 3;

/// Research a topic, review a section plan and write an article.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Chat model to use, overrides ARTICLES_MODEL
    #[arg(long)]
    model: Option<String>,

    /// Directory for saved articles, overrides ARTICLES_OUTPUT_DIR
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

/// Logs go to a file so they never interleave with the interactive prompts.
fn setup_logging() -> Result<PathBuf> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("articles")
        .join("logs");
    fs::create_dir_all(&log_dir)?;

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("articles.log"))?;

    tracing_subscriber::fmt()
        .with_writer(Mutex::new(log_file))
        .with_ansi(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    Ok(log_dir)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    dotenv::dotenv().ok();
    let log_dir = setup_logging()?;

    let mut config = Config::from_env()?;
    if let Some(model) = cli.model {
        config.model = model;
    }
    if let Some(output_dir) = cli.output_dir {
        config.output_dir = output_dir;
    }
    info!(?config, "configuration loaded");

    let llm = agent::llm::OpenAI::new(
        config.model.clone(),
        &config.api_key,
        config.api_base.as_deref(),
    );
    let console: Arc<dyn Console> = Arc::new(TerminalConsole::new());

    let tavily_api_key = config.tavily_api_key.clone();
    let search: Arc<dyn SearchCapability> = Arc::new(
        AgentSearch::new(
            llm.clone(),
            ConsoleApprover::new(console.clone()),
            Box::new(move || -> Box<dyn Tool + Send> {
                TavilySearch::new(tavily_api_key.clone(), SEARCH_RESULTS_PER_QUERY)
            }),
            config.max_agent_steps,
        )
        .transcripts(log_dir.join("transcripts.md")),
    );

    let writer = Arc::new(SearchingSectionWriter::new(
        search.clone(),
        llm.clone(),
        config.section_language.clone(),
        RetryPolicy {
            max_attempts: config.max_attempts,
            pacing: config.pacing,
            backoff: config.backoff,
        },
    ));

    let shell = Shell::new(
        console,
        search,
        PlanGenerator::new(llm),
        writer,
        config.output_dir.clone(),
    );

    match shell.run().await? {
        Outcome::Declined => info!("session ended without an article"),
        Outcome::Completed { article, saved } => {
            info!(headline = %article.headline, ?saved, "session complete")
        }
    }

    Ok(())
}
