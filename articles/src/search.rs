use crate::Result;
use crate::console::Console;
use agent::callbacks::{Callback, MessageLogger};
use agent::llm::{LLM, Message};
use agent::tools::{FunctionalTool, Tool, ToolCall, ToolDefinition};
use agent::{AgentBuilder, StopCondition};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

const SEARCH_PROMPT: &str = include_str!("prompts/search.md");
const SUBMIT_TOOL: &str = "submit_search_result";
const AUTHENTICATE_TOOL: &str = "authenticate_source";
const SUBMIT_REMINDER: &str =
    "When you are done searching, call submit_search_result with the headline, details and sources.";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Source {
    /// where the information was found, usually a url
    pub source: String,
    /// summary of the information found on this source
    pub information_found: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SearchResult {
    pub headline: String,
    pub details: String,
    pub sources: Vec<Source>,
}

#[async_trait]
pub trait SearchCapability: Send + Sync {
    async fn search(&self, query: &str, language: &str) -> Result<SearchResult>;
}

/// Human judgement on whether a source can be trusted.
#[async_trait]
pub trait SourceApprover: Send + Sync {
    async fn approve(&self, source: &Source) -> Result<bool>;
}

pub struct ConsoleApprover {
    console: Arc<dyn Console>,
}

impl ConsoleApprover {
    pub fn new(console: Arc<dyn Console>) -> Arc<Self> {
        Arc::new(Self { console })
    }
}

#[async_trait]
impl SourceApprover for ConsoleApprover {
    async fn approve(&self, source: &Source) -> Result<bool> {
        let console = self.console.clone();
        let details = format!("information found: \n {} \n", source.information_found);
        let prompt = format!(
            "Does this information found on the source {} authentic?",
            source.source
        );
        tokio::task::spawn_blocking(move || console.confirm_details(&details, &prompt, true))
            .await?
    }
}

pub type ToolFactory = Box<dyn Fn() -> Box<dyn Tool + Send> + Send + Sync>;

/// Search performed by a tool-using agent: it queries the web, asks the
/// approver about each source and finally submits a structured result.
pub struct AgentSearch {
    llm: Arc<dyn LLM + Send + Sync>,
    approver: Arc<dyn SourceApprover>,
    web_search: ToolFactory,
    max_steps: usize,
    transcripts: Option<PathBuf>,
}

impl AgentSearch {
    pub fn new(
        llm: Arc<dyn LLM + Send + Sync>,
        approver: Arc<dyn SourceApprover>,
        web_search: ToolFactory,
        max_steps: usize,
    ) -> Self {
        Self {
            llm,
            approver,
            web_search,
            max_steps,
            transcripts: None,
        }
    }

    /// Appends a markdown transcript of every search to `path`.
    pub fn transcripts(mut self, path: PathBuf) -> Self {
        self.transcripts = Some(path);
        self
    }
}

#[async_trait]
impl SearchCapability for AgentSearch {
    async fn search(&self, query: &str, language: &str) -> Result<SearchResult> {
        info!(%query, %language, "searching");

        let mut builder = AgentBuilder::new()
            .llm(self.llm.clone())
            .tool((self.web_search)())
            .tool(Box::new(AuthenticateSource(self.approver.clone())))
            .tool(Box::new(SubmitSearchResult))
            .callback(Box::new(RequireSubmission))
            .stop_condition(Box::new(ResultSubmitted))
            .max_steps(self.max_steps);

        if let Some(path) = &self.transcripts {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            builder = builder.callback(MessageLogger::new(&format!("search: {}", query), file)?);
        }

        let history = builder
            .build()?
            .run(vec![
                Message::System(SEARCH_PROMPT.replace("{language}", language)),
                Message::User(format!("search for information about {}", query)),
            ])
            .await?;

        let result = submitted_result(&history).ok_or_else(|| {
            agent::Error::AgentWorkflowError(
                "search agent stopped without submitting a result".to_string(),
            )
        })?;

        debug!(headline = %result.headline, sources = result.sources.len(), "search complete");
        Ok(result)
    }
}

/// The result from a well-formed submit call in the latest batch of tool
/// messages.
fn submitted_result(history: &[Message]) -> Option<SearchResult> {
    history
        .iter()
        .rev()
        .take_while(|m| matches!(m, Message::Tool { .. }))
        .find_map(|m| match m {
            Message::Tool { name, result, .. } if name == SUBMIT_TOOL => {
                serde_json::from_str(result).ok()
            }
            _ => None,
        })
}

struct ResultSubmitted;

impl StopCondition for ResultSubmitted {
    fn done(&self, history: &[Message]) -> bool {
        submitted_result(history).is_some()
    }
}

/// Nudges the model back to the tools when it answers in plain text.
struct RequireSubmission;

#[async_trait]
impl Callback for RequireSubmission {
    async fn call(&mut self, mut messages: Vec<Message>) -> agent::Result<Vec<Message>> {
        if let Some(Message::Assistant(_, tool_calls)) = messages.last() {
            if tool_calls.is_empty() {
                messages.push(Message::User(SUBMIT_REMINDER.to_string()));
            }
        }
        Ok(messages)
    }
}

fn invalid_arguments(call: &ToolCall, err: agent::Error) -> Message {
    Message::Tool {
        id: call.id.clone(),
        name: call.name.clone(),
        result: format!("invalid arguments: {}", err),
    }
}

struct AuthenticateSource(Arc<dyn SourceApprover>);

#[async_trait]
impl FunctionalTool for AuthenticateSource {
    fn definition(&self) -> agent::Result<ToolDefinition> {
        ToolDefinition::new::<Source>(
            AUTHENTICATE_TOOL,
            "ask a human reviewer whether the information found on a source is authentic, returns is_authentic",
        )
    }

    async fn invoke_fn(&mut self, call: &ToolCall) -> agent::Result<Message> {
        let source: Source = match call.args() {
            Ok(source) => source,
            Err(err) => return Ok(invalid_arguments(call, err)),
        };

        let is_authentic = self.0.approve(&source).await.map_err(|err| {
            agent::Error::AgentWorkflowError(format!("source authentication failed: {}", err))
        })?;
        debug!(source = %source.source, is_authentic, "source reviewed");

        Ok(Message::Tool {
            id: call.id.clone(),
            name: AUTHENTICATE_TOOL.to_string(),
            result: serde_json::json!({ "is_authentic": is_authentic }).to_string(),
        })
    }
}

struct SubmitSearchResult;

#[async_trait]
impl FunctionalTool for SubmitSearchResult {
    fn definition(&self) -> agent::Result<ToolDefinition> {
        ToolDefinition::new::<SearchResult>(
            SUBMIT_TOOL,
            "finish the search and return the headline, the rephrased details and the authentic sources",
        )
    }

    async fn invoke_fn(&mut self, call: &ToolCall) -> agent::Result<Message> {
        let result: SearchResult = match call.args() {
            Ok(result) => result,
            Err(err) => return Ok(invalid_arguments(call, err)),
        };

        Ok(Message::Tool {
            id: call.id.clone(),
            name: SUBMIT_TOOL.to_string(),
            result: serde_json::to_string(&result)?,
        })
    }
}
