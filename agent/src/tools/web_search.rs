use crate::Result;
use crate::llm::Message;
use crate::tools::{FunctionalTool, ToolCall, ToolDefinition};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::debug;

const TAVILY_ENDPOINT: &str = "https://api.tavily.com/search";

/// Web search backed by the Tavily search api.
pub struct TavilySearch {
    client: reqwest::Client,
    api_key: String,
    max_results: usize,
}

impl TavilySearch {
    pub fn new(api_key: String, max_results: usize) -> Box<Self> {
        Box::new(Self {
            client: reqwest::Client::new(),
            api_key,
            max_results,
        })
    }

    async fn search(&self, query: &str) -> Result<TavilyResponse> {
        let response = self
            .client
            .post(TAVILY_ENDPOINT)
            .bearer_auth(&self.api_key)
            .json(&TavilyRequest {
                query,
                max_results: self.max_results,
            })
            .send()
            .await?
            .error_for_status()?
            .json::<TavilyResponse>()
            .await?;

        Ok(response)
    }
}

#[derive(Serialize)]
struct TavilyRequest<'a> {
    query: &'a str,
    max_results: usize,
}

#[derive(Deserialize, Debug)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Deserialize, Serialize, Debug)]
struct TavilyResult {
    url: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
}

impl TavilyResponse {
    fn render(&self) -> Result<String> {
        if self.results.is_empty() {
            return Ok("no results found, try a different query".to_string());
        }
        Ok(serde_json::to_string_pretty(&self.results)?)
    }
}

#[derive(Deserialize, JsonSchema)]
struct WebSearchArgs {
    /// search engine query
    query: String,
}

#[async_trait]
impl FunctionalTool for TavilySearch {
    fn definition(&self) -> Result<ToolDefinition> {
        ToolDefinition::new::<WebSearchArgs>(
            "web_search",
            "search the web and return the most relevant pages with their url, title and extracted content",
        )
    }

    async fn invoke_fn(&mut self, call: &ToolCall) -> Result<Message> {
        let args: WebSearchArgs = call.args()?;
        debug!(query = %args.query, "web search");

        let response = self.search(&args.query).await?;

        Ok(Message::Tool {
            id: call.id.clone(),
            name: "web_search".to_string(),
            result: response.render()?,
        })
    }
}
