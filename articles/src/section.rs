use crate::config::DelayRange;
use crate::plan::Section;
use crate::search::SearchCapability;
use crate::{Error, Result};
use agent::llm::{CompletionRequest, LLM, Message};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

const SECTION_PROMPT: &str = include_str!("prompts/section.md");

#[async_trait]
pub trait SectionWriter: Send + Sync {
    async fn write(&self, section: &Section) -> Result<String>;
}

#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    /// waited before every search to stay under provider rate limits
    pub pacing: DelayRange,
    /// exponential backoff after a transient failure
    pub backoff: DelayRange,
}

/// Researches a section with its own search, then drafts it.
pub struct SearchingSectionWriter {
    search: Arc<dyn SearchCapability>,
    llm: Arc<dyn LLM + Send + Sync>,
    language: String,
    policy: RetryPolicy,
}

impl SearchingSectionWriter {
    pub fn new(
        search: Arc<dyn SearchCapability>,
        llm: Arc<dyn LLM + Send + Sync>,
        language: String,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            search,
            llm,
            language,
            policy,
        }
    }

    async fn attempt(&self, section: &Section) -> Result<String> {
        let pause = self.policy.pacing.sample();
        debug!(section = %section.name, ?pause, "pacing before search");
        tokio::time::sleep(pause).await;

        let research = self
            .search
            .search(&section.description, &self.language)
            .await?;

        let messages = [
            Message::System(SECTION_PROMPT.trim_end().to_string()),
            Message::User(format!(
                "Write about {}\nHere is the information required to write the section:\n{}",
                section.name, research.details
            )),
        ];

        let response = self
            .llm
            .completion(CompletionRequest {
                messages: &messages,
                tools: &[],
            })
            .await?;

        Ok(response.content)
    }
}

#[async_trait]
impl SectionWriter for SearchingSectionWriter {
    async fn write(&self, section: &Section) -> Result<String> {
        let mut attempt = 1;

        loop {
            match self.attempt(section).await {
                Ok(text) => {
                    info!(section = %section.name, attempt, "section written");
                    return Ok(text);
                }
                Err(err) if err.is_transient() && attempt < self.policy.max_attempts => {
                    let cool_off = self.policy.backoff.backoff(attempt);
                    warn!(
                        section = %section.name,
                        attempt,
                        ?cool_off,
                        error = %err,
                        "section attempt failed, retrying"
                    );
                    tokio::time::sleep(cool_off).await;
                    attempt += 1;
                }
                Err(err) => {
                    return Err(Error::SectionFailed {
                        section: section.name.clone(),
                        attempts: attempt,
                        source: Box::new(err),
                    });
                }
            }
        }
    }
}
