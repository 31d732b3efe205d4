use crate::Result;
use crate::tools::{ToolCall, ToolDefinition};
use async_trait::async_trait;
use std::hash::{DefaultHasher, Hash, Hasher};

mod openai;
pub use openai::OpenAI;

#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub enum Message {
    User(String),
    Assistant(String, Vec<ToolCall>),
    System(String),
    Tool {
        id: String,
        name: String,
        result: String,
    },
}

impl Message {
    pub fn get_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

impl std::fmt::Display for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Message::User(content) => write!(f, "**user**\n\n{}\n\n", content),
            Message::System(content) => write!(f, "**system**\n\n{}\n\n", content),
            Message::Assistant(content, tool_calls) => {
                write!(f, "**assistant**\n\n{}\n\n", content)?;
                tool_calls.iter().try_for_each(|call| write!(f, "{}", call))?;
                writeln!(f)
            }
            Message::Tool { name, result, .. } => {
                write!(f, "**tool: {}**\n\n{}\n\n", name, result)
            }
        }
    }
}

pub struct CompletionRequest<'a> {
    pub messages: &'a [Message],
    pub tools: &'a [ToolDefinition],
}

#[derive(Clone, Debug)]
pub struct CompletionResponse {
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
}

#[async_trait]
pub trait LLM {
    async fn completion<'a>(&self, request: CompletionRequest<'a>) -> Result<CompletionResponse>;
}
