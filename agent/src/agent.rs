use crate::llm::Message;
use crate::callbacks;
use crate::llm;
use crate::tools;
use crate::{Error, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

pub trait StopCondition {
    fn done(&self, history: &[llm::Message]) -> bool;
}

type Tool = Box<dyn tools::Tool + Send>;
type Callback = Box<dyn callbacks::Callback + Send>;

pub struct Agent {
    llm: Arc<dyn llm::LLM + Send + Sync>,
    tools: HashMap<String, Tool>,
    callbacks: Vec<Callback>,
    tool_defs: Vec<tools::ToolDefinition>,
    stop_condition: Box<dyn StopCondition + Send>,
    max_steps: Option<usize>,
}

impl Agent {
    async fn execute_tool_call(
        &mut self,
        tool_call: &tools::ToolCall,
        messages: Vec<llm::Message>,
    ) -> Result<Vec<llm::Message>> {
        let tool = self
            .tools
            .get_mut(&tool_call.name)
            .ok_or(Error::ToolDoesNotExist(tool_call.name.clone()))?;

        debug!(tool = %tool_call.name, id = %tool_call.id, "executing tool call");
        let messages = tool.invoke(tool_call, messages).await?;

        Ok(messages)
    }

    pub async fn run(&mut self, mut messages: Vec<llm::Message>) -> Result<Vec<Message>> {
        let mut step = 0;

        while !self.stop_condition.done(&messages) {
            if let Some(max_steps) = self.max_steps {
                if step >= max_steps {
                    return Err(Error::StepLimitReached(max_steps));
                }
            }
            step += 1;

            let next = self
                .llm
                .completion(llm::CompletionRequest {
                    messages: &messages,
                    tools: &self.tool_defs,
                })
                .await?;

            messages.push(llm::Message::Assistant(
                next.content,
                next.tool_calls.clone(),
            ));

            for tool_call in &next.tool_calls {
                messages = self.execute_tool_call(tool_call, messages).await?;
            }

            for callback in &mut self.callbacks {
                messages = callback.call(messages).await?;
            }
        }

        debug!(steps = step, "agent finished");
        Ok(messages)
    }
}

pub struct AgentBuilder {
    llm: Option<Arc<dyn llm::LLM + Send + Sync>>,
    tools: Vec<Tool>,
    callbacks: Vec<Callback>,
    stop_condition: Option<Box<dyn StopCondition + Send>>,
    max_steps: Option<usize>,
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self {
            llm: None,
            tools: Vec::new(),
            callbacks: Vec::new(),
            stop_condition: None,
            max_steps: None,
        }
    }

    pub fn llm(mut self, llm: Arc<dyn llm::LLM + Send + Sync>) -> Self {
        self.llm = Some(llm);
        self
    }

    pub fn tool(mut self, tool: Tool) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn tools(mut self, tools: Vec<Tool>) -> Self {
        self.tools.extend(tools);
        self
    }

    pub fn callback(mut self, callback: Callback) -> Self {
        self.callbacks.push(callback);
        self
    }

    pub fn stop_condition(mut self, cond: Box<dyn StopCondition + Send>) -> Self {
        self.stop_condition = Some(cond);
        self
    }

    /// Number of model completions after which `run` gives up.
    pub fn max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = Some(max_steps);
        self
    }

    pub fn build(self) -> Result<Agent> {
        let mut tool_defs = Vec::new();
        let mut tools = HashMap::new();

        for tool in self.tools {
            let def = tool.definition()?;
            tools.insert(def.name.clone(), tool);
            tool_defs.push(def);
        }

        Ok(Agent {
            llm: self
                .llm
                .ok_or(Error::MissingArg("llm is required for agent".to_string()))?,
            tools,
            tool_defs,
            callbacks: self.callbacks,
            stop_condition: self.stop_condition.ok_or(Error::MissingArg(
                "stop_condition is required for agent".to_string(),
            ))?,
            max_steps: self.max_steps,
        })
    }
}
