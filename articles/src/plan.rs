use crate::repair::repair_json;
use crate::{Error, Result};
use agent::llm::{CompletionRequest, LLM, Message};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

const PLAN_PROMPT: &str = include_str!("prompts/plan.md");

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub name: String,
    pub description: String,
}

/// Ordered article sections; the order is the order of the final article.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Plan(pub Vec<Section>);

impl Plan {
    pub fn sections(&self) -> &[Section] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `N. name` followed by the indented description, one block per section.
    pub fn render(&self) -> String {
        self.0
            .iter()
            .enumerate()
            .map(|(idx, section)| {
                format!("{}. {}\n   {}\n", idx + 1, section.name, section.description)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

pub struct PlanGenerator {
    llm: Arc<dyn LLM + Send + Sync>,
}

impl PlanGenerator {
    pub fn new(llm: Arc<dyn LLM + Send + Sync>) -> Self {
        Self { llm }
    }

    /// Asks the model for a section plan. Edit instructions are passed along
    /// as a note; the previous plan is not.
    pub async fn generate(
        &self,
        headline: &str,
        information: &str,
        edits: Option<&str>,
    ) -> Result<Plan> {
        let mut instructions = PLAN_PROMPT.trim_end().to_string();
        if let Some(edits) = edits.map(str::trim).filter(|edits| !edits.is_empty()) {
            info!(%edits, "regenerating plan with user edits");
            instructions.push_str(&format!(
                "\n\n[Note: The user requested these plan edits: {}]",
                edits
            ));
        }

        let messages = [
            Message::System(instructions),
            Message::User(headline.to_string()),
            Message::System(format!(
                "Here is all information required to write the article:\n{}",
                information
            )),
        ];

        let response = self
            .llm
            .completion(CompletionRequest {
                messages: &messages,
                tools: &[],
            })
            .await?;

        let plan = parse_plan(&response.content)?;
        debug!(sections = plan.len(), "plan generated");
        Ok(plan)
    }
}

/// Parses a bare section array or an object with a `sections` array.
fn parse_plan(raw: &str) -> Result<Plan> {
    let repaired = repair_json(raw);
    let malformed = |reason: String| Error::MalformedPlan(format!("{reason}; model output: {raw}"));

    let value: serde_json::Value =
        serde_json::from_str(&repaired).map_err(|err| malformed(err.to_string()))?;

    let sections = match value {
        serde_json::Value::Array(_) => value,
        serde_json::Value::Object(mut object) => object
            .remove("sections")
            .ok_or_else(|| malformed("object has no sections field".to_string()))?,
        _ => return Err(malformed("expected a list of sections".to_string())),
    };

    let sections: Vec<Section> =
        serde_json::from_value(sections).map_err(|err| malformed(err.to_string()))?;
    if sections.is_empty() {
        return Err(malformed("plan has no sections".to_string()));
    }

    Ok(Plan(sections))
}
