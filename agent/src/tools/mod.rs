use crate::Result;
use crate::llm::Message;
use async_trait::async_trait;
use schemars::JsonSchema;
use schemars::r#gen::SchemaSettings;

mod web_search;
pub use web_search::TavilySearch;

pub struct ToolDefinition {
    pub name: String,
    pub desc: String,
    pub params: serde_json::Value,
}

impl ToolDefinition {
    /// Describes a tool whose arguments deserialize into `P`. Nested types are
    /// inlined so the parameter schema has no `$ref`s into missing definitions.
    pub fn new<P: JsonSchema>(name: &str, desc: &str) -> Result<Self> {
        let schema = SchemaSettings::draft07()
            .with(|settings| settings.inline_subschemas = true)
            .into_generator()
            .into_root_schema_for::<P>();
        let params = serde_json::to_value(&schema.schema)?;
        Ok(Self {
            name: name.to_string(),
            desc: desc.to_string(),
            params,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, std::hash::Hash)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub args: String,
}

impl ToolCall {
    pub fn args<O: for<'de> serde::Deserialize<'de>>(&self) -> Result<O> {
        let args = serde_json::from_str(&self.args)?;
        Ok(args)
    }
}

impl std::fmt::Display for ToolCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "- {} ({})\n\t- `{}`", self.name, self.id, self.args)
    }
}

#[async_trait]
pub trait Tool {
    fn definition(&self) -> Result<ToolDefinition>;

    async fn invoke(&mut self, args: &ToolCall, messages: Vec<Message>) -> Result<Vec<Message>>;
}

/// A tool that answers each call with exactly one message.
#[async_trait]
pub trait FunctionalTool {
    fn definition(&self) -> Result<ToolDefinition>;

    async fn invoke_fn(&mut self, args: &ToolCall) -> Result<Message>;
}

#[async_trait]
impl<T> Tool for T
where
    T: FunctionalTool + Send + Sync,
{
    fn definition(&self) -> Result<ToolDefinition> {
        FunctionalTool::definition(self)
    }

    async fn invoke(
        &mut self,
        args: &ToolCall,
        mut messages: Vec<Message>,
    ) -> Result<Vec<Message>> {
        let result = self.invoke_fn(args).await?;
        messages.push(result);
        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[allow(dead_code)]
    #[derive(Deserialize, JsonSchema)]
    struct Inner {
        origin: String,
    }

    #[allow(dead_code)]
    #[derive(Deserialize, JsonSchema)]
    struct Outer {
        title: String,
        items: Vec<Inner>,
    }

    #[test]
    fn test_definition_inlines_nested_types() -> Result<()> {
        let def = ToolDefinition::new::<Outer>("outer", "nested args")?;

        assert_eq!(def.params["type"], "object");
        assert_eq!(
            def.params["properties"]["items"]["items"]["properties"]["origin"]["type"],
            "string"
        );
        assert!(!def.params.to_string().contains("$ref"));
        Ok(())
    }

    #[test]
    fn test_tool_call_args() -> Result<()> {
        let call = ToolCall {
            id: "1".to_string(),
            name: "outer".to_string(),
            args: "{\"title\":\"t\",\"items\":[{\"origin\":\"a\"}]}".to_string(),
        };
        let outer: Outer = call.args()?;
        assert_eq!(outer.title, "t");
        assert_eq!(outer.items[0].origin, "a");

        let bad = ToolCall {
            args: "not json".to_string(),
            ..call
        };
        assert!(bad.args::<Outer>().is_err());
        Ok(())
    }
}
