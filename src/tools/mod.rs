//! Tools module - the operations exposed to clients
//!
//! Each tool is one short pipeline over the shared [`Gateway`]:
//! resolve provider(s), build the prompt, make a tracked provider call and
//! shape the reply.
//!
//! [`Gateway`]: crate::gateway::Gateway

mod brain_chat;
mod chat;
mod compare;
mod list;
mod prompts;
mod review;
mod runner;

pub use brain_chat::BrainChatTool;
pub use chat::ChatTool;
pub use compare::CompareTool;
pub use list::ListTool;
pub use prompts::{build_review_prompt, ReviewFocus};
pub use review::ReviewTool;
pub use runner::{ToolDefinition, ToolRunner};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::Error;
use crate::Result;

/// One text block of a tool result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextContent {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: String,
}

/// Normalized tool result: a payload or an explicit error, never a crash.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolOutput {
    pub content: Vec<TextContent>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

impl ToolOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![TextContent {
                kind: "text",
                text: text.into(),
            }],
            is_error: false,
            meta: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            is_error: true,
            ..Self::text(message)
        }
    }

    pub fn with_meta(mut self, meta: Value) -> Self {
        self.meta = Some(meta);
        self
    }

    /// Concatenated text of all content blocks.
    pub fn joined_text(&self) -> String {
        self.content.iter().map(|c| c.text.as_str()).collect()
    }
}

/// Tool trait - interface for every exposed operation
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name used in `tools/call`
    fn name(&self) -> &str;

    /// Description of what the tool does
    fn description(&self) -> &str;

    /// JSON Schema for parameters
    fn parameters(&self) -> Value;

    /// Whether the tool is advertised in listings
    fn is_enabled(&self) -> bool {
        true
    }

    /// Execute the tool with given parameters
    async fn execute(&self, params: Value) -> Result<ToolOutput>;

    /// Convert to tool definition for listings
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.parameters(),
        }
    }
}

/// Deserialize tool arguments into their typed form.
pub(crate) fn parse_args<T: DeserializeOwned>(params: Value) -> Result<T> {
    serde_json::from_value(params).map_err(|e| Error::InvalidParams(e.to_string()))
}
