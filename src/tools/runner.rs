//! Tool runner - holds the tools and turns failures into error payloads

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error};

use crate::error::Error;
use crate::gateway::Gateway;
use super::{BrainChatTool, ChatTool, CompareTool, ListTool, ReviewTool, Tool, ToolOutput};

/// Tool definition for listings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Tool runner manages registered tools in listing order
pub struct ToolRunner {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRunner {
    /// Create an empty tool runner
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Create a tool runner with the standard tool set
    pub fn new_with_defaults(gateway: Arc<Gateway>) -> Self {
        let mut runner = Self::new();

        runner.register(ChatTool::new(gateway.clone()));
        runner.register(CompareTool::new(gateway.clone()));
        runner.register(ReviewTool::new(gateway.clone()));
        runner.register(ListTool::new(gateway.clone()));
        runner.register(BrainChatTool::new(gateway));

        runner
    }

    /// Register a tool, replacing any tool with the same name
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        match self.tools.iter().position(|t| t.name() == tool.name()) {
            Some(index) => self.tools[index] = Box::new(tool),
            None => self.tools.push(Box::new(tool)),
        }
    }

    /// Definitions of the enabled tools
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .filter(|t| t.is_enabled())
            .map(|t| t.to_definition())
            .collect()
    }

    /// Execute a tool by name.
    ///
    /// Always returns a payload; errors become `isError` results.
    pub async fn call(&self, name: &str, params: Value) -> ToolOutput {
        debug!("Calling tool {} with args: {}", name, params);

        let result = match self.tools.iter().find(|t| t.name() == name) {
            Some(tool) => tool.execute(params).await,
            None => Err(Error::UnknownTool(name.to_string())),
        };

        result.unwrap_or_else(|e| {
            error!("Tool call error in {} [{}]: {}", name, e.code(), e);
            ToolOutput::error(format!("Error: {e}"))
        })
    }
}

impl Default for ToolRunner {
    fn default() -> Self {
        Self::new()
    }
}
