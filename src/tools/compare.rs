//! ai_compare - fan one prompt out to several providers
//!
//! All calls run concurrently and are joined with settle-all semantics: one
//! provider failing never cancels or hides the others.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::join_all;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::Error;
use crate::gateway::Gateway;
use crate::providers::{ChatOptions, Provider};
use crate::Result;
use super::{parse_args, Tool, ToolOutput};

const SECTION_SEPARATOR: &str = "\n\n---\n\n";

#[derive(Debug, Deserialize)]
struct CompareArgs {
    prompt: String,
    providers: Option<Vec<String>>,
    system_prompt: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

pub struct CompareTool {
    gateway: Arc<Gateway>,
}

impl CompareTool {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }

    /// Explicit names that exist, or every available provider.
    fn targets(&self, names: Option<&[String]>) -> Vec<Arc<dyn Provider>> {
        match names {
            Some(names) => names
                .iter()
                .filter_map(|name| self.gateway.registry.get(name))
                .collect(),
            None => self.gateway.registry.list_available(),
        }
    }
}

/// Render one `## provider` section per outcome.
fn render_comparison(outcomes: &[(String, Result<String>)]) -> String {
    outcomes
        .iter()
        .map(|(provider, outcome)| match outcome {
            Ok(text) => format!("## {provider}\n\n{text}"),
            Err(e) => format!("## {provider}\n\n**Error:** {e}"),
        })
        .collect::<Vec<_>>()
        .join(SECTION_SEPARATOR)
}

#[async_trait]
impl Tool for CompareTool {
    fn name(&self) -> &str { "ai_compare" }
    fn description(&self) -> &str { "Send a prompt to multiple providers and compare responses" }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "prompt": {
                    "type": "string",
                    "description": "The prompt to send to all providers"
                },
                "providers": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "Provider names to compare (defaults to all available)"
                },
                "system_prompt": {
                    "type": "string",
                    "description": "Optional system prompt"
                },
                "temperature": {
                    "type": "number",
                    "description": "Temperature for creativity (0-1)"
                },
                "max_tokens": {
                    "type": "number",
                    "description": "Maximum tokens in response"
                }
            },
            "required": ["prompt"]
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolOutput> {
        let args: CompareArgs = parse_args(params)?;

        let targets = self.targets(args.providers.as_deref());
        if targets.is_empty() {
            return Err(Error::ProviderUnavailable(
                "No available providers found".to_string(),
            ));
        }

        let options = ChatOptions {
            model: None,
            system_prompt: args.system_prompt,
            max_tokens: args.max_tokens,
            temperature: args.temperature,
        };

        let usage = &self.gateway.usage;
        let prompt = args.prompt.as_str();
        let options = &options;
        let calls = targets.iter().map(|provider| async move {
            let outcome = usage
                .track(
                    provider.name(),
                    provider.default_model(),
                    "ai_compare",
                    provider.chat(prompt.into(), options),
                )
                .await;
            (provider.name().to_string(), outcome)
        });
        let outcomes = join_all(calls).await;

        let succeeded = outcomes.iter().filter(|(_, o)| o.is_ok()).count();
        Ok(ToolOutput::text(render_comparison(&outcomes)).with_meta(json!({
            "providers": outcomes.iter().map(|(name, _)| name).collect::<Vec<_>>(),
            "succeeded": succeeded,
            "failed": outcomes.len() - succeeded,
        })))
    }
}
