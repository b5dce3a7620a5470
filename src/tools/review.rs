//! ai_review - code review through a chosen provider

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::gateway::Gateway;
use crate::providers::ChatOptions;
use crate::Result;
use super::{build_review_prompt, parse_args, ReviewFocus, Tool, ToolOutput};

#[derive(Debug, Deserialize)]
struct ReviewArgs {
    provider: String,
    code: String,
    language: Option<String>,
    focus: Option<ReviewFocus>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

pub struct ReviewTool {
    gateway: Arc<Gateway>,
}

impl ReviewTool {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl Tool for ReviewTool {
    fn name(&self) -> &str { "ai_review" }
    fn description(&self) -> &str { "Review code using a selected AI provider" }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "provider": {
                    "type": "string",
                    "description": "Provider name for code review"
                },
                "code": {
                    "type": "string",
                    "description": "Code snippet to review"
                },
                "language": {
                    "type": "string",
                    "description": "Programming language"
                },
                "focus": {
                    "type": "string",
                    "enum": ["bugs", "security", "perf", "style", "all"],
                    "description": "Review focus area"
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
            "required": ["provider", "code"]
        })
    }

    async fn execute(&self, params: Value) -> Result<ToolOutput> {
        let args: ReviewArgs = parse_args(params)?;
        let provider = self.gateway.resolve_provider(&args.provider)?;

        let prompt = build_review_prompt(&args.code, args.language.as_deref(), args.focus);
        let options = ChatOptions {
            model: None,
            system_prompt: None,
            max_tokens: args.max_tokens,
            temperature: args.temperature,
        };

        let reply = self
            .gateway
            .usage
            .track(
                provider.name(),
                provider.default_model(),
                "ai_review",
                provider.chat(prompt.into(), &options),
            )
            .await?;

        Ok(ToolOutput::text(reply).with_meta(json!({
            "provider": provider.name(),
            "focus": args.focus.unwrap_or_default().as_str(),
        })))
    }
}
