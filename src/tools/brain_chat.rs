//! ai_brain_chat - chat with persona, rules and knowledge from the brain

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::brain::{build_system_prompt, BrainModule, BrainRequest};
use crate::error::Error;
use crate::gateway::Gateway;
use crate::providers::ChatOptions;
use crate::Result;
use super::{parse_args, Tool, ToolOutput};

#[derive(Debug, Deserialize)]
struct BrainChatArgs {
    provider: String,
    prompt: String,
    model: Option<String>,
    persona: Option<String>,
    brain_modules: Option<Vec<BrainModule>>,
    knowledge_query: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

pub struct BrainChatTool {
    gateway: Arc<Gateway>,
}

impl BrainChatTool {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl Tool for BrainChatTool {
    fn name(&self) -> &str { "ai_brain_chat" }
    fn description(&self) -> &str { "Send a prompt to a provider with AI Brain context (persona, rules, knowledge)" }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "provider": {
                    "type": "string",
                    "description": "Provider name: gemini, claude, openai, or copilot"
                },
                "prompt": {
                    "type": "string",
                    "description": "The user prompt to send to the provider"
                },
                "model": {
                    "type": "string",
                    "description": "Optional model override"
                },
                "persona": {
                    "type": "string",
                    "description": "Persona name to load (defaults to 'default')"
                },
                "brain_modules": {
                    "type": "array",
                    "items": {"type": "string", "enum": ["persona", "rules", "knowledge"]},
                    "description": "Brain modules to include: persona, rules, knowledge"
                },
                "knowledge_query": {
                    "type": "string",
                    "description": "Query for knowledge search"
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
            "required": ["provider", "prompt"]
        })
    }

    fn is_enabled(&self) -> bool {
        self.gateway.brain.is_available()
    }

    async fn execute(&self, params: Value) -> Result<ToolOutput> {
        if !self.gateway.brain.is_available() {
            return Err(Error::BrainUnavailable(
                "AI Brain is not available. Please set AI_BRAIN_PATH environment variable.".to_string(),
            ));
        }

        let args: BrainChatArgs = parse_args(params)?;
        let provider = self.gateway.resolve_provider(&args.provider)?;

        let brain_prompt = build_system_prompt(
            self.gateway.brain.as_ref(),
            &BrainRequest {
                persona: args.persona,
                modules: args.brain_modules,
                knowledge_query: args.knowledge_query,
            },
        );
        debug!(
            "Brain prompt for {}: {} chars from {:?}",
            provider.name(),
            brain_prompt.text.len(),
            brain_prompt.modules_used
        );

        let model = args
            .model
            .clone()
            .unwrap_or_else(|| provider.default_model().to_string());
        let options = ChatOptions {
            model: args.model,
            system_prompt: (!brain_prompt.is_empty()).then(|| brain_prompt.text.clone()),
            max_tokens: args.max_tokens,
            temperature: args.temperature,
        };

        let reply = self
            .gateway
            .usage
            .track(
                provider.name(),
                &model,
                "ai_brain_chat",
                provider.chat(args.prompt.into(), &options),
            )
            .await?;

        Ok(ToolOutput::text(reply).with_meta(json!({
            "provider": provider.name(),
            "model": model,
            "brain_modules": brain_prompt.modules_used,
        })))
    }
}
