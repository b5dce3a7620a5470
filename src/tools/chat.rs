//! ai_chat - single-provider chat with per-conversation history

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::conversation::ConversationStore;
use crate::gateway::Gateway;
use crate::providers::{ChatMessage, ChatOptions};
use crate::Result;
use super::{parse_args, Tool, ToolOutput};

#[derive(Debug, Deserialize)]
struct ChatArgs {
    provider: String,
    prompt: String,
    model: Option<String>,
    system_prompt: Option<String>,
    conversation_id: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

pub struct ChatTool {
    gateway: Arc<Gateway>,
}

impl ChatTool {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl Tool for ChatTool {
    fn name(&self) -> &str { "ai_chat" }
    fn description(&self) -> &str { "Send a prompt to a specific AI provider with optional conversation history" }

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
                "system_prompt": {
                    "type": "string",
                    "description": "Optional system prompt"
                },
                "conversation_id": {
                    "type": "string",
                    "description": "Conversation ID for multi-turn chat"
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

    async fn execute(&self, params: Value) -> Result<ToolOutput> {
        let args: ChatArgs = parse_args(params)?;
        let provider = self.gateway.resolve_provider(&args.provider)?;
        let name = provider.name().to_string();

        let conversation_id = args
            .conversation_id
            .unwrap_or_else(ConversationStore::new_conversation_id);
        let mut history = self.gateway.conversations.get(&conversation_id, &name);
        history.push(ChatMessage::user(args.prompt));

        // Explicit system prompt, else the brain's default persona + rules
        let system_prompt = args.system_prompt.or_else(|| self.gateway.brain_context());

        let model = args
            .model
            .clone()
            .unwrap_or_else(|| provider.default_model().to_string());
        let options = ChatOptions {
            model: args.model,
            system_prompt,
            max_tokens: args.max_tokens,
            temperature: args.temperature,
        };

        let reply = self
            .gateway
            .usage
            .track(&name, &model, "ai_chat", provider.chat(history.clone().into(), &options))
            .await?;

        history.push(ChatMessage::assistant(reply.clone()));
        self.gateway.conversations.set(&conversation_id, &name, history);

        Ok(ToolOutput::text(reply).with_meta(json!({
            "conversation_id": conversation_id,
            "provider": name,
            "model": model,
        })))
    }
}
