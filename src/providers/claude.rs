//! Claude provider over the Anthropic Messages API.

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::error::Error;
use crate::Result;

use super::types::{AnthropicContentBlock, AnthropicRequest, AnthropicResponse, WireMessage};
use super::{send_json, ChatInput, ChatMessage, ChatOptions, Provider, Role};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";

/// The Messages API rejects requests without `max_tokens`.
const DEFAULT_MAX_TOKENS: u32 = 1024;

pub struct ClaudeProvider {
    api_key: String,
    model: String,
    timeout: Duration,
    client: OnceLock<Client>,
}

impl ClaudeProvider {
    pub fn new(api_key: &str, model: &str, timeout: Duration) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            timeout,
            client: OnceLock::new(),
        }
    }

    fn client(&self) -> Client {
        self.client.get_or_init(Client::new).clone()
    }

    /// System prompt travels in `system`; system-role turns are dropped.
    fn build_request(&self, model: &str, messages: &[ChatMessage], options: &ChatOptions) -> AnthropicRequest {
        let messages = messages
            .iter()
            .filter(|m| m.role != Role::System)
            .map(|m| WireMessage {
                role: if m.role == Role::Assistant { "assistant" } else { "user" },
                content: m.content.clone(),
            })
            .collect();

        AnthropicRequest {
            model: model.to_string(),
            max_tokens: options.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            messages,
            system: options.system_prompt.clone(),
            temperature: options.temperature,
        }
    }

    fn parse_response(response: AnthropicResponse) -> Result<String> {
        response
            .content
            .into_iter()
            .find_map(|block| match block {
                AnthropicContentBlock::Text { text } => Some(text),
                AnthropicContentBlock::Other => None,
            })
            .filter(|text| !text.is_empty())
            .ok_or_else(|| Error::InvalidResponse("No text content in Claude response".to_string()))
    }
}

#[async_trait]
impl Provider for ClaudeProvider {
    fn name(&self) -> &str {
        "claude"
    }

    fn default_model(&self) -> &str {
        &self.model
    }

    fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn chat(&self, input: ChatInput, options: &ChatOptions) -> Result<String> {
        if !self.is_available() {
            return Err(Error::ProviderUnavailable(
                "Anthropic API key not configured".to_string(),
            ));
        }

        let model = options.model.as_deref().unwrap_or(&self.model);
        let body = self.build_request(model, &input.into_messages(), options);
        let request = self
            .client()
            .post(format!("{ANTHROPIC_API_URL}/v1/messages"))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body);

        let response: AnthropicResponse = send_json("Claude", request, self.timeout).await?;
        let text = Self::parse_response(response)?;

        debug!("Claude response received for model {}", model);
        Ok(text)
    }
}
