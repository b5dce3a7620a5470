//! Shared client for OpenAI-compatible `/chat/completions` endpoints.
//!
//! Used by the OpenAI adapter and by the Copilot adapter, which talks to a
//! local OpenAI-compatible proxy.

use std::sync::OnceLock;
use std::time::Duration;

use reqwest::Client;
use tracing::debug;

use crate::error::Error;
use crate::Result;

use super::types::{ChatCompletionRequest, ChatCompletionResponse, WireMessage};
use super::{send_json, ChatMessage, ChatOptions, Role};

/// Chat Completions client bound to one base URL.
pub struct ChatCompletionsClient {
    /// Display name used in error messages ("OpenAI", "Copilot")
    label: &'static str,
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
    client: OnceLock<Client>,
}

impl ChatCompletionsClient {
    pub fn new(label: &'static str, base_url: &str, api_key: Option<String>, timeout: Duration) -> Self {
        Self {
            label,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            timeout,
            client: OnceLock::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn client(&self) -> Client {
        self.client.get_or_init(Client::new).clone()
    }

    /// Convert messages, keeping system turns in place.
    ///
    /// The explicit system prompt is prepended only when the sequence does
    /// not already carry a system message.
    pub fn build_request(model: &str, messages: &[ChatMessage], options: &ChatOptions) -> ChatCompletionRequest {
        let mut wire: Vec<WireMessage> = messages
            .iter()
            .map(|m| WireMessage {
                role: match m.role {
                    Role::System => "system",
                    Role::User => "user",
                    Role::Assistant => "assistant",
                },
                content: m.content.clone(),
            })
            .collect();

        if let Some(ref system) = options.system_prompt {
            if !wire.iter().any(|m| m.role == "system") {
                wire.insert(
                    0,
                    WireMessage {
                        role: "system",
                        content: system.clone(),
                    },
                );
            }
        }

        ChatCompletionRequest {
            model: model.to_string(),
            messages: wire,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        }
    }

    pub fn parse_response(label: &str, response: ChatCompletionResponse) -> Result<String> {
        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.is_empty())
            .ok_or_else(|| Error::InvalidResponse(format!("No content in {label} response")))
    }

    /// Run one completion against `model`.
    pub async fn complete(&self, model: &str, messages: &[ChatMessage], options: &ChatOptions) -> Result<String> {
        let body = Self::build_request(model, messages, options);
        let mut request = self
            .client()
            .post(format!("{}/chat/completions", self.base_url))
            .json(&body);
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        let response: ChatCompletionResponse = send_json(self.label, request, self.timeout).await?;
        let text = Self::parse_response(self.label, response)?;

        debug!("{} response received for model {}", self.label, model);
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_system_prompt_prepended_once() {
        let options = ChatOptions {
            system_prompt: Some("be nice".to_string()),
            ..Default::default()
        };

        let plain = ChatCompletionsClient::build_request("gpt-4o", &[ChatMessage::user("hi")], &options);
        assert_eq!(plain.messages[0].role, "system");
        assert_eq!(plain.messages[0].content, "be nice");
        assert_eq!(plain.messages.len(), 2);

        let existing = ChatCompletionsClient::build_request(
            "gpt-4o",
            &[ChatMessage::system("already"), ChatMessage::user("hi")],
            &options,
        );
        let systems: Vec<&WireMessage> = existing.messages.iter().filter(|m| m.role == "system").collect();
        assert_eq!(systems.len(), 1);
        assert_eq!(systems[0].content, "already");
    }

    #[test]
    fn test_optional_fields_only_when_set() {
        let request = ChatCompletionsClient::build_request("gpt-4o", &[ChatMessage::user("hi")], &ChatOptions::default());
        let body = serde_json::to_value(&request).unwrap();
        assert!(body.get("temperature").is_none());
        assert!(body.get("max_tokens").is_none());
    }

    #[test]
    fn test_parse_response() {
        let ok: ChatCompletionResponse = serde_json::from_value(json!({
            "choices": [{"message": {"role": "assistant", "content": "hello"}}]
        }))
        .unwrap();
        assert_eq!(ChatCompletionsClient::parse_response("OpenAI", ok).unwrap(), "hello");

        let null: ChatCompletionResponse = serde_json::from_value(json!({
            "choices": [{"message": {"role": "assistant", "content": null}}]
        }))
        .unwrap();
        let err = ChatCompletionsClient::parse_response("OpenAI", null).unwrap_err();
        assert_eq!(err.to_string(), "No content in OpenAI response");
    }
}
