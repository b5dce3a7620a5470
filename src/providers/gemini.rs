//! Gemini provider (API key authentication).

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::error::Error;
use crate::Result;

use super::types::GeminiResponse;
use super::{send_json, ChatInput, ChatMessage, ChatOptions, Provider, Role};

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Gemini API provider using API key authentication.
pub struct GeminiProvider {
    api_key: String,
    model: String,
    base_url: String,
    timeout: Duration,
    client: OnceLock<Client>,
}

impl GeminiProvider {
    /// Create a new Gemini provider with API key.
    pub fn new(api_key: &str, model: &str, timeout: Duration) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url: GEMINI_API_URL.to_string(),
            timeout,
            client: OnceLock::new(),
        }
    }

    #[cfg(test)]
    fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn client(&self) -> Client {
        self.client.get_or_init(Client::new).clone()
    }

    /// The key travels in `x-goog-api-key`, never in the URL.
    fn build_url(&self, model: &str) -> String {
        format!("{}/{}:generateContent", self.base_url, model)
    }

    /// Build the request body.
    ///
    /// Gemini takes the system prompt as `systemInstruction`, so system-role
    /// messages are lifted out of `contents` and only used when no explicit
    /// system prompt was given.
    fn build_request(&self, messages: &[ChatMessage], options: &ChatOptions) -> Value {
        let mut system_parts = Vec::new();

        let contents: Vec<Value> = messages
            .iter()
            .filter_map(|m| {
                let role = match m.role {
                    Role::System => {
                        system_parts.push(m.content.as_str());
                        return None;
                    }
                    Role::User => "user",
                    Role::Assistant => "model",
                };
                Some(json!({
                    "role": role,
                    "parts": [{"text": m.content}]
                }))
            })
            .collect();

        let system = options
            .system_prompt
            .clone()
            .or_else(|| (!system_parts.is_empty()).then(|| system_parts.join("\n\n")));

        let mut request = json!({ "contents": contents });

        let mut generation = Map::new();
        if let Some(temperature) = options.temperature {
            generation.insert("temperature".to_string(), json!(temperature));
        }
        if let Some(max_tokens) = options.max_tokens {
            generation.insert("maxOutputTokens".to_string(), json!(max_tokens));
        }
        if !generation.is_empty() {
            request["generationConfig"] = Value::Object(generation);
        }

        if let Some(system) = system {
            request["systemInstruction"] = json!({
                "parts": [{"text": system}]
            });
        }

        request
    }

    fn parse_response(response: &GeminiResponse) -> Result<String> {
        let text: String = response
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect()
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(Error::InvalidResponse(
                "No text content in Gemini response".to_string(),
            ));
        }
        Ok(text)
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
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
                "Gemini API key not configured".to_string(),
            ));
        }

        let model = options.model.as_deref().unwrap_or(&self.model);
        let body = self.build_request(&input.into_messages(), options);
        let request = self
            .client()
            .post(self.build_url(model))
            .header("x-goog-api-key", &self.api_key)
            .json(&body);

        let response: GeminiResponse = send_json("Gemini", request, self.timeout).await?;
        let text = Self::parse_response(&response)?;

        debug!("Gemini response received for model {}", model);
        Ok(text)
    }
}
