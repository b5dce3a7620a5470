//! Provider abstraction layer.
//!
//! This module provides:
//! - [`Provider`] trait making heterogeneous LLM backends interchangeable
//! - [`ProviderRegistry`] for name-based lookup and availability queries
//! - Concrete adapters: Gemini, Claude, OpenAI, Copilot (local proxy)
//!
//! # Adding a New Provider
//!
//! 1. Create a new file (e.g., `mistral.rs`)
//! 2. Implement the `Provider` trait, routing the HTTP call through [`send_json`]
//! 3. Register it in `ProviderRegistry::from_config()`
//! 4. Add config fields in `config.rs`

mod types;

pub mod claude;
pub mod copilot;
pub mod gemini;
pub mod openai;
pub mod openai_compat;
pub mod registry;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::error::Error;
use crate::timeout::with_timeout;
use crate::Result;

pub use claude::ClaudeProvider;
pub use copilot::CopilotProvider;
pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;
pub use registry::{ProviderRegistry, ProviderStatus};

/// Message role in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single chat turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Per-call overrides. Unset fields fall back to the adapter's defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatOptions {
    pub model: Option<String>,
    pub system_prompt: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

/// Either a bare prompt or a full message sequence.
#[derive(Debug, Clone)]
pub enum ChatInput {
    Text(String),
    Messages(Vec<ChatMessage>),
}

impl ChatInput {
    /// Normalize into a message sequence; bare text becomes one user turn.
    pub fn into_messages(self) -> Vec<ChatMessage> {
        match self {
            ChatInput::Text(text) => vec![ChatMessage::user(text)],
            ChatInput::Messages(messages) => messages,
        }
    }
}

impl From<&str> for ChatInput {
    fn from(text: &str) -> Self {
        ChatInput::Text(text.to_string())
    }
}

impl From<String> for ChatInput {
    fn from(text: String) -> Self {
        ChatInput::Text(text)
    }
}

impl From<Vec<ChatMessage>> for ChatInput {
    fn from(messages: Vec<ChatMessage>) -> Self {
        ChatInput::Messages(messages)
    }
}

/// Provider trait - one implementation per backend.
///
/// `is_available` must stay cheap and free of side effects (a credential
/// check, not a network call).
#[async_trait]
pub trait Provider: Send + Sync {
    /// Unique registry name (e.g. "gemini").
    fn name(&self) -> &str;

    /// Model used when the caller does not override it.
    fn default_model(&self) -> &str;

    fn is_available(&self) -> bool;

    /// Send the conversation and return the reply text.
    async fn chat(&self, input: ChatInput, options: &ChatOptions) -> Result<String>;
}

/// Send a JSON request under the deadline and decode the JSON reply.
///
/// Transport failures and non-2xx statuses become [`Error::Backend`] tagged
/// with `label`; an expired deadline stays [`Error::Timeout`]. Request URLs
/// are stripped from transport errors before they reach callers or logs.
pub(crate) async fn send_json<T>(label: &'static str, request: RequestBuilder, timeout: Duration) -> Result<T>
where
    T: DeserializeOwned + Send + 'static,
{
    let call = async move {
        let response = request
            .send()
            .await
            .map_err(|e| Error::backend(label, e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::backend(label, format!("HTTP {status}: {body}")));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| Error::backend(label, format!("failed to parse response: {e}")))
    };

    with_timeout(call, timeout).await.map_err(|e| {
        error!("{} API error: {}", label, e);
        e
    })
}

/// Fake provider for testing.
#[cfg(test)]
pub struct FakeProvider {
    name: String,
    available: bool,
    replies: std::sync::Mutex<std::collections::VecDeque<String>>,
    fail_with: Option<String>,
    delay: Option<Duration>,
    calls: std::sync::Mutex<Vec<(Vec<ChatMessage>, ChatOptions)>>,
}

#[cfg(test)]
impl FakeProvider {
    /// Create with predefined text replies, consumed in order.
    pub fn new(name: &str, replies: Vec<&str>) -> Self {
        Self {
            name: name.to_string(),
            available: true,
            replies: std::sync::Mutex::new(replies.iter().map(|s| s.to_string()).collect()),
            fail_with: None,
            delay: None,
            calls: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Every call fails with a backend error carrying `message`.
    pub fn failing(name: &str, message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Self::new(name, vec![])
        }
    }

    /// Reports itself as not configured.
    pub fn unavailable(name: &str) -> Self {
        Self {
            available: false,
            ..Self::new(name, vec![])
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Messages and options received so far.
    pub fn calls(&self) -> Vec<(Vec<ChatMessage>, ChatOptions)> {
        self.calls.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl Provider for FakeProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn default_model(&self) -> &str {
        "fake-model"
    }

    fn is_available(&self) -> bool {
        self.available
    }

    async fn chat(&self, input: ChatInput, options: &ChatOptions) -> Result<String> {
        self.calls
            .lock()
            .unwrap()
            .push((input.into_messages(), options.clone()));

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(ref message) = self.fail_with {
            return Err(Error::backend(self.name.clone(), message.clone()));
        }

        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| Error::Other("No more fake responses".to_string()))
    }
}
