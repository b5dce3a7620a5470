//! Copilot provider via a local copilot-api proxy.
//!
//! The proxy speaks the OpenAI Chat Completions protocol and does not check
//! credentials, so this adapter always reports itself available and lets the
//! call fail if the proxy is down.

use std::time::Duration;

use async_trait::async_trait;

use crate::Result;

use super::openai_compat::ChatCompletionsClient;
use super::{ChatInput, ChatOptions, Provider};

pub struct CopilotProvider {
    model: String,
    client: ChatCompletionsClient,
}

impl CopilotProvider {
    pub fn new(port: u16, model: &str, timeout: Duration) -> Self {
        Self {
            model: model.to_string(),
            client: ChatCompletionsClient::new(
                "Copilot",
                &format!("http://localhost:{port}"),
                None,
                timeout,
            ),
        }
    }
}

#[async_trait]
impl Provider for CopilotProvider {
    fn name(&self) -> &str {
        "copilot"
    }

    fn default_model(&self) -> &str {
        &self.model
    }

    fn is_available(&self) -> bool {
        true
    }

    async fn chat(&self, input: ChatInput, options: &ChatOptions) -> Result<String> {
        let model = options.model.as_deref().unwrap_or(&self.model);
        self.client
            .complete(model, &input.into_messages(), options)
            .await
    }
}
