//! OpenAI provider.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Error;
use crate::Result;

use super::openai_compat::ChatCompletionsClient;
use super::{ChatInput, ChatOptions, Provider};

const OPENAI_API_URL: &str = "https://api.openai.com/v1";

pub struct OpenAiProvider {
    model: String,
    configured: bool,
    client: ChatCompletionsClient,
}

impl OpenAiProvider {
    pub fn new(api_key: &str, model: &str, timeout: Duration) -> Self {
        Self::with_base_url(api_key, model, timeout, OPENAI_API_URL)
    }

    /// Point at another OpenAI-compatible deployment.
    pub fn with_base_url(api_key: &str, model: &str, timeout: Duration, base_url: &str) -> Self {
        let key = (!api_key.is_empty()).then(|| api_key.to_string());
        Self {
            model: model.to_string(),
            configured: key.is_some(),
            client: ChatCompletionsClient::new("OpenAI", base_url, key, timeout),
        }
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn default_model(&self) -> &str {
        &self.model
    }

    fn is_available(&self) -> bool {
        self.configured
    }

    async fn chat(&self, input: ChatInput, options: &ChatOptions) -> Result<String> {
        if !self.is_available() {
            return Err(Error::ProviderUnavailable(
                "OpenAI API key not configured".to_string(),
            ));
        }

        let model = options.model.as_deref().unwrap_or(&self.model);
        self.client
            .complete(model, &input.into_messages(), options)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unconfigured() {
        let provider = OpenAiProvider::new("", "gpt-4o", Duration::from_secs(1));
        assert!(!provider.is_available());
        assert_eq!(provider.default_model(), "gpt-4o");

        let err = provider.chat("hi".into(), &ChatOptions::default()).await.unwrap_err();
        assert_eq!(err.to_string(), "OpenAI API key not configured");
    }
}
