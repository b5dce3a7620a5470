//! Provider registry - name-indexed, registration-ordered.

use std::sync::Arc;

use serde::Serialize;

use crate::config::Config;

use super::{ClaudeProvider, CopilotProvider, GeminiProvider, OpenAiProvider, Provider};

/// Availability snapshot of one provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderStatus {
    pub name: String,
    pub configured: bool,
    pub default_model: String,
}

/// Registry of providers.
///
/// # Example
///
/// ```ignore
/// let registry = ProviderRegistry::from_config(&config);
/// for provider in registry.list_available() {
///     println!("{} ({})", provider.name(), provider.default_model());
/// }
/// ```
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn Provider>>,
}

impl ProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    /// Register the canonical provider set: gemini, claude, openai, copilot.
    pub fn from_config(config: &Config) -> Self {
        let timeout = config.request_timeout();
        let mut registry = Self::new();

        registry.register(GeminiProvider::new(
            &config.gemini_api_key,
            &config.gemini_default_model,
            timeout,
        ));
        registry.register(ClaudeProvider::new(
            &config.anthropic_api_key,
            &config.anthropic_default_model,
            timeout,
        ));
        registry.register(OpenAiProvider::new(
            &config.openai_api_key,
            &config.openai_default_model,
            timeout,
        ));
        registry.register(CopilotProvider::new(
            config.copilot_api_port,
            &config.copilot_default_model,
            timeout,
        ));

        registry
    }

    /// Register a provider.
    pub fn register<P: Provider + 'static>(&mut self, provider: P) {
        self.register_shared(Arc::new(provider));
    }

    /// Register an already shared provider.
    ///
    /// A provider with the same name is replaced in place, keeping its
    /// original position in the listing order.
    pub fn register_shared(&mut self, provider: Arc<dyn Provider>) {
        match self.providers.iter().position(|p| p.name() == provider.name()) {
            Some(index) => self.providers[index] = provider,
            None => self.providers.push(provider),
        }
    }

    /// Look up a provider by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.providers.iter().find(|p| p.name() == name).cloned()
    }

    /// All providers in registration order.
    pub fn list_all(&self) -> &[Arc<dyn Provider>] {
        &self.providers
    }

    /// Providers whose credentials are configured, in registration order.
    pub fn list_available(&self) -> Vec<Arc<dyn Provider>> {
        self.providers
            .iter()
            .filter(|p| p.is_available())
            .cloned()
            .collect()
    }

    pub fn status(&self) -> Vec<ProviderStatus> {
        self.providers
            .iter()
            .map(|p| ProviderStatus {
                name: p.name().to_string(),
                configured: p.is_available(),
                default_model: p.default_model().to_string(),
            })
            .collect()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
