//! Process-scoped state shared by every tool handler.

use std::sync::Arc;

use tracing::debug;

use crate::brain::{build_system_prompt, Brain, BrainRequest, FileBrain};
use crate::config::Config;
use crate::conversation::ConversationStore;
use crate::error::Error;
use crate::providers::{Provider, ProviderRegistry};
use crate::usage::UsageTracker;
use crate::Result;

/// Owning container for the registry, conversation store, usage tracker and
/// brain. Built once at startup and shared behind an `Arc`.
pub struct Gateway {
    pub registry: ProviderRegistry,
    pub conversations: ConversationStore,
    pub usage: UsageTracker,
    pub brain: Box<dyn Brain>,
}

impl Gateway {
    pub fn new(registry: ProviderRegistry, brain: Box<dyn Brain>, history_limit: Option<usize>) -> Self {
        Self {
            registry,
            conversations: ConversationStore::new(history_limit),
            usage: UsageTracker::new(),
            brain,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            ProviderRegistry::from_config(config),
            Box::new(FileBrain::new(config.brain_path.clone())),
            config.max_history_messages,
        )
    }

    /// Look up a provider that is registered and configured.
    pub fn resolve_provider(&self, name: &str) -> Result<Arc<dyn Provider>> {
        let provider = self
            .registry
            .get(name)
            .ok_or_else(|| Error::NotFound(name.to_string()))?;

        if !provider.is_available() {
            return Err(Error::ProviderUnavailable(format!(
                "Provider \"{name}\" is not configured"
            )));
        }
        Ok(provider)
    }

    /// Default persona + rules, when the brain has any.
    pub fn brain_context(&self) -> Option<String> {
        let prompt = build_system_prompt(self.brain.as_ref(), &BrainRequest::default());
        if prompt.is_empty() {
            return None;
        }
        debug!("Auto-injected brain context ({} chars)", prompt.text.len());
        Some(prompt.text)
    }
}
