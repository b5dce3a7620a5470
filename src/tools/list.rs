//! ai_list - provider status table

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::gateway::Gateway;
use crate::providers::ProviderStatus;
use crate::Result;
use super::{Tool, ToolOutput};

pub struct ListTool {
    gateway: Arc<Gateway>,
}

impl ListTool {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }
}

fn render_table(statuses: &[ProviderStatus]) -> String {
    let mut table = String::from(
        "| Provider | Configured | Default Model |\n|----------|------------|-----------|",
    );
    for status in statuses {
        let mark = if status.configured { "✓" } else { "✗" };
        table.push_str(&format!(
            "\n| {} | {} | {} |",
            status.name, mark, status.default_model
        ));
    }
    table
}

#[async_trait]
impl Tool for ListTool {
    fn name(&self) -> &str { "ai_list" }
    fn description(&self) -> &str { "List configured AI providers and their status" }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn execute(&self, _params: Value) -> Result<ToolOutput> {
        Ok(ToolOutput::text(render_table(&self.gateway.registry.status())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brain::FileBrain;
    use crate::providers::{FakeProvider, ProviderRegistry};

    #[tokio::test]
    async fn test_table_rows() {
        let mut registry = ProviderRegistry::new();
        registry.register(FakeProvider::new("alpha", vec![]));
        registry.register(FakeProvider::unavailable("beta"));
        let gateway = Arc::new(Gateway::new(registry, Box::new(FileBrain::disabled()), None));

        let out = ListTool::new(gateway.clone()).execute(json!({})).await.unwrap();
        assert_eq!(
            out.joined_text(),
            "| Provider | Configured | Default Model |\n\
             |----------|------------|-----------|\n\
             | alpha | ✓ | fake-model |\n\
             | beta | ✗ | fake-model |"
        );
        // Listing is not a provider call
        assert_eq!(gateway.usage.get_summary().total_requests, 0);
    }
}
