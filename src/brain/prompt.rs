//! System-prompt assembly from brain modules.

use serde::{Deserialize, Serialize};

use super::Brain;

const SECTION_SEPARATOR: &str = "\n\n---\n\n";

/// A brain module that can contribute to the system prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrainModule {
    Persona,
    Rules,
    Knowledge,
}

/// What to pull from the brain.
#[derive(Debug, Clone, Default)]
pub struct BrainRequest {
    /// Persona name, `default` when unset
    pub persona: Option<String>,
    /// Modules to include, persona + rules when unset
    pub modules: Option<Vec<BrainModule>>,
    pub knowledge_query: Option<String>,
}

/// Assembled system prompt plus the modules that contributed text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BrainPrompt {
    pub text: String,
    pub modules_used: Vec<BrainModule>,
}

impl BrainPrompt {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Build the system prompt for `request`.
///
/// Sections appear in persona, rules, knowledge order regardless of the
/// order requested. Empty sources are left out.
pub fn build_system_prompt(brain: &dyn Brain, request: &BrainRequest) -> BrainPrompt {
    if !brain.is_available() {
        return BrainPrompt::default();
    }

    let modules = request
        .modules
        .clone()
        .unwrap_or_else(|| vec![BrainModule::Persona, BrainModule::Rules]);

    let mut parts = Vec::with_capacity(3);
    let mut modules_used = Vec::with_capacity(3);

    if modules.contains(&BrainModule::Persona) {
        let persona = brain.load_persona(request.persona.as_deref().unwrap_or("default"));
        if !persona.is_empty() {
            parts.push(format!("## Persona\n{persona}"));
            modules_used.push(BrainModule::Persona);
        }
    }

    if modules.contains(&BrainModule::Rules) {
        let rules = brain.load_core_rules();
        if !rules.is_empty() {
            parts.push(format!("## Rules\n{rules}"));
            modules_used.push(BrainModule::Rules);
        }
    }

    if modules.contains(&BrainModule::Knowledge) {
        if let Some(query) = request.knowledge_query.as_deref() {
            let hits = brain.search_knowledge(query);
            if !hits.is_empty() {
                let knowledge = hits
                    .iter()
                    .map(|k| format!("### {}\n{}", k.file, k.preview))
                    .collect::<Vec<_>>()
                    .join("\n\n");
                parts.push(format!("## Relevant Knowledge\n{knowledge}"));
                modules_used.push(BrainModule::Knowledge);
            }
        }
    }

    BrainPrompt {
        text: parts.join(SECTION_SEPARATOR),
        modules_used,
    }
}

/// In-memory brain for testing.
#[cfg(test)]
pub struct StaticBrain {
    pub persona: String,
    pub rules: String,
    pub knowledge: Vec<super::KnowledgeHit>,
}

#[cfg(test)]
impl Brain for StaticBrain {
    fn is_available(&self) -> bool {
        true
    }

    fn load_persona(&self, name: &str) -> String {
        if name == "default" {
            self.persona.clone()
        } else {
            String::new()
        }
    }

    fn load_core_rules(&self) -> String {
        self.rules.clone()
    }

    fn search_knowledge(&self, query: &str) -> Vec<super::KnowledgeHit> {
        let query = query.to_lowercase();
        self.knowledge
            .iter()
            .filter(|k| k.preview.to_lowercase().contains(&query))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brain::{FileBrain, KnowledgeHit};

    fn brain() -> StaticBrain {
        StaticBrain {
            persona: "Calm".to_string(),
            rules: "No guessing".to_string(),
            knowledge: vec![KnowledgeHit {
                file: "tokio.md".to_string(),
                preview: "...spawn tasks...".to_string(),
            }],
        }
    }

    #[test]
    fn test_default_modules() {
        let prompt = build_system_prompt(&brain(), &BrainRequest::default());
        assert_eq!(prompt.text, "## Persona\nCalm\n\n---\n\n## Rules\nNo guessing");
        assert_eq!(prompt.modules_used, vec![BrainModule::Persona, BrainModule::Rules]);
    }

    #[test]
    fn test_knowledge_section() {
        let request = BrainRequest {
            modules: Some(vec![BrainModule::Knowledge]),
            knowledge_query: Some("SPAWN".to_string()),
            ..Default::default()
        };
        let prompt = build_system_prompt(&brain(), &request);
        assert_eq!(prompt.text, "## Relevant Knowledge\n### tokio.md\n...spawn tasks...");
        assert_eq!(prompt.modules_used, vec![BrainModule::Knowledge]);
    }

    #[test]
    fn test_knowledge_without_query_is_skipped() {
        let request = BrainRequest {
            modules: Some(vec![BrainModule::Knowledge]),
            ..Default::default()
        };
        let prompt = build_system_prompt(&brain(), &request);
        assert!(prompt.is_empty());
        assert!(prompt.modules_used.is_empty());
    }

    #[test]
    fn test_missing_persona_not_reported() {
        let request = BrainRequest {
            persona: Some("pirate".to_string()),
            ..Default::default()
        };
        let prompt = build_system_prompt(&brain(), &request);
        assert_eq!(prompt.modules_used, vec![BrainModule::Rules]);
    }

    #[test]
    fn test_unavailable_brain_yields_nothing() {
        let prompt = build_system_prompt(&FileBrain::disabled(), &BrainRequest::default());
        assert!(prompt.is_empty());
    }
}
