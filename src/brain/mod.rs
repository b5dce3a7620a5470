//! Brain module - file-backed persona, rules and knowledge.
//!
//! Layout under the brain root:
//!
//! ```text
//! personas/<name>.md
//! rules/core.md
//! knowledge/**/*.md
//! ```
//!
//! Every loader degrades to an empty result (with a warning) when the root or
//! a file is missing; the brain never fails a request on its own.

mod prompt;

pub use prompt::{build_system_prompt, BrainModule, BrainPrompt, BrainRequest};
#[cfg(test)]
pub use prompt::StaticBrain;

use std::path::{Component, Path, PathBuf};

use regex::Regex;
use serde::Serialize;
use tracing::{debug, warn};

/// Characters of context kept before the first match.
const PREVIEW_BEFORE: usize = 100;
/// Characters of context kept after the start of the first match.
const PREVIEW_AFTER: usize = 200;

/// A knowledge file matching a search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KnowledgeHit {
    /// Path relative to `knowledge/`
    pub file: String,
    /// Text window around the first match, wrapped in `...`
    pub preview: String,
}

/// Brain trait - source of system-prompt context.
pub trait Brain: Send + Sync {
    fn is_available(&self) -> bool;

    /// Persona text, empty when missing.
    fn load_persona(&self, name: &str) -> String;

    /// Core rules text, empty when missing.
    fn load_core_rules(&self) -> String;

    /// Case-insensitive search over knowledge files.
    fn search_knowledge(&self, query: &str) -> Vec<KnowledgeHit>;
}

/// A single file-name segment: no separators, no `.`/`..`, not absolute.
fn is_plain_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !name.contains(['/', '\\'])
}

/// Filesystem brain rooted at `AI_BRAIN_PATH`.
pub struct FileBrain {
    root: Option<PathBuf>,
}

impl FileBrain {
    pub fn new(root: Option<PathBuf>) -> Self {
        Self { root }
    }

    /// A brain that is never available.
    pub fn disabled() -> Self {
        Self { root: None }
    }

    fn root(&self) -> Option<&Path> {
        self.root.as_deref().filter(|p| p.is_dir())
    }

    fn read_optional(&self, path: &Path, what: &str) -> String {
        if !path.exists() {
            warn!("{} file not found: {:?}", what, path);
            return String::new();
        }
        match std::fs::read_to_string(path) {
            Ok(content) => {
                debug!("Loaded {}: {:?}", what, path);
                content
            }
            Err(e) => {
                warn!("Error loading {} {:?}: {}", what, path, e);
                String::new()
            }
        }
    }

    fn search_recursive(&self, base: &Path, dir: &Path, pattern: &Regex, results: &mut Vec<KnowledgeHit>) -> std::io::Result<()> {
        let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|e| e.ok().map(|e| e.path()))
            .collect();
        entries.sort();

        for path in entries {
            if path.is_dir() {
                // Skip hidden directories like .git
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    if name.starts_with('.') {
                        continue;
                    }
                }
                self.search_recursive(base, &path, pattern, results)?;
            } else if path.extension().and_then(|e| e.to_str()) == Some("md") {
                let content = match std::fs::read_to_string(&path) {
                    Ok(content) => content,
                    Err(e) => {
                        warn!("Error reading file {:?}: {}", path, e);
                        continue;
                    }
                };

                if let Some(found) = pattern.find(&content) {
                    let file = path
                        .strip_prefix(base)
                        .unwrap_or(&path)
                        .to_string_lossy()
                        .replace('\\', "/");
                    results.push(KnowledgeHit {
                        file,
                        preview: format!("...{}...", preview_window(&content, found.start())),
                    });
                }
            }
        }
        Ok(())
    }
}

impl Brain for FileBrain {
    fn is_available(&self) -> bool {
        self.root().is_some()
    }

    fn load_persona(&self, name: &str) -> String {
        let Some(root) = self.root() else {
            warn!("Brain not available, returning empty persona");
            return String::new();
        };
        if !is_plain_name(name) {
            warn!("Rejecting persona name {:?}", name);
            return String::new();
        }
        self.read_optional(&root.join("personas").join(format!("{name}.md")), "persona")
    }

    fn load_core_rules(&self) -> String {
        let Some(root) = self.root() else {
            warn!("Brain not available, returning empty rules");
            return String::new();
        };
        self.read_optional(&root.join("rules").join("core.md"), "core rules")
    }

    fn search_knowledge(&self, query: &str) -> Vec<KnowledgeHit> {
        let Some(root) = self.root() else {
            warn!("Brain not available, search returned empty results");
            return Vec::new();
        };
        if query.trim().is_empty() {
            return Vec::new();
        }

        let knowledge = root.join("knowledge");
        if !knowledge.is_dir() {
            warn!("Knowledge directory not found: {:?}", knowledge);
            return Vec::new();
        }

        let pattern = match Regex::new(&format!("(?i){}", regex::escape(query))) {
            Ok(pattern) => pattern,
            Err(e) => {
                warn!("Invalid knowledge query {:?}: {}", query, e);
                return Vec::new();
            }
        };

        let mut results = Vec::new();
        if let Err(e) = self.search_recursive(&knowledge, &knowledge, &pattern, &mut results) {
            warn!("Error searching knowledge: {}", e);
        }
        debug!("Knowledge search for {:?} found {} results", query, results.len());
        results
    }
}

/// Slice of `content` from `PREVIEW_BEFORE` bytes before `at` to
/// `PREVIEW_AFTER` bytes after it, widened to char boundaries and trimmed.
fn preview_window(content: &str, at: usize) -> &str {
    let mut start = at.saturating_sub(PREVIEW_BEFORE);
    while !content.is_char_boundary(start) {
        start -= 1;
    }
    let mut end = (at + PREVIEW_AFTER).min(content.len());
    while !content.is_char_boundary(end) {
        end += 1;
    }
    content[start..end].trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn brain_fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("personas")).unwrap();
        fs::create_dir_all(root.join("rules")).unwrap();
        fs::create_dir_all(root.join("knowledge/rust")).unwrap();
        fs::create_dir_all(root.join("knowledge/.hidden")).unwrap();

        fs::write(root.join("personas/default.md"), "You are calm.").unwrap();
        fs::write(root.join("rules/core.md"), "Never guess.").unwrap();
        fs::write(root.join("knowledge/rust/ownership.md"), "Borrowing rules: one &mut OR many &.").unwrap();
        fs::write(root.join("knowledge/notes.txt"), "borrowing in a txt file").unwrap();
        fs::write(root.join("knowledge/.hidden/secret.md"), "borrowing secret").unwrap();
        dir
    }

    #[test]
    fn test_disabled_brain() {
        let brain = FileBrain::disabled();
        assert!(!brain.is_available());
        assert!(brain.load_persona("default").is_empty());
        assert!(brain.search_knowledge("x").is_empty());
    }

    #[test]
    fn test_persona_name_cannot_leave_personas_dir() {
        let outer = TempDir::new().unwrap();
        fs::write(outer.path().join("secret.md"), "TOP SECRET").unwrap();
        let root = outer.path().join("brain");
        fs::create_dir_all(root.join("personas")).unwrap();
        fs::write(root.join("personas/default.md"), "You are calm.").unwrap();
        let brain = FileBrain::new(Some(root));

        assert_eq!(brain.load_persona("default"), "You are calm.");
        for name in ["../../secret", "../secret", "/tmp/secret", "a/b", "a\\b", "..", ".", ""] {
            assert!(brain.load_persona(name).is_empty(), "{name}");
        }
    }

    #[test]
    fn test_missing_root_is_unavailable() {
        let brain = FileBrain::new(Some(PathBuf::from("/definitely/not/here")));
        assert!(!brain.is_available());
    }

    #[test]
    fn test_loads_persona_and_rules() {
        let dir = brain_fixture();
        let brain = FileBrain::new(Some(dir.path().to_path_buf()));

        assert!(brain.is_available());
        assert_eq!(brain.load_persona("default"), "You are calm.");
        assert_eq!(brain.load_persona("pirate"), "");
        assert_eq!(brain.load_core_rules(), "Never guess.");
    }

    #[test]
    fn test_search_is_case_insensitive_and_md_only() {
        let dir = brain_fixture();
        let brain = FileBrain::new(Some(dir.path().to_path_buf()));

        let hits = brain.search_knowledge("BORROWING");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].file, "rust/ownership.md");
        assert_eq!(hits[0].preview, "...Borrowing rules: one &mut OR many &....");
    }

    #[test]
    fn test_preview_window_bounds() {
        let content = format!("{}needle{}", "a".repeat(150), "b".repeat(300));
        let window = preview_window(&content, 150);
        assert_eq!(window.len(), PREVIEW_BEFORE + PREVIEW_AFTER);
        assert!(window.starts_with('a'));
        assert!(window.contains("needle"));
    }

    #[test]
    fn test_preview_respects_char_boundaries() {
        let content = format!("{}needle", "é".repeat(80));
        let window = preview_window(&content, content.find("needle").unwrap());
        assert!(window.ends_with("needle"));
    }
}
