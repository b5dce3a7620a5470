//! Review prompt template.

use serde::{Deserialize, Serialize};

/// What a code review should concentrate on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewFocus {
    Bugs,
    Security,
    Perf,
    Style,
    #[default]
    All,
}

impl ReviewFocus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewFocus::Bugs => "bugs",
            ReviewFocus::Security => "security",
            ReviewFocus::Perf => "perf",
            ReviewFocus::Style => "style",
            ReviewFocus::All => "all",
        }
    }

    fn instruction(&self) -> &'static str {
        match self {
            ReviewFocus::Bugs => "focus on identifying potential bugs, logical errors, and edge cases",
            ReviewFocus::Security => "focus on security vulnerabilities, injection attacks, and unsafe patterns",
            ReviewFocus::Perf => "focus on performance issues, inefficient algorithms, and resource usage",
            ReviewFocus::Style => "focus on code style, naming conventions, and readability",
            ReviewFocus::All => "provide a comprehensive review covering bugs, security, performance, and style",
        }
    }
}

/// Build the review request sent to the provider.
pub fn build_review_prompt(code: &str, language: Option<&str>, focus: Option<ReviewFocus>) -> String {
    let lang_hint = language.map(|l| format!(" ({l})")).unwrap_or_default();
    let focus_text = focus.unwrap_or_default().instruction();

    format!(
        "Please review the following code{lang_hint}. {focus_text}.\n\n\
         ```\n{code}\n```\n\n\
         Provide constructive feedback with specific examples and suggestions for improvement."
    )
}
