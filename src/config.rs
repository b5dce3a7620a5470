//! Configuration management
//!
//! Settings are layered: built-in defaults, then `~/.ai-factory/config.json`
//! when it exists, then environment variables. Everything is read once at
//! startup.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use crate::Result;
use crate::error::Error;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub gemini_api_key: String,

    #[serde(default = "default_gemini_model")]
    pub gemini_default_model: String,

    #[serde(default)]
    pub anthropic_api_key: String,

    #[serde(default = "default_anthropic_model")]
    pub anthropic_default_model: String,

    #[serde(default)]
    pub openai_api_key: String,

    #[serde(default = "default_openai_model")]
    pub openai_default_model: String,

    /// Port of the local copilot-api proxy
    #[serde(default = "default_copilot_port")]
    pub copilot_api_port: u16,

    #[serde(default = "default_copilot_model")]
    pub copilot_default_model: String,

    /// Fallback log filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Deadline applied to every backend call
    #[serde(default = "default_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Root of the brain directory (personas/, rules/, knowledge/)
    #[serde(default)]
    pub brain_path: Option<PathBuf>,

    #[serde(default = "default_http_port")]
    pub http_port: u16,

    /// Bearer token required by the HTTP transport when non-empty
    #[serde(default)]
    pub auth_token: String,

    /// "stdio" or "http"
    #[serde(default = "default_transport")]
    pub transport: String,

    /// Keep only the newest N messages per conversation (unbounded when unset)
    #[serde(default)]
    pub max_history_messages: Option<usize>,
}

fn default_gemini_model() -> String {
    "gemini-2.5-pro".to_string()
}

fn default_anthropic_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o".to_string()
}

fn default_copilot_port() -> u16 {
    4141
}

fn default_copilot_model() -> String {
    "gpt-4".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_http_port() -> u16 {
    3000
}

fn default_transport() -> String {
    "stdio".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gemini_api_key: String::new(),
            gemini_default_model: default_gemini_model(),
            anthropic_api_key: String::new(),
            anthropic_default_model: default_anthropic_model(),
            openai_api_key: String::new(),
            openai_default_model: default_openai_model(),
            copilot_api_port: default_copilot_port(),
            copilot_default_model: default_copilot_model(),
            log_level: default_log_level(),
            request_timeout_ms: default_timeout_ms(),
            brain_path: None,
            http_port: default_http_port(),
            auth_token: String::new(),
            transport: default_transport(),
            max_history_messages: None,
        }
    }
}

impl Config {
    /// Backend call deadline as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Overlay values found through `lookup` (normally the process environment).
    ///
    /// Empty values are ignored so that `FOO=` does not clobber a file setting.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("GEMINI_API_KEY") {
            self.gemini_api_key = v;
        }
        if let Some(v) = get("GEMINI_DEFAULT_MODEL") {
            self.gemini_default_model = v;
        }
        if let Some(v) = get("ANTHROPIC_API_KEY") {
            self.anthropic_api_key = v;
        }
        if let Some(v) = get("ANTHROPIC_DEFAULT_MODEL") {
            self.anthropic_default_model = v;
        }
        if let Some(v) = get("OPENAI_API_KEY") {
            self.openai_api_key = v;
        }
        if let Some(v) = get("OPENAI_DEFAULT_MODEL") {
            self.openai_default_model = v;
        }
        if let Some(v) = get("COPILOT_API_PORT") {
            self.copilot_api_port = parse_number("COPILOT_API_PORT", &v)?;
        }
        if let Some(v) = get("COPILOT_DEFAULT_MODEL") {
            self.copilot_default_model = v;
        }
        if let Some(v) = get("LOG_LEVEL") {
            self.log_level = v;
        }
        if let Some(v) = get("REQUEST_TIMEOUT_MS") {
            self.request_timeout_ms = parse_number("REQUEST_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = get("AI_BRAIN_PATH") {
            self.brain_path = Some(PathBuf::from(v));
        }
        if let Some(v) = get("HTTP_PORT") {
            self.http_port = parse_number("HTTP_PORT", &v)?;
        }
        if let Some(v) = get("AUTH_TOKEN") {
            self.auth_token = v;
        }
        if let Some(v) = get("TRANSPORT") {
            self.transport = v.to_lowercase();
        }
        if let Some(v) = get("MAX_HISTORY_MESSAGES") {
            self.max_history_messages = Some(parse_number("MAX_HISTORY_MESSAGES", &v)?);
        }

        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{key} must be a number, got {value:?}")))
}

/// Get the config directory path
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".ai-factory")
}

/// Get the config file path
pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

/// Load configuration from the optional config file and the environment
pub fn load() -> Result<Config> {
    let path = config_path();

    let mut config = if path.exists() {
        let content = std::fs::read_to_string(&path)?;
        serde_json::from_str(&content)?
    } else {
        Config::default()
    };

    config.apply_env(|key| std::env::var(key).ok())?;
    Ok(config)
}
