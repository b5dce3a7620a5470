//! Error types for AI Factory

use thiserror::Error;

/// Result type alias for AI Factory operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in AI Factory
#[derive(Error, Debug)]
pub enum Error {
    /// Provider credentials are missing.
    #[error("{0}")]
    ProviderUnavailable(String),

    #[error("Provider \"{0}\" not found")]
    NotFound(String),

    /// Backend answered but without usable text.
    #[error("{0}")]
    InvalidResponse(String),

    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    /// Transport, auth or quota failure reported by a backend.
    #[error("{provider} API error: {message}")]
    Backend { provider: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    BrainUnavailable(String),

    #[error("Invalid arguments: {0}")]
    InvalidParams(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Build a backend error for the named provider.
    pub fn backend(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Backend {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Stable machine-readable code for logs and error payloads.
    pub fn code(&self) -> &'static str {
        match self {
            Error::ProviderUnavailable(_) => "PROVIDER_UNAVAILABLE",
            Error::NotFound(_) => "NOT_FOUND",
            Error::InvalidResponse(_) => "INVALID_RESPONSE",
            Error::Timeout(_) => "TIMEOUT",
            Error::Backend { .. } | Error::Http(_) => "BACKEND_ERROR",
            Error::Config(_) => "CONFIG_ERROR",
            Error::BrainUnavailable(_) => "BRAIN_UNAVAILABLE",
            Error::InvalidParams(_) => "INVALID_PARAMS",
            Error::UnknownTool(_) => "UNKNOWN_TOOL",
            Error::Io(_) => "IO_ERROR",
            Error::Json(_) => "JSON_ERROR",
            Error::Other(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(err.to_string())
    }
}
