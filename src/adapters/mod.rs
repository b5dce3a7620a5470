//! Adapters module - transports that carry MCP traffic to the dispatcher.
//!
//! Each adapter implements the [`Transport`] trait for uniform handling.
//!
//! # Supported Transports
//!
//! - **stdio** - newline-delimited JSON-RPC over stdin/stdout
//! - **http** - JSON-RPC on `POST /mcp` plus read-only status routes
//!
//! # Adding a New Transport
//!
//! 1. Create a new file (e.g., `websocket.rs`)
//! 2. Implement the [`Transport`] trait
//! 3. Add a variant to [`TransportKind`]

pub mod http;
pub mod stdio;

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

pub use http::HttpTransport;
pub use stdio::StdioTransport;

/// Transport trait for MCP front-ends.
///
/// All transport implementations must be [`Send`] + [`Sync`] for async compatibility.
pub trait Transport: Send + Sync {
    /// Transport name (e.g., "stdio", "http").
    fn name(&self) -> &str;

    /// Serve requests until the input closes or the listener fails.
    fn serve(&self) -> impl std::future::Future<Output = crate::Result<()>> + Send;
}

/// Which transport to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransportKind {
    #[default]
    Stdio,
    Http,
}

impl TransportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportKind::Stdio => "stdio",
            TransportKind::Http => "http",
        }
    }

    /// Get a human-readable description of a transport.
    pub fn description(&self) -> &'static str {
        match self {
            TransportKind::Stdio => "JSON-RPC over stdin/stdout",
            TransportKind::Http => "JSON-RPC over HTTP with status routes",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransportKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stdio" | "" => Ok(TransportKind::Stdio),
            "http" => Ok(TransportKind::Http),
            other => Err(Error::Config(format!(
                "Unknown transport \"{other}\" (expected stdio or http)"
            ))),
        }
    }
}
