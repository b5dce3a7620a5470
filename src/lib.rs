//! AI Factory - tool-call gateway over interchangeable LLM providers
//!
//! This library exposes chat, compare, review and brain-augmented chat as
//! MCP tools, dispatching each call to Gemini, Claude, OpenAI or a local
//! Copilot proxy with a deadline, usage tracking and per-conversation history.

pub mod adapters;
pub mod brain;
pub mod config;
pub mod conversation;
pub mod error;
pub mod gateway;
pub mod mcp;
pub mod providers;
pub mod timeout;
pub mod tools;
pub mod ui;
pub mod usage;

pub use error::{Error, Result};
