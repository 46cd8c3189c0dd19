//! Chat Comeback Buddy turns a pasted chat snippet into the same conversation
//! plus one witty reply and a matching GIF, formatted as Markdown.
//!
//! # Overview
//! A request carries the snippet and two style choices (tone and intensity).
//! The crate builds a prompt, hands it to a tool-calling agent backed by an
//! OpenAI chat model, lets the model search Giphy for a GIF, and returns the
//! Markdown transcript the model writes.
//!
//! # Architecture
//! - [`chat`] and [`builder`] hold provider-neutral chat and tool types
//! - [`backends`] talks to the hosted LLM, [`resilient_llm`] retries it
//! - [`tools`] implements the GIF search tool
//! - [`agent`] runs the instruction-driven tool-calling loop
//! - [`comeback`] is the request model, prompt and agent configuration
//! - [`api`] serves the HTML form and JSON endpoint

// Re-export for convenience
pub use async_trait::async_trait;

use serde::{Deserialize, Serialize};

/// Instruction-driven agent that can call tools
pub mod agent;

/// Backend implementations for the hosted LLM
pub mod backends;

/// Builder pattern for configuring LLM providers and tool definitions
pub mod builder;

/// Chat-based interactions with language models
pub mod chat;

/// Comeback request model, prompt construction and agent configuration
pub mod comeback;

/// Runtime settings resolved from flags, environment and the secret store
pub mod config;

/// Error types and handling
pub mod error;

/// Retry wrapper for chat providers
pub mod resilient_llm;

/// Secret store for storing API keys
pub mod secret_store;

/// Tools the agent can call
pub mod tools;

#[cfg(feature = "api")]
pub mod api;

#[inline]
/// Initialize logging using env_logger if the "logging" feature is enabled.
/// This is a no-op if the feature is not enabled.
pub fn init_logging() {
    #[cfg(feature = "logging")]
    {
        let _ = env_logger::try_init();
    }
}

/// Tool call represents a function call that an LLM wants to make.
#[derive(Debug, Deserialize, Serialize, Clone, Eq, PartialEq)]
pub struct ToolCall {
    /// The ID of the tool call.
    pub id: String,
    /// The type of the tool call (usually "function").
    #[serde(rename = "type")]
    pub call_type: String,
    /// The function to call.
    pub function: FunctionCall,
}

/// FunctionCall contains details about which function to call and with what arguments.
#[derive(Debug, Deserialize, Serialize, Clone, Eq, PartialEq)]
pub struct FunctionCall {
    /// The name of the function to call.
    pub name: String,
    /// The arguments to pass to the function, typically serialized as a JSON string.
    pub arguments: String,
}

impl std::fmt::Display for ToolCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{{\n  \"id\": \"{}\",\n  \"type\": \"{}\",\n  \"function\": {}\n}}",
            self.id, self.call_type, self.function
        )
    }
}

impl std::fmt::Display for FunctionCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{{\n  \"name\": \"{}\",\n  \"arguments\": {}\n}}",
            self.name, self.arguments
        )
    }
}
