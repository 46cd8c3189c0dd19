//! Tools an agent can call while answering.

use async_trait::async_trait;

use crate::{chat::Tool, error::LLMError, ToolCall};

pub mod giphy;

pub use giphy::GiphyTools;

/// A set of callable functions offered to the model.
#[async_trait]
pub trait Toolkit: Send + Sync {
    /// Function definitions advertised to the model.
    fn tools(&self) -> Vec<Tool>;

    /// Executes one tool call and returns its JSON-encoded result.
    async fn call(&self, call: &ToolCall) -> Result<String, LLMError>;
}
