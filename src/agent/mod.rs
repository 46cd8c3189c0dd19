//! Agent module: an instruction-driven tool-calling loop around a chat provider.
//!
//! An [`Agent`] frames every run with a system prompt built from its
//! description and instructions, offers its toolkit to the model, executes
//! the calls the model makes (up to a limit) and returns the model's final
//! text.

pub mod builder;

pub use builder::AgentBuilder;

use serde_json::json;

use crate::{
    chat::{ChatMessage, ChatProvider},
    error::LLMError,
    tools::Toolkit,
    FunctionCall, ToolCall,
};

/// Result of one agent run.
#[derive(Debug, Clone)]
pub struct AgentRun {
    /// Final text produced by the model
    pub content: String,
    /// Tool calls that were executed, in order
    pub tool_calls: Vec<ToolCall>,
}

/// An LLM agent with a fixed persona, instructions and toolkit.
pub struct Agent {
    pub(crate) name: String,
    pub(crate) description: Option<String>,
    pub(crate) instructions: Vec<String>,
    pub(crate) tool_call_limit: usize,
    pub(crate) llm: Box<dyn ChatProvider>,
    pub(crate) toolkit: Option<Box<dyn Toolkit>>,
}

impl Agent {
    /// Returns the agent's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Maximum number of tool calls executed per run.
    pub fn tool_call_limit(&self) -> usize {
        self.tool_call_limit
    }

    /// Composes the system prompt from the description and instructions.
    pub fn system_prompt(&self) -> String {
        let mut prompt = String::new();
        if let Some(description) = &self.description {
            prompt.push_str(description.trim());
        }
        if !self.instructions.is_empty() {
            if !prompt.is_empty() {
                prompt.push_str("\n\n");
            }
            prompt.push_str("## Instructions");
            for instruction in &self.instructions {
                prompt.push_str("\n- ");
                prompt.push_str(instruction);
            }
        }
        prompt
    }

    /// Runs the agent on a user prompt until the model answers in text.
    pub async fn run(&self, prompt: &str) -> Result<AgentRun, LLMError> {
        let mut messages = Vec::with_capacity(2);
        let system = self.system_prompt();
        if !system.is_empty() {
            messages.push(ChatMessage::system().content(system).build());
        }
        messages.push(ChatMessage::user().content(prompt).build());

        let tools = self
            .toolkit
            .as_ref()
            .map(|t| t.tools())
            .unwrap_or_default();
        let mut executed: Vec<ToolCall> = Vec::new();

        loop {
            let offered = if tools.is_empty() || executed.len() >= self.tool_call_limit {
                None
            } else {
                Some(tools.as_slice())
            };

            let response = self.llm.chat_with_tools(&messages, offered).await?;
            let text = response.text();
            let calls = response.tool_calls().unwrap_or_default();

            if calls.is_empty() || offered.is_none() {
                if !calls.is_empty() {
                    log::warn!(
                        "{}: ignoring {} tool call(s) requested without tools on offer",
                        self.name,
                        calls.len()
                    );
                }
                let content = text.filter(|t| !t.trim().is_empty()).ok_or_else(|| {
                    LLMError::ProviderError(format!("{} returned no text", self.name))
                })?;
                return Ok(AgentRun {
                    content,
                    tool_calls: executed,
                });
            }

            messages.push(
                ChatMessage::assistant()
                    .tool_use(calls.clone())
                    .content(text.unwrap_or_default())
                    .build(),
            );

            let mut results = Vec::with_capacity(calls.len());
            for call in calls {
                let output = if executed.len() >= self.tool_call_limit {
                    json!({ "error": "tool call limit reached" }).to_string()
                } else {
                    let output = self.execute(&call).await;
                    executed.push(call.clone());
                    output
                };
                results.push(ToolCall {
                    id: call.id,
                    call_type: "function".to_string(),
                    function: FunctionCall {
                        name: call.function.name,
                        arguments: output,
                    },
                });
            }
            messages.push(ChatMessage::user().tool_result(results).build());
        }
    }

    /// Executes one call; failures become a JSON error the model can read.
    async fn execute(&self, call: &ToolCall) -> String {
        log::info!(
            "{}: calling {}({})",
            self.name,
            call.function.name,
            call.function.arguments
        );
        let Some(toolkit) = &self.toolkit else {
            return json!({ "error": "no tools available" }).to_string();
        };
        match toolkit.call(call).await {
            Ok(output) => output,
            Err(e) => {
                log::warn!("{}: tool {} failed: {e}", self.name, call.function.name);
                json!({ "error": e.to_string() }).to_string()
            }
        }
    }
}
