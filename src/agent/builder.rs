//! Agent builder for creating tool-calling LLM agents.

use super::Agent;
use crate::{
    builder::LLMBuilder,
    chat::ChatProvider,
    error::LLMError,
    tools::Toolkit,
};

/// Tool calls allowed per run unless configured otherwise.
pub const DEFAULT_TOOL_CALL_LIMIT: usize = 3;

/// Builder for creating agents.
///
/// AgentBuilder provides a clean interface for creating agents that:
/// - Carry a description and a list of instructions as their system prompt
/// - Offer a toolkit to the model and execute its calls
/// - Cap the number of tool calls per run
pub struct AgentBuilder {
    llm_builder: Option<LLMBuilder>,
    provider: Option<Box<dyn ChatProvider>>,
    name: String,
    description: Option<String>,
    instructions: Vec<String>,
    tool_call_limit: usize,
    toolkit: Option<Box<dyn Toolkit>>,
}

impl AgentBuilder {
    /// Creates a new AgentBuilder instance.
    pub fn new() -> Self {
        Self {
            llm_builder: None,
            provider: None,
            name: "Agent".to_string(),
            description: None,
            instructions: Vec::new(),
            tool_call_limit: DEFAULT_TOOL_CALL_LIMIT,
            toolkit: None,
        }
    }

    /// Sets the agent's name, used in logs and errors.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the persona description that opens the system prompt.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Appends one instruction.
    pub fn instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instructions.push(instruction.into());
        self
    }

    /// Appends several instructions in order.
    pub fn instructions<I, S>(mut self, instructions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.instructions
            .extend(instructions.into_iter().map(Into::into));
        self
    }

    /// Sets the maximum number of tool calls executed per run.
    pub fn tool_call_limit(mut self, limit: usize) -> Self {
        self.tool_call_limit = limit;
        self
    }

    /// Sets the underlying LLM configuration.
    pub fn llm(mut self, llm_builder: LLMBuilder) -> Self {
        self.llm_builder = Some(llm_builder);
        self
    }

    /// Uses an already constructed chat provider instead of an [`LLMBuilder`].
    pub fn provider(mut self, provider: impl ChatProvider + 'static) -> Self {
        self.provider = Some(Box::new(provider));
        self
    }

    /// Sets the tools offered to the model.
    pub fn toolkit(mut self, toolkit: impl Toolkit + 'static) -> Self {
        self.toolkit = Some(Box::new(toolkit));
        self
    }

    /// Builds the agent.
    ///
    /// # Errors
    ///
    /// Returns an error if no LLM is configured or its configuration is invalid.
    pub fn build(self) -> Result<Agent, LLMError> {
        let llm = match (self.provider, self.llm_builder) {
            (Some(provider), _) => provider,
            (None, Some(builder)) => builder.build()?,
            (None, None) => {
                return Err(LLMError::InvalidRequest(format!(
                    "No LLM configured for agent {}",
                    self.name
                )))
            }
        };

        Ok(Agent {
            name: self.name,
            description: self.description,
            instructions: self.instructions,
            tool_call_limit: self.tool_call_limit,
            llm,
            toolkit: self.toolkit,
        })
    }
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_requires_an_llm() {
        let err = AgentBuilder::new().name("Lonely").build().err().unwrap();
        assert!(err.to_string().contains("Lonely"));
    }

    #[test]
    fn builds_from_llm_builder() {
        let agent = AgentBuilder::new()
            .llm(LLMBuilder::new().api_key("sk-test"))
            .instructions(["one", "two"])
            .build()
            .unwrap();
        assert_eq!(agent.tool_call_limit(), DEFAULT_TOOL_CALL_LIMIT);
        assert_eq!(agent.system_prompt(), "## Instructions\n- one\n- two");
    }
}
