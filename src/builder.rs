//! Builder module for configuring LLM providers and tool definitions.
//!
//! [`LLMBuilder`] assembles the hosted chat backend (optionally wrapped with
//! retries) and [`FunctionBuilder`]/[`ParamBuilder`] describe the functions a
//! model may call.

use crate::{
    backends::openai::OpenAI,
    chat::{ChatProvider, FunctionTool, ParameterProperty, ParametersSchema, Tool, ToolChoice},
    error::LLMError,
    resilient_llm::{ResilienceConfig, ResilientLLM},
};
use std::collections::HashMap;

/// Builder for configuring and instantiating the chat provider.
///
/// Provides a fluent interface for setting various configuration options
/// like model selection, API keys, generation parameters, etc.
#[derive(Default)]
pub struct LLMBuilder {
    /// API key for authentication with the provider
    api_key: Option<String>,
    /// Base URL for API requests
    base_url: Option<String>,
    /// Model identifier/name to use
    model: Option<String>,
    /// Maximum tokens to generate in responses
    max_tokens: Option<u32>,
    /// Temperature parameter for controlling response randomness (0.0-1.0)
    temperature: Option<f32>,
    /// System prompt/context to guide model behavior
    system: Option<String>,
    /// Request timeout duration in seconds
    timeout_seconds: Option<u64>,
    /// How the model may use the tools it is offered
    tool_choice: Option<ToolChoice>,
    /// Retry transient failures
    resilient: bool,
    resilient_attempts: Option<usize>,
    resilient_backoff: Option<(u64, u64)>,
}

impl LLMBuilder {
    /// Creates a new empty builder instance with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key for authentication.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the base URL for API requests.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the model identifier to use.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the maximum number of tokens to generate.
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Sets the temperature for controlling response randomness (0.0-1.0).
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Sets the system prompt/context.
    pub fn system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Sets the request timeout in seconds.
    pub fn timeout_seconds(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = Some(timeout_seconds);
        self
    }

    /// Sets the tool choice sent alongside tool definitions.
    pub fn tool_choice(mut self, choice: ToolChoice) -> Self {
        self.tool_choice = Some(choice);
        self
    }

    /// Enables retrying transient failures with exponential backoff.
    pub fn resilient(mut self, enabled: bool) -> Self {
        self.resilient = enabled;
        self
    }

    /// Sets the maximum number of attempts, including the first one.
    pub fn resilient_attempts(mut self, attempts: usize) -> Self {
        self.resilient_attempts = Some(attempts);
        self
    }

    /// Sets the base and maximum backoff delays in milliseconds.
    pub fn resilient_backoff(mut self, base_delay_ms: u64, max_delay_ms: u64) -> Self {
        self.resilient_backoff = Some((base_delay_ms, max_delay_ms));
        self
    }

    /// Builds and returns a configured chat provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is missing or the base URL is invalid.
    pub fn build(self) -> Result<Box<dyn ChatProvider>, LLMError> {
        let key = self.api_key.ok_or_else(|| {
            LLMError::InvalidRequest("No API key provided for OpenAI".to_string())
        })?;

        let openai = OpenAI::new(
            key,
            self.base_url,
            self.model,
            self.max_tokens,
            self.temperature,
            self.timeout_seconds,
            self.system,
            self.tool_choice,
        )?;

        if !self.resilient {
            return Ok(Box::new(openai));
        }

        let mut cfg = ResilienceConfig::defaults();
        if let Some(attempts) = self.resilient_attempts {
            cfg.max_attempts = attempts.max(1);
        }
        if let Some((base, max)) = self.resilient_backoff {
            cfg.base_delay_ms = base;
            cfg.max_delay_ms = max;
        }
        Ok(Box::new(ResilientLLM::new(Box::new(openai), cfg)))
    }
}

/// Builder for function parameters
pub struct ParamBuilder {
    name: String,
    property_type: String,
    description: String,
}

impl ParamBuilder {
    /// Creates a new parameter builder
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            property_type: "string".to_string(),
            description: String::new(),
        }
    }

    /// Sets the parameter type
    pub fn type_of(mut self, type_str: impl Into<String>) -> Self {
        self.property_type = type_str.into();
        self
    }

    /// Sets the parameter description
    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    fn build(self) -> (String, ParameterProperty) {
        (
            self.name,
            ParameterProperty {
                property_type: self.property_type,
                description: self.description,
            },
        )
    }
}

/// Builder for function tools
pub struct FunctionBuilder {
    name: String,
    description: String,
    parameters: Vec<ParamBuilder>,
    required: Vec<String>,
}

impl FunctionBuilder {
    /// Creates a new function builder
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            parameters: Vec::new(),
            required: Vec::new(),
        }
    }

    /// Sets the function description
    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    /// Adds a parameter to the function
    pub fn param(mut self, param: ParamBuilder) -> Self {
        self.parameters.push(param);
        self
    }

    /// Marks parameters as required
    pub fn required(mut self, param_names: Vec<String>) -> Self {
        self.required = param_names;
        self
    }

    /// Builds the function tool
    pub fn build(self) -> Tool {
        let mut properties = HashMap::new();
        for param in self.parameters {
            let (name, prop) = param.build();
            properties.insert(name, prop);
        }

        Tool {
            tool_type: "function".to_string(),
            function: FunctionTool {
                name: self.name,
                description: self.description,
                parameters: ParametersSchema {
                    schema_type: "object".to_string(),
                    properties,
                    required: self.required,
                },
            },
        }
    }
}
