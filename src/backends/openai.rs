//! OpenAI API client implementation
//!
//! Speaks the Chat Completions protocol, including function tool calls and
//! tool results.

use crate::{
    chat::{
        ChatMessage, ChatProvider, ChatResponse, ChatRole, MessageType, Tool, ToolChoice, Usage,
    },
    error::LLMError,
    ToolCall,
};
use async_trait::async_trait;
use either::*;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

const PROVIDER_NAME: &str = "OpenAI";

/// Default base URL of the OpenAI API
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1/";

/// Model used when none is configured
pub const DEFAULT_MODEL: &str = "gpt-4o";

const CHAT_ENDPOINT: &str = "chat/completions";

/// Client for OpenAI's chat completions API
pub struct OpenAI {
    pub api_key: String,
    pub base_url: Url,
    pub model: String,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub system: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub tool_choice: Option<ToolChoice>,
    client: Client,
}

#[derive(Serialize, Debug)]
struct OpenAIChatMessage<'a> {
    role: &'a str,
    #[serde(
        skip_serializing_if = "Option::is_none",
        with = "either::serde_untagged_optional"
    )]
    content: Option<Either<Vec<MessageContent<'a>>, &'a str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<OpenAIFunctionCall<'a>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<&'a str>,
}

#[derive(Serialize, Debug)]
struct MessageContent<'a> {
    #[serde(rename = "type")]
    message_type: &'a str,
    text: &'a str,
}

#[derive(Serialize, Debug)]
struct OpenAIFunctionPayload<'a> {
    name: &'a str,
    arguments: &'a str,
}

#[derive(Serialize, Debug)]
struct OpenAIFunctionCall<'a> {
    id: &'a str,
    #[serde(rename = "type")]
    content_type: &'a str,
    function: OpenAIFunctionPayload<'a>,
}

#[derive(Serialize, Debug)]
struct OpenAIChatRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAIChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<&'a [Tool]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'a ToolChoice>,
}

/// Chat completions response body
#[derive(Deserialize, Debug)]
pub struct OpenAIChatResponse {
    choices: Vec<OpenAIChatChoice>,
    usage: Option<Usage>,
}

#[derive(Deserialize, Debug)]
struct OpenAIChatChoice {
    message: OpenAIChatMsg,
}

#[derive(Deserialize, Debug)]
struct OpenAIChatMsg {
    content: Option<String>,
    tool_calls: Option<Vec<ToolCall>>,
}

impl ChatResponse for OpenAIChatResponse {
    fn text(&self) -> Option<String> {
        self.choices.first().and_then(|c| c.message.content.clone())
    }

    fn tool_calls(&self) -> Option<Vec<ToolCall>> {
        self.choices
            .first()
            .and_then(|c| c.message.tool_calls.clone())
    }

    fn usage(&self) -> Option<Usage> {
        self.usage.clone()
    }
}

impl std::fmt::Display for OpenAIChatResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let Some(choice) = self.choices.first() else {
            return Ok(());
        };
        if let Some(tool_calls) = &choice.message.tool_calls {
            for tool_call in tool_calls {
                write!(f, "{tool_call}")?;
            }
        }
        if let Some(content) = &choice.message.content {
            write!(f, "{content}")?;
        }
        Ok(())
    }
}

impl OpenAI {
    /// Creates a new OpenAI client with the specified configuration.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        api_key: impl Into<String>,
        base_url: Option<String>,
        model: Option<String>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
        timeout_seconds: Option<u64>,
        system: Option<String>,
        tool_choice: Option<ToolChoice>,
    ) -> Result<Self, LLMError> {
        let mut base = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_owned());
        // Url::join drops the last segment unless the base ends with '/'.
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)
            .map_err(|e| LLMError::InvalidRequest(format!("Invalid base URL {base}: {e}")))?;

        Ok(Self {
            api_key: api_key.into(),
            base_url,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            max_tokens,
            temperature,
            system,
            timeout_seconds,
            tool_choice,
            client: Client::new(),
        })
    }
}

#[async_trait]
impl ChatProvider for OpenAI {
    async fn chat_with_tools(
        &self,
        messages: &[ChatMessage],
        tools: Option<&[Tool]>,
    ) -> Result<Box<dyn ChatResponse>, LLMError> {
        if self.api_key.is_empty() {
            return Err(LLMError::AuthError("Missing OpenAI API key".to_string()));
        }

        let mut openai_msgs: Vec<OpenAIChatMessage> = vec![];

        if let Some(system) = &self.system {
            openai_msgs.push(OpenAIChatMessage {
                role: "system",
                content: Some(Left(vec![MessageContent {
                    message_type: "text",
                    text: system,
                }])),
                tool_calls: None,
                tool_call_id: None,
            });
        }

        for msg in messages {
            if let MessageType::ToolResult(ref results) = msg.message_type {
                for result in results {
                    openai_msgs.push(OpenAIChatMessage {
                        role: "tool",
                        tool_call_id: Some(&result.id),
                        tool_calls: None,
                        content: Some(Right(&result.function.arguments)),
                    });
                }
            } else {
                openai_msgs.push(chat_message_to_api_message(msg));
            }
        }

        let request_tools = tools.filter(|t| !t.is_empty());
        let request_tool_choice = if request_tools.is_some() {
            self.tool_choice.as_ref()
        } else {
            None
        };

        let body = OpenAIChatRequest {
            model: &self.model,
            messages: openai_msgs,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            stream: false,
            tools: request_tools,
            tool_choice: request_tool_choice,
        };

        let url = self
            .base_url
            .join(CHAT_ENDPOINT)
            .map_err(|e| LLMError::HttpError(e.to_string()))?;

        let mut request = self.client.post(url).bearer_auth(&self.api_key).json(&body);

        if log::log_enabled!(log::Level::Trace) {
            if let Ok(json) = serde_json::to_string(&body) {
                log::trace!("{PROVIDER_NAME} request payload: {json}");
            }
        }

        if let Some(timeout) = self.timeout_seconds {
            request = request.timeout(std::time::Duration::from_secs(timeout));
        }

        let response = request.send().await?;

        log::debug!("{PROVIDER_NAME} HTTP status: {}", response.status());

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(LLMError::ResponseFormatError {
                message: format!("{PROVIDER_NAME} API returned error status: {status}"),
                raw_response: error_text,
            });
        }

        let resp_text = response.text().await?;
        match serde_json::from_str::<OpenAIChatResponse>(&resp_text) {
            Ok(response) => {
                if let Some(usage) = &response.usage {
                    log::debug!(
                        "{PROVIDER_NAME} usage: prompt={} completion={} total={}",
                        usage.prompt_tokens,
                        usage.completion_tokens,
                        usage.total_tokens
                    );
                }
                Ok(Box::new(response))
            }
            Err(e) => Err(LLMError::ResponseFormatError {
                message: format!("Failed to decode {PROVIDER_NAME} API response: {e}"),
                raw_response: resp_text,
            }),
        }
    }
}

fn chat_message_to_api_message(chat_msg: &ChatMessage) -> OpenAIChatMessage<'_> {
    OpenAIChatMessage {
        role: match chat_msg.role {
            ChatRole::System => "system",
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        },
        tool_call_id: None,
        content: match &chat_msg.message_type {
            MessageType::Text => Some(Right(chat_msg.content.as_str())),
            // Assistant text that accompanies a tool call is optional.
            MessageType::ToolUse(_) if chat_msg.content.is_empty() => None,
            MessageType::ToolUse(_) => Some(Right(chat_msg.content.as_str())),
            MessageType::ToolResult(_) => None,
        },
        tool_calls: match &chat_msg.message_type {
            MessageType::ToolUse(calls) => Some(
                calls
                    .iter()
                    .map(|c| OpenAIFunctionCall {
                        id: &c.id,
                        content_type: "function",
                        function: OpenAIFunctionPayload {
                            name: &c.function.name,
                            arguments: &c.function.arguments,
                        },
                    })
                    .collect(),
            ),
            _ => None,
        },
    }
}
