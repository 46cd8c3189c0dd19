//! Comeback requests: style choices, prompt construction and the agent that answers them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{
    agent::{Agent, AgentBuilder, AgentRun},
    builder::LLMBuilder,
    error::LLMError,
    tools::GiphyTools,
};

/// Name the comeback agent reports in logs.
pub const AGENT_NAME: &str = "Chat Comeback Agent";

/// Tool calls allowed per comeback.
pub const TOOL_CALL_LIMIT: usize = 3;

const AGENT_DESCRIPTION: &str = "
    You are a witty conversation assistant. Your job is to interpret a given chat snippet,
    understand the intended tone and intensity, craft a clever comeback message,
    and return the most fitting GIF to go with it.
";

const AGENT_INSTRUCTIONS: [&str; 12] = [
    "Read the user's chat message and comeback preferences (tone and intensity).",
    "Write a short, funny, and clever text-only comeback response.",
    "Summarize the comeback into a **GIF search query no longer than 8–10 words**.",
    "The query must be **brief, expressive, and under 10 words**.",
    "Do **not** include the full chat in the search query — use only the core idea or emotion.",
    "Use the `search_gifs` tool to find the most relevant GIF using this query.",
    "Format the entire output in Markdown as follows:",
    "- Convert the original chat into clean, readable Markdown (e.g., `**Alice**: Hello`, one line per message).",
    "- Append the comeback as a new line in **exactly the same style** as the original chat format (same speaker style and spacing).",
    "- Add a blank line after the comeback.",
    "- Include the GIF in Markdown format on a new line: `![gif](URL)`.",
    "Output only the final Markdown-formatted conversation. Do not include any commentary, reasoning, or explanation.",
];

/// The kind of comeback to aim for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tone {
    #[default]
    Witty,
    Sarcastic,
    Savage,
    Friendly,
    Random,
}

impl Tone {
    /// Every tone, in display order.
    pub const ALL: [Tone; 5] = [
        Tone::Witty,
        Tone::Sarcastic,
        Tone::Savage,
        Tone::Friendly,
        Tone::Random,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Tone::Witty => "Witty and playful",
            Tone::Sarcastic => "Sarcastic and dry",
            Tone::Savage => "Savage and bold",
            Tone::Friendly => "Friendly and light",
            Tone::Random => "Random and silly",
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            Tone::Witty => "witty",
            Tone::Sarcastic => "sarcastic",
            Tone::Savage => "savage",
            Tone::Friendly => "friendly",
            Tone::Random => "random",
        }
    }
}

/// How strong the comeback should be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Intensity {
    #[default]
    LowKey,
    Balanced,
    HighImpact,
}

impl Intensity {
    /// Every intensity, in display order.
    pub const ALL: [Intensity; 3] = [
        Intensity::LowKey,
        Intensity::Balanced,
        Intensity::HighImpact,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Intensity::LowKey => "Low-key and subtle",
            Intensity::Balanced => "Balanced and clever",
            Intensity::HighImpact => "High-impact and punchy",
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            Intensity::LowKey => "low-key",
            Intensity::Balanced => "balanced",
            Intensity::HighImpact => "high-impact",
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for Intensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Accepts the slug or the display label, case-insensitively.
impl FromStr for Tone {
    type Err = LLMError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Tone::ALL
            .into_iter()
            .find(|t| t.slug().eq_ignore_ascii_case(wanted) || t.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| LLMError::InvalidRequest(format!("Unknown tone: {s}")))
    }
}

/// Accepts the slug or the display label, case-insensitively.
impl FromStr for Intensity {
    type Err = LLMError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Intensity::ALL
            .into_iter()
            .find(|i| i.slug().eq_ignore_ascii_case(wanted) || i.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| LLMError::InvalidRequest(format!("Unknown intensity: {s}")))
    }
}

/// A chat snippet and the style of comeback wanted for it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ComebackRequest {
    pub chat_text: String,
    pub tone: Tone,
    pub intensity: Intensity,
}

impl ComebackRequest {
    pub fn new(chat_text: impl Into<String>, tone: Tone, intensity: Intensity) -> Self {
        Self {
            chat_text: chat_text.into(),
            tone,
            intensity,
        }
    }

    /// Rejects requests with nothing to respond to.
    pub fn validate(&self) -> Result<(), LLMError> {
        if self.chat_text.trim().is_empty() {
            return Err(LLMError::ValidationError(
                "Please paste a chat snippet to respond to.".to_string(),
            ));
        }
        Ok(())
    }

    /// The user prompt sent to the agent.
    pub fn prompt(&self) -> String {
        format!(
            "Chat snippet:\n{}\n\nComeback tone: {}\nIntensity: {}\n\nGenerate a witty comeback based on these inputs.",
            self.chat_text,
            self.tone.label(),
            self.intensity.label()
        )
    }
}

/// Configures the comeback agent on top of an LLM configuration and a GIF toolkit.
pub fn comeback_agent(llm: LLMBuilder, gifs: GiphyTools) -> Result<Agent, LLMError> {
    comeback_agent_builder().llm(llm).toolkit(gifs).build()
}

/// The comeback persona and instructions, without an LLM or toolkit attached.
pub fn comeback_agent_builder() -> AgentBuilder {
    AgentBuilder::new()
        .name(AGENT_NAME)
        .description(AGENT_DESCRIPTION)
        .instructions(AGENT_INSTRUCTIONS)
        .tool_call_limit(TOOL_CALL_LIMIT)
}

/// Validates the request, runs the agent and returns its Markdown transcript.
///
/// The trimmed Markdown is in [`AgentRun::content`]; [`AgentRun::tool_calls`]
/// lists the GIF searches the agent made on the way.
pub async fn generate_comeback(
    agent: &Agent,
    request: &ComebackRequest,
) -> Result<AgentRun, LLMError> {
    request.validate()?;
    log::info!(
        "generating comeback: tone={}, intensity={}, {} chars",
        request.tone.slug(),
        request.intensity.slug(),
        request.chat_text.len()
    );
    let mut run = agent.run(&request.prompt()).await?;
    run.content = run.content.trim().to_string();
    Ok(run)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_matches_expected_layout() {
        let request = ComebackRequest::new(
            "Yeah sure, like that plan ever works 😏",
            Tone::Sarcastic,
            Intensity::HighImpact,
        );
        assert_eq!(
            request.prompt(),
            "Chat snippet:\nYeah sure, like that plan ever works 😏\n\n\
             Comeback tone: Sarcastic and dry\nIntensity: High-impact and punchy\n\n\
             Generate a witty comeback based on these inputs."
        );
    }

    #[test]
    fn blank_snippet_is_rejected() {
        let err = ComebackRequest::new(" \n\t", Tone::default(), Intensity::default())
            .validate()
            .unwrap_err();
        assert_eq!(err.to_string(), "Please paste a chat snippet to respond to.");
        assert!(ComebackRequest::new("hi", Tone::Witty, Intensity::LowKey)
            .validate()
            .is_ok());
    }

    #[test]
    fn parses_slugs_and_labels() {
        assert_eq!("savage".parse::<Tone>().unwrap(), Tone::Savage);
        assert_eq!("Friendly and light".parse::<Tone>().unwrap(), Tone::Friendly);
        assert_eq!(" RANDOM ".parse::<Tone>().unwrap(), Tone::Random);
        assert_eq!("high-impact".parse::<Intensity>().unwrap(), Intensity::HighImpact);
        assert_eq!(
            "balanced and clever".parse::<Intensity>().unwrap(),
            Intensity::Balanced
        );
        assert!("spicy".parse::<Tone>().is_err());
        assert!("".parse::<Intensity>().is_err());
    }

    #[test]
    fn defaults_are_first_choices() {
        assert_eq!(Tone::default(), Tone::ALL[0]);
        assert_eq!(Intensity::default(), Intensity::ALL[0]);
    }

    #[test]
    fn serde_uses_slugs() {
        assert_eq!(serde_json::to_string(&Intensity::LowKey).unwrap(), "\"low-key\"");
        assert_eq!(
            serde_json::from_str::<Tone>("\"sarcastic\"").unwrap(),
            Tone::Sarcastic
        );
    }

    #[test]
    fn agent_carries_persona_and_limit() {
        let agent = comeback_agent(
            LLMBuilder::new().api_key("sk-test"),
            GiphyTools::new("giphy-key"),
        )
        .unwrap();
        assert_eq!(agent.name(), AGENT_NAME);
        assert_eq!(agent.tool_call_limit(), 3);
        let prompt = agent.system_prompt();
        assert!(prompt.starts_with("You are a witty conversation assistant."));
        assert!(prompt.contains("- Use the `search_gifs` tool"));
        assert!(prompt.ends_with("Do not include any commentary, reasoning, or explanation."));
    }
}
