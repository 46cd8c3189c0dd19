use serde::{Deserialize, Serialize};

use crate::comeback::{Intensity, Tone};

/// Fields posted by the HTML form
#[derive(Deserialize, Debug, Default)]
pub struct ComebackForm {
    /// Pasted chat snippet
    #[serde(default)]
    pub chat_text: String,
    /// Tone slug or label
    #[serde(default)]
    pub tone: String,
    /// Intensity slug or label
    #[serde(default)]
    pub intensity: String,
}

/// Request payload for the JSON comeback endpoint
#[derive(Deserialize, Debug)]
pub struct ComebackApiRequest {
    /// Pasted chat snippet
    pub chat_text: String,
    /// Comeback tone, defaults to witty
    #[serde(default)]
    pub tone: Option<String>,
    /// Comeback intensity, defaults to low-key
    #[serde(default)]
    pub intensity: Option<String>,
}

/// Response payload from the JSON comeback endpoint
#[derive(Serialize, Debug)]
pub struct ComebackApiResponse {
    /// Unique identifier for this comeback
    pub id: String,
    /// Unix timestamp when the response was created
    pub created: i64,
    /// Tone actually used
    pub tone: Tone,
    /// Intensity actually used
    pub intensity: Intensity,
    /// Markdown transcript with the comeback and GIF appended
    pub markdown: String,
    /// Names of the tools the agent called
    pub tool_calls: Vec<String>,
}
