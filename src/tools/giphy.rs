//! GIF search through the Giphy API.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::Toolkit;
use crate::{
    builder::{FunctionBuilder, ParamBuilder},
    chat::Tool,
    error::LLMError,
    ToolCall,
};

/// Default base URL of the Giphy API
pub const DEFAULT_BASE_URL: &str = "https://api.giphy.com";

/// Name of the search function exposed to the model
pub const SEARCH_GIFS: &str = "search_gifs";

const SEARCH_ENDPOINT: &str = "v1/gifs/search";

/// Toolkit exposing `search_gifs` backed by Giphy.
pub struct GiphyTools {
    api_key: String,
    base_url: String,
    limit: u32,
    timeout_seconds: Option<u64>,
    client: Client,
}

#[derive(Deserialize, Debug)]
struct GiphySearchResponse {
    #[serde(default)]
    data: Vec<GiphyGif>,
}

#[derive(Deserialize, Debug)]
struct GiphyGif {
    url: Option<String>,
    images: Option<GiphyImages>,
}

#[derive(Deserialize, Debug)]
struct GiphyImages {
    original: Option<GiphyRendition>,
}

#[derive(Deserialize, Debug)]
struct GiphyRendition {
    url: Option<String>,
}

impl GiphyGif {
    /// Direct media URL when present, otherwise the GIF page.
    fn into_url(self) -> Option<String> {
        self.images
            .and_then(|i| i.original)
            .and_then(|o| o.url)
            .or(self.url)
    }
}

#[derive(Deserialize, Debug)]
struct SearchArgs {
    query: String,
}

impl GiphyTools {
    /// Creates a toolkit that talks to the public Giphy API and returns one GIF per search.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            limit: 1,
            timeout_seconds: None,
            client: Client::new(),
        }
    }

    /// Points the toolkit at another host, e.g. a local mock.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets how many GIFs a search returns.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit.max(1);
        self
    }

    /// Sets the request timeout in seconds.
    pub fn timeout_seconds(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = Some(timeout_seconds);
        self
    }

    /// Searches Giphy and returns GIF URLs, best match first.
    pub async fn search_gifs(&self, query: &str) -> Result<Vec<String>, LLMError> {
        if self.api_key.is_empty() {
            return Err(LLMError::AuthError("Missing Giphy API key".to_string()));
        }

        let url = format!("{}/{SEARCH_ENDPOINT}", self.base_url);
        let limit = self.limit.to_string();
        let mut request = self.client.get(url).query(&[
            ("api_key", self.api_key.as_str()),
            ("q", query),
            ("limit", limit.as_str()),
        ]);

        if let Some(timeout) = self.timeout_seconds {
            request = request.timeout(std::time::Duration::from_secs(timeout));
        }

        let response = request.send().await?;

        log::debug!("Giphy HTTP status: {}", response.status());

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(LLMError::ResponseFormatError {
                message: format!("Giphy API returned error status: {status}"),
                raw_response: error_text,
            });
        }

        let resp_text = response.text().await?;
        let body: GiphySearchResponse =
            serde_json::from_str(&resp_text).map_err(|e| LLMError::ResponseFormatError {
                message: format!("Failed to decode Giphy API response: {e}"),
                raw_response: resp_text.clone(),
            })?;

        Ok(body
            .data
            .into_iter()
            .filter_map(GiphyGif::into_url)
            .collect())
    }
}

#[async_trait]
impl Toolkit for GiphyTools {
    fn tools(&self) -> Vec<Tool> {
        vec![FunctionBuilder::new(SEARCH_GIFS)
            .description("Find GIFs about a specific query. Returns a list of GIF URLs.")
            .param(
                ParamBuilder::new("query")
                    .type_of("string")
                    .description("The text to search for"),
            )
            .required(vec!["query".to_string()])
            .build()]
    }

    async fn call(&self, call: &ToolCall) -> Result<String, LLMError> {
        if call.function.name != SEARCH_GIFS {
            return Err(LLMError::ToolConfigError(format!(
                "Unknown tool: {}",
                call.function.name
            )));
        }

        let args: SearchArgs = serde_json::from_str(&call.function.arguments).map_err(|e| {
            LLMError::InvalidRequest(format!("Invalid {SEARCH_GIFS} arguments: {e}"))
        })?;

        let urls = self.search_gifs(&args.query).await?;
        Ok(serde_json::to_string(&urls)?)
    }
}
