//! Resilience wrapper providing retry with exponential backoff for chat providers.
//!
//! This wrapper retries transient failures with exponential backoff and jitter.
//! It does not retry on permanent errors like authentication or invalid requests.
//! When every attempt fails it returns [`LLMError::RetryExceeded`] carrying the
//! last error.
//!
//! # Example
//!
//! ```no_run
//! use comeback_buddy::builder::LLMBuilder;
//! use comeback_buddy::chat::ChatMessage;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let llm = LLMBuilder::new()
//!         .api_key(std::env::var("OPENAI_API_KEY").unwrap_or_default())
//!         .model("gpt-4o")
//!         .resilient(true)
//!         .resilient_attempts(3)
//!         .resilient_backoff(200, 2_000)
//!         .build()?;
//!
//!     let msgs = [ChatMessage::user().content("Say hi succinctly").build()];
//!     let resp = llm.chat(&msgs).await?;
//!     println!("{}", resp);
//!     Ok(())
//! }
//! ```
use std::time::Duration;

use async_trait::async_trait;
// Deterministic jitter only; no RNG
use tokio::time::sleep;

use crate::chat::{ChatMessage, ChatProvider, ChatResponse, Tool};
use crate::error::LLMError;

/// Configuration for retry and backoff behavior.
#[derive(Clone, Debug)]
pub struct ResilienceConfig {
    /// Maximum number of attempts including the first one
    pub max_attempts: usize,
    /// Initial backoff delay in milliseconds
    pub base_delay_ms: u64,
    /// Maximum backoff delay in milliseconds
    pub max_delay_ms: u64,
    /// Whether to add jitter to backoff delays
    pub jitter: bool,
}

impl ResilienceConfig {
    /// Creates a default configuration with sane values.
    pub fn defaults() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 200,
            max_delay_ms: 2_000,
            jitter: true,
        }
    }
}

/// Resilient wrapper that retries transient failures using exponential backoff.
pub struct ResilientLLM {
    inner: Box<dyn ChatProvider>,
    cfg: ResilienceConfig,
}

impl ResilientLLM {
    /// Creates a new resilient wrapper around an existing provider.
    pub fn new(inner: Box<dyn ChatProvider>, cfg: ResilienceConfig) -> Self {
        Self { inner, cfg }
    }

    fn is_retryable(err: &LLMError) -> bool {
        match err {
            LLMError::HttpError(_) => true,
            LLMError::ProviderError(_) => true,
            LLMError::ResponseFormatError { .. } => true,
            LLMError::JsonError(_) => true,
            LLMError::Generic(_) => true,
            LLMError::RetryExceeded { .. } => false,
            LLMError::AuthError(_) => false,
            LLMError::InvalidRequest(_) => false,
            LLMError::ToolConfigError(_) => false,
            LLMError::ValidationError(_) => false,
        }
    }

    fn backoff_delay(&self, attempt_index: usize) -> u64 {
        let mut delay = self
            .cfg
            .base_delay_ms
            .saturating_mul(1u64 << attempt_index.min(16));
        delay = delay.min(self.cfg.max_delay_ms);
        if self.cfg.jitter {
            let span = (delay / 2).max(1);
            let jitter = ((attempt_index as u64)
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1))
                % span;
            delay = delay.saturating_sub(jitter);
        }
        delay
    }
}

#[async_trait]
impl ChatProvider for ResilientLLM {
    async fn chat_with_tools(
        &self,
        messages: &[ChatMessage],
        tools: Option<&[Tool]>,
    ) -> Result<Box<dyn ChatResponse>, LLMError> {
        let attempts = self.cfg.max_attempts.max(1);
        let mut last_err = String::new();
        for idx in 0..attempts {
            match self.inner.chat_with_tools(messages, tools).await {
                Ok(v) => return Ok(v),
                Err(e) if !Self::is_retryable(&e) => return Err(e),
                Err(e) => {
                    last_err = e.to_string();
                    if idx + 1 < attempts {
                        let delay = self.backoff_delay(idx);
                        log::warn!("chat attempt {} failed, retrying in {delay}ms: {e}", idx + 1);
                        sleep(Duration::from_millis(delay)).await;
                    }
                }
            }
        }
        Err(LLMError::RetryExceeded {
            attempts,
            last_error: last_err,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ToolCall;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Debug)]
    struct Text(String);

    impl std::fmt::Display for Text {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{}", self.0)
        }
    }

    impl ChatResponse for Text {
        fn text(&self) -> Option<String> {
            Some(self.0.clone())
        }
        fn tool_calls(&self) -> Option<Vec<ToolCall>> {
            None
        }
    }

    struct Flaky {
        calls: Arc<AtomicUsize>,
        failures: usize,
        permanent: Option<fn() -> LLMError>,
    }

    #[async_trait]
    impl ChatProvider for Flaky {
        async fn chat_with_tools(
            &self,
            _messages: &[ChatMessage],
            _tools: Option<&[Tool]>,
        ) -> Result<Box<dyn ChatResponse>, LLMError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(err) = self.permanent {
                return Err(err());
            }
            if n < self.failures {
                return Err(LLMError::HttpError("connection reset".into()));
            }
            Ok(Box::new(Text("ok".into())))
        }
    }

    fn fast() -> ResilienceConfig {
        ResilienceConfig {
            max_attempts: 3,
            base_delay_ms: 1,
            max_delay_ms: 2,
            jitter: true,
        }
    }

    fn flaky(calls: &Arc<AtomicUsize>, failures: usize) -> ResilientLLM {
        ResilientLLM::new(
            Box::new(Flaky {
                calls: calls.clone(),
                failures,
                permanent: None,
            }),
            fast(),
        )
    }

    async fn calls_before_giving_up(err: fn() -> LLMError) -> (LLMError, usize) {
        let calls = Arc::new(AtomicUsize::new(0));
        let llm = ResilientLLM::new(
            Box::new(Flaky {
                calls: calls.clone(),
                failures: 0,
                permanent: Some(err),
            }),
            fast(),
        );
        let err = llm.chat(&[]).await.unwrap_err();
        (err, calls.load(Ordering::SeqCst))
    }

    #[tokio::test]
    async fn retries_transient_errors() {
        let calls = Arc::new(AtomicUsize::new(0));
        let resp = flaky(&calls, 2).chat(&[]).await.unwrap();
        assert_eq!(resp.text().as_deref(), Some("ok"));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let calls = Arc::new(AtomicUsize::new(0));
        let err = flaky(&calls, 10).chat(&[]).await.unwrap_err();
        match err {
            LLMError::RetryExceeded {
                attempts,
                last_error,
            } => {
                assert_eq!(attempts, 3);
                assert!(last_error.contains("connection reset"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn auth_errors_are_not_retried() {
        let (err, calls) = calls_before_giving_up(|| LLMError::AuthError("bad key".into())).await;
        assert!(matches!(err, LLMError::AuthError(_)));
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn tool_config_errors_are_not_retried() {
        let (err, calls) =
            calls_before_giving_up(|| LLMError::ToolConfigError("unknown tool".into())).await;
        assert!(matches!(err, LLMError::ToolConfigError(_)));
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn invalid_requests_are_not_retried() {
        let (err, calls) =
            calls_before_giving_up(|| LLMError::InvalidRequest("bad model".into())).await;
        assert!(matches!(err, LLMError::InvalidRequest(_)));
        assert_eq!(calls, 1);
    }

    #[test]
    fn backoff_is_capped() {
        let llm = ResilientLLM::new(
            Box::new(Flaky {
                calls: Arc::new(AtomicUsize::new(0)),
                failures: 0,
                permanent: None,
            }),
            ResilienceConfig {
                jitter: false,
                ..ResilienceConfig::defaults()
            },
        );
        assert_eq!(llm.backoff_delay(0), 200);
        assert_eq!(llm.backoff_delay(1), 400);
        assert_eq!(llm.backoff_delay(10), 2_000);
    }
}
