//! Server module exposing the comeback agent over HTTP
//!
//! Serves a small HTML form for people and a JSON endpoint for programs.
//! Supports optional bearer authentication on the JSON endpoint and CORS.

mod handlers;
mod page;
mod types;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::agent::Agent;
use handlers::{handle_api_comeback, handle_form, handle_health, handle_index};

pub use page::render_markdown;
pub use types::{ComebackApiRequest, ComebackApiResponse, ComebackForm};

/// Main server struct holding the agent and authentication settings
pub struct Server {
    agent: Arc<Agent>,
    /// Optional authentication key for JSON API requests
    pub auth_key: Option<String>,
}

/// Internal server state shared between request handlers
#[derive(Clone)]
struct ServerState {
    agent: Arc<Agent>,
    auth_key: Option<String>,
}

impl Server {
    /// Creates a new server around the given agent
    pub fn new(agent: Agent) -> Self {
        Self {
            agent: Arc::new(agent),
            auth_key: None,
        }
    }

    /// Sets the authentication key required for JSON API requests
    ///
    /// # Arguments
    /// * `key` - API key that clients must provide in Authorization header
    pub fn with_auth_key(mut self, key: impl Into<String>) -> Self {
        self.auth_key = Some(key.into());
        self
    }

    /// Builds the application router
    pub fn router(self) -> Router {
        Router::new()
            .route("/", get(handle_index))
            .route("/comeback", post(handle_form))
            .route("/v1/comeback", post(handle_api_comeback))
            .route("/health", get(handle_health))
            .layer(CorsLayer::permissive())
            .with_state(ServerState {
                agent: self.agent,
                auth_key: self.auth_key,
            })
    }

    /// Starts the server and listens for requests on the specified address
    ///
    /// # Arguments
    /// * `addr` - Address to bind to (e.g. "127.0.0.1:8501")
    pub async fn run(self, addr: &str) -> Result<(), crate::error::LLMError> {
        let app = self.router();

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| crate::error::LLMError::InvalidRequest(e.to_string()))?;

        log::info!("listening on http://{addr}");

        axum::serve(listener, app)
            .await
            .map_err(|e| crate::error::LLMError::Generic(e.to_string()))?;

        Ok(())
    }
}
