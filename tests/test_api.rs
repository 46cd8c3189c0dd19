#![cfg(feature = "api")]

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use comeback_buddy::{
    api::Server,
    async_trait,
    chat::{ChatMessage, ChatProvider, ChatResponse, Tool, Usage},
    comeback::comeback_agent_builder,
    error::LLMError,
    ToolCall,
};
use serde_json::{json, Value};
use std::fmt;
use tower::ServiceExt;

const REPLY: &str = "**Alice**: you again?\n**You**: Always.\n\n![gif](https://media.giphy.com/media/a/giphy.gif)";

#[derive(Debug)]
struct Reply(String);

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl ChatResponse for Reply {
    fn text(&self) -> Option<String> {
        Some(self.0.clone())
    }

    fn tool_calls(&self) -> Option<Vec<ToolCall>> {
        None
    }

    fn usage(&self) -> Option<Usage> {
        None
    }
}

/// Answers every prompt with a fixed transcript.
struct Canned;

#[async_trait]
impl ChatProvider for Canned {
    async fn chat_with_tools(
        &self,
        _messages: &[ChatMessage],
        _tools: Option<&[Tool]>,
    ) -> Result<Box<dyn ChatResponse>, LLMError> {
        Ok(Box::new(Reply(REPLY.to_string())))
    }
}

/// Always fails, like an upstream outage.
struct Down;

#[async_trait]
impl ChatProvider for Down {
    async fn chat_with_tools(
        &self,
        _messages: &[ChatMessage],
        _tools: Option<&[Tool]>,
    ) -> Result<Box<dyn ChatResponse>, LLMError> {
        Err(LLMError::HttpError("connection refused".to_string()))
    }
}

fn app(provider: impl ChatProvider + 'static, auth_key: Option<&str>) -> Router {
    let agent = comeback_agent_builder().provider(provider).build().unwrap();
    let mut server = Server::new(agent);
    if let Some(key) = auth_key {
        server = server.with_auth_key(key);
    }
    server.router()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn form(body: &str) -> Request<Body> {
    Request::post("/comeback")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn api(body: Value, bearer: Option<&str>) -> Request<Body> {
    let mut req = Request::post("/v1/comeback").header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = bearer {
        req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    req.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn test_index_serves_the_form() {
    let response = app(Canned, None)
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response).await;
    assert!(html.contains("<form method=\"post\" action=\"/comeback\">"));
    assert!(html.contains("<option value=\"witty\" selected>"));
    assert!(html.contains("<option value=\"low-key\" selected>"));
}

#[tokio::test]
async fn test_form_renders_the_transcript() {
    let response = app(Canned, None)
        .oneshot(form("chat_text=Alice%3A+you+again%3F&tone=savage&intensity=balanced"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = body_string(response).await;
    assert!(html.contains("Updated Chat"));
    assert!(html.contains("<strong>You</strong>: Always."));
    assert!(html.contains("<img src=\"https://media.giphy.com/media/a/giphy.gif\""));
    assert!(html.contains("Alice: you again?</textarea>"));
    assert!(html.contains("<option value=\"savage\" selected>"));
}

#[tokio::test]
async fn test_form_rejects_blank_snippet() {
    let response = app(Down, None)
        .oneshot(form("chat_text=+++&tone=witty&intensity=low-key"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let html = body_string(response).await;
    assert!(html.contains("Please paste a chat snippet to respond to."));
    assert!(!html.contains("Updated Chat"));
}

#[tokio::test]
async fn test_form_rejects_unknown_tone_and_keeps_inputs() {
    let response = app(Canned, None)
        .oneshot(form("chat_text=Bob%3A+nice+haircut&tone=spicy&intensity=balanced"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let html = body_string(response).await;
    assert!(html.contains("Unknown tone: spicy"));
    assert!(html.contains("Bob: nice haircut</textarea>"));
    assert!(html.contains("<option value=\"balanced\" selected>"));
    assert!(!html.contains("Updated Chat"));
}

#[tokio::test]
async fn test_form_reports_upstream_failure() {
    let response = app(Down, None)
        .oneshot(form("chat_text=hello"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let html = body_string(response).await;
    assert!(html.contains("connection refused"));
}

#[tokio::test]
async fn test_api_returns_markdown() {
    let response = app(Canned, None)
        .oneshot(api(
            json!({ "chat_text": "Alice: you again?", "tone": "Sarcastic and dry" }),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["markdown"], REPLY);
    assert_eq!(body["tone"], "sarcastic");
    assert_eq!(body["intensity"], "low-key");
    assert!(body["id"].as_str().unwrap().starts_with("comeback-"));
    assert_eq!(body["tool_calls"], json!([]));
}

#[tokio::test]
async fn test_api_rejects_unknown_tone() {
    let response = app(Canned, None)
        .oneshot(api(json!({ "chat_text": "hi", "tone": "spicy" }), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert!(body["error"].as_str().unwrap().contains("Unknown tone: spicy"));
}

#[tokio::test]
async fn test_api_requires_bearer_token() {
    let missing = app(Canned, Some("secret"))
        .oneshot(api(json!({ "chat_text": "hi" }), None))
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    let wrong = app(Canned, Some("secret"))
        .oneshot(api(json!({ "chat_text": "hi" }), Some("nope")))
        .await
        .unwrap();
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
    let body: Value = serde_json::from_str(&body_string(wrong).await).unwrap();
    assert_eq!(body["error"], "Invalid API key");

    let ok = app(Canned, Some("secret"))
        .oneshot(api(json!({ "chat_text": "hi" }), Some("secret")))
        .await
        .unwrap();
    assert_eq!(ok.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_health() {
    let response = app(Canned, None)
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["status"], "healthy");
}
